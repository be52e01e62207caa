pub mod keypoint;

pub use keypoint::{Keypoint, KeypointIndex, Pose, PoseError, PoseRecord, Visibility};
