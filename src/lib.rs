pub mod config;
pub mod logging;
pub mod pose;
pub mod retarget;
pub mod rig;

pub use config::{Config, ConfigError, LoadOutcome, RigSettings};
pub use pose::{Keypoint, KeypointIndex, Pose, PoseError};
pub use retarget::RigDriver;
pub use rig::{LogicalJoint, Registry, Skeleton, SkeletonNode};
