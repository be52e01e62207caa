pub mod applier;
pub mod axis;
pub mod joint;
pub mod registry;
pub mod skeleton;

pub use applier::{ApplyOutcome, BoneApplier};
pub use axis::{Axis, AxisConfig, AxisTable, FixedAxes, Sign};
pub use joint::{JointMap, LogicalJoint};
pub use registry::Registry;
pub use skeleton::{BoneHandle, BoneIndex, Rotation, Skeleton, SkeletonNode};
