use super::axis::{AxisConfig, AxisTable, FixedAxes};
use super::joint::{JointMap, LogicalJoint};

/// ジョイント表と軸表の組
///
/// 別のリグを駆動する場合はボーン名と軸規約をここで差し替える。
/// アルゴリズム側は変更不要。
#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    joints: JointMap,
    axes: AxisTable,
}

impl Registry {
    pub fn new(joints: JointMap, axes: AxisTable) -> Self {
        Self { joints, axes }
    }

    pub fn mixamo() -> Self {
        Self::new(JointMap::mixamo(), AxisTable::mixamo())
    }

    /// ジョイントのボーン名と軸規約をまとめて差し替える
    pub fn with_bone(mut self, joint: LogicalJoint, bone: &str, axis: AxisConfig) -> Self {
        self.joints.set(joint, bone);
        self.axes.insert(bone, axis);
        self
    }

    pub fn joints(&self) -> &JointMap {
        &self.joints
    }

    pub fn joints_mut(&mut self) -> &mut JointMap {
        &mut self.joints
    }

    pub fn axes(&self) -> &AxisTable {
        &self.axes
    }

    pub fn axes_mut(&mut self) -> &mut AxisTable {
        &mut self.axes
    }

    pub fn bone_name(&self, joint: LogicalJoint) -> &str {
        self.joints.bone(joint)
    }

    pub fn axis_for(&self, bone: &str) -> AxisConfig {
        self.axes.lookup(bone)
    }

    pub fn fixed_for(&self, bone: &str) -> FixedAxes {
        self.axes.fixed(bone)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::mixamo()
    }
}
