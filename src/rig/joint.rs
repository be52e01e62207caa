use serde::{Deserialize, Serialize};

/// リグ非依存の論理ジョイント
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalJoint {
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    Spine,
}

impl LogicalJoint {
    pub const COUNT: usize = 9;

    /// 駆動順
    pub const ALL: [LogicalJoint; LogicalJoint::COUNT] = [
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::Spine,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::Spine => "spine",
        }
    }
}

/// 論理ジョイント → ボーン名
#[derive(Debug, Clone, PartialEq)]
pub struct JointMap {
    bones: [String; LogicalJoint::COUNT],
}

impl JointMap {
    /// Mixamo リグの命名
    pub fn mixamo() -> Self {
        let bones = LogicalJoint::ALL.map(|joint| {
            let name = match joint {
                LogicalJoint::LeftShoulder => "mixamorig:LeftArm",
                LogicalJoint::RightShoulder => "mixamorig:RightArm",
                LogicalJoint::LeftElbow => "mixamorig:LeftForeArm",
                LogicalJoint::RightElbow => "mixamorig:RightForeArm",
                LogicalJoint::LeftHip => "mixamorig:LeftUpLeg",
                LogicalJoint::RightHip => "mixamorig:RightUpLeg",
                LogicalJoint::LeftKnee => "mixamorig:LeftLeg",
                LogicalJoint::RightKnee => "mixamorig:RightLeg",
                LogicalJoint::Spine => "mixamorig:Spine1",
            };
            name.to_string()
        });
        Self { bones }
    }

    pub fn bone(&self, joint: LogicalJoint) -> &str {
        &self.bones[joint.index()]
    }

    pub fn set(&mut self, joint: LogicalJoint, bone: impl Into<String>) {
        self.bones[joint.index()] = bone.into();
    }

    pub fn iter(&self) -> impl Iterator<Item = (LogicalJoint, &str)> {
        LogicalJoint::ALL
            .into_iter()
            .map(move |joint| (joint, self.bone(joint)))
    }
}

impl Default for JointMap {
    fn default() -> Self {
        Self::mixamo()
    }
}
