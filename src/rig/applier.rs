use super::axis::Axis;
use super::registry::Registry;
use super::skeleton::BoneIndex;
use crate::retarget::angles::normalize_degrees;

/// `apply` の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Written,
    /// スケルトンにボーンが無い。部分リグは許容されるので何もしない
    MissingBone,
}

/// 平滑化済み角度を軸規約に従ってボーンへ書き込む
pub struct BoneApplier<'a> {
    registry: &'a Registry,
    bones: &'a BoneIndex,
}

impl<'a> BoneApplier<'a> {
    pub fn new(registry: &'a Registry, bones: &'a BoneIndex) -> Self {
        Self { registry, bones }
    }

    /// `sign * degrees + offset` を正規化してラジアンで軸に書く。
    /// 固定値が設定された他の軸も同時に上書きする
    pub fn apply(&self, bone: &str, degrees: f32) -> ApplyOutcome {
        let Some(handle) = self.bones.get(bone) else {
            return ApplyOutcome::MissingBone;
        };

        let config = self.registry.axis_for(bone);
        let fixed = self.registry.fixed_for(bone);
        let target = normalize_degrees(config.map_degrees(degrees)).to_radians();

        let mut rotation = handle.rotation();
        for axis in [Axis::Pitch, Axis::Yaw, Axis::Roll] {
            if axis == config.axis {
                rotation.set(axis, target);
            } else if let Some(fixed_deg) = fixed.get(axis) {
                rotation.set(axis, fixed_deg.to_radians());
            }
        }
        handle.set_rotation(rotation);
        ApplyOutcome::Written
    }
}
