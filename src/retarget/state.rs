use crate::config::RigSettings;
use crate::retarget::smooth::AngleFilter;
use crate::rig::LogicalJoint;

/// ジョイントごとの平滑化状態。アタッチ中だけ有効
///
/// 保持するのは常に平滑化後の出力値で、生の目標値ではない。
#[derive(Debug, Clone)]
pub struct SmoothingState {
    filters: [AngleFilter; LogicalJoint::COUNT],
}

impl SmoothingState {
    pub fn from_settings(settings: &RigSettings) -> Self {
        Self {
            filters: LogicalJoint::ALL.map(|joint| AngleFilter::from_config(settings.tuning(joint))),
        }
    }

    /// 平滑化後の値。非有限の入力は `None` で、状態は変わらない
    pub fn apply(&mut self, joint: LogicalJoint, raw: f32) -> Option<f32> {
        self.filters[joint.index()].apply(raw)
    }

    pub fn last(&self, joint: LogicalJoint) -> Option<f32> {
        self.filters[joint.index()].last()
    }

    pub fn reset(&mut self) {
        for filter in &mut self.filters {
            filter.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joints_are_independent() {
        let mut state = SmoothingState::from_settings(&RigSettings::default());
        state.apply(LogicalJoint::LeftElbow, 30.0);
        assert_eq!(state.last(LogicalJoint::LeftElbow), Some(30.0));
        assert_eq!(state.last(LogicalJoint::RightElbow), None);
    }

    #[test]
    fn test_stores_emitted_value() {
        let mut state = SmoothingState::from_settings(&RigSettings::default());
        state.apply(LogicalJoint::Spine, -90.0);
        let emitted = state.apply(LogicalJoint::Spine, -80.0).unwrap();
        // Spine: EMA alpha 0.3
        assert!((emitted - -87.0).abs() < 1e-4);
        assert_eq!(state.last(LogicalJoint::Spine), Some(emitted));
    }

    #[test]
    fn test_reset_clears_all() {
        let mut state = SmoothingState::from_settings(&RigSettings::default());
        for joint in LogicalJoint::ALL {
            state.apply(joint, 10.0);
        }
        state.reset();
        for joint in LogicalJoint::ALL {
            assert_eq!(state.last(joint), None);
        }
    }
}
