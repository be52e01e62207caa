use std::collections::HashMap;

use crate::config::{Config, ConfigError, LossPolicy, RigSettings};
use crate::pose::Pose;
use crate::retarget::angles;
use crate::retarget::state::SmoothingState;
use crate::rig::{ApplyOutcome, BoneApplier, BoneIndex, LogicalJoint, Registry, Skeleton};

/// ポーズ → ボーン回転のリターゲット
///
/// 未アタッチの間は `drive` は何もしない。`attach` でボーン索引を作り直し、
/// 平滑化状態を全てクリアする。ジョイントは互いに独立で、
/// 1つが欠けても他のジョイントは更新される。
pub struct RigDriver {
    settings: RigSettings,
    state: SmoothingState,
    /// `None` = 未アタッチ
    bones: Option<BoneIndex>,
    /// ボーン名 → 見つからなかった回数
    misses: HashMap<String, u32>,
    angles: [Option<f32>; LogicalJoint::COUNT],
}

impl RigDriver {
    pub fn new(settings: RigSettings) -> Self {
        let state = SmoothingState::from_settings(&settings);
        Self {
            settings,
            state,
            bones: None,
            misses: HashMap::new(),
            angles: [None; LogicalJoint::COUNT],
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(config.rig_settings()?))
    }

    pub fn settings(&self) -> &RigSettings {
        &self.settings
    }

    pub fn registry(&self) -> &Registry {
        &self.settings.registry
    }

    pub fn is_attached(&self) -> bool {
        self.bones.is_some()
    }

    /// スケルトンをアタッチする。以前のアタッチは置き換える
    pub fn attach(&mut self, skeleton: &dyn Skeleton) {
        let bones = BoneIndex::build(skeleton);

        for (joint, bone) in self.settings.registry.joints().iter() {
            if !bones.contains(bone) {
                tracing::warn!(joint = joint.name(), bone, "skeleton has no bone for joint");
            }
        }
        tracing::info!(bones = bones.len(), "skeleton attached");

        self.bones = Some(bones);
        self.state.reset();
        self.misses.clear();
        self.angles = [None; LogicalJoint::COUNT];
    }

    /// 1フレーム分のポーズを適用する
    pub fn drive(&mut self, pose: &Pose) {
        let Self {
            settings,
            state,
            bones,
            misses,
            angles: last_angles,
        } = self;
        let Some(bones) = bones.as_ref() else {
            return;
        };

        let applier = BoneApplier::new(&settings.registry, bones);
        let threshold = settings.confidence_threshold;

        for joint in LogicalJoint::ALL {
            let tuning = settings.tuning(joint);
            let bone = settings.registry.bone_name(joint);

            // 非有限の角度は欠損と同じ扱い
            let smoothed = angles::joint_angle(pose, joint, threshold)
                .and_then(|raw| state.apply(joint, raw * tuning.scale));

            let emitted = match smoothed {
                Some(emitted) => {
                    last_angles[joint.index()] = Some(emitted);
                    emitted
                }
                None => match (tuning.on_loss, state.last(joint)) {
                    (LossPolicy::Hold, Some(last)) => last,
                    _ => {
                        tracing::trace!(joint = joint.name(), "insufficient keypoints, skipped");
                        continue;
                    }
                },
            };

            if applier.apply(bone, emitted) == ApplyOutcome::MissingBone {
                record_miss(misses, bone, settings.warn_every);
            }
        }
    }

    /// 生の `[x, y, confidence]` 列を適用する。不正な入力は無視
    pub fn drive_triples(&mut self, triples: &[Option<[f32; 3]>]) {
        match Pose::from_triples(triples) {
            Ok(pose) => self.drive(&pose),
            Err(e) => tracing::debug!(error = %e, "malformed pose ignored"),
        }
    }

    /// 最後に出力した角度 (度)
    pub fn angle(&self, joint: LogicalJoint) -> Option<f32> {
        self.angles[joint.index()]
    }

    pub fn angles(&self) -> impl Iterator<Item = (LogicalJoint, f32)> + '_ {
        LogicalJoint::ALL
            .into_iter()
            .filter_map(|joint| self.angle(joint).map(|a| (joint, a)))
    }

    /// アタッチ以降、ボーンが見つからなかった回数
    pub fn missing_bone_lookups(&self, bone: &str) -> u32 {
        self.misses.get(bone).copied().unwrap_or(0)
    }
}

/// 初回と `warn_every` 回ごとに警告する。`warn_every == 0` なら初回のみ
fn should_warn(count: u32, warn_every: u32) -> bool {
    count == 1 || (warn_every > 0 && count % warn_every == 0)
}

/// 見つからなかった回数を数える。警告したら `true`
fn record_miss(misses: &mut HashMap<String, u32>, bone: &str, warn_every: u32) -> bool {
    let count = misses.entry(bone.to_string()).or_insert(0);
    *count += 1;
    let warn = should_warn(*count, warn_every);
    if warn {
        tracing::warn!(bone, misses = *count, "bone lookup failed; rig and skeleton may not match");
    }
    warn
}
