use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rig::{Axis, AxisConfig, FixedAxes, LogicalJoint, Registry, Sign};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown joint `{0}`")]
    UnknownJoint(String),

    #[error("invalid tuning for {joint}: {reason}")]
    InvalidTuning { joint: &'static str, reason: String },

    #[error("confidence_threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f32),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rig: RigConfig,
    /// ジョイント名 → 平滑化パラメータ (指定した項目のみ上書き)
    #[serde(default)]
    pub joints: HashMap<String, JointOverride>,
    /// ジョイント名 → ボーン名
    #[serde(default)]
    pub joint_map: HashMap<String, String>,
    /// ボーン名 → 軸規約
    #[serde(default)]
    pub bones: HashMap<String, BoneConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RigConfig {
    /// キーポイントの最小信頼度
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    /// 未登録ボーン参照の警告間隔 (回)
    #[serde(default = "default_warn_every")]
    pub warn_every: u32,
}

fn default_confidence_threshold() -> f32 { 0.35 }
fn default_warn_every() -> u32 { 30 }

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            warn_every: default_warn_every(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    /// ラップ対応 + ステップ上限
    Bounded,
    /// 単純 EMA
    Ema,
}

/// 信頼度が落ちたフレームの扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LossPolicy {
    /// 最後に出力した値をボーンへ書き直す
    Hold,
    /// ボーンに触れない
    Skip,
}

/// ジョイント単位の平滑化設定
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointTuning {
    pub filter: FilterKind,
    /// 0 < alpha <= 1
    pub alpha: f32,
    /// 1 更新あたりの最大変化量 (度)。`Bounded` のみ
    pub max_step: f32,
    /// 生角度に掛ける係数
    pub scale: f32,
    pub on_loss: LossPolicy,
}

impl JointTuning {
    /// 既定値。左右で値が違うのは意図的 (要キャリブレーション)
    pub fn default_for(joint: LogicalJoint) -> Self {
        let bounded = |max_step: f32, alpha: f32, on_loss: LossPolicy| Self {
            filter: FilterKind::Bounded,
            alpha,
            max_step,
            scale: 1.0,
            on_loss,
        };
        match joint {
            LogicalJoint::LeftShoulder => bounded(20.0, 0.5, LossPolicy::Skip),
            LogicalJoint::RightShoulder => bounded(25.0, 0.5, LossPolicy::Skip),
            LogicalJoint::LeftElbow => bounded(20.0, 0.65, LossPolicy::Hold),
            LogicalJoint::RightElbow => bounded(25.0, 0.35, LossPolicy::Hold),
            LogicalJoint::Spine => Self {
                alpha: 0.3,
                ..Self::default()
            },
            LogicalJoint::LeftHip
            | LogicalJoint::RightHip
            | LogicalJoint::LeftKnee
            | LogicalJoint::RightKnee => Self::default(),
        }
    }

    fn validate(&self, joint: LogicalJoint) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidTuning {
            joint: joint.name(),
            reason,
        };
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(invalid(format!("alpha must be in (0, 1], got {}", self.alpha)));
        }
        if !(self.max_step >= 0.0) {
            return Err(invalid(format!("max_step must be >= 0, got {}", self.max_step)));
        }
        if !(self.scale.is_finite() && self.scale >= 0.0) {
            return Err(invalid(format!("scale must be >= 0, got {}", self.scale)));
        }
        Ok(())
    }
}

impl Default for JointTuning {
    fn default() -> Self {
        Self {
            filter: FilterKind::Ema,
            alpha: 0.5,
            max_step: 180.0,
            scale: 1.0,
            on_loss: LossPolicy::Skip,
        }
    }
}

/// `[joints.<name>]` の上書き項目
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct JointOverride {
    pub filter: Option<FilterKind>,
    pub alpha: Option<f32>,
    pub max_step: Option<f32>,
    pub scale: Option<f32>,
    pub on_loss: Option<LossPolicy>,
}

impl JointOverride {
    fn merge(&self, base: JointTuning) -> JointTuning {
        JointTuning {
            filter: self.filter.unwrap_or(base.filter),
            alpha: self.alpha.unwrap_or(base.alpha),
            max_step: self.max_step.unwrap_or(base.max_step),
            scale: self.scale.unwrap_or(base.scale),
            on_loss: self.on_loss.unwrap_or(base.on_loss),
        }
    }
}

/// `[bones."<name>"]`
#[derive(Debug, Clone, Deserialize)]
pub struct BoneConfig {
    pub axis: Axis,
    pub sign: Sign,
    #[serde(default)]
    pub offset: f32,
    /// 書き込み時に固定する他の軸
    #[serde(default)]
    pub fixed: Option<FixedAxes>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// EnvFilter 形式 (e.g. "info", "talava_rig=debug")
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// ドライバに渡す検証済み設定
#[derive(Debug, Clone)]
pub struct RigSettings {
    pub confidence_threshold: f32,
    pub warn_every: u32,
    pub tuning: [JointTuning; LogicalJoint::COUNT],
    pub registry: Registry,
}

impl RigSettings {
    pub fn tuning(&self, joint: LogicalJoint) -> &JointTuning {
        &self.tuning[joint.index()]
    }
}

impl Default for RigSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            warn_every: default_warn_every(),
            tuning: LogicalJoint::ALL.map(JointTuning::default_for),
            registry: Registry::mixamo(),
        }
    }
}

/// `Config::load_or_default` の結果
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded,
    NotFound,
    /// 読めたが不正だったので既定値を使った
    Invalid(ConfigError),
}

impl LoadOutcome {
    pub fn is_fallback(&self) -> bool {
        !matches!(self, LoadOutcome::Loaded)
    }

    pub fn log(&self, path: &Path) {
        match self {
            LoadOutcome::Loaded => tracing::info!(path = %path.display(), "config loaded"),
            LoadOutcome::NotFound => {
                tracing::info!(path = %path.display(), "config not found, using defaults")
            }
            LoadOutcome::Invalid(e) => {
                tracing::warn!(path = %path.display(), error = %e, "invalid config, using defaults")
            }
        }
    }
}

fn parse_joint(name: &str) -> Result<LogicalJoint, ConfigError> {
    LogicalJoint::ALL
        .into_iter()
        .find(|joint| joint.name() == name)
        .ok_or_else(|| ConfigError::UnknownJoint(name.to_string()))
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        Ok(config)
    }

    /// 読めなければ既定値。結果はロギング初期化後に `LoadOutcome::log` で報告する
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> (Self, LoadOutcome) {
        match Self::load(&path) {
            Ok(config) => (config, LoadOutcome::Loaded),
            Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                (Self::default(), LoadOutcome::NotFound)
            }
            Err(e) => (Self::default(), LoadOutcome::Invalid(e)),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rig_settings().map(|_| ())
    }

    /// 既定値に上書き項目を重ねたジョイント設定
    pub fn tuning(&self, joint: LogicalJoint) -> JointTuning {
        let base = JointTuning::default_for(joint);
        match self.joints.get(joint.name()) {
            Some(over) => over.merge(base),
            None => base,
        }
    }

    /// Mixamo 既定表に `[joint_map]` と `[bones]` を重ねる
    pub fn registry(&self) -> Result<Registry, ConfigError> {
        let mut registry = Registry::mixamo();
        for (name, bone) in &self.joint_map {
            registry.joints_mut().set(parse_joint(name)?, bone.as_str());
        }
        for (bone, cfg) in &self.bones {
            registry
                .axes_mut()
                .insert(bone.as_str(), AxisConfig::new(cfg.axis, cfg.sign, cfg.offset));
            if let Some(fixed) = cfg.fixed {
                registry.axes_mut().insert_fixed(bone.as_str(), fixed);
            }
        }
        Ok(registry)
    }

    pub fn rig_settings(&self) -> Result<RigSettings, ConfigError> {
        let threshold = self.rig.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::InvalidThreshold(threshold));
        }
        for name in self.joints.keys() {
            parse_joint(name)?;
        }

        let tuning = LogicalJoint::ALL.map(|joint| self.tuning(joint));
        for joint in LogicalJoint::ALL {
            tuning[joint.index()].validate(joint)?;
        }

        Ok(RigSettings {
            confidence_threshold: threshold,
            warn_every: self.rig.warn_every,
            tuning,
            registry: self.registry()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.rig.confidence_threshold, 0.35);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.tuning(LogicalJoint::LeftElbow), JointTuning::default_for(LogicalJoint::LeftElbow));
    }

    #[test]
    fn test_default_tuning_table() {
        let left = JointTuning::default_for(LogicalJoint::LeftElbow);
        let right = JointTuning::default_for(LogicalJoint::RightElbow);
        assert_eq!((left.max_step, left.alpha), (20.0, 0.65));
        assert_eq!((right.max_step, right.alpha), (25.0, 0.35));
        assert_eq!(left.on_loss, LossPolicy::Hold);
        assert_eq!(JointTuning::default_for(LogicalJoint::LeftShoulder).on_loss, LossPolicy::Skip);
        assert_eq!(JointTuning::default_for(LogicalJoint::Spine).filter, FilterKind::Ema);
    }

    #[test]
    fn test_partial_override_keeps_joint_defaults() {
        let config = Config::from_toml_str(
            r#"
[joints.left_elbow]
alpha = 0.4
"#,
        )
        .unwrap();
        let tuning = config.tuning(LogicalJoint::LeftElbow);
        assert_eq!(tuning.alpha, 0.4);
        assert_eq!(tuning.max_step, 20.0);
        assert_eq!(tuning.on_loss, LossPolicy::Hold);
    }

    #[test]
    fn test_unknown_joint_rejected() {
        let err = Config::from_toml_str("[joints.tail]\nalpha = 0.5").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownJoint(name) if name == "tail"));
    }

    #[test]
    fn test_invalid_alpha_rejected() {
        let err = Config::from_toml_str("[joints.spine]\nalpha = 0.0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTuning { joint: "spine", .. }));
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let err = Config::from_toml_str("[rig]\nconfidence_threshold = 1.5").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidThreshold(_)));
    }

    #[test]
    fn test_bone_overrides_build_registry() {
        let config = Config::from_toml_str(
            r#"
[joint_map]
left_shoulder = "LeftUpperArm"

[bones."LeftUpperArm"]
axis = "yaw"
sign = -1
offset = 90.0

[bones."LeftUpperArm".fixed]
roll = 10.0
"#,
        )
        .unwrap();
        let registry = config.registry().unwrap();
        assert_eq!(registry.bone_name(LogicalJoint::LeftShoulder), "LeftUpperArm");
        assert_eq!(
            registry.axis_for("LeftUpperArm"),
            AxisConfig::new(Axis::Yaw, Sign::Negative, 90.0)
        );
        assert_eq!(registry.fixed_for("LeftUpperArm").roll, Some(10.0));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/talava_rig.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        let (config, outcome) = Config::load_or_default("/nonexistent/talava_rig.toml");
        assert!(matches!(outcome, LoadOutcome::NotFound));
        assert!(outcome.is_fallback());
        assert_eq!(config.rig.warn_every, 30);
    }

    #[test]
    fn test_load_or_default_keeps_invalid_error() {
        let path = std::env::temp_dir().join(format!("talava_rig_invalid_{}.toml", std::process::id()));
        fs::write(&path, "[rig]\nconfidence_threshold = 5.0\n").unwrap();

        let (config, outcome) = Config::load_or_default(&path);
        fs::remove_file(&path).ok();

        assert!(matches!(outcome, LoadOutcome::Invalid(ConfigError::InvalidThreshold(t)) if t == 5.0));
        assert_eq!(config.rig.confidence_threshold, 0.35);
    }

    #[test]
    fn test_load_or_default_reads_file() {
        let path = std::env::temp_dir().join(format!("talava_rig_valid_{}.toml", std::process::id()));
        fs::write(&path, "[rig]\nwarn_every = 5\n").unwrap();

        let (config, outcome) = Config::load_or_default(&path);
        fs::remove_file(&path).ok();

        assert!(matches!(outcome, LoadOutcome::Loaded));
        assert_eq!(config.rig.warn_every, 5);
    }

    #[test]
    fn test_bundled_config_parses() {
        let content = include_str!("../config.toml");
        let config = Config::from_toml_str(content).unwrap();
        let settings = config.rig_settings().unwrap();
        assert_eq!(settings.tuning(LogicalJoint::RightElbow).alpha, 0.35);
    }
}
