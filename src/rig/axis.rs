use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// ボーンのローカル回転軸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Pitch,
    Yaw,
    Roll,
}

/// 角度に掛ける符号。0 は軸を常にオフセット値に固定する
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Sign {
    Negative,
    Zero,
    Positive,
}

impl Sign {
    pub fn factor(self) -> f32 {
        match self {
            Self::Negative => -1.0,
            Self::Zero => 0.0,
            Self::Positive => 1.0,
        }
    }
}

impl TryFrom<i8> for Sign {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Negative),
            0 => Ok(Self::Zero),
            1 => Ok(Self::Positive),
            other => Err(format!("sign must be -1, 0 or 1, got {other}")),
        }
    }
}

impl From<Sign> for i8 {
    fn from(sign: Sign) -> Self {
        match sign {
            Sign::Negative => -1,
            Sign::Zero => 0,
            Sign::Positive => 1,
        }
    }
}

/// 計算角度をボーン回転へ写す規約: `sign * angle + offset` を `axis` に書く
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub axis: Axis,
    pub sign: Sign,
    /// 度
    #[serde(default)]
    pub offset: f32,
}

impl AxisConfig {
    /// 未登録ボーンに使う規約 (roll, +1, 0)
    pub const DEFAULT: AxisConfig = AxisConfig {
        axis: Axis::Roll,
        sign: Sign::Positive,
        offset: 0.0,
    };

    pub const fn new(axis: Axis, sign: Sign, offset: f32) -> Self {
        Self { axis, sign, offset }
    }

    /// 書き込む最終角度 (度)
    pub fn map_degrees(&self, angle: f32) -> f32 {
        self.sign.factor() * angle + self.offset
    }
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// 書き込み時に他の軸を固定する値 (度)。`None` の軸は触らない
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FixedAxes {
    #[serde(default)]
    pub pitch: Option<f32>,
    #[serde(default)]
    pub yaw: Option<f32>,
    #[serde(default)]
    pub roll: Option<f32>,
}

impl FixedAxes {
    pub fn is_empty(&self) -> bool {
        self.pitch.is_none() && self.yaw.is_none() && self.roll.is_none()
    }

    pub fn get(&self, axis: Axis) -> Option<f32> {
        match axis {
            Axis::Pitch => self.pitch,
            Axis::Yaw => self.yaw,
            Axis::Roll => self.roll,
        }
    }
}

/// ボーン名 → 軸規約
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisTable {
    axes: HashMap<String, AxisConfig>,
    fixed: HashMap<String, FixedAxes>,
}

impl AxisTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mixamo リグ向けの規約
    pub fn mixamo() -> Self {
        use Axis::*;
        use Sign::*;

        let mut table = Self::new();
        for (bone, config) in [
            ("mixamorig:LeftArm", AxisConfig::new(Pitch, Negative, 0.0)),
            ("mixamorig:RightArm", AxisConfig::new(Pitch, Positive, 180.0)),
            ("mixamorig:LeftForeArm", AxisConfig::new(Pitch, Negative, 0.0)),
            ("mixamorig:RightForeArm", AxisConfig::new(Pitch, Positive, 0.0)),
            ("mixamorig:LeftUpLeg", AxisConfig::new(Roll, Negative, 100.0)),
            ("mixamorig:RightUpLeg", AxisConfig::new(Roll, Negative, 100.0)),
            ("mixamorig:LeftLeg", AxisConfig::new(Pitch, Zero, 0.0)),
            ("mixamorig:RightLeg", AxisConfig::new(Pitch, Zero, 0.0)),
            ("mixamorig:LeftFoot", AxisConfig::new(Pitch, Zero, 0.0)),
            ("mixamorig:RightFoot", AxisConfig::new(Pitch, Zero, 0.0)),
            ("mixamorig:Spine1", AxisConfig::new(Roll, Positive, 0.0)),
            ("mixamorig:Spine", AxisConfig::new(Roll, Positive, 0.0)),
        ] {
            table.insert(bone, config);
        }
        table
    }

    pub fn insert(&mut self, bone: impl Into<String>, config: AxisConfig) {
        self.axes.insert(bone.into(), config);
    }

    pub fn insert_fixed(&mut self, bone: impl Into<String>, fixed: FixedAxes) {
        self.fixed.insert(bone.into(), fixed);
    }

    /// 未登録なら `AxisConfig::DEFAULT`
    pub fn lookup(&self, bone: &str) -> AxisConfig {
        self.axes.get(bone).copied().unwrap_or(AxisConfig::DEFAULT)
    }

    pub fn contains(&self, bone: &str) -> bool {
        self.axes.contains_key(bone)
    }

    pub fn fixed(&self, bone: &str) -> FixedAxes {
        self.fixed.get(bone).copied().unwrap_or_default()
    }
}
