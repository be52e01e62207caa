use crate::config::{FilterKind, JointTuning};
use crate::retarget::angles::{normalize_degrees, unwrap_near};

/// 角度ラップ対応・ステップ上限付きの指数平滑 (肩・肘)
///
/// 1. 初回はそのまま出力
/// 2. 目標を前回値の ±180 度以内に展開
/// 3. 差分を `max_step` でクランプ
/// 4. `alpha` でブレンド
///
/// 非有限の目標は捨てて `None` を返し、前回値は保持する。
#[derive(Debug, Clone)]
pub struct BoundedStepFilter {
    max_step: f32,
    alpha: f32,
    prev: Option<f32>,
}

impl BoundedStepFilter {
    pub fn new(max_step: f32, alpha: f32) -> Self {
        Self {
            max_step,
            alpha,
            prev: None,
        }
    }

    pub fn apply(&mut self, target: f32) -> Option<f32> {
        if !target.is_finite() {
            return None;
        }
        let prev = match self.prev {
            Some(prev) => prev,
            None => {
                self.prev = Some(target);
                return Some(target);
            }
        };

        let delta = (unwrap_near(target, prev) - prev).clamp(-self.max_step, self.max_step);
        let blended = (1.0 - self.alpha) * prev + self.alpha * (prev + delta);

        // 多回転を溜めない
        let emitted = normalize_degrees(blended);
        self.prev = Some(emitted);
        Some(emitted)
    }

    pub fn last(&self) -> Option<f32> {
        self.prev
    }

    pub fn reset(&mut self) {
        self.prev = None;
    }
}

/// 単純な EMA (背骨など)。ラップ処理もクランプも無し
#[derive(Debug, Clone)]
pub struct EmaFilter {
    alpha: f32,
    prev: Option<f32>,
}

impl EmaFilter {
    pub fn new(alpha: f32) -> Self {
        Self { alpha, prev: None }
    }

    pub fn apply(&mut self, value: f32) -> Option<f32> {
        if !value.is_finite() {
            return None;
        }
        let result = match self.prev {
            Some(prev) => (1.0 - self.alpha) * prev + self.alpha * value,
            None => value,
        };
        self.prev = Some(result);
        Some(result)
    }

    pub fn last(&self) -> Option<f32> {
        self.prev
    }

    pub fn reset(&mut self) {
        self.prev = None;
    }
}

/// ジョイントごとに選ばれる平滑化
#[derive(Debug, Clone)]
pub enum AngleFilter {
    Bounded(BoundedStepFilter),
    Ema(EmaFilter),
}

impl AngleFilter {
    pub fn from_config(tuning: &JointTuning) -> Self {
        match tuning.filter {
            FilterKind::Bounded => Self::Bounded(BoundedStepFilter::new(tuning.max_step, tuning.alpha)),
            FilterKind::Ema => Self::Ema(EmaFilter::new(tuning.alpha)),
        }
    }

    /// 非有限値なら `None`。状態は変えない
    pub fn apply(&mut self, value: f32) -> Option<f32> {
        match self {
            Self::Bounded(f) => f.apply(value),
            Self::Ema(f) => f.apply(value),
        }
    }

    pub fn last(&self) -> Option<f32> {
        match self {
            Self::Bounded(f) => f.last(),
            Self::Ema(f) => f.last(),
        }
    }

    pub fn reset(&mut self) {
        match self {
            Self::Bounded(f) => f.reset(),
            Self::Ema(f) => f.reset(),
        }
    }
}
