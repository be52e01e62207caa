use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// COCO 17 キーポイントインデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum KeypointIndex {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl KeypointIndex {
    pub const COUNT: usize = 17;

    /// インデックス順の全キーポイント
    pub const ALL: [KeypointIndex; KeypointIndex::COUNT] = [
        Self::Nose,
        Self::LeftEye,
        Self::RightEye,
        Self::LeftEar,
        Self::RightEar,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// 検出器側の名前 (snake_case)
    pub fn name(self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }
}

/// 単一キーポイント
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    /// X座標 (ピクセル)
    pub x: f32,
    /// Y座標 (ピクセル、下向きが正)
    pub y: f32,
    /// 信頼度スコア (0.0〜1.0)
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }

    /// 信頼度が閾値以上か
    pub fn is_valid(&self, threshold: f32) -> bool {
        self.confidence >= threshold
    }

    pub fn position(&self) -> Vector2<f32> {
        Vector2::new(self.x, self.y)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum PoseError {
    #[error("expected {expected} keypoints, got {actual}")]
    KeypointCount { expected: usize, actual: usize },

    #[error("keypoint {index} has a non-finite value")]
    NonFinite { index: usize },
}

/// 検出器から届く生データ (JSON)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseRecord {
    pub keypoints: Vec<Option<[f32; 3]>>,
    #[serde(default)]
    pub bbox: Option<[f32; 4]>,
    #[serde(default)]
    pub score: Option<f32>,
}

/// 17キーポイントからなる姿勢
///
/// 欠損キーポイントは `None`。構築時に有限値をチェックし信頼度をクランプするため、
/// アクセス時の検証は不要。フィールドは非公開で、検証を経ない構築はできない。
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "PoseRecord")]
pub struct Pose {
    keypoints: [Option<Keypoint>; KeypointIndex::COUNT],
    /// バウンディングボックス (x, y, w, h)。リターゲットでは未使用
    bbox: Option<[f32; 4]>,
    /// 検出スコア。リターゲットでは未使用
    score: Option<f32>,
}

impl Pose {
    /// 座標・信頼度が有限であることを確認し、信頼度を 0..=1 にクランプする
    pub fn new(keypoints: [Option<Keypoint>; KeypointIndex::COUNT]) -> Result<Self, PoseError> {
        let mut checked = [None; KeypointIndex::COUNT];
        for (index, kp) in keypoints.iter().enumerate() {
            if let Some(kp) = kp {
                if !(kp.x.is_finite() && kp.y.is_finite() && kp.confidence.is_finite()) {
                    return Err(PoseError::NonFinite { index });
                }
                checked[index] = Some(Keypoint::new(kp.x, kp.y, kp.confidence.clamp(0.0, 1.0)));
            }
        }
        Ok(Self {
            keypoints: checked,
            bbox: None,
            score: None,
        })
    }

    /// `[x, y, confidence]` の列から構築する
    pub fn from_triples(triples: &[Option<[f32; 3]>]) -> Result<Self, PoseError> {
        if triples.len() != KeypointIndex::COUNT {
            return Err(PoseError::KeypointCount {
                expected: KeypointIndex::COUNT,
                actual: triples.len(),
            });
        }

        let mut keypoints = [None; KeypointIndex::COUNT];
        for (slot, &triple) in keypoints.iter_mut().zip(triples) {
            *slot = triple.map(|[x, y, c]| Keypoint::new(x, y, c));
        }
        Self::new(keypoints)
    }

    pub fn keypoints(&self) -> &[Option<Keypoint>; KeypointIndex::COUNT] {
        &self.keypoints
    }

    pub fn bbox(&self) -> Option<[f32; 4]> {
        self.bbox
    }

    pub fn score(&self) -> Option<f32> {
        self.score
    }

    /// インデックスでキーポイントを取得
    pub fn get(&self, index: KeypointIndex) -> Option<&Keypoint> {
        self.keypoints[index as usize].as_ref()
    }

    /// 閾値以上の信頼度を持つキーポイントの座標
    pub fn point(&self, index: KeypointIndex, threshold: f32) -> Option<Vector2<f32>> {
        self.get(index)
            .filter(|kp| kp.is_valid(threshold))
            .map(Keypoint::position)
    }

    /// 可視キーポイントの統計
    pub fn visibility(&self, threshold: f32) -> Visibility {
        let confs: Vec<f32> = self
            .keypoints
            .iter()
            .flatten()
            .filter(|kp| kp.is_valid(threshold))
            .map(|kp| kp.confidence)
            .collect();
        let visible = confs.len();
        let mean_confidence = if visible > 0 {
            confs.iter().sum::<f32>() / visible as f32
        } else {
            0.0
        };
        Visibility {
            mean_confidence,
            ratio: visible as f32 / KeypointIndex::COUNT as f32,
            visible,
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            keypoints: [None; KeypointIndex::COUNT],
            bbox: None,
            score: None,
        }
    }
}

impl TryFrom<PoseRecord> for Pose {
    type Error = PoseError;

    fn try_from(record: PoseRecord) -> Result<Self, Self::Error> {
        let mut pose = Pose::from_triples(&record.keypoints)?;
        pose.bbox = record.bbox;
        pose.score = record.score;
        Ok(pose)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visibility {
    /// 可視キーポイントの平均信頼度
    pub mean_confidence: f32,
    /// 可視キーポイントの割合 (0.0〜1.0)
    pub ratio: f32,
    pub visible: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypoint_index_count() {
        assert_eq!(KeypointIndex::COUNT, 17);
        assert_eq!(KeypointIndex::ALL.len(), KeypointIndex::COUNT);
    }

    #[test]
    fn test_keypoint_index_from_index() {
        assert_eq!(KeypointIndex::from_index(0), Some(KeypointIndex::Nose));
        assert_eq!(KeypointIndex::from_index(16), Some(KeypointIndex::RightAnkle));
        assert_eq!(KeypointIndex::from_index(17), None);
    }

    #[test]
    fn test_index_table_matches_discriminants() {
        for (i, idx) in KeypointIndex::ALL.iter().enumerate() {
            assert_eq!(*idx as usize, i, "{} out of order", idx.name());
        }
    }

    #[test]
    fn test_keypoint_is_valid() {
        let kp = Keypoint::new(0.5, 0.5, 0.7);
        assert!(kp.is_valid(0.5));
        assert!(!kp.is_valid(0.8));
    }

    #[test]
    fn test_from_triples_wrong_length() {
        let triples = vec![Some([0.0, 0.0, 1.0]); 16];
        assert_eq!(
            Pose::from_triples(&triples),
            Err(PoseError::KeypointCount { expected: 17, actual: 16 })
        );
    }

    #[test]
    fn test_from_triples_rejects_nan() {
        let mut triples = vec![None; 17];
        triples[3] = Some([f32::NAN, 1.0, 0.9]);
        assert_eq!(Pose::from_triples(&triples), Err(PoseError::NonFinite { index: 3 }));
    }

    #[test]
    fn test_new_rejects_non_finite() {
        let mut keypoints = [None; KeypointIndex::COUNT];
        keypoints[KeypointIndex::LeftWrist as usize] = Some(Keypoint::new(f32::NAN, 10.0, 0.9));
        assert_eq!(
            Pose::new(keypoints),
            Err(PoseError::NonFinite { index: KeypointIndex::LeftWrist as usize })
        );

        keypoints[KeypointIndex::LeftWrist as usize] = Some(Keypoint::new(1.0, 10.0, f32::INFINITY));
        assert!(Pose::new(keypoints).is_err());
    }

    #[test]
    fn test_new_clamps_confidence() {
        let mut keypoints = [None; KeypointIndex::COUNT];
        keypoints[0] = Some(Keypoint::new(1.0, 2.0, -0.5));
        let pose = Pose::new(keypoints).unwrap();
        assert_eq!(pose.get(KeypointIndex::Nose).unwrap().confidence, 0.0);
    }

    #[test]
    fn test_from_triples_missing_entries() {
        let mut triples = vec![None; 17];
        triples[KeypointIndex::LeftElbow as usize] = Some([120.0, 140.0, 1.4]);
        let pose = Pose::from_triples(&triples).unwrap();
        assert!(pose.get(KeypointIndex::Nose).is_none());
        let elbow = pose.get(KeypointIndex::LeftElbow).unwrap();
        assert_eq!(elbow.x, 120.0);
        assert_eq!(elbow.confidence, 1.0);
    }

    #[test]
    fn test_point_respects_threshold() {
        let mut keypoints = [None; KeypointIndex::COUNT];
        keypoints[KeypointIndex::Nose as usize] = Some(Keypoint::new(10.0, 20.0, 0.3));
        let pose = Pose::new(keypoints).unwrap();
        assert!(pose.point(KeypointIndex::Nose, 0.35).is_none());
        assert_eq!(pose.point(KeypointIndex::Nose, 0.25), Some(Vector2::new(10.0, 20.0)));
    }

    #[test]
    fn test_visibility() {
        let mut keypoints = [None; KeypointIndex::COUNT];
        keypoints[0] = Some(Keypoint::new(0.0, 0.0, 0.8));
        keypoints[1] = Some(Keypoint::new(0.0, 0.0, 0.6));
        keypoints[2] = Some(Keypoint::new(0.0, 0.0, 0.1));
        let pose = Pose::new(keypoints).unwrap();

        let vis = pose.visibility(0.35);
        assert_eq!(vis.visible, 2);
        assert!((vis.mean_confidence - 0.7).abs() < 1e-6);
        assert!((vis.ratio - 2.0 / 17.0).abs() < 1e-6);
    }

    #[test]
    fn test_visibility_empty_pose() {
        let vis = Pose::default().visibility(0.35);
        assert_eq!(vis.visible, 0);
        assert_eq!(vis.mean_confidence, 0.0);
    }

    #[test]
    fn test_deserialize_json() {
        let mut kps = vec!["null".to_string(); 17];
        kps[5] = "[100.0, 100.0, 0.9]".to_string();
        let json = format!(r#"{{"keypoints": [{}], "score": 0.8}}"#, kps.join(","));
        let pose: Pose = serde_json::from_str(&json).unwrap();
        assert_eq!(pose.score(), Some(0.8));
        assert!(pose.get(KeypointIndex::LeftShoulder).is_some());
        assert!(pose.get(KeypointIndex::RightShoulder).is_none());
    }

    #[test]
    fn test_deserialize_json_wrong_length() {
        let json = r#"{"keypoints": [[1.0, 2.0, 0.5]]}"#;
        assert!(serde_json::from_str::<Pose>(json).is_err());
    }
}
