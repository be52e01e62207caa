//! Keypoint geometry → joint angles (degrees).
//!
//! All functions are pure. Degenerate vectors (coincident keypoints) produce
//! finite results instead of NaN.

use nalgebra::Vector2;

use crate::pose::{KeypointIndex, Pose};
use crate::rig::LogicalJoint;

/// 肘屈曲の上限 (度)
pub const ELBOW_FLEXION_MAX: f32 = 160.0;

/// (-180, 180] に正規化
pub fn normalize_degrees(angle: f32) -> f32 {
    let r = angle.rem_euclid(360.0);
    if r > 180.0 {
        r - 360.0
    } else {
        r
    }
}

/// `target` を 360 度単位でずらし、`reference` との差を 180 度以内にする
pub fn unwrap_near(target: f32, reference: f32) -> f32 {
    reference + normalize_degrees(target - reference)
}

fn unit(v: Vector2<f32>) -> Vector2<f32> {
    v.try_normalize(f32::EPSILON).unwrap_or_else(Vector2::zeros)
}

/// a → b の絶対方向
pub fn direction_angle(a: Vector2<f32>, b: Vector2<f32>) -> f32 {
    let d = b - a;
    d.y.atan2(d.x).to_degrees()
}

/// `reference` を `target` に重ねる符号付き回転角 (-180, 180]
pub fn signed_angle_between(reference: Vector2<f32>, target: Vector2<f32>) -> f32 {
    let r = unit(reference);
    let t = unit(target);
    let cross = r.x * t.y - r.y * t.x;
    let dot = r.dot(&t);
    normalize_degrees(cross.atan2(dot).to_degrees())
}

/// 符号なしの挟み角 [0, 180]
pub fn unsigned_angle_between(u: Vector2<f32>, v: Vector2<f32>) -> f32 {
    unit(u).dot(&unit(v)).clamp(-1.0, 1.0).acos().to_degrees()
}

fn midpoint(a: Vector2<f32>, b: Vector2<f32>) -> Vector2<f32> {
    (a + b) * 0.5
}

/// 腰中点 → 肩中点。4点とも有効な場合のみ
fn torso_axis(pose: &Pose, threshold: f32) -> Option<(Vector2<f32>, Vector2<f32>)> {
    let ls = pose.point(KeypointIndex::LeftShoulder, threshold)?;
    let rs = pose.point(KeypointIndex::RightShoulder, threshold)?;
    let lh = pose.point(KeypointIndex::LeftHip, threshold)?;
    let rh = pose.point(KeypointIndex::RightHip, threshold)?;
    Some((midpoint(lh, rh), midpoint(ls, rs)))
}

fn shoulder_angle(
    pose: &Pose,
    threshold: f32,
    shoulder: KeypointIndex,
    elbow: KeypointIndex,
) -> Option<f32> {
    let s = pose.point(shoulder, threshold)?;
    let e = pose.point(elbow, threshold)?;

    // 胴体の傾きを肩の動きと誤認しないよう、胴体軸からの相対角にする
    let reference = torso_axis(pose, threshold)
        .map(|(hip_mid, shoulder_mid)| shoulder_mid - hip_mid)
        .filter(|v| v.norm() > f32::EPSILON);

    Some(match reference {
        Some(reference) => signed_angle_between(reference, e - s),
        None => direction_angle(s, e),
    })
}

fn elbow_flexion(
    pose: &Pose,
    threshold: f32,
    shoulder: KeypointIndex,
    elbow: KeypointIndex,
    wrist: KeypointIndex,
) -> Option<f32> {
    let s = pose.point(shoulder, threshold)?;
    let e = pose.point(elbow, threshold)?;
    let w = pose.point(wrist, threshold)?;
    Some(unsigned_angle_between(e - s, w - e).clamp(0.0, ELBOW_FLEXION_MAX))
}

fn segment_angle(pose: &Pose, threshold: f32, from: KeypointIndex, to: KeypointIndex) -> Option<f32> {
    Some(direction_angle(
        pose.point(from, threshold)?,
        pose.point(to, threshold)?,
    ))
}

/// ジョイントの生角度。必要なキーポイントが欠けていれば `None`
pub fn joint_angle(pose: &Pose, joint: LogicalJoint, threshold: f32) -> Option<f32> {
    use KeypointIndex::*;

    match joint {
        LogicalJoint::LeftShoulder => shoulder_angle(pose, threshold, LeftShoulder, LeftElbow),
        LogicalJoint::RightShoulder => shoulder_angle(pose, threshold, RightShoulder, RightElbow),
        LogicalJoint::LeftElbow => elbow_flexion(pose, threshold, LeftShoulder, LeftElbow, LeftWrist),
        LogicalJoint::RightElbow => {
            elbow_flexion(pose, threshold, RightShoulder, RightElbow, RightWrist)
        }
        LogicalJoint::LeftHip => segment_angle(pose, threshold, LeftHip, LeftKnee),
        LogicalJoint::RightHip => segment_angle(pose, threshold, RightHip, RightKnee),
        LogicalJoint::LeftKnee => segment_angle(pose, threshold, LeftKnee, LeftAnkle),
        LogicalJoint::RightKnee => segment_angle(pose, threshold, RightKnee, RightAnkle),
        LogicalJoint::Spine => {
            torso_axis(pose, threshold).map(|(hip_mid, shoulder_mid)| direction_angle(hip_mid, shoulder_mid))
        }
    }
}
