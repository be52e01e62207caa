//! Skeleton attachment: bone hierarchy traversal and the name → rotation index.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::axis::Axis;

/// ボーンのローカル回転 (ラジアン)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rotation {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Rotation {
    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    pub fn get(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Pitch => self.pitch,
            Axis::Yaw => self.yaw,
            Axis::Roll => self.roll,
        }
    }

    pub fn set(&mut self, axis: Axis, radians: f32) {
        match axis {
            Axis::Pitch => self.pitch = radians,
            Axis::Yaw => self.yaw = radians,
            Axis::Roll => self.roll = radians,
        }
    }
}

/// シーン側と共有する回転ハンドル
///
/// ドライバが書き込み、レンダラが自分の周期で読む。シングルスレッド前提。
#[derive(Debug, Clone, Default)]
pub struct BoneHandle(Rc<RefCell<Rotation>>);

impl BoneHandle {
    pub fn new(rotation: Rotation) -> Self {
        Self(Rc::new(RefCell::new(rotation)))
    }

    pub fn rotation(&self) -> Rotation {
        *self.0.borrow()
    }

    pub fn set_rotation(&self, rotation: Rotation) {
        *self.0.borrow_mut() = rotation;
    }

    pub fn set_axis(&self, axis: Axis, radians: f32) {
        self.0.borrow_mut().set(axis, radians);
    }

    /// 同じ回転を指しているか
    pub fn same_bone(&self, other: &BoneHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// アタッチ可能なスケルトン
///
/// 子孫を全て辿り、ボーンごとに名前とハンドルを渡せればよい。
pub trait Skeleton {
    fn visit_bones(&self, visit: &mut dyn FnMut(&str, &BoneHandle));
}

/// 汎用の階層ノード。独自のシーングラフを持たない呼び出し側向け
#[derive(Debug, Clone)]
pub struct SkeletonNode {
    pub name: String,
    /// false ならグループノード (回転は索引されない)
    pub is_bone: bool,
    pub handle: BoneHandle,
    pub children: Vec<SkeletonNode>,
}

impl SkeletonNode {
    pub fn bone(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_bone: true,
            handle: BoneHandle::default(),
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self {
            is_bone: false,
            ..Self::bone(name)
        }
    }

    pub fn with_child(mut self, child: SkeletonNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_rotation(self, rotation: Rotation) -> Self {
        self.handle.set_rotation(rotation);
        self
    }

    /// 深さ優先で名前検索
    pub fn find(&self, name: &str) -> Option<&SkeletonNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    /// Mixamo 命名の最小ヒューマノイド
    pub fn mixamo_humanoid() -> Self {
        let arm = |side: &str| {
            SkeletonNode::bone(format!("mixamorig:{side}Shoulder")).with_child(
                SkeletonNode::bone(format!("mixamorig:{side}Arm")).with_child(
                    SkeletonNode::bone(format!("mixamorig:{side}ForeArm"))
                        .with_child(SkeletonNode::bone(format!("mixamorig:{side}Hand"))),
                ),
            )
        };
        let leg = |side: &str| {
            SkeletonNode::bone(format!("mixamorig:{side}UpLeg")).with_child(
                SkeletonNode::bone(format!("mixamorig:{side}Leg"))
                    .with_child(SkeletonNode::bone(format!("mixamorig:{side}Foot"))),
            )
        };

        let spine = SkeletonNode::bone("mixamorig:Spine").with_child(
            SkeletonNode::bone("mixamorig:Spine1").with_child(
                SkeletonNode::bone("mixamorig:Spine2")
                    .with_child(SkeletonNode::bone("mixamorig:Neck"))
                    .with_child(arm("Left"))
                    .with_child(arm("Right")),
            ),
        );

        SkeletonNode::group("Armature").with_child(
            SkeletonNode::bone("mixamorig:Hips")
                .with_child(spine)
                .with_child(leg("Left"))
                .with_child(leg("Right")),
        )
    }
}

impl Skeleton for SkeletonNode {
    fn visit_bones(&self, visit: &mut dyn FnMut(&str, &BoneHandle)) {
        if self.is_bone {
            visit(&self.name, &self.handle);
        }
        for child in &self.children {
            child.visit_bones(visit);
        }
    }
}

/// ボーン名 → 回転ハンドル。アタッチごとに作り直す
#[derive(Debug, Clone, Default)]
pub struct BoneIndex {
    bones: HashMap<String, BoneHandle>,
}

impl BoneIndex {
    /// 全ボーンを索引する。同名ボーンは最初に見つかったものを使う
    pub fn build(skeleton: &dyn Skeleton) -> Self {
        let mut bones = HashMap::new();
        skeleton.visit_bones(&mut |name: &str, handle: &BoneHandle| {
            if bones.contains_key(name) {
                tracing::debug!(bone = name, "duplicate bone name ignored");
                return;
            }
            bones.insert(name.to_string(), handle.clone());
        });
        Self { bones }
    }

    pub fn get(&self, name: &str) -> Option<&BoneHandle> {
        self.bones.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bones.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_skips_groups() {
        let root = SkeletonNode::group("root")
            .with_child(SkeletonNode::bone("a").with_child(SkeletonNode::bone("b")));
        let index = BoneIndex::build(&root);
        assert_eq!(index.len(), 2);
        assert!(!index.contains("root"));
        assert!(index.contains("b"));
    }

    #[test]
    fn test_index_shares_handles() {
        let root = SkeletonNode::bone("a");
        let index = BoneIndex::build(&root);
        index.get("a").unwrap().set_axis(Axis::Yaw, 1.5);
        assert_eq!(root.handle.rotation().yaw, 1.5);
        assert!(index.get("a").unwrap().same_bone(&root.handle));
    }

    #[test]
    fn test_duplicate_name_keeps_first() {
        let first = SkeletonNode::bone("dup");
        let root = SkeletonNode::group("root")
            .with_child(first.clone())
            .with_child(SkeletonNode::bone("dup"));
        let index = BoneIndex::build(&root);
        assert_eq!(index.len(), 1);
        assert!(index.get("dup").unwrap().same_bone(&first.handle));
    }

    #[test]
    fn test_rotation_axis_access() {
        let mut rotation = Rotation::new(0.1, 0.2, 0.3);
        rotation.set(Axis::Pitch, -0.5);
        assert_eq!(rotation.get(Axis::Pitch), -0.5);
        assert_eq!(rotation.get(Axis::Yaw), 0.2);
        assert_eq!(rotation.get(Axis::Roll), 0.3);
    }

    #[test]
    fn test_set_axis_keeps_other_axes() {
        let handle = BoneHandle::new(Rotation::new(0.1, 0.2, 0.3));
        handle.set_axis(Axis::Roll, 1.0);
        assert_eq!(handle.rotation(), Rotation::new(0.1, 0.2, 1.0));
    }

    #[test]
    fn test_mixamo_humanoid_has_driven_bones() {
        let root = SkeletonNode::mixamo_humanoid();
        let index = BoneIndex::build(&root);
        for name in [
            "mixamorig:LeftArm",
            "mixamorig:RightForeArm",
            "mixamorig:LeftUpLeg",
            "mixamorig:RightLeg",
            "mixamorig:Spine1",
        ] {
            assert!(index.contains(name), "{name} missing");
        }
        assert!(root.find("mixamorig:LeftHand").is_some());
    }
}
