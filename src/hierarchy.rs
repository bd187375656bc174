//! Arena that owns every joint of a skeleton.
//!
//! Joints refer to each other through `JointId`s, the parent link is a plain index and never owns
//! anything. World space values are computed on demand by walking the parent chain.

use crate::config::{EmptyKeyframes, HierarchyConfig};
use crate::error::{BvhError, Result};
use crate::joint::{Joint, JointId};
use crate::pose::Pose;
use crate::transform::Space;
use crate::types::*;
use crate::utils::rotation_between;
use cgmath::InnerSpace;
use regex::Regex;

#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    pub(crate) joints: Vec<Joint>,
    config: HierarchyConfig,
}

impl Hierarchy {
    pub fn new() -> Self {
        Hierarchy::default()
    }

    pub fn with_config(config: HierarchyConfig) -> Self {
        Hierarchy {
            joints: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &HierarchyConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: HierarchyConfig) {
        self.config = config;
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    ///////////////////////////////////////////////////////////////////////////////////////////////
    //// BUILDING

    /// Adds a joint without a parent. Links the joint may carry from elsewhere are dropped.
    pub fn add_joint(&mut self, mut joint: Joint) -> JointId {
        joint.parent = None;
        joint.children.clear();
        let id = JointId(self.joints.len());
        self.joints.push(joint);
        return id;
    }

    /// Adds a joint as last child of `parent`. Its local values are taken as given (relative to `parent`).
    pub fn add_child(&mut self, parent: JointId, joint: Joint) -> JointId {
        let id = self.add_joint(joint);
        self.__link(parent, id);
        return id;
    }

    pub(crate) fn __link(&mut self, parent: JointId, child: JointId) {
        self.joints[child.0].parent = Some(parent);
        self.joints[parent.0].children.push(child);
    }

    pub(crate) fn __unlink(&mut self, parent: JointId, child: JointId) {
        self.joints[parent.0].children.retain(|c| *c != child);
        self.joints[child.0].parent = None;
    }

    ///////////////////////////////////////////////////////////////////////////////////////////////
    //// ACCESS

    /// # Panics
    /// If `id` was not handed out by this hierarchy.
    pub fn joint(&self, id: JointId) -> &Joint {
        &self.joints[id.0]
    }

    /// # Panics
    /// If `id` was not handed out by this hierarchy.
    pub fn joint_mut(&mut self, id: JointId) -> &mut Joint {
        &mut self.joints[id.0]
    }

    pub fn ids(&self) -> impl Iterator<Item = JointId> + '_ {
        (0..self.joints.len()).map(JointId)
    }

    pub fn parent(&self, id: JointId) -> Option<JointId> {
        self.joints[id.0].parent
    }

    pub fn children(&self, id: JointId) -> &[JointId] {
        &self.joints[id.0].children
    }

    /// Joints without a parent, in insertion order.
    pub fn roots(&self) -> Vec<JointId> {
        self.ids().filter(|id| self.parent(*id).is_none()).collect()
    }

    /// Parent, grand parent and so on up to the root.
    pub fn ancestors(&self, id: JointId) -> impl Iterator<Item = JointId> + '_ {
        std::iter::successors(self.parent(id), move |current| self.parent(*current))
    }

    pub fn is_ancestor(&self, ancestor: JointId, of: JointId) -> bool {
        self.ancestors(of).any(|id| id == ancestor)
    }

    /// First joint in insertion order with exactly this name.
    pub fn find(&self, name: &str) -> Option<JointId> {
        self.ids().find(|id| self.joints[id.0].name == name)
    }

    ///////////////////////////////////////////////////////////////////////////////////////////////
    //// WORLD SPACE

    /// Space of the joint's working transform composed through all its ancestors.
    pub fn world_space(&self, id: JointId) -> Space {
        return self.__space(id, |joint| joint.local);
    }

    /// Like `world_space` but composed from rest poses.
    pub fn rest_world_space(&self, id: JointId) -> Space {
        return self.__space(id, |joint| joint.rest_pose);
    }

    fn __space(&self, id: JointId, pose: fn(&Joint) -> Pose) -> Space {
        let mut chain: Vec<JointId> = vec![id];
        chain.extend(self.ancestors(id));
        return chain
            .iter()
            .rev()
            .fold(Space::identity(), |space, j| space.then(&pose(&self.joints[j.0])));
    }

    pub fn position_world(&self, id: JointId) -> Position {
        self.world_space(id).position()
    }

    pub fn rotation_world(&self, id: JointId) -> Quaternion {
        self.world_space(id).rotation
    }

    pub fn scale_world(&self, id: JointId) -> Scale {
        self.world_space(id).scale
    }

    ///////////////////////////////////////////////////////////////////////////////////////////////
    //// TRAVERSAL

    /// Depth first enumeration of `root` and its descendants as `(joint, index, depth)`.
    /// Indices and depths are relative to `root`.
    pub fn layout(&self, root: JointId) -> Vec<(JointId, Index, Depth)> {
        let mut result = Vec::new();
        self.__layout(root, 0, &mut result);
        return result;
    }

    fn __layout(&self, id: JointId, depth: Depth, result: &mut Vec<(JointId, Index, Depth)>) {
        result.push((id, result.len(), depth));
        for child in self.joints[id.0].children.iter() {
            self.__layout(*child, depth + 1, result);
        }
    }

    /// Joints of the subtree whose name contains `pattern` (or equals it when `is_equal`).
    pub fn filter(
        &self,
        root: JointId,
        pattern: &str,
        is_equal: bool,
        case_sensitive: bool,
    ) -> Vec<JointId> {
        let pattern = if case_sensitive {
            pattern.to_string()
        } else {
            pattern.to_lowercase()
        };
        return self
            .layout(root)
            .into_iter()
            .map(|(id, _, _)| id)
            .filter(|id| {
                let name = &self.joints[id.0].name;
                let name = if case_sensitive {
                    name.clone()
                } else {
                    name.to_lowercase()
                };
                if is_equal {
                    name == pattern
                } else {
                    name.contains(&pattern)
                }
            })
            .collect();
    }

    /// Joints of the subtree whose name matches the regular expression.
    pub fn filter_regex(&self, root: JointId, pattern: &str) -> Result<Vec<JointId>> {
        let re = Regex::new(pattern)?;
        return Ok(self
            .layout(root)
            .into_iter()
            .map(|(id, _, _)| id)
            .filter(|id| re.is_match(&self.joints[id.0].name))
            .collect());
    }

    ///////////////////////////////////////////////////////////////////////////////////////////////
    //// POSES

    /// Loads `rest_pose ⊕ keyframe(frame)` into the working transform.
    ///
    /// Negative frames are resolved per joint. A joint without keyframes follows
    /// `HierarchyConfig::empty_keyframes`. When recursive, descendants are visited depth first and the
    /// first error stops the walk; joints visited before keep their new pose.
    pub fn read_pose(&mut self, id: JointId, frame: Frame, recursive: bool) -> Result<()> {
        let policy = self.config.empty_keyframes;
        let joint = &mut self.joints[id.0];
        let resolved = joint.keyframes.resolve(frame);

        match joint.keyframes.sample(resolved) {
            Some(delta) => joint.local = joint.rest_pose.compose(&delta),
            None => match policy {
                EmptyKeyframes::RestPose => joint.local = joint.rest_pose,
                EmptyKeyframes::Error => {
                    return Err(BvhError::FrameOutOfRange {
                        joint: joint.name.clone(),
                        frame,
                    })
                }
            },
        }
        joint.current_frame = Some(resolved);

        if recursive {
            for child in self.joints[id.0].children.clone() {
                self.read_pose(child, frame, true)?;
            }
        }
        return Ok(());
    }

    /// Stores the working transform as keyframe at `frame`.
    ///
    /// By default the delta against the rest pose is stored. With `update_rest_pose` the delta already
    /// sampled at that frame (identity without keyframes) is kept and the rest pose absorbs the change.
    pub fn write_pose(&mut self, id: JointId, frame: Frame, recursive: bool, update_rest_pose: bool) {
        let joint = &mut self.joints[id.0];
        let resolved = joint.keyframes.resolve(frame);

        if update_rest_pose {
            let delta = joint.keyframes.sample(resolved).unwrap_or_default();
            joint.rest_pose = joint.local.without(&delta);
        } else {
            let delta = joint.local.difference(&joint.rest_pose);
            joint.keyframes.insert(resolved, delta);
        }

        if recursive {
            for child in self.joints[id.0].children.clone() {
                self.write_pose(child, frame, true, update_rest_pose);
            }
        }
    }

    /// Loads the rest pose into the working transform. The joint no longer shows any frame afterwards.
    pub fn read_rest_pose(&mut self, id: JointId, recursive: bool) {
        let joint = &mut self.joints[id.0];
        joint.local = joint.rest_pose;
        joint.current_frame = None;

        if recursive {
            for child in self.joints[id.0].children.clone() {
                self.read_rest_pose(child, true);
            }
        }
    }

    /// Makes the working transform the new rest pose.
    ///
    /// With `update_keyframes` every delta is re-expressed against the new rest pose, so each frame
    /// still produces the same local pose. Without it the deltas stay as they are and the whole
    /// animation moves along with the rest pose.
    pub fn write_rest_pose(&mut self, id: JointId, recursive: bool, update_keyframes: bool) {
        let joint = &mut self.joints[id.0];
        let old = joint.rest_pose;
        let new = joint.local;

        if update_keyframes {
            for delta in joint.keyframes.poses_mut() {
                *delta = old.compose(delta).difference(&new);
            }
        }
        joint.rest_pose = new;

        if recursive {
            for child in self.joints[id.0].children.clone() {
                self.write_rest_pose(child, true, update_keyframes);
            }
        }
    }

    ///////////////////////////////////////////////////////////////////////////////////////////////
    //// KEYFRAMES

    pub fn set_keyframe(&mut self, id: JointId, frame: Frame, delta: Pose) {
        self.joints[id.0].set_keyframe(frame, delta);
    }

    /// Removes the keyframe stored exactly at `frame`. Missing keyframes are ignored.
    pub fn remove_keyframe(&mut self, id: JointId, frame: Frame, recursive: bool) {
        self.joints[id.0].keyframes.remove(frame);
        if recursive {
            for child in self.joints[id.0].children.clone() {
                self.remove_keyframe(child, frame, true);
            }
        }
    }

    /// First and last keyframe id of the joint, or of its whole subtree with `include_children`.
    /// `None` when there is no keyframe at all.
    pub fn keyframe_range(&self, id: JointId, include_children: bool) -> Option<(Frame, Frame)> {
        let ids: Vec<JointId> = if include_children {
            self.layout(id).into_iter().map(|(j, _, _)| j).collect()
        } else {
            vec![id]
        };
        return ids
            .iter()
            .filter_map(|j| self.joints[j.0].keyframes.range())
            .reduce(|(first, last), (f, l)| (first.min(f), last.max(l)));
    }

    ///////////////////////////////////////////////////////////////////////////////////////////////
    //// BONE GEOMETRY

    /// Bone tip in the joint's local space: the average rest position of the children, or the end site
    /// of a leaf.
    pub fn tip(&self, id: JointId) -> Position {
        let joint = &self.joints[id.0];
        if joint.children.is_empty() {
            return joint.end_site;
        }
        let sum: Position = joint
            .children
            .iter()
            .map(|child| self.joints[child.0].rest_pose.position)
            .sum();
        return sum / joint.children.len() as f64;
    }

    pub fn length(&self, id: JointId) -> f64 {
        self.tip(id).magnitude()
    }

    /// Rotation that aligns +Y with the bone direction.
    pub fn bone_rotation(&self, id: JointId) -> Quaternion {
        rotation_between(Position::unit_y(), self.tip(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframes::Keyframes;
    use approx::assert_abs_diff_eq;
    use cgmath::{Deg, Rotation3};

    /// root -> spine -> (left, right)
    fn small_tree() -> (Hierarchy, [JointId; 4]) {
        let mut hierarchy = Hierarchy::new();
        let root = hierarchy.add_joint(Joint::new("Root"));
        let spine = hierarchy.add_child(
            root,
            Joint::new("Spine").with_rest_pose(Pose::from_position(Position::new(0.0, 2.0, 0.0))),
        );
        let left = hierarchy.add_child(
            spine,
            Joint::new("LeftArm").with_rest_pose(Pose::from_position(Position::new(1.0, 1.0, 0.0))),
        );
        let right = hierarchy.add_child(
            spine,
            Joint::new("RightArm")
                .with_rest_pose(Pose::from_position(Position::new(-1.0, 1.0, 0.0))),
        );
        return (hierarchy, [root, spine, left, right]);
    }

    #[test]
    fn layout_is_depth_first() {
        let (hierarchy, [root, spine, left, right]) = small_tree();
        assert_eq!(
            hierarchy.layout(root),
            vec![(root, 0, 0), (spine, 1, 1), (left, 2, 2), (right, 3, 2)]
        );
        assert_eq!(hierarchy.layout(spine)[0], (spine, 0, 0));
        assert_eq!(hierarchy.roots(), vec![root]);
        assert!(hierarchy.is_ancestor(root, right));
        assert!(!hierarchy.is_ancestor(left, right));
    }

    #[test]
    fn filters_by_name() {
        let (hierarchy, [root, _, left, right]) = small_tree();
        assert_eq!(hierarchy.filter(root, "arm", false, false), vec![left, right]);
        assert!(hierarchy.filter(root, "arm", false, true).is_empty());
        assert_eq!(hierarchy.filter(root, "leftarm", true, false), vec![left]);
        assert_eq!(hierarchy.filter_regex(root, "^Right").unwrap(), vec![right]);
        assert!(hierarchy.filter_regex(root, "(").is_err());
    }

    #[test]
    fn world_position_follows_parent_chain() {
        let (mut hierarchy, [root, spine, left, _]) = small_tree();
        hierarchy
            .joint_mut(root)
            .set_rotation(Quaternion::from_axis_angle(Position::unit_z(), Deg(90.0)));
        let position = hierarchy.position_world(left);
        // (1, 3, 0) rotated a quarter turn around z
        assert_abs_diff_eq!(position.x, -3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(position.y, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(hierarchy.rest_world_space(left).position().y, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(hierarchy.position_world(spine).x, -2.0, epsilon = 1e-12);
    }

    #[test]
    fn read_pose_composes_rest_and_delta() {
        let (mut hierarchy, [_, spine, _, _]) = small_tree();
        hierarchy.set_keyframe(spine, 0, Pose::from_position(Position::new(0.0, 0.0, 1.0)));
        hierarchy.set_keyframe(spine, 4, Pose::from_position(Position::new(0.0, 0.0, 3.0)));

        hierarchy.read_pose(spine, 1, false).unwrap();
        let local = hierarchy.joint(spine).position();
        assert_abs_diff_eq!(local.y, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(local.z, 1.5, epsilon = 1e-12);
        assert_eq!(hierarchy.joint(spine).current_frame(), Some(1));

        hierarchy.read_rest_pose(spine, false);
        assert_eq!(hierarchy.joint(spine).current_frame(), None);
        assert_abs_diff_eq!(hierarchy.joint(spine).position().z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn empty_keyframes_policy() {
        let (mut hierarchy, [root, _, _, _]) = small_tree();
        hierarchy.joint_mut(root).set_position(Position::new(5.0, 5.0, 5.0));
        hierarchy.read_pose(root, 3, true).unwrap();
        assert_eq!(hierarchy.joint(root).position(), Position::new(0.0, 0.0, 0.0));

        hierarchy.set_config(HierarchyConfig::new().with_empty_keyframes(EmptyKeyframes::Error));
        match hierarchy.read_pose(root, 3, true) {
            Err(BvhError::FrameOutOfRange { joint, frame }) => {
                assert_eq!(joint, "Root");
                assert_eq!(frame, 3);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn keyframe_range_over_subtree() {
        let (mut hierarchy, [root, spine, left, _]) = small_tree();
        assert_eq!(hierarchy.keyframe_range(root, true), None);
        hierarchy.set_keyframe(spine, 2, Pose::identity());
        hierarchy.joint_mut(left).keyframes =
            [(0, Pose::identity()), (9, Pose::identity())].into_iter().collect::<Keyframes>();
        assert_eq!(hierarchy.keyframe_range(root, false), None);
        assert_eq!(hierarchy.keyframe_range(spine, false), Some((2, 2)));
        assert_eq!(hierarchy.keyframe_range(root, true), Some((0, 9)));

        hierarchy.remove_keyframe(root, 9, true);
        assert_eq!(hierarchy.keyframe_range(root, true), Some((0, 2)));
    }

    #[test]
    fn write_rest_pose_without_update_keeps_deltas() {
        let (mut hierarchy, [_, spine, _, _]) = small_tree();
        let delta = Pose::from_position(Position::new(0.5, 0.0, 0.0));
        hierarchy.set_keyframe(spine, 0, delta);
        hierarchy
            .joint_mut(spine)
            .set_position(Position::new(0.0, 10.0, 0.0));
        hierarchy.write_rest_pose(spine, false, false);

        assert_eq!(hierarchy.joint(spine).keyframes().get(0), Some(delta));
        hierarchy.read_pose(spine, 0, false).unwrap();
        assert_abs_diff_eq!(hierarchy.joint(spine).position().y, 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(hierarchy.joint(spine).position().x, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn bone_geometry() {
        let (hierarchy, [_, spine, left, _]) = small_tree();
        // average of (1, 1, 0) and (-1, 1, 0)
        assert_eq!(hierarchy.tip(spine), Position::new(0.0, 1.0, 0.0));
        assert_abs_diff_eq!(hierarchy.length(spine), 1.0, epsilon = 1e-12);
        assert_eq!(hierarchy.tip(left), Position::new(0.0, 1.0, 0.0));
        let rotation = hierarchy.bone_rotation(spine);
        assert_abs_diff_eq!(rotation.s, 1.0, epsilon = 1e-12);
    }
}
