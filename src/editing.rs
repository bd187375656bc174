//! Structural edits of a `Hierarchy`: reparenting, rolling and applying local transforms.
//!
//! Every edit keeps the world appearance of the affected joints where asked to, and can carry the rest
//! pose and the keyframes along so recorded animation keeps playing the same.

use crate::error::{BvhError, Result};
use crate::hierarchy::Hierarchy;
use crate::joint::JointId;
use crate::transform::Space;
use crate::types::*;
use cgmath::{Deg, ElementWise, One, Rotation, Rotation3, Zero};
use tracing::{trace, warn};

/// Which world space properties of a joint survive a reparent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Keep {
    pub position: bool,
    pub rotation: bool,
    pub scale: bool,
}

impl Keep {
    pub const ALL: Keep = Keep {
        position: true,
        rotation: true,
        scale: true,
    };
    pub const NONE: Keep = Keep {
        position: false,
        rotation: false,
        scale: false,
    };

    pub fn new(position: bool, rotation: bool, scale: bool) -> Self {
        Keep {
            position,
            rotation,
            scale,
        }
    }
}

fn __is_degenerate(scale: Scale) -> bool {
    scale.x.abs() <= f64::EPSILON || scale.y.abs() <= f64::EPSILON || scale.z.abs() <= f64::EPSILON
}

impl Hierarchy {
    ///////////////////////////////////////////////////////////////////////////////////////////////
    //// ATTACH / DETACH

    /// Makes `nodes` children of `parent`.
    ///
    /// All nodes are checked before anything changes: a node that is `parent` itself or one of its
    /// ancestors fails with `BvhError::Cycle`. A node that already is a direct child is left alone, a
    /// node attached elsewhere is detached first with the same flags.
    ///
    /// For every property set in `keep` the working transform is adjusted so the world value stays the
    /// same. With `update_rest_pose` the rest pose is moved into the parent's rest space as well and the
    /// keyframe positions follow, so the animation still plays in place.
    pub fn attach(
        &mut self,
        parent: JointId,
        nodes: &[JointId],
        keep: Keep,
        update_rest_pose: bool,
    ) -> Result<()> {
        for &node in nodes {
            if node == parent || self.is_ancestor(node, parent) {
                return Err(BvhError::Cycle {
                    parent: self.joints[parent.0].name.clone(),
                    child: self.joints[node.0].name.clone(),
                });
            }
        }

        for &node in nodes {
            match self.joints[node.0].parent {
                Some(current) if current == parent => continue,
                Some(current) => self.detach(current, &[node], keep, update_rest_pose),
                None => {}
            }

            let world = self.world_space(node);
            let parent_world = self.world_space(parent);
            let parent_rest = self.rest_world_space(parent);

            self.__link(parent, node);
            self.__localize(node, &world, &parent_world, keep);
            if update_rest_pose {
                self.__rest_into(node, &parent_rest, keep);
            }
            trace!(
                parent = %self.joints[parent.0].name,
                child = %self.joints[node.0].name,
                "attached joint"
            );
        }
        return Ok(());
    }

    /// Removes `nodes` from the children of `parent`; nodes that are not direct children are skipped.
    ///
    /// The old parent's world space is baked into the working transform per `keep`, and with
    /// `update_keyframes` its rest space into the rest pose and keyframe positions.
    pub fn detach(&mut self, parent: JointId, nodes: &[JointId], keep: Keep, update_keyframes: bool) {
        for &node in nodes {
            if self.joints[node.0].parent != Some(parent) {
                continue;
            }

            let world = self.world_space(node);
            let parent_rest = self.rest_world_space(parent);

            self.__unlink(parent, node);
            self.__globalize(node, &world, keep);
            if update_keyframes {
                self.__rest_out_of(node, &parent_rest, keep);
            }
            trace!(
                parent = %self.joints[parent.0].name,
                child = %self.joints[node.0].name,
                "detached joint"
            );
        }
    }

    /// Detaches the joint from its parent, if it has one.
    pub fn clear_parent(&mut self, id: JointId, keep: Keep, update_keyframes: bool) {
        if let Some(parent) = self.joints[id.0].parent {
            self.detach(parent, &[id], keep, update_keyframes);
        }
    }

    /// Detaches all children of the joint.
    pub fn clear_children(&mut self, id: JointId, keep: Keep, update_keyframes: bool) {
        let children = self.joints[id.0].children.clone();
        self.detach(id, &children, keep, update_keyframes);
    }

    /// Working transform relative to `parent_world` that shows the same world values as `world`.
    fn __localize(&mut self, node: JointId, world: &Space, parent_world: &Space, keep: Keep) {
        let joint = &mut self.joints[node.0];
        if keep.position {
            match parent_world.inverse_transform_point(world.position()) {
                Some(position) => joint.local.position = position,
                None => warn!(joint = %joint.name, "parent space is singular, position not kept"),
            }
        }
        if keep.rotation {
            joint.local.rotation = parent_world.rotation.invert() * world.rotation;
        }
        if keep.scale {
            if __is_degenerate(parent_world.scale) {
                warn!(joint = %joint.name, "parent scale is zero, scale not kept");
            } else {
                joint.local.scale = world.scale.div_element_wise(parent_world.scale);
            }
        }
    }

    /// Working transform of a joint that just lost its parent, set to its former world values.
    fn __globalize(&mut self, node: JointId, world: &Space, keep: Keep) {
        let joint = &mut self.joints[node.0];
        if keep.position {
            joint.local.position = world.position();
        }
        if keep.rotation {
            joint.local.rotation = world.rotation;
        }
        if keep.scale {
            joint.local.scale = world.scale;
        }
    }

    /// Re-expresses rest pose and keyframe positions inside `space` (the new parent's rest space).
    fn __rest_into(&mut self, node: JointId, space: &Space, keep: Keep) {
        let joint = &mut self.joints[node.0];
        if keep.position {
            match space.inverse_transform_point(joint.rest_pose.position) {
                Some(position) => {
                    joint.rest_pose.position = position;
                    for delta in joint.keyframes.poses_mut() {
                        if let Some(moved) = space.inverse_transform_vector(delta.position) {
                            delta.position = moved;
                        }
                    }
                }
                None => warn!(joint = %joint.name, "parent rest space is singular, rest position not kept"),
            }
        }
        if keep.rotation {
            joint.rest_pose.rotation = space.rotation.invert() * joint.rest_pose.rotation;
        }
        if keep.scale {
            if __is_degenerate(space.scale) {
                warn!(joint = %joint.name, "parent rest scale is zero, rest scale not kept");
            } else {
                joint.rest_pose.scale = joint.rest_pose.scale.div_element_wise(space.scale);
            }
        }
    }

    /// Bakes `space` (the old parent's rest space) into rest pose and keyframe positions.
    fn __rest_out_of(&mut self, node: JointId, space: &Space, keep: Keep) {
        let joint = &mut self.joints[node.0];
        if keep.position {
            joint.rest_pose.position = space.transform_point(joint.rest_pose.position);
            for delta in joint.keyframes.poses_mut() {
                delta.position = space.transform_vector(delta.position);
            }
        }
        if keep.rotation {
            joint.rest_pose.rotation = space.rotation * joint.rest_pose.rotation;
        }
        if keep.scale {
            joint.rest_pose.scale = joint.rest_pose.scale.mul_element_wise(space.scale);
        }
    }

    ///////////////////////////////////////////////////////////////////////////////////////////////
    //// ROTATIONS

    /// Rotates the joint around its own local Y axis while its direct children keep their world
    /// placement. Rest pose and keyframes are not touched, use `write_pose` to record the result.
    pub fn roll(&mut self, id: JointId, degrees: f64, recursive: bool) {
        let rotation = self.joints[id.0].local.rotation
            * Quaternion::from_axis_angle(Position::unit_y(), Deg(degrees));
        self.__rotate_keeping_children(id, rotation);
        trace!(joint = %self.joints[id.0].name, degrees, "rolled joint");

        if recursive {
            for child in self.joints[id.0].children.clone() {
                self.roll(child, degrees, true);
            }
        }
    }

    /// Sets the local rotation (identity for `None`) and pushes the change into the direct children so
    /// they keep their world placement. Rest pose and keyframes are not touched.
    pub fn apply_rotation(&mut self, id: JointId, rotation: Option<Quaternion>, recursive: bool) {
        self.__rotate_keeping_children(id, rotation.unwrap_or_else(Quaternion::one));
        trace!(joint = %self.joints[id.0].name, "applied rotation");

        if recursive {
            for child in self.joints[id.0].children.clone() {
                self.apply_rotation(child, rotation, true);
            }
        }
    }

    ///////////////////////////////////////////////////////////////////////////////////////////////
    //// POSITION / SCALE

    /// Sets the local position (origin for `None`). The direct children get the opposite offset, mapped
    /// into this joint's rotated and scaled space, so they keep their world position. Rest pose and
    /// keyframes are not touched.
    pub fn apply_position(&mut self, id: JointId, position: Option<Position>, recursive: bool) {
        let joint = &mut self.joints[id.0];
        let target = position.unwrap_or_else(Position::zero);
        let change = joint.local.position - target;
        let rotation = joint.local.rotation;
        let scale = joint.local.scale;
        joint.local.position = target;

        if __is_degenerate(scale) {
            warn!(joint = %joint.name, "joint scale is zero, child positions not compensated");
        } else {
            let offset = rotation.invert().rotate_vector(change).div_element_wise(scale);
            for child in self.joints[id.0].children.clone() {
                self.joints[child.0].local.position += offset;
            }
        }
        trace!(joint = %self.joints[id.0].name, "applied position");

        if recursive {
            for child in self.joints[id.0].children.clone() {
                self.apply_position(child, position, true);
            }
        }
    }

    /// Sets the local scale (one for `None`). The direct children's positions and scales absorb the
    /// ratio, so their world position stays and so does their world scale along axes the child shares
    /// with this joint. Rest pose and keyframes are not touched.
    pub fn apply_scale(&mut self, id: JointId, scale: Option<Scale>, recursive: bool) {
        let joint = &mut self.joints[id.0];
        let target = scale.unwrap_or_else(|| Scale::new(1.0, 1.0, 1.0));
        let old = joint.local.scale;
        joint.local.scale = target;

        if __is_degenerate(target) || __is_degenerate(old) {
            warn!(joint = %joint.name, "scale is zero, children not compensated");
        } else {
            let ratio = old.div_element_wise(target);
            for child in self.joints[id.0].children.clone() {
                let child = &mut self.joints[child.0];
                child.local.position = child.local.position.mul_element_wise(ratio);
                child.local.scale = child.local.scale.mul_element_wise(ratio);
            }
        }
        trace!(joint = %self.joints[id.0].name, "applied scale");

        if recursive {
            for child in self.joints[id.0].children.clone() {
                self.apply_scale(child, scale, true);
            }
        }
    }

    fn __rotate_keeping_children(&mut self, id: JointId, rotation: Quaternion) {
        let joint = &mut self.joints[id.0];
        let change = rotation.invert() * joint.local.rotation;
        let scale = joint.local.scale;
        joint.local.rotation = rotation;

        let degenerate = __is_degenerate(scale);
        if degenerate {
            warn!(joint = %joint.name, "joint scale is zero, child positions not compensated");
        }

        for child in self.joints[id.0].children.clone() {
            let child = &mut self.joints[child.0];
            if !degenerate {
                child.local.position =
                    (change * child.local.position.mul_element_wise(scale)).div_element_wise(scale);
            }
            child.local.rotation = change * child.local.rotation;
        }
    }
}
