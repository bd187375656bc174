//! Conversion between the flat .bvh structures and the joint hierarchy.
//!
//! BVH offsets and channel rotations carry no bone orientation. When loading, every joint gets the
//! rotation that aligns +Y with its bone as rest rotation, child offsets and keyframe deltas are
//! re-expressed relative to it. Saving undoes this using the rest poses of the hierarchy.

use crate::bvh::{BvhContainer, BvhJoint};
use crate::config::{HierarchyConfig, WriteOptions};
use crate::error::Result;
use crate::hierarchy::Hierarchy;
use crate::joint::{Joint, JointId};
use crate::keyframes::Keyframes;
use crate::pose::Pose;
use crate::transform::Space;
use crate::types::*;
use crate::utils::RotationOrder;
use cgmath::{InnerSpace, One, Rotation};
use tracing::debug;

/// A loaded hierarchy together with the timing of its animation.
#[derive(Debug, Clone)]
pub struct Skeleton {
    pub hierarchy: Hierarchy,
    pub root: JointId,
    pub frame_count: usize,
    /// Seconds per frame.
    pub frame_time: f64,
}

impl Skeleton {
    pub fn fps(&self) -> f64 {
        if self.frame_time > 0.0 {
            1.0 / self.frame_time
        } else {
            0.0
        }
    }

    /// `(joint, index, depth)` of every joint below the root.
    pub fn layout(&self) -> Vec<(JointId, Index, Depth)> {
        self.hierarchy.layout(self.root)
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

/// Builds the joint hierarchy of a parsed .bvh file and loads frame 0 (the rest pose without frames).
pub fn convert_bvh_to_hierarchy(bvh: &BvhContainer, config: HierarchyConfig) -> Result<Skeleton> {
    let raw = bvh.decode_motion()?;
    let mut hierarchy = Hierarchy::with_config(config);
    let mut index = 0;
    let root = __to_joint(
        &mut hierarchy,
        None,
        &bvh.root,
        Quaternion::one(),
        &raw,
        &mut index,
    );

    if bvh.frame_count > 0 {
        hierarchy.read_pose(root, 0, true)?;
    } else {
        hierarchy.read_rest_pose(root, true);
    }

    debug!(
        joints = hierarchy.len(),
        frames = bvh.frame_count,
        "converted bvh to hierarchy"
    );
    return Ok(Skeleton {
        hierarchy,
        root,
        frame_count: bvh.frame_count,
        frame_time: bvh.frame_time,
    });
}

fn __to_joint(
    hierarchy: &mut Hierarchy,
    parent: Option<JointId>,
    bvh_joint: &BvhJoint,
    parent_bone: Quaternion,
    raw: &[Vec<Pose>],
    index: &mut Index,
) -> JointId {
    let frames = &raw[*index];
    *index += 1;

    let unit = Scale::new(1.0, 1.0, 1.0);
    let bone = bvh_joint.rotation();
    let bone_inverse = bone.invert();
    let parent_inverse = parent_bone.invert();

    //// rest pose and deltas without the parent's bone rotation
    let rest = Pose::new(parent_inverse * bvh_joint.offset, parent_inverse * bone, unit);
    let keyframes: Keyframes = frames
        .iter()
        .enumerate()
        .map(|(frame, channel_pose)| {
            let delta = Pose::new(
                parent_inverse * (channel_pose.position - bvh_joint.offset),
                bone_inverse * channel_pose.rotation * bone,
                unit,
            );
            (frame as Frame, delta)
        })
        .collect();

    let joint = Joint::new(bvh_joint.name.clone())
        .with_rest_pose(rest)
        .with_keyframes(keyframes)
        .with_end_site(bone_inverse * bvh_joint.end_site)
        .with_channels(bvh_joint.channels.clone());
    let id = match parent {
        Some(parent) => hierarchy.add_child(parent, joint),
        None => hierarchy.add_joint(joint),
    };

    for child in bvh_joint.children.iter() {
        __to_joint(hierarchy, Some(id), child, bone, raw, index);
    }
    return id;
}

/////////////////////////////////////////////////////////////////////////////////////////////////

/// Turns a skeleton back into .bvh structures, sampling frames `0..frame_count`.
///
/// Joints keep the channel layout they were loaded with. Joints without one get the rotation channels
/// of `options.rotation_order`. Position channels are added when a frame moves the joint further than
/// `options.position_epsilon` away from its offset. Scale cannot be expressed in .bvh and is dropped.
pub fn convert_hierarchy_to_bvh(skeleton: &Skeleton, options: &WriteOptions) -> BvhContainer {
    let mut columns: Vec<Vec<Vec<f64>>> = Vec::new();
    let root = __to_bvh_joint(
        &skeleton.hierarchy,
        skeleton.root,
        &Space::identity(),
        skeleton.frame_count,
        options,
        &mut columns,
    );

    let motion: Vec<Vec<f64>> = (0..skeleton.frame_count)
        .map(|frame| {
            columns
                .iter()
                .flat_map(|joint| joint[frame].iter().copied())
                .collect()
        })
        .collect();

    debug!(
        joints = columns.len(),
        frames = skeleton.frame_count,
        "converted hierarchy to bvh"
    );
    return BvhContainer {
        root,
        frame_count: skeleton.frame_count,
        frame_time: skeleton.frame_time,
        motion,
    };
}

/// `columns` receives the channel values `[frame][channel]` of each joint in depth first order.
fn __to_bvh_joint(
    hierarchy: &Hierarchy,
    id: JointId,
    parent_rest: &Space,
    frame_count: usize,
    options: &WriteOptions,
    columns: &mut Vec<Vec<Vec<f64>>>,
) -> BvhJoint {
    let joint = hierarchy.joint(id);
    let rest = joint.rest_pose();
    let parent_linear = parent_rest.linear();
    let space = parent_rest.then(&rest);
    let offset = parent_linear * rest.position;

    //// raw channel poses in the parent's unrotated frame
    let raws: Vec<Pose> = (0..frame_count)
        .map(|frame| {
            let delta = joint.keyframes().sample(frame as Frame).unwrap_or_default();
            Pose::new(
                parent_linear * (rest.position + delta.position),
                space.rotation * delta.rotation * space.rotation.invert(),
                Scale::new(1.0, 1.0, 1.0),
            )
        })
        .collect();
    let moved = raws
        .iter()
        .any(|raw| (raw.position - offset).magnitude() > options.position_epsilon);

    let mut bvh_joint = BvhJoint::new(joint.name.clone(), offset);
    bvh_joint.channels = __channels(joint.channels.as_deref(), moved, options.rotation_order);
    if joint.is_leaf() {
        bvh_joint.end_site = space.linear() * joint.end_site;
    }
    columns.push(raws.iter().map(|raw| bvh_joint.encode(raw)).collect());

    for child in joint.children() {
        let child = __to_bvh_joint(hierarchy, *child, &space, frame_count, options, columns);
        bvh_joint.children.push(child);
    }
    return bvh_joint;
}

/// Channel list of a saved joint: the remembered layout, with position channels put in front when the
/// joint moves but the layout has none.
fn __channels(remembered: Option<&[Channel]>, moved: bool, order: RotationOrder) -> Vec<Channel> {
    let position = [Axis::X, Axis::Y, Axis::Z].map(Channel::position);
    let mut channels: Vec<Channel> = match remembered {
        Some(layout) => layout.to_vec(),
        None => order.channels().to_vec(),
    };
    if moved && !channels.iter().any(|c| c.is_position()) {
        channels = position.into_iter().chain(channels).collect();
    }
    return channels;
}
