//! Flat mirror of a .bvh file: the joint tree as written in the HIERARCHY block and the raw MOTION rows.

use crate::error::{BvhError, Result};
use crate::pose::Pose;
use crate::types::*;
use crate::utils::{self, RotationOrder};
use cgmath::{Deg, InnerSpace, One, Rotation3};

/////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq)]
pub struct BvhJoint {
    pub name: String,
    /// Position relative to the parent joint, without any parent rotation applied.
    pub offset: Position,
    /// Tip of a leaf bone (`End Site`). Unused for joints with children.
    pub end_site: Position,
    pub channels: Vec<Channel>,
    pub children: Vec<BvhJoint>,
}

impl BvhJoint {
    pub fn new(name: impl Into<String>, offset: Position) -> Self {
        BvhJoint {
            name: name.into(),
            offset,
            end_site: Position::new(0.0, 1.0, 0.0),
            channels: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Average offset of the children, or the end site of a leaf (+Y when the end site is degenerate).
    pub fn tip(&self) -> Position {
        let num_children = self.children.len();
        if num_children > 0 {
            return self
                .children
                .iter()
                .map(|child| child.offset)
                .sum::<Position>()
                / num_children as f64;
        }
        if self.end_site.magnitude() > 1e-3 {
            return self.end_site;
        }
        return Position::unit_y();
    }

    pub fn length(&self) -> f64 {
        self.tip().magnitude()
    }

    /// Minimal rotation that turns +Y into the bone direction.
    pub fn rotation(&self) -> Quaternion {
        utils::rotation_between(Position::unit_y(), self.tip())
    }

    /// Depth first enumeration as `(joint, index, depth)`.
    pub fn layout(&self) -> Vec<(&BvhJoint, Index, Depth)> {
        fn __layout<'a>(joint: &'a BvhJoint, depth: Depth, result: &mut Vec<(&'a BvhJoint, Index, Depth)>) {
            result.push((joint, result.len(), depth));
            for child in joint.children.iter() {
                __layout(child, depth + 1, result);
            }
        }
        let mut result = Vec::new();
        __layout(self, 0, &mut result);
        return result;
    }

    /// Number of channels of this joint and all its descendants.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
            + self
                .children
                .iter()
                .map(BvhJoint::channel_count)
                .sum::<usize>()
    }

    pub fn rotation_order(&self) -> RotationOrder {
        RotationOrder::from_channels(&self.channels)
    }

    /// Raw pose described by this joint's channel values.
    ///
    /// Position channels overwrite the matching component of the offset. Rotation channels are applied
    /// in the order they are declared, `R = R_first * R_second * R_third`.
    pub fn decode(&self, values: &[f64]) -> Pose {
        let mut position = self.offset;
        let mut rotation = Quaternion::one();
        for (channel, value) in self.channels.iter().zip(values.iter()) {
            if channel.is_position() {
                position[channel.axis().index()] = *value;
            } else {
                rotation = rotation * Quaternion::from_axis_angle(channel.axis().unit(), Deg(*value));
            }
        }
        return Pose::new(position, rotation, Scale::new(1.0, 1.0, 1.0));
    }

    /// Channel values of a raw pose, one per declared channel.
    pub fn encode(&self, raw: &Pose) -> Vec<f64> {
        let order = self.rotation_order();
        let axes = order.axes();
        let angles = utils::quat_to_euler(raw.rotation, order);
        return self
            .channels
            .iter()
            .map(|channel| {
                let axis = channel.axis();
                if channel.is_position() {
                    raw.position[axis.index()]
                } else {
                    let slot = axes.iter().position(|a| *a == axis).unwrap_or(0);
                    angles[slot]
                }
            })
            .collect();
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq)]
pub struct BvhContainer {
    pub root: BvhJoint,
    pub frame_count: usize,
    /// Seconds per frame.
    pub frame_time: f64,
    /// One row per frame, one value per channel in depth first joint order.
    pub motion: Vec<Vec<f64>>,
}

impl BvhContainer {
    pub fn new(root: BvhJoint, frame_time: f64) -> Self {
        BvhContainer {
            root,
            frame_count: 0,
            frame_time,
            motion: Vec::new(),
        }
    }

    pub fn fps(&self) -> f64 {
        if self.frame_time > 0.0 {
            1.0 / self.frame_time
        } else {
            0.0
        }
    }

    pub fn channel_count(&self) -> usize {
        self.root.channel_count()
    }

    /// Raw poses indexed as `[joint in layout order][frame]`.
    ///
    /// Fails with `BvhError::MotionShape` when a row does not match the declared channels or when there
    /// are fewer rows than `frame_count`.
    pub fn decode_motion(&self) -> Result<Vec<Vec<Pose>>> {
        let layout = self.root.layout();
        let expected = self.channel_count();
        let capacity = self.frame_count.min(self.motion.len());
        let mut poses: Vec<Vec<Pose>> = vec![Vec::with_capacity(capacity); layout.len()];

        for frame in 0..self.frame_count {
            let row = self.motion.get(frame).ok_or(BvhError::MotionShape {
                frame,
                expected,
                found: 0,
            })?;
            if row.len() != expected {
                return Err(BvhError::MotionShape {
                    frame,
                    expected,
                    found: row.len(),
                });
            }

            let mut index = 0;
            for (joint, i, _) in layout.iter() {
                let count = joint.channels.len();
                poses[*i].push(joint.decode(&row[index..index + count]));
                index += count;
            }
        }
        return Ok(poses);
    }
}
