use crate::types::{Position, Quaternion, Scale};
use crate::utils::nlerp;
use cgmath::{ElementWise, Matrix4, One, Rotation, VectorSpace, Zero};

/// Local position, rotation and scale of a joint.
///
/// Used for the working transform, the rest pose and the keyframe deltas. It is `Copy`, so storing or
/// reading a pose never shares state with the joint it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Position,
    pub rotation: Quaternion,
    pub scale: Scale,
}

impl Default for Pose {
    fn default() -> Self {
        Pose::identity()
    }
}

impl Pose {
    pub fn new(position: Position, rotation: Quaternion, scale: Scale) -> Self {
        Pose {
            position,
            rotation,
            scale,
        }
    }

    pub fn identity() -> Self {
        Pose {
            position: Position::zero(),
            rotation: Quaternion::one(),
            scale: Scale::new(1.0, 1.0, 1.0),
        }
    }

    pub fn from_position(position: Position) -> Self {
        Pose {
            position,
            ..Pose::identity()
        }
    }

    pub fn from_rotation(rotation: Quaternion) -> Self {
        Pose {
            rotation,
            ..Pose::identity()
        }
    }

    /// Animated pose of a joint whose rest pose is `self` and whose keyframe is `delta`.
    pub fn compose(&self, delta: &Pose) -> Pose {
        Pose {
            position: self.position + delta.position,
            rotation: self.rotation * delta.rotation,
            scale: self.scale.mul_element_wise(delta.scale),
        }
    }

    /// Keyframe delta that turns `rest` into `self`, i.e. `rest.compose(&self.difference(rest)) == self`.
    pub fn difference(&self, rest: &Pose) -> Pose {
        Pose {
            position: self.position - rest.position,
            rotation: rest.rotation.invert() * self.rotation,
            scale: self.scale.div_element_wise(rest.scale),
        }
    }

    /// Rest pose that turns `delta` into `self`, i.e. `self.without(delta).compose(delta) == self`.
    pub fn without(&self, delta: &Pose) -> Pose {
        Pose {
            position: self.position - delta.position,
            rotation: self.rotation * delta.rotation.invert(),
            scale: self.scale.div_element_wise(delta.scale),
        }
    }

    /// Linear blend, rotation along the shorter arc.
    pub fn lerp(&self, other: &Pose, t: f64) -> Pose {
        Pose {
            position: self.position.lerp(other.position, t),
            rotation: nlerp(self.rotation, other.rotation, t),
            scale: self.scale.lerp(other.scale, t),
        }
    }

    /// Local matrix, translation * rotation * scale.
    pub fn matrix(&self) -> Matrix4<f64> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}
