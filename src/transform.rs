//! World space composition of local poses.
//!
//! A joint's world position is its local position mapped through the parent's world matrix, its world
//! rotation the product of all local rotations along the chain and its world scale the component-wise
//! product of all local scales.

use crate::pose::Pose;
use crate::types::{Position, Quaternion, Scale};
use cgmath::{ElementWise, Matrix3, Matrix4, One, SquareMatrix};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Space {
    pub matrix: Matrix4<f64>,
    pub rotation: Quaternion,
    pub scale: Scale,
}

impl Default for Space {
    fn default() -> Self {
        Space::identity()
    }
}

impl Space {
    pub fn identity() -> Self {
        Space {
            matrix: Matrix4::identity(),
            rotation: Quaternion::one(),
            scale: Scale::new(1.0, 1.0, 1.0),
        }
    }

    /// Space of a child placed at `local` inside this space.
    pub fn then(&self, local: &Pose) -> Space {
        Space {
            matrix: self.matrix * local.matrix(),
            rotation: self.rotation * local.rotation,
            scale: self.scale.mul_element_wise(local.scale),
        }
    }

    /// Origin of this space in world coordinates.
    pub fn position(&self) -> Position {
        self.matrix.w.truncate()
    }

    pub fn transform_point(&self, point: Position) -> Position {
        (self.matrix * point.extend(1.0)).truncate()
    }

    pub fn transform_vector(&self, vector: Position) -> Position {
        self.linear() * vector
    }

    /// Upper 3x3 block (rotation and scale, no translation).
    pub fn linear(&self) -> Matrix3<f64> {
        Matrix3::from_cols(
            self.matrix.x.truncate(),
            self.matrix.y.truncate(),
            self.matrix.z.truncate(),
        )
    }

    pub fn inverse_matrix(&self) -> Option<Matrix4<f64>> {
        self.matrix.invert()
    }

    /// Maps a world point into this space, `None` when the space is degenerate (zero scale).
    pub fn inverse_transform_point(&self, point: Position) -> Option<Position> {
        self.inverse_matrix()
            .map(|inverse| (inverse * point.extend(1.0)).truncate())
    }

    pub fn inverse_transform_vector(&self, vector: Position) -> Option<Position> {
        self.linear().invert().map(|inverse| inverse * vector)
    }
}
