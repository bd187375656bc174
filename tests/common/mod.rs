#![allow(dead_code)]

use bvh_hierarchy::types::{Position, Quaternion, Scale};
use bvh_hierarchy::{read_as_hierarchy, JointId, Skeleton};
use cgmath::{InnerSpace, Rotation3, Rad};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

pub const EXAMPLE: &str = "./tests/data/example.bvh";

pub fn load_example() -> Skeleton {
    read_as_hierarchy(EXAMPLE).unwrap()
}

pub fn joint_ids(skeleton: &Skeleton) -> Vec<JointId> {
    skeleton.layout().into_iter().map(|(id, _, _)| id).collect()
}

pub fn deviation_position(a: Position, b: Position) -> f64 {
    (a - b).x.abs() + (a - b).y.abs() + (a - b).z.abs()
}

/// q and -q are the same rotation.
pub fn deviation_quaternion(a: Quaternion, b: Quaternion) -> f64 {
    let l1 = |q: Quaternion| q.s.abs() + q.v.x.abs() + q.v.y.abs() + q.v.z.abs();
    l1(a - b).min(l1(a + b))
}

pub fn deviation_scale(a: Scale, b: Scale) -> f64 {
    deviation_position(a, b)
}

/// World position, rotation and scale of every joint in insertion order, which survives reparenting.
pub fn world_pose(skeleton: &Skeleton) -> Vec<(Position, Quaternion, Scale)> {
    skeleton
        .hierarchy
        .ids()
        .map(|id| {
            let space = skeleton.hierarchy.world_space(id);
            (space.position(), space.rotation, space.scale)
        })
        .collect()
}

pub fn assert_same_world_pose(
    expected: &[(Position, Quaternion, Scale)],
    found: &[(Position, Quaternion, Scale)],
    tolerance: f64,
) {
    assert_eq!(expected.len(), found.len());
    for (i, (e, f)) in expected.iter().zip(found.iter()).enumerate() {
        assert!(
            deviation_position(e.0, f.0) < tolerance,
            "position of joint {}: {:?} != {:?}",
            i,
            e.0,
            f.0
        );
        assert!(
            deviation_quaternion(e.1, f.1) < tolerance,
            "rotation of joint {}: {:?} != {:?}",
            i,
            e.1,
            f.1
        );
        assert!(
            deviation_scale(e.2, f.2) < tolerance,
            "scale of joint {}: {:?} != {:?}",
            i,
            e.2,
            f.2
        );
    }
}

/// Seeded generator, tests stay deterministic.
pub struct Random(Pcg64);

impl Random {
    pub fn new(seed: u64) -> Self {
        Random(Pcg64::seed_from_u64(seed))
    }

    /// Uniform in [0, 1).
    pub fn next(&mut self) -> f64 {
        self.0.random::<f64>()
    }

    pub fn position(&mut self) -> Position {
        Position::new(self.next(), self.next(), self.next()) * 2.0 - Position::new(1.0, 1.0, 1.0)
    }

    pub fn rotation(&mut self) -> Quaternion {
        let mut axis = self.position();
        if axis.magnitude2() < 1e-6 {
            axis = Position::unit_y();
        }
        Quaternion::from_axis_angle(axis.normalize(), Rad(self.next() * std::f64::consts::TAU))
    }
}
