use crate::types::{Axis, Channel, Position, Quaternion};
use cgmath::{Deg, InnerSpace, One, Rotation3};
use std::fmt;
use std::str::FromStr;

/////////////////////////////////////////////////////////////////////////////////////////////////

/// Order in which euler angles are applied, `R = R_first * R_second * R_third`.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RotationOrder {
    XYZ,
    XZY,
    YXZ,
    YZX,
    #[default]
    ZXY,
    ZYX,
}

impl RotationOrder {
    pub fn axes(self) -> [Axis; 3] {
        match self {
            RotationOrder::XYZ => [Axis::X, Axis::Y, Axis::Z],
            RotationOrder::XZY => [Axis::X, Axis::Z, Axis::Y],
            RotationOrder::YXZ => [Axis::Y, Axis::X, Axis::Z],
            RotationOrder::YZX => [Axis::Y, Axis::Z, Axis::X],
            RotationOrder::ZXY => [Axis::Z, Axis::X, Axis::Y],
            RotationOrder::ZYX => [Axis::Z, Axis::Y, Axis::X],
        }
    }

    pub fn from_axes(axes: [Axis; 3]) -> Option<RotationOrder> {
        [
            RotationOrder::XYZ,
            RotationOrder::XZY,
            RotationOrder::YXZ,
            RotationOrder::YZX,
            RotationOrder::ZXY,
            RotationOrder::ZYX,
        ]
        .into_iter()
        .find(|order| order.axes() == axes)
    }

    /// Rotation order declared by a channel list. Axes missing from the list are appended in X, Y, Z order.
    pub fn from_channels(channels: &[Channel]) -> RotationOrder {
        let mut axes: Vec<Axis> = Vec::with_capacity(3);
        for channel in channels.iter().filter(|c| c.is_rotation()) {
            if !axes.contains(&channel.axis()) {
                axes.push(channel.axis());
            }
        }
        for axis in [Axis::X, Axis::Y, Axis::Z] {
            if !axes.contains(&axis) {
                axes.push(axis);
            }
        }
        RotationOrder::from_axes([axes[0], axes[1], axes[2]]).unwrap_or_default()
    }

    pub fn channels(self) -> [Channel; 3] {
        self.axes().map(Channel::rotation)
    }
}

impl fmt::Display for RotationOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: String = self
            .axes()
            .iter()
            .map(|axis| match axis {
                Axis::X => 'X',
                Axis::Y => 'Y',
                Axis::Z => 'Z',
            })
            .collect();
        f.write_str(&name)
    }
}

impl FromStr for RotationOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "XYZ" => Ok(RotationOrder::XYZ),
            "XZY" => Ok(RotationOrder::XZY),
            "YXZ" => Ok(RotationOrder::YXZ),
            "YZX" => Ok(RotationOrder::YZX),
            "ZXY" => Ok(RotationOrder::ZXY),
            "ZYX" => Ok(RotationOrder::ZYX),
            _ => Err(format!("invalid euler angles order \"{}\"", s)),
        }
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

/// Convert euler angles in DEGREES (given in the order's axis sequence) to quaternion
pub fn euler_to_quat(angles: [f64; 3], order: RotationOrder) -> Quaternion {
    let axes = order.axes();
    axes.iter()
        .zip(angles.iter())
        .fold(Quaternion::one(), |acc, (axis, angle)| {
            acc * Quaternion::from_axis_angle(axis.unit(), Deg(*angle))
        })
}

/// Convert a quaternion to euler angles in DEGREES, returned in the order's axis sequence.
/// The middle angle lies in [-90, 90], the outer ones in (-180, 180].
pub fn quat_to_euler(rotation: Quaternion, order: RotationOrder) -> [f64; 3] {
    let m = __rotation_matrix(rotation);
    let [i, j, k] = order.axes().map(Axis::index);

    // cyclic orders (XYZ, YZX, ZXY) keep the sign, the others flip it
    let sign = if (j + 3 - i) % 3 == 1 { 1.0 } else { -1.0 };

    let middle = (sign * m[i][k]).clamp(-1.0, 1.0).asin();
    let first = (-sign * m[j][k]).atan2(m[k][k]);
    let last = (-sign * m[i][j]).atan2(m[i][i]);

    [first.to_degrees(), middle.to_degrees(), last.to_degrees()]
}

/// Row-major rotation matrix of a (normalized) quaternion.
fn __rotation_matrix(rotation: Quaternion) -> [[f64; 3]; 3] {
    let q = rotation.normalize();
    let (w, x, y, z) = (q.s, q.v.x, q.v.y, q.v.z);
    [
        [
            1.0 - 2.0 * (y * y + z * z),
            2.0 * (x * y - w * z),
            2.0 * (x * z + w * y),
        ],
        [
            2.0 * (x * y + w * z),
            1.0 - 2.0 * (x * x + z * z),
            2.0 * (y * z - w * x),
        ],
        [
            2.0 * (x * z - w * y),
            2.0 * (y * z + w * x),
            1.0 - 2.0 * (x * x + y * y),
        ],
    ]
}

/////////////////////////////////////////////////////////////////////////////////////////////////

/// Minimal-arc rotation that maps `axis` onto the direction of `target`.
///
/// Nearly parallel vectors give the identity, nearly opposite ones a half turn around an axis
/// perpendicular to `axis` (Z for the +Y bone axis). A zero target gives the identity.
pub fn rotation_between(axis: Position, target: Position) -> Quaternion {
    if target.magnitude2() <= f64::EPSILON {
        return Quaternion::one();
    }
    let axis = axis.normalize();
    let dir = target.normalize();
    let dot = axis.dot(dir);

    if dot > 0.9999 {
        Quaternion::one()
    } else if dot < -0.9999 {
        let candidate = if axis.z.abs() < 0.9 {
            Position::unit_z()
        } else {
            Position::unit_x()
        };
        let perpendicular = (candidate - axis * axis.dot(candidate)).normalize();
        Quaternion::from_axis_angle(perpendicular, Deg(180.0))
    } else {
        Quaternion::from_axis_angle(axis.cross(dir).normalize(), cgmath::Rad(dot.acos()))
    }
}

/// Normalized linear interpolation along the shorter arc.
pub fn nlerp(from: Quaternion, to: Quaternion, t: f64) -> Quaternion {
    let to = if from.dot(to) < 0.0 { -to } else { to };
    (from * (1.0 - t) + to * t).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_quat_eq(a: Quaternion, b: Quaternion, epsilon: f64) {
        let deviation = (a.s - b.s).abs()
            + (a.v.x - b.v.x).abs()
            + (a.v.y - b.v.y).abs()
            + (a.v.z - b.v.z).abs();
        assert!(deviation < epsilon, "{:?} != {:?}", a, b);
    }

    #[test]
    fn euler_zxy_matches_reference() {
        // Hips rotation of the first frame of the bundled example file
        let q = euler_to_quat([-3.41, 14.78, -164.35], RotationOrder::ZXY);
        assert_quat_eq(
            q,
            Quaternion::new(0.131166, -0.0117277, -0.982546, -0.131386),
            1e-5,
        );
    }

    #[test]
    fn euler_round_trip_for_every_order() {
        let samples = [
            [10.0, 20.0, 30.0],
            [-170.0, 45.0, 95.0],
            [0.0, -89.0, 179.0],
            [123.4, 5.6, -78.9],
        ];
        for order in [
            RotationOrder::XYZ,
            RotationOrder::XZY,
            RotationOrder::YXZ,
            RotationOrder::YZX,
            RotationOrder::ZXY,
            RotationOrder::ZYX,
        ] {
            for angles in samples {
                let back = quat_to_euler(euler_to_quat(angles, order), order);
                for (a, b) in angles.iter().zip(back.iter()) {
                    assert_abs_diff_eq!(*a, *b, epsilon = 1e-9);
                }
            }
        }
    }

    #[test]
    fn rotation_order_from_partial_channels() {
        let order = RotationOrder::from_channels(&[Channel::Xposition, Channel::Zrotation]);
        assert_eq!(order, RotationOrder::ZXY);
        let order = RotationOrder::from_channels(&[
            Channel::Yrotation,
            Channel::Xrotation,
            Channel::Zrotation,
        ]);
        assert_eq!(order, RotationOrder::YXZ);
        assert_eq!("zyx".parse::<RotationOrder>().unwrap(), RotationOrder::ZYX);
        assert_eq!(RotationOrder::YZX.to_string(), "YZX");
    }

    #[test]
    fn rotation_between_singular_cases() {
        let up = Position::unit_y();
        assert_quat_eq(rotation_between(up, up * 3.0), Quaternion::one(), 1e-12);
        assert_quat_eq(
            rotation_between(up, -up),
            Quaternion::new(0.0, 0.0, 0.0, 1.0),
            1e-12,
        );
        assert_quat_eq(rotation_between(up, Position::new(0.0, 0.0, 0.0)), Quaternion::one(), 1e-12);

        let q = rotation_between(up, Position::new(5.54, 0.0, 0.0));
        let s = std::f64::consts::FRAC_1_SQRT_2;
        assert_quat_eq(q, Quaternion::new(s, 0.0, 0.0, -s), 1e-9);
    }

    #[test]
    fn nlerp_takes_shorter_arc() {
        let a = Quaternion::one();
        let b = -Quaternion::from_axis_angle(Position::unit_y(), Deg(90.0));
        let mid = nlerp(a, b, 0.5);
        assert_quat_eq(
            mid,
            Quaternion::from_axis_angle(Position::unit_y(), Deg(45.0)),
            1e-9,
        );
    }
}
