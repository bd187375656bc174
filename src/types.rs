use cgmath::{Quaternion as CgQuaternion, Vector3};
use std::fmt;
use std::str::FromStr;

/////////////////////////////////////////////////////////////////////////////////////////////////

pub type Index = usize;
pub type Depth = usize;
/// Frame id. Stored keyframes are always >= 0, negative ids are resolved relative to the last keyframe.
pub type Frame = i64;
pub type Quaternion = CgQuaternion<f64>;
pub type Position = Vector3<f64>;
pub type Scale = Vector3<f64>;

/////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn unit(self) -> Position {
        match self {
            Axis::X => Position::unit_x(),
            Axis::Y => Position::unit_y(),
            Axis::Z => Position::unit_z(),
        }
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

/// One animated degree of freedom declared by a `CHANNELS` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Xposition,
    Yposition,
    Zposition,
    Xrotation,
    Yrotation,
    Zrotation,
}

impl Channel {
    pub fn axis(self) -> Axis {
        match self {
            Channel::Xposition | Channel::Xrotation => Axis::X,
            Channel::Yposition | Channel::Yrotation => Axis::Y,
            Channel::Zposition | Channel::Zrotation => Axis::Z,
        }
    }

    pub fn is_position(self) -> bool {
        matches!(
            self,
            Channel::Xposition | Channel::Yposition | Channel::Zposition
        )
    }

    pub fn is_rotation(self) -> bool {
        !self.is_position()
    }

    pub fn position(axis: Axis) -> Channel {
        match axis {
            Axis::X => Channel::Xposition,
            Axis::Y => Channel::Yposition,
            Axis::Z => Channel::Zposition,
        }
    }

    pub fn rotation(axis: Axis) -> Channel {
        match axis {
            Axis::X => Channel::Xrotation,
            Axis::Y => Channel::Yrotation,
            Axis::Z => Channel::Zrotation,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Xposition => "Xposition",
            Channel::Yposition => "Yposition",
            Channel::Zposition => "Zposition",
            Channel::Xrotation => "Xrotation",
            Channel::Yrotation => "Yrotation",
            Channel::Zrotation => "Zrotation",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Xposition" => Ok(Channel::Xposition),
            "Yposition" => Ok(Channel::Yposition),
            "Zposition" => Ok(Channel::Zposition),
            "Xrotation" => Ok(Channel::Xrotation),
            "Yrotation" => Ok(Channel::Yrotation),
            "Zrotation" => Ok(Channel::Zrotation),
            _ => Err(format!("unknown channel label \"{}\"", s)),
        }
    }
}
