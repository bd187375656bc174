use crate::utils::RotationOrder;

/// What `read_pose` does for a joint that has no keyframes at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyKeyframes {
    /// Load the rest pose.
    #[default]
    RestPose,
    /// Fail with `BvhError::FrameOutOfRange`.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HierarchyConfig {
    pub empty_keyframes: EmptyKeyframes,
}

impl HierarchyConfig {
    pub fn new() -> Self {
        HierarchyConfig::default()
    }

    pub fn with_empty_keyframes(mut self, policy: EmptyKeyframes) -> Self {
        self.empty_keyframes = policy;
        self
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

/// Settings used when a hierarchy is turned back into BVH text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WriteOptions {
    /// Decimal places of every written number.
    pub precision: usize,
    /// Rotation channel order of joints that carry no remembered channel layout.
    pub rotation_order: RotationOrder,
    /// Joints whose position deltas stay below this get no position channels.
    pub position_epsilon: f64,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            precision: 6,
            rotation_order: RotationOrder::ZXY,
            position_epsilon: 1e-2,
        }
    }
}

impl WriteOptions {
    pub fn new() -> Self {
        WriteOptions::default()
    }

    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_rotation_order(mut self, order: RotationOrder) -> Self {
        self.rotation_order = order;
        self
    }

    pub fn with_position_epsilon(mut self, epsilon: f64) -> Self {
        self.position_epsilon = epsilon;
        self
    }
}
