use crate::keyframes::Keyframes;
use crate::pose::Pose;
use crate::types::{Channel, Frame, Position, Quaternion, Scale};

/// Index of a joint inside its `Hierarchy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointId(pub(crate) usize);

impl JointId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Node of the joint hierarchy.
///
/// `local` is the working transform that world queries are computed from. `rest_pose` and `keyframes`
/// are the animation data: the pose of a frame is `rest_pose` composed with the keyframe delta.
/// Parent and children links are only changed through the owning `Hierarchy`.
#[derive(Debug, Clone)]
pub struct Joint {
    pub name: String,
    pub(crate) local: Pose,
    pub(crate) rest_pose: Pose,
    pub(crate) keyframes: Keyframes,
    pub(crate) current_frame: Option<Frame>,
    pub(crate) parent: Option<JointId>,
    pub(crate) children: Vec<JointId>,
    /// Bone tip of a leaf joint, in the joint's own local space.
    pub end_site: Position,
    /// Channel layout this joint was loaded with.
    pub channels: Option<Vec<Channel>>,
}

impl Joint {
    pub fn new(name: impl Into<String>) -> Self {
        Joint {
            name: name.into(),
            local: Pose::identity(),
            rest_pose: Pose::identity(),
            keyframes: Keyframes::new(),
            current_frame: None,
            parent: None,
            children: Vec::new(),
            end_site: Position::new(0.0, 1.0, 0.0),
            channels: None,
        }
    }

    /// Sets the rest pose and loads it into the working transform.
    pub fn with_rest_pose(mut self, rest_pose: Pose) -> Self {
        self.rest_pose = rest_pose;
        self.local = rest_pose;
        self
    }

    pub fn with_keyframes(mut self, keyframes: Keyframes) -> Self {
        self.keyframes = keyframes;
        self
    }

    pub fn with_end_site(mut self, end_site: Position) -> Self {
        self.end_site = end_site;
        self
    }

    pub fn with_channels(mut self, channels: Vec<Channel>) -> Self {
        self.channels = Some(channels);
        self
    }

    //// WORKING TRANSFORM

    pub fn local(&self) -> Pose {
        self.local
    }

    pub fn set_local(&mut self, pose: Pose) {
        self.local = pose;
    }

    pub fn position(&self) -> Position {
        self.local.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.local.position = position;
    }

    pub fn rotation(&self) -> Quaternion {
        self.local.rotation
    }

    pub fn set_rotation(&mut self, rotation: Quaternion) {
        self.local.rotation = rotation;
    }

    pub fn scale(&self) -> Scale {
        self.local.scale
    }

    pub fn set_scale(&mut self, scale: Scale) {
        self.local.scale = scale;
    }

    //// ANIMATION DATA

    pub fn rest_pose(&self) -> Pose {
        self.rest_pose
    }

    pub fn keyframes(&self) -> &Keyframes {
        &self.keyframes
    }

    /// Stores a delta pose at `frame`, overwriting any keyframe already there.
    pub fn set_keyframe(&mut self, frame: Frame, delta: Pose) {
        self.keyframes.insert(frame, delta);
    }

    /// Frame the working transform was last loaded from, `None` after loading the rest pose.
    pub fn current_frame(&self) -> Option<Frame> {
        self.current_frame
    }

    pub fn parent(&self) -> Option<JointId> {
        self.parent
    }

    pub fn children(&self) -> &[JointId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
