use crate::pose::Pose;
use crate::types::Frame;

/// Delta poses of one joint, ordered by strictly increasing frame id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Keyframes {
    frames: Vec<(Frame, Pose)>,
}

impl Keyframes {
    pub fn new() -> Self {
        Keyframes { frames: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Copies of the stored `(frame, delta)` pairs in frame order.
    pub fn iter(&self) -> impl Iterator<Item = (Frame, Pose)> + '_ {
        self.frames.iter().copied()
    }

    pub fn first_frame(&self) -> Option<Frame> {
        self.frames.first().map(|(frame, _)| *frame)
    }

    pub fn last_frame(&self) -> Option<Frame> {
        self.frames.last().map(|(frame, _)| *frame)
    }

    /// `(first, last)` frame id, `None` when there are no keyframes.
    pub fn range(&self) -> Option<(Frame, Frame)> {
        Some((self.first_frame()?, self.last_frame()?))
    }

    /// Negative ids count from one past the last keyframe: `last + 1 - frame`, never below 0.
    /// With no keyframes `last` is taken as -1.
    pub fn resolve(&self, frame: Frame) -> Frame {
        if frame >= 0 {
            return frame;
        }
        let last = self.last_frame().unwrap_or(-1);
        (last + 1).saturating_sub(frame).max(0)
    }

    /// Delta stored exactly at `frame`.
    pub fn get(&self, frame: Frame) -> Option<Pose> {
        let frame = self.resolve(frame);
        self.frames
            .binary_search_by_key(&frame, |(f, _)| *f)
            .ok()
            .map(|i| self.frames[i].1)
    }

    /// Delta for any frame id.
    ///
    /// Frames past the last keyframe clamp to the last one, frames before the first clamp to the first one,
    /// frames between two keyframes are blended linearly. `None` when there are no keyframes.
    pub fn sample(&self, frame: Frame) -> Option<Pose> {
        let frame = self.resolve(frame);
        match self.frames.binary_search_by_key(&frame, |(f, _)| *f) {
            Ok(i) => Some(self.frames[i].1),
            Err(0) => self.frames.first().map(|(_, pose)| *pose),
            Err(i) if i == self.frames.len() => self.frames.last().map(|(_, pose)| *pose),
            Err(i) => {
                let (before, from) = self.frames[i - 1];
                let (after, to) = self.frames[i];
                let weight = (frame - before) as f64 / (after - before) as f64;
                Some(from.lerp(&to, weight))
            }
        }
    }

    /// Stores `pose` at `frame`, replacing an existing keyframe with the same id.
    pub fn insert(&mut self, frame: Frame, pose: Pose) {
        let frame = self.resolve(frame);
        match self.frames.binary_search_by_key(&frame, |(f, _)| *f) {
            Ok(i) => self.frames[i].1 = pose,
            Err(i) => self.frames.insert(i, (frame, pose)),
        }
    }

    /// Removes the keyframe stored exactly at `frame`, if there is one.
    pub fn remove(&mut self, frame: Frame) -> Option<Pose> {
        let frame = self.resolve(frame);
        self.frames
            .binary_search_by_key(&frame, |(f, _)| *f)
            .ok()
            .map(|i| self.frames.remove(i).1)
    }

    pub(crate) fn poses_mut(&mut self) -> impl Iterator<Item = &mut Pose> + '_ {
        self.frames.iter_mut().map(|(_, pose)| pose)
    }
}

impl FromIterator<(Frame, Pose)> for Keyframes {
    fn from_iter<I: IntoIterator<Item = (Frame, Pose)>>(iter: I) -> Self {
        let mut keyframes = Keyframes::new();
        for (frame, pose) in iter {
            keyframes.insert(frame, pose);
        }
        keyframes
    }
}
