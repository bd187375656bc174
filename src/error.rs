//! Error type shared by the format layer and the joint hierarchy.

use std::path::PathBuf;

use crate::types::Frame;

pub type Result<T> = std::result::Result<T, BvhError>;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum BvhError {
    /// The file could not be read or written.
    #[error("cannot access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed or unexpected content in a .bvh file.
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// A motion row does not match the channels declared by the hierarchy.
    #[error("motion frame {frame} has {found} values, the hierarchy declares {expected} channels")]
    MotionShape {
        frame: usize,
        expected: usize,
        found: usize,
    },

    /// Pose requested from a joint without keyframes while the hierarchy is configured to refuse it.
    #[error("frame {frame} of joint \"{joint}\" is out of range (no keyframes)")]
    FrameOutOfRange { joint: String, frame: Frame },

    /// Attaching would make a joint its own ancestor.
    #[error("joint \"{child}\" cannot be attached to \"{parent}\": it is the joint itself or one of its ancestors")]
    Cycle { parent: String, child: String },

    #[error("invalid name pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl BvhError {
    pub(crate) fn syntax(line: usize, column: usize, message: impl Into<String>) -> Self {
        BvhError::Syntax {
            line,
            column,
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            BvhError::Io { .. } => "io",
            BvhError::Syntax { .. } | BvhError::MotionShape { .. } => "format",
            BvhError::FrameOutOfRange { .. } => "range",
            BvhError::Cycle { .. } => "structure",
            BvhError::Pattern(_) => "pattern",
        }
    }
}
