use crate::bvh::{BvhContainer, BvhJoint};
use crate::error::{BvhError, Result};
use crate::types::*;
use std::fmt::{self, Write as _};
use std::path::Path;
use tracing::debug;

/////////////////////////////////////////////////////////////////////////////////////////////////

/// Displays a container as .bvh text with `precision` decimal places.
pub struct BvhText<'a> {
    pub container: &'a BvhContainer,
    pub precision: usize,
}

impl fmt::Display for BvhText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = self.precision;
        let mut text = String::new();

        //// HIERARCHY
        text.push_str("HIERARCHY\n");
        __write_joint(&mut text, &self.container.root, 0, precision)?;

        //// MOTION
        text.push_str("MOTION\n");
        writeln!(text, "Frames: {}", self.container.frame_count)?;
        writeln!(text, "Frame Time: {}", self.container.frame_time)?;
        for row in self.container.motion.iter().take(self.container.frame_count) {
            let values: Vec<String> = row.iter().map(|v| __number(*v, precision)).collect();
            text.push_str(&values.join(" "));
            text.push('\n');
        }
        return f.write_str(&text);
    }
}

fn __write_joint(text: &mut String, joint: &BvhJoint, depth: Depth, precision: usize) -> fmt::Result {
    let indent = "\t".repeat(depth);
    let keyword = if depth == 0 { "ROOT" } else { "JOINT" };

    writeln!(text, "{}{} {}", indent, keyword, joint.name)?;
    writeln!(text, "{}{{", indent)?;
    writeln!(text, "{}\tOFFSET {}", indent, __vector(joint.offset, precision))?;
    let labels: Vec<&str> = joint.channels.iter().map(|c| c.as_str()).collect();
    if labels.is_empty() {
        writeln!(text, "{}\tCHANNELS 0", indent)?;
    } else {
        writeln!(text, "{}\tCHANNELS {} {}", indent, labels.len(), labels.join(" "))?;
    }

    if joint.children.is_empty() {
        writeln!(text, "{}\tEnd Site", indent)?;
        writeln!(text, "{}\t{{", indent)?;
        writeln!(text, "{}\t\tOFFSET {}", indent, __vector(joint.end_site, precision))?;
        writeln!(text, "{}\t}}", indent)?;
    }
    for child in joint.children.iter() {
        __write_joint(text, child, depth + 1, precision)?;
    }
    writeln!(text, "{}}}", indent)?;
    return Ok(());
}

fn __vector(v: Position, precision: usize) -> String {
    format!(
        "{} {} {}",
        __number(v.x, precision),
        __number(v.y, precision),
        __number(v.z, precision)
    )
}

/// Fixed point number without a sign on values that round to zero.
fn __number(value: f64, precision: usize) -> String {
    let text = format!("{:.*}", precision, value);
    if text.starts_with('-') && text[1..].chars().all(|c| c == '0' || c == '.') {
        return text[1..].to_string();
    }
    return text;
}

/////////////////////////////////////////////////////////////////////////////////////////////////

/// Rows of a container that is about to be written must match its frame count and channels.
fn __check_motion(container: &BvhContainer) -> Result<()> {
    let expected = container.channel_count();
    for frame in 0..container.frame_count {
        let found = container.motion.get(frame).map(Vec::len).unwrap_or(0);
        if found != expected {
            return Err(BvhError::MotionShape {
                frame,
                expected,
                found,
            });
        }
    }
    return Ok(());
}

/// .bvh text of a container, numbers rounded to `precision` decimal places.
pub fn serialize_bvh(container: &BvhContainer, precision: usize) -> Result<String> {
    __check_motion(container)?;
    return Ok(BvhText {
        container,
        precision,
    }
    .to_string());
}

/// Writes a container as .bvh file.
pub fn write_bvh(path: impl AsRef<Path>, container: &BvhContainer, precision: usize) -> Result<()> {
    let path = path.as_ref();
    let text = serialize_bvh(container, precision)?;
    std::fs::write(path, text).map_err(|source| BvhError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), frames = container.frame_count, "wrote bvh");
    return Ok(());
}
