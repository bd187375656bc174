use crate::bvh::{BvhContainer, BvhJoint};
use crate::error::{BvhError, Result};
use crate::types::*;
use regex::Regex;
use std::path::Path;
use std::str::Lines;
use tracing::{debug, warn};

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// One non-empty line split into tokens, each token with its 1-based column.
struct Line<'a> {
    number: usize,
    text: &'a str,
    tokens: Vec<(usize, &'a str)>,
}

impl<'a> Line<'a> {
    fn keyword(&self) -> &'a str {
        self.tokens.first().map(|(_, token)| *token).unwrap_or("")
    }

    fn column(&self, token: usize) -> usize {
        self.tokens.get(token).map(|(column, _)| *column).unwrap_or(1)
    }

    fn error(&self, token: usize, message: impl Into<String>) -> BvhError {
        BvhError::syntax(self.number, self.column(token), message)
    }
}

/// Hands out the non-empty lines of a .bvh text while counting line numbers.
struct LineReader<'a> {
    lines: Lines<'a>,
    number: usize,
}

impl<'a> LineReader<'a> {
    fn new(text: &'a str) -> Self {
        LineReader {
            lines: text.lines(),
            number: 0,
        }
    }

    fn next_line(&mut self) -> Option<Line<'a>> {
        for text in self.lines.by_ref() {
            self.number += 1;
            let tokens: Vec<(usize, &str)> = text
                .split_whitespace()
                .map(|token| (token.as_ptr() as usize - text.as_ptr() as usize + 1, token))
                .collect();
            if !tokens.is_empty() {
                return Some(Line {
                    number: self.number,
                    text: text.trim(),
                    tokens,
                });
            }
        }
        return None;
    }

    /// Next non-empty line, end of input is an error.
    fn expect_line(&mut self, what: &str) -> Result<Line<'a>> {
        let number = self.number + 1;
        return self.next_line().ok_or_else(|| {
            BvhError::syntax(number, 1, format!("unexpected end of file, expected {}", what))
        });
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

struct Patterns {
    joint: Regex,
    frames: Regex,
    frame_time: Regex,
}

impl Patterns {
    fn new() -> Result<Self> {
        return Ok(Patterns {
            joint: Regex::new(r"^(ROOT|JOINT)\s+(.+)$")?,
            frames: Regex::new(r"^Frames:\s*(\S+)$")?,
            frame_time: Regex::new(r"^Frame\s+Time:\s*(\S+)$")?,
        });
    }
}

fn __parse_number<T: std::str::FromStr>(line: &Line, token: usize, what: &str) -> Result<T> {
    let text = line.tokens.get(token).map(|(_, t)| *t).unwrap_or("");
    return text
        .parse::<T>()
        .map_err(|_| line.error(token, format!("{} must be numeric, found \"{}\"", what, text)));
}

/// Parses the first capture group of `pattern`. `None` when the line does not match at all.
fn __parse_capture<T: std::str::FromStr>(line: &Line, pattern: &Regex, what: &str) -> Option<Result<T>> {
    let value = pattern.captures(line.text)?.get(1)?;
    let column = line.column(0) + value.start();
    return Some(value.as_str().parse::<T>().map_err(|_| {
        BvhError::syntax(
            line.number,
            column,
            format!("{} must be numeric, found \"{}\"", what, value.as_str()),
        )
    }));
}

fn __parse_offset(reader: &mut LineReader) -> Result<Position> {
    let line = reader.expect_line("OFFSET")?;
    if line.keyword() != "OFFSET" {
        return Err(line.error(0, format!("expected OFFSET, found \"{}\"", line.keyword())));
    }
    if line.tokens.len() != 4 {
        return Err(line.error(0, "OFFSET must be a 3-part tuple"));
    }
    return Ok(Position::new(
        __parse_number(&line, 1, "OFFSET")?,
        __parse_number(&line, 2, "OFFSET")?,
        __parse_number(&line, 3, "OFFSET")?,
    ));
}

fn __parse_channels(reader: &mut LineReader) -> Result<Vec<Channel>> {
    let line = reader.expect_line("CHANNELS")?;
    if line.keyword() != "CHANNELS" {
        return Err(line.error(0, format!("expected CHANNELS, found \"{}\"", line.keyword())));
    }
    if line.tokens.len() < 2 {
        return Err(line.error(0, "CHANNELS must declare a channel count"));
    }
    let count: usize = __parse_number(&line, 1, "channel count")?;
    if count != line.tokens.len() - 2 {
        return Err(line.error(
            1,
            format!(
                "channel count {} does not match the {} given labels",
                count,
                line.tokens.len() - 2
            ),
        ));
    }
    let mut channels = Vec::with_capacity(count);
    for i in 2..line.tokens.len() {
        let channel = line.tokens[i]
            .1
            .parse::<Channel>()
            .map_err(|message| line.error(i, message))?;
        channels.push(channel);
    }
    return Ok(channels);
}

fn __expect_open(reader: &mut LineReader, what: &str) -> Result<()> {
    let line = reader.expect_line("{")?;
    if line.text != "{" {
        return Err(line.error(0, format!("{} must start with an opening bracket", what)));
    }
    return Ok(());
}

fn __parse_end_site(reader: &mut LineReader) -> Result<Position> {
    __expect_open(reader, "End Site")?;
    let end_site = __parse_offset(reader)?;
    let line = reader.expect_line("}")?;
    if line.text != "}" {
        return Err(line.error(0, "End Site must end with a closing bracket"));
    }
    return Ok(end_site);
}

/// Parses a joint block after its ROOT/JOINT header line.
fn __parse_joint(reader: &mut LineReader, patterns: &Patterns, name: &str) -> Result<BvhJoint> {
    __expect_open(reader, "joint definition")?;

    let mut joint = BvhJoint::new(name, __parse_offset(reader)?);
    joint.channels = __parse_channels(reader)?;

    loop {
        let line = reader.expect_line("JOINT, End Site or }")?;
        match line.keyword() {
            "JOINT" => {
                let name = __joint_name(&line, patterns)?;
                let child = __parse_joint(reader, patterns, &name)?;
                joint.children.push(child);
            }
            "End" => joint.end_site = __parse_end_site(reader)?,
            "}" if line.tokens.len() == 1 => break,
            _ => {
                return Err(line.error(
                    0,
                    "joint definition must continue with a child joint, an end site or a closing bracket",
                ))
            }
        }
    }
    return Ok(joint);
}

fn __joint_name(line: &Line, patterns: &Patterns) -> Result<String> {
    return patterns
        .joint
        .captures(line.text)
        .and_then(|captures| captures.get(2))
        .map(|name| name.as_str().trim().to_string())
        .ok_or_else(|| line.error(0, "joint header must be \"ROOT <name>\" or \"JOINT <name>\""));
}

fn parse_bvh(text: &str) -> Result<BvhContainer> {
    let patterns = Patterns::new()?;
    let mut reader = LineReader::new(text);

    //// HIERARCHY
    let line = reader.expect_line("HIERARCHY")?;
    if line.text != "HIERARCHY" {
        return Err(line.error(0, "first line must be only \"HIERARCHY\""));
    }

    let line = reader.expect_line("ROOT")?;
    if line.keyword() != "ROOT" {
        return Err(line.error(0, "first joint must be defined as \"ROOT\""));
    }
    let name = __joint_name(&line, &patterns)?;
    let root = __parse_joint(&mut reader, &patterns, &name)?;

    //// MOTION header
    let line = reader.expect_line("MOTION")?;
    if line.text != "MOTION" {
        return Err(line.error(0, "hierarchy must be followed by \"MOTION\""));
    }

    let line = reader.expect_line("Frames:")?;
    let frame_count: usize = __parse_capture(&line, &patterns.frames, "frame count")
        .ok_or_else(|| line.error(0, "first line of MOTION must be \"Frames: <count>\""))??;

    let line = reader.expect_line("Frame Time:")?;
    let frame_time: f64 = __parse_capture(&line, &patterns.frame_time, "frame time")
        .ok_or_else(|| line.error(0, "frame count must be followed by \"Frame Time: <seconds>\""))??;

    //// MOTION rows
    let channel_count = root.channel_count();
    let mut motion: Vec<Vec<f64>> = Vec::new();
    while motion.len() < frame_count {
        let Some(line) = reader.next_line() else {
            return Err(BvhError::syntax(
                reader.number + 1,
                1,
                format!("expected {} frames, found {}", frame_count, motion.len()),
            ));
        };
        if line.tokens.len() != channel_count {
            return Err(line.error(
                0,
                format!(
                    "frame has {} values, the hierarchy declares {} channels",
                    line.tokens.len(),
                    channel_count
                ),
            ));
        }
        let row = (0..line.tokens.len())
            .map(|i| __parse_number::<f64>(&line, i, "motion value"))
            .collect::<Result<Vec<f64>>>()?;
        motion.push(row);
    }

    let mut extra = 0;
    while reader.next_line().is_some() {
        extra += 1;
    }
    if extra > 0 {
        warn!(extra, frame_count, "ignoring motion rows beyond the declared frame count");
    }

    debug!(
        root = %root.name,
        joints = root.layout().len(),
        channels = channel_count,
        frames = frame_count,
        "parsed bvh"
    );

    return Ok(BvhContainer {
        root,
        frame_count,
        frame_time,
        motion,
    });
}

//////////////////////////////////////////////////////////////// PUBLIC ///////////////////////////////////////////////////////////////////

/// load a bvh file from a file path
pub fn load_bvh_from_file(file_path: impl AsRef<Path>) -> Result<BvhContainer> {
    let path = file_path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| BvhError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    return parse_bvh(&contents);
}

/// load a bvh file from a string
pub fn load_bvh_from_string(bvh_string: &str) -> Result<BvhContainer> {
    return parse_bvh(bvh_string);
}
