//! Reading, editing and writing .bvh motion capture files.
//!
//! A file is parsed into [`BvhContainer`] (the text layout as is) and converted into a [`Hierarchy`]
//! of joints. Every joint has a rest pose and keyframes storing deltas against it, so poses can be
//! read, edited and written back per frame, and the skeleton can be restructured without breaking the
//! recorded animation.

pub mod bvh;
pub mod config;
pub mod convert;
pub mod editing;
pub mod error;
pub mod hierarchy;
pub mod joint;
pub mod keyframes;
pub mod parse;
pub mod pose;
pub mod transform;
pub mod types;
pub mod utils;
pub mod write;

pub use bvh::{BvhContainer, BvhJoint};
pub use config::{EmptyKeyframes, HierarchyConfig, WriteOptions};
pub use convert::{convert_bvh_to_hierarchy, convert_hierarchy_to_bvh, Skeleton};
pub use editing::Keep;
pub use error::{BvhError, Result};
pub use hierarchy::Hierarchy;
pub use joint::{Joint, JointId};
pub use keyframes::Keyframes;
pub use pose::Pose;
pub use transform::Space;
pub use utils::RotationOrder;

use std::path::Path;

/// Reads a .bvh file without converting it.
pub fn read_as_bvh(path: impl AsRef<Path>) -> Result<BvhContainer> {
    parse::load_bvh_from_file(path)
}

/// Reads a .bvh file as joint hierarchy with frame 0 loaded.
pub fn read_as_hierarchy(path: impl AsRef<Path>) -> Result<Skeleton> {
    let bvh = parse::load_bvh_from_file(path)?;
    convert_bvh_to_hierarchy(&bvh, HierarchyConfig::default())
}

/// Parses .bvh text as joint hierarchy with frame 0 loaded.
pub fn read_as_hierarchy_from_str(text: &str) -> Result<Skeleton> {
    let bvh = parse::load_bvh_from_string(text)?;
    convert_bvh_to_hierarchy(&bvh, HierarchyConfig::default())
}

/// Writes a skeleton and its keyframes as .bvh file.
pub fn write_hierarchy(
    path: impl AsRef<Path>,
    skeleton: &Skeleton,
    options: &WriteOptions,
) -> Result<()> {
    let bvh = convert_hierarchy_to_bvh(skeleton, options);
    write::write_bvh(path, &bvh, options.precision)
}
