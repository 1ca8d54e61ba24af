//! Media probing.
//!
//! Wraps ffprobe and normalizes its JSON into a [`MediaDescription`] that
//! the planner and compliance check consume.

mod ffprobe;
mod types;

pub use types::{AudioStream, MediaDescription};

use crate::tools::Toolset;
use crate::Result;
use std::path::Path;

/// Probe one file and return its normalized stream description.
pub fn inspect(tools: &Toolset, path: &Path) -> Result<MediaDescription> {
    ffprobe::inspect_with_ffprobe(&tools.ffprobe, path)
}
