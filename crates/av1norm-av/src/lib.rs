//! # av1norm-av
//!
//! Media probing, encode planning and transactional replacement for the
//! av1norm batch normalizer.
//!
//! This crate provides functionality for:
//! - Probing media files with ffprobe and normalizing their stream layout
//! - Deciding whether a file already satisfies the AV1 + Opus target
//! - Building deterministic `av1_nvenc`/`libopus` encode plans, including
//!   per-stream Opus channel mapping and the HDR pixel-format heuristic
//! - Discovering which optional encoder options the installed ffmpeg
//!   build supports
//! - Executing a plan into a temp file and atomically swapping it over the
//!   original with backup-based rollback
//!
//! ## Example
//!
//! ```no_run
//! use av1norm_av::{probe, EncodeSettings, EncoderCaps, Toolset};
//!
//! let tools = Toolset::resolve(None);
//! let desc = probe::inspect(&tools, "/media/movie.mp4".as_ref())?;
//! if !desc.is_compliant() {
//!     let caps = EncoderCaps::discover(&tools.ffmpeg);
//!     let plan = av1norm_av::build_plan(&desc, &caps, &EncodeSettings::default());
//!     println!("ffmpeg {}", plan.args.join(" "));
//! }
//! # Ok::<(), av1norm_av::Error>(())
//! ```

mod capabilities;
mod error;
pub mod plan;
pub mod probe;
pub mod replace;
pub mod tools;

// Re-exports
pub use capabilities::EncoderCaps;
pub use error::{Error, Result};
pub use plan::{
    build_plan, resolve_channel_mapping, ChannelMapping, EncodePlan, EncodeSettings,
    OutputContainer, DEFAULT_QUALITY,
};
pub use probe::{AudioStream, MediaDescription};
pub use replace::{execute_plan, ReplaceOptions, ReplaceTransaction};
pub use tools::{check_tool, check_tools, ToolInfo, Toolset, FFMPEG_DIR_ENV};

/// Video codec every file is normalized toward.
pub const TARGET_VIDEO_CODEC: &str = "av1";

/// Audio codec every audio stream is normalized toward.
pub const TARGET_AUDIO_CODEC: &str = "opus";

/// Default extension whitelist for tree scanning.
pub const MEDIA_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov", "avi", "m4v", "ts", "m2ts", "webm"];
