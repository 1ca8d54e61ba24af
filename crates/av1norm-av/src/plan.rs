//! Encode plan construction.
//!
//! Turns a [`MediaDescription`], the discovered [`EncoderCaps`] and user
//! preferences into a complete ffmpeg argument vector. Building a plan is a
//! pure function and never fails: unknown audio layouts degrade to a stereo
//! downmix instead of erroring, so every probed file resolves to some valid
//! plan.

use crate::capabilities::EncoderCaps;
use crate::probe::MediaDescription;
use std::path::{Path, PathBuf};

/// Constant-quality value used when neither `--cq` nor `--bitrate` is given.
pub const DEFAULT_QUALITY: u32 = 30;

/// 10-bit pixel format selected for wide-gamut (assumed HDR) sources.
const HDR_PIX_FMT: &str = "p010le";

/// 8-bit 4:2:0 fallback when the source reports no pixel format.
const DEFAULT_PIX_FMT: &str = "yuv420p";

/// Channel remap reordering side surrounds to back surrounds. Opus has no
/// native 5.1(side) mapping, so SL/SR become BL/BR.
const SIDE_TO_BACK_REMAP: &str = "channelmap=map=FL-FL|FR-FR|FC-FC|LFE-LFE|SL-BL|SR-BR";

/// User-supplied encode preferences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeSettings {
    /// Constant-quality value (`-cq`). Mutually exclusive with
    /// `video_bitrate`; the CLI layer clears the bitrate when this is set.
    pub quality: Option<u32>,
    /// Target average video bitrate, e.g. "3000k". Selects bitrate-bounded
    /// VBR when present.
    pub video_bitrate: Option<String>,
    /// Opus bitrate per audio stream, e.g. "128k".
    pub audio_bitrate: String,
    /// Extra arguments appended after the video options.
    pub extra_video_args: Vec<String>,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            quality: None,
            video_bitrate: None,
            audio_bitrate: "128k".to_string(),
            extra_video_args: Vec::new(),
        }
    }
}

/// Output containers known to carry Opus audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputContainer {
    /// Matroska container
    Mkv,
    /// WebM container
    Webm,
}

impl OutputContainer {
    /// Get the file extension for this container.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputContainer::Mkv => "mkv",
            OutputContainer::Webm => "webm",
        }
    }

    /// Resolve the output container for a source path: keep mkv/webm,
    /// otherwise force mkv for Opus support.
    pub fn for_source(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("mkv") => OutputContainer::Mkv,
            Some("webm") => OutputContainer::Webm,
            _ => OutputContainer::Mkv,
        }
    }
}

/// Opus channel-mapping decision for one audio stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMapping {
    /// Mono/stereo, mapping family 0.
    Native,
    /// Multichannel, mapping family 1; `remap` reorders side to back
    /// surrounds first.
    Surround { remap: bool },
    /// Mapping family 1 for a layout that is not standard for Opus; the
    /// plan carries a warning.
    SurroundNonStandard,
    /// Unrecognized layout: force a stereo downmix (family 0) with a
    /// warning rather than risk a mute track.
    Downmix,
}

/// Classify one audio stream's Opus channel mapping. First matching row of
/// the layout table wins; layouts are compared case-insensitively.
pub fn resolve_channel_mapping(channels: u32, layout: &str) -> ChannelMapping {
    if channels <= 2 {
        return ChannelMapping::Native;
    }
    let layout = layout.to_ascii_lowercase();
    match (channels, layout.as_str()) {
        (6, "5.1(side)") => ChannelMapping::Surround { remap: true },
        (6, "5.1" | "5.1(back)") => ChannelMapping::Surround { remap: false },
        (8, "7.1" | "7.1(wide)" | "7.1(wide-side)" | "7.1(rear)") => {
            ChannelMapping::Surround { remap: false }
        }
        (4, "quad" | "4.0") => ChannelMapping::Surround { remap: false },
        (3..=5 | 7, _) => ChannelMapping::SurroundNonStandard,
        _ => ChannelMapping::Downmix,
    }
}

/// A complete, deterministic encode plan for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodePlan {
    /// Ordered ffmpeg argument vector, input included. The output path is
    /// appended by the replacer, which owns temp-file placement.
    pub args: Vec<String>,
    /// Resolved output container.
    pub container: OutputContainer,
    /// Non-fatal per-stream warnings collected while planning.
    pub warnings: Vec<String>,
}

impl EncodePlan {
    /// In-place destination for a given original path: same path unless the
    /// container changed, in which case only the extension differs.
    pub fn destination_for(&self, original: &Path) -> PathBuf {
        original.with_extension(self.container.extension())
    }
}

/// Build the encode plan for one probed file.
///
/// Pure: identical `(desc, caps, settings)` always yield an identical
/// argument vector, which the unit tests rely on.
pub fn build_plan(
    desc: &MediaDescription,
    caps: &EncoderCaps,
    settings: &EncodeSettings,
) -> EncodePlan {
    let container = OutputContainer::for_source(&desc.path);
    let mut warnings = Vec::new();

    let mut args: Vec<String> = vec![
        "-hide_banner".into(),
        "-y".into(),
        "-nostdin".into(),
        "-i".into(),
        desc.path.to_string_lossy().into_owned(),
    ];

    // Global metadata and chapters carry over from the source.
    args.extend(["-map_metadata".into(), "0".into()]);
    args.extend(["-map_chapters".into(), "0".into()]);

    // Map every stream kind optionally, so files lacking one don't fail.
    for selector in ["0:v?", "0:a?", "0:s?", "0:t?"] {
        args.extend(["-map".into(), selector.into()]);
    }

    args.extend(["-c:v".into(), "av1_nvenc".into()]);

    // Slowest/highest-quality preset unless the user already set one.
    if !settings.extra_video_args.iter().any(|a| a == "-preset") {
        args.extend(["-preset".into(), "p7".into()]);
    }

    // Rate control: bitrate-bounded VBR when a target bitrate is given,
    // constant-quality VBR otherwise.
    if let Some(bitrate) = &settings.video_bitrate {
        args.extend([
            "-rc".into(),
            "vbr".into(),
            "-b:v".into(),
            bitrate.clone(),
            "-maxrate".into(),
            bitrate.clone(),
            "-b_ref_mode".into(),
            "middle".into(),
        ]);
    } else {
        let quality = settings.quality.unwrap_or(DEFAULT_QUALITY);
        args.extend([
            "-cq".into(),
            quality.to_string(),
            "-rc".into(),
            "vbr".into(),
            "-b_ref_mode".into(),
            "middle".into(),
        ]);
    }

    // Adaptive quantization, each gated independently on build support.
    if caps.supports("spatial_aq") {
        args.extend(["-spatial_aq".into(), "1".into()]);
    }
    if caps.supports("temporal_aq") {
        args.extend(["-temporal_aq".into(), "1".into()]);
    }

    args.extend(["-bf".into(), "3".into()]);
    args.extend(["-pix_fmt".into(), select_pix_fmt(desc)]);

    // Color metadata passthrough; absent fields stay absent.
    if let Some(primaries) = &desc.color_primaries {
        args.extend(["-color_primaries".into(), primaries.clone()]);
    }
    if let Some(transfer) = &desc.color_transfer {
        args.extend(["-color_trc".into(), transfer.clone()]);
    }
    if let Some(space) = &desc.color_space {
        args.extend(["-colorspace".into(), space.clone()]);
    }

    args.extend(settings.extra_video_args.iter().cloned());

    // All audio re-encodes to Opus; subtitles and attachments stream-copy.
    args.extend([
        "-c:a".into(),
        "libopus".into(),
        "-b:a".into(),
        settings.audio_bitrate.clone(),
        "-vbr".into(),
        "on".into(),
        "-application".into(),
        "audio".into(),
    ]);
    args.extend(["-c:s".into(), "copy".into()]);
    args.extend(["-c:t".into(), "copy".into()]);

    // Per-stream Opus channel mapping, targeted by audio ordinal.
    for (ordinal, stream) in desc.audio_streams.iter().enumerate() {
        match resolve_channel_mapping(stream.channels, &stream.layout) {
            ChannelMapping::Native => {
                args.extend([format!("-mapping_family:a:{}", ordinal), "0".into()]);
            }
            ChannelMapping::Surround { remap } => {
                args.extend([format!("-mapping_family:a:{}", ordinal), "1".into()]);
                if remap {
                    args.extend([format!("-filter:a:{}", ordinal), SIDE_TO_BACK_REMAP.into()]);
                }
            }
            ChannelMapping::SurroundNonStandard => {
                args.extend([format!("-mapping_family:a:{}", ordinal), "1".into()]);
                warnings.push(format!(
                    "audio stream {}: {}ch layout '{}' may not be Opus standard; check output",
                    ordinal, stream.channels, stream.layout
                ));
            }
            ChannelMapping::Downmix => {
                warnings.push(format!(
                    "audio stream {}: {}ch layout '{}' not recognized, downmixing to stereo",
                    ordinal, stream.channels, stream.layout
                ));
                args.extend([format!("-ac:a:{}", ordinal), "2".into()]);
                args.extend([format!("-mapping_family:a:{}", ordinal), "0".into()]);
            }
        }
    }

    EncodePlan {
        args,
        container,
        warnings,
    }
}

/// Select the output pixel format.
///
/// Best-effort HDR heuristic carried over from the original tool: bt2020
/// primaries or color space imply a wide-gamut (HDR10/HLG) source and get a
/// 10-bit format. This is deliberately not a certified HDR classifier;
/// borderline files follow the source's reported format.
fn select_pix_fmt(desc: &MediaDescription) -> String {
    let wide_gamut = desc
        .color_primaries
        .as_deref()
        .is_some_and(|p| p.starts_with("bt2020"))
        || desc
            .color_space
            .as_deref()
            .is_some_and(|c| c.starts_with("bt2020"));

    if wide_gamut {
        HDR_PIX_FMT.to_string()
    } else {
        desc.pix_fmt
            .clone()
            .unwrap_or_else(|| DEFAULT_PIX_FMT.to_string())
    }
}
