//! Normalized media description types.

use crate::{TARGET_AUDIO_CODEC, TARGET_VIDEO_CODEC};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One audio stream as reported by the prober.
///
/// Streams are kept in prober order; the position in
/// [`MediaDescription::audio_streams`] (not [`AudioStream::index`]) is the
/// per-kind ordinal used for `:a:{n}` argument targeting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioStream {
    /// Container-level stream index.
    pub index: u32,
    /// Channel count (0 when unreported).
    pub channels: u32,
    /// Channel layout label, verbatim; empty means unknown.
    pub layout: String,
    /// Codec name, verbatim; empty means unknown.
    pub codec: String,
}

/// Normalized probe result for one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaDescription {
    /// Path to the probed file.
    pub path: PathBuf,
    /// Whether the file has at least one video stream.
    pub has_video: bool,
    /// True only if the file has video and every video stream is already AV1.
    pub all_video_av1: bool,
    /// Audio streams in prober order.
    pub audio_streams: Vec<AudioStream>,
    /// Number of subtitle streams.
    pub subtitle_streams: u32,
    /// Number of attachment streams.
    pub attachment_streams: u32,
    /// Color space of the first video stream reporting one.
    pub color_space: Option<String>,
    /// Color primaries of the first video stream reporting them.
    pub color_primaries: Option<String>,
    /// Transfer characteristics of the first video stream reporting them.
    pub color_transfer: Option<String>,
    /// Pixel format of the first video stream reporting one.
    pub pix_fmt: Option<String>,
}

impl MediaDescription {
    /// Whether the file already satisfies the target encoding and can be
    /// skipped: has video, every video stream is AV1, and every audio
    /// stream with a known codec is Opus. A file with no audio streams
    /// trivially satisfies the audio condition.
    ///
    /// The `--force` re-encode override is orchestrator policy, not part of
    /// this decision.
    pub fn is_compliant(&self) -> bool {
        if !self.has_video || !self.all_video_av1 {
            return false;
        }
        self.audio_streams
            .iter()
            .filter(|a| !a.codec.is_empty())
            .all(|a| a.codec == TARGET_AUDIO_CODEC)
    }

    /// Whether a video codec name matches the target codec.
    pub fn is_target_video_codec(codec: &str) -> bool {
        codec == TARGET_VIDEO_CODEC
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc() -> MediaDescription {
        MediaDescription {
            path: PathBuf::from("/media/movie.mkv"),
            has_video: true,
            all_video_av1: true,
            audio_streams: Vec::new(),
            subtitle_streams: 0,
            attachment_streams: 0,
            color_space: None,
            color_primaries: None,
            color_transfer: None,
            pix_fmt: None,
        }
    }

    fn audio(codec: &str) -> AudioStream {
        AudioStream {
            index: 1,
            channels: 2,
            layout: "stereo".to_string(),
            codec: codec.to_string(),
        }
    }

    #[test]
    fn test_no_video_is_never_compliant() {
        let mut d = desc();
        d.has_video = false;
        d.all_video_av1 = false;
        d.audio_streams = vec![audio("opus")];
        assert!(!d.is_compliant());
    }

    #[test]
    fn test_av1_plus_opus_is_compliant() {
        let mut d = desc();
        d.audio_streams = vec![audio("opus"), audio("opus")];
        assert!(d.is_compliant());
    }

    #[test]
    fn test_single_foreign_audio_breaks_compliance() {
        let mut d = desc();
        d.audio_streams = vec![audio("opus"), audio("ac3")];
        assert!(!d.is_compliant());
    }

    #[test]
    fn test_no_audio_is_compliant() {
        assert!(desc().is_compliant());
    }

    #[test]
    fn test_unknown_audio_codec_does_not_break_compliance() {
        let mut d = desc();
        d.audio_streams = vec![audio("")];
        assert!(d.is_compliant());
    }

    #[test]
    fn test_non_av1_video_is_not_compliant() {
        let mut d = desc();
        d.all_video_av1 = false;
        assert!(!d.is_compliant());
    }
}
