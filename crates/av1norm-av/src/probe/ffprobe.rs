//! FFprobe invocation and output normalization.

use super::types::{AudioStream, MediaDescription};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::process::Command;

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    #[serde(default)]
    index: u32,
    codec_type: Option<String>,
    codec_name: Option<String>,
    channels: Option<u32>,
    channel_layout: Option<String>,
    color_space: Option<String>,
    color_transfer: Option<String>,
    color_primaries: Option<String>,
    pix_fmt: Option<String>,
}

/// Probe a media file with ffprobe and normalize its stream layout.
///
/// Fails with [`Error::Probe`] when ffprobe is not invocable, exits
/// non-zero, or emits unparseable JSON. Callers treat this as a per-file
/// failure, never as fatal to the run.
pub fn inspect_with_ffprobe(ffprobe: &Path, path: &Path) -> Result<MediaDescription> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .output()
        .map_err(|e| Error::probe(path, format!("ffprobe not invocable: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        // Last stderr line is the interesting one; the rest is noise.
        let last = stderr.lines().next_back().unwrap_or("").trim();
        return Err(Error::probe(path, format!("ffprobe failed: {}", last)));
    }

    let parsed: FfprobeOutput = serde_json::from_slice(&output.stdout)
        .map_err(|e| Error::probe(path, format!("unparseable ffprobe output: {}", e)))?;

    Ok(normalize(path, parsed))
}

fn normalize(path: &Path, output: FfprobeOutput) -> MediaDescription {
    let mut desc = MediaDescription {
        path: path.to_path_buf(),
        has_video: false,
        all_video_av1: true,
        audio_streams: Vec::new(),
        subtitle_streams: 0,
        attachment_streams: 0,
        color_space: None,
        color_primaries: None,
        color_transfer: None,
        pix_fmt: None,
    };

    for stream in output.streams {
        match stream.codec_type.as_deref() {
            Some("video") => {
                desc.has_video = true;
                let codec = stream.codec_name.unwrap_or_default();
                if !MediaDescription::is_target_video_codec(&codec) {
                    desc.all_video_av1 = false;
                }
                // First video stream reporting a field wins.
                if desc.color_space.is_none() {
                    desc.color_space = stream.color_space;
                }
                if desc.color_primaries.is_none() {
                    desc.color_primaries = stream.color_primaries;
                }
                if desc.color_transfer.is_none() {
                    desc.color_transfer = stream.color_transfer;
                }
                if desc.pix_fmt.is_none() {
                    desc.pix_fmt = stream.pix_fmt;
                }
            }
            Some("audio") => {
                desc.audio_streams.push(AudioStream {
                    index: stream.index,
                    channels: stream.channels.unwrap_or(0),
                    layout: stream.channel_layout.unwrap_or_default(),
                    codec: stream.codec_name.unwrap_or_default(),
                });
            }
            Some("subtitle") => desc.subtitle_streams += 1,
            Some("attachment") => desc.attachment_streams += 1,
            _ => {}
        }
    }

    // A file with no video never counts as "compliant video".
    if !desc.has_video {
        desc.all_video_av1 = false;
    }

    desc
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(json: &str) -> MediaDescription {
        let output: FfprobeOutput = serde_json::from_str(json).unwrap();
        normalize(&PathBuf::from("/media/test.mkv"), output)
    }

    #[test]
    fn test_normalize_mixed_streams() {
        let desc = parse(
            r#"{
                "streams": [
                    {"index": 0, "codec_type": "video", "codec_name": "h264",
                     "pix_fmt": "yuv420p", "color_space": "bt709"},
                    {"index": 1, "codec_type": "audio", "codec_name": "ac3",
                     "channels": 6, "channel_layout": "5.1(side)"},
                    {"index": 2, "codec_type": "subtitle", "codec_name": "subrip"},
                    {"index": 3, "codec_type": "attachment"}
                ]
            }"#,
        );

        assert!(desc.has_video);
        assert!(!desc.all_video_av1);
        assert_eq!(desc.audio_streams.len(), 1);
        assert_eq!(desc.audio_streams[0].channels, 6);
        assert_eq!(desc.audio_streams[0].layout, "5.1(side)");
        assert_eq!(desc.audio_streams[0].codec, "ac3");
        assert_eq!(desc.subtitle_streams, 1);
        assert_eq!(desc.attachment_streams, 1);
        assert_eq!(desc.pix_fmt.as_deref(), Some("yuv420p"));
        assert_eq!(desc.color_space.as_deref(), Some("bt709"));
    }

    #[test]
    fn test_first_video_stream_wins_color_fields() {
        let desc = parse(
            r#"{
                "streams": [
                    {"index": 0, "codec_type": "video", "codec_name": "av1",
                     "color_primaries": "bt2020"},
                    {"index": 1, "codec_type": "video", "codec_name": "av1",
                     "color_primaries": "bt709", "pix_fmt": "yuv420p"}
                ]
            }"#,
        );

        // primaries set by the first stream; pix_fmt only reported by the
        // second, so it fills in there
        assert_eq!(desc.color_primaries.as_deref(), Some("bt2020"));
        assert_eq!(desc.pix_fmt.as_deref(), Some("yuv420p"));
        assert!(desc.all_video_av1);
    }

    #[test]
    fn test_any_non_av1_video_clears_flag() {
        let desc = parse(
            r#"{
                "streams": [
                    {"index": 0, "codec_type": "video", "codec_name": "av1"},
                    {"index": 1, "codec_type": "video", "codec_name": "mjpeg"}
                ]
            }"#,
        );
        assert!(!desc.all_video_av1);
    }

    #[test]
    fn test_audio_only_file() {
        let desc = parse(
            r#"{
                "streams": [
                    {"index": 0, "codec_type": "audio", "codec_name": "opus",
                     "channels": 2, "channel_layout": "stereo"}
                ]
            }"#,
        );
        assert!(!desc.has_video);
        assert!(!desc.all_video_av1);
        assert!(!desc.is_compliant());
    }

    #[test]
    fn test_absent_fields_tolerated() {
        let desc = parse(
            r#"{
                "streams": [
                    {"index": 0, "codec_type": "audio"}
                ]
            }"#,
        );
        assert_eq!(desc.audio_streams[0].channels, 0);
        assert_eq!(desc.audio_streams[0].layout, "");
        assert_eq!(desc.audio_streams[0].codec, "");
    }

    #[test]
    fn test_empty_output() {
        let desc = parse(r#"{}"#);
        assert!(!desc.has_video);
        assert!(desc.audio_streams.is_empty());
    }
}
