//! Encoder capability discovery.
//!
//! Different ffmpeg builds expose different `av1_nvenc` options. The set of
//! supported option names is read once per run from the encoder help text
//! and passed explicitly into plan building; optional features gate on it
//! and degrade silently when absent.

use std::collections::BTreeSet;
use std::path::Path;
use std::process::Command;

/// Option names exposed by the installed `av1_nvenc` build.
///
/// Immutable once discovered. An empty set means "nothing optional is
/// supported", which every consumer must treat as valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncoderCaps {
    options: BTreeSet<String>,
}

impl EncoderCaps {
    /// Discover supported encoder options by parsing
    /// `ffmpeg -hide_banner -h encoder=av1_nvenc`.
    ///
    /// Never fails: if ffmpeg cannot be invoked or prints nothing usable,
    /// the returned set is empty and capability-gated options are skipped.
    pub fn discover(ffmpeg: &Path) -> Self {
        let output = Command::new(ffmpeg)
            .args(["-hide_banner", "-h", "encoder=av1_nvenc"])
            .output();

        match output {
            Ok(out) => {
                let mut text = String::from_utf8_lossy(&out.stdout).into_owned();
                text.push('\n');
                text.push_str(&String::from_utf8_lossy(&out.stderr));
                let caps = Self::parse_help(&text);
                tracing::debug!("discovered {} av1_nvenc options", caps.options.len());
                caps
            }
            Err(e) => {
                tracing::warn!("could not query av1_nvenc options: {}", e);
                Self::default()
            }
        }
    }

    /// Build a capability set from explicit option names.
    pub fn from_options<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the encoder build exposes the given option.
    pub fn supports(&self, option: &str) -> bool {
        self.options.contains(option)
    }

    /// Parse option names out of encoder help text.
    ///
    /// Option lines look like `  -spatial_aq  <boolean> ...`. Lines starting
    /// with a double dash denote a different option class and are ignored.
    /// Hyphens inside names are normalized to underscores.
    fn parse_help(text: &str) -> Self {
        let mut options = BTreeSet::new();
        for line in text.lines() {
            let s = line.trim_start();
            if !s.starts_with('-') || s.starts_with("--") {
                continue;
            }
            let name = s
                .split_whitespace()
                .next()
                .unwrap_or("")
                .trim_start_matches('-')
                .replace('-', "_");
            if !name.is_empty() {
                options.insert(name);
            }
        }
        Self { options }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HELP: &str = "\
Encoder av1_nvenc [NVIDIA NVENC av1 encoder]:
    General capabilities: dr1 delay hardware
    Supported pixel formats: yuv420p nv12 p010le cuda
av1_nvenc AVOptions:
  -preset            <int>        E..V....... Set the encoding preset (from 0 to 18) (default p4)
  -tune              <int>        E..V....... Set the encoding tuning info (from 1 to 4) (default hq)
  -rc                <int>        E..V....... Override the preset rate-control (from -1 to INT_MAX) (default -1)
  -spatial-aq        <boolean>    E..V....... set spatial AQ (default false)
  -temporal_aq       <boolean>    E..V....... set temporal AQ (default false)
  --ignored          <flags>      E..V....... not a real option class
  -b_ref_mode        <int>        E..V....... Use B frames as references (from -1 to 2) (default -1)
";

    #[test]
    fn test_parse_help_extracts_single_dash_options() {
        let caps = EncoderCaps::parse_help(SAMPLE_HELP);
        assert!(caps.supports("preset"));
        assert!(caps.supports("rc"));
        assert!(caps.supports("b_ref_mode"));
    }

    #[test]
    fn test_parse_help_normalizes_hyphens() {
        let caps = EncoderCaps::parse_help(SAMPLE_HELP);
        // -spatial-aq appears hyphenated in some builds
        assert!(caps.supports("spatial_aq"));
        assert!(caps.supports("temporal_aq"));
    }

    #[test]
    fn test_parse_help_skips_double_dash_lines() {
        let caps = EncoderCaps::parse_help(SAMPLE_HELP);
        assert!(!caps.supports("ignored"));
    }

    #[test]
    fn test_parse_help_ignores_prose() {
        let caps = EncoderCaps::parse_help(SAMPLE_HELP);
        assert!(!caps.supports("General"));
        assert!(!caps.supports("Encoder"));
    }

    #[test]
    fn test_discover_missing_tool_yields_empty_set() {
        let caps = EncoderCaps::discover(Path::new("nonexistent_ffmpeg_12345"));
        assert_eq!(caps, EncoderCaps::default());
        assert!(!caps.supports("spatial_aq"));
    }
}
