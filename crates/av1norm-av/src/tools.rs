//! External tool resolution and availability checks.
//!
//! ffmpeg and ffprobe are located through a fixed chain: an explicit
//! directory (CLI flag), the `AV1NORM_FFMPEG_DIR` environment variable, a
//! bundled `ffmpeg/` directory next to the executable, and finally bare
//! names resolved through `PATH`.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Environment variable that may supply the ffmpeg/ffprobe directory.
pub const FFMPEG_DIR_ENV: &str = "AV1NORM_FFMPEG_DIR";

/// Resolved paths (or bare names) for the external tools.
#[derive(Debug, Clone)]
pub struct Toolset {
    /// Path to the ffmpeg executable, or a bare name for PATH lookup.
    pub ffmpeg: PathBuf,
    /// Path to the ffprobe executable, or a bare name for PATH lookup.
    pub ffprobe: PathBuf,
}

impl Toolset {
    /// Resolve the toolset, preferring an explicit directory over the
    /// environment, a bundled directory, and finally `PATH`.
    pub fn resolve(explicit: Option<&Path>) -> Self {
        if let Some(dir) = resolve_tool_dir(explicit) {
            return Self::in_dir(&dir);
        }
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }

    /// Build a toolset pointing into a specific directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            ffmpeg: dir.join(exe_name("ffmpeg")),
            ffprobe: dir.join(exe_name("ffprobe")),
        }
    }

    /// Check that ffprobe is invocable.
    pub fn have_ffprobe(&self) -> bool {
        run_silent(&self.ffprobe, &["-version"])
    }

    /// Check that this ffmpeg build exposes the av1_nvenc encoder.
    pub fn have_av1_nvenc(&self) -> bool {
        run_silent(&self.ffmpeg, &["-hide_banner", "-h", "encoder=av1_nvenc"])
    }
}

/// Information about an external tool, for the `check-tools` report.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// Version string if available.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
}

/// Check a tool's availability and capture its version line.
pub fn check_tool(bin: &Path, name: &str) -> ToolInfo {
    let result = Command::new(bin).arg("-version").output();

    match result {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(|s| s.to_string());

            let path = if bin.components().count() > 1 {
                Some(bin.to_path_buf())
            } else {
                which::which(name).ok()
            };

            ToolInfo {
                name: name.to_string(),
                available: true,
                version,
                path,
            }
        }
        _ => ToolInfo {
            name: name.to_string(),
            available: false,
            version: None,
            path: None,
        },
    }
}

/// Check both tools of a resolved toolset.
pub fn check_tools(tools: &Toolset) -> Vec<ToolInfo> {
    vec![
        check_tool(&tools.ffmpeg, "ffmpeg"),
        check_tool(&tools.ffprobe, "ffprobe"),
    ]
}

fn resolve_tool_dir(explicit: Option<&Path>) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(dir) = explicit {
        candidates.push(dir.to_path_buf());
    }
    if let Ok(dir) = std::env::var(FFMPEG_DIR_ENV) {
        if !dir.is_empty() {
            candidates.push(PathBuf::from(dir));
        }
    }
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.to_path_buf()))
    {
        candidates.push(exe_dir.join("ffmpeg"));
    }

    candidates.into_iter().find(|dir| {
        dir.join(exe_name("ffmpeg")).is_file() && dir.join(exe_name("ffprobe")).is_file()
    })
}

fn exe_name(base: &str) -> String {
    format!("{}{}", base, std::env::consts::EXE_SUFFIX)
}

fn run_silent(bin: &Path, args: &[&str]) -> bool {
    Command::new(bin)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_tool_not_found() {
        let info = check_tool(Path::new("nonexistent_tool_12345"), "nonexistent_tool_12345");
        assert!(!info.available);
        assert!(info.version.is_none());
        assert!(info.path.is_none());
    }

    #[test]
    fn test_resolve_falls_back_to_path_names() {
        let dir = tempfile::tempdir().unwrap();
        // Empty directory has no ffmpeg/ffprobe, so the explicit candidate
        // is rejected and bare names win.
        let tools = Toolset::resolve(Some(dir.path()));
        assert_eq!(tools.ffmpeg, PathBuf::from("ffmpeg"));
        assert_eq!(tools.ffprobe, PathBuf::from("ffprobe"));
    }

    #[test]
    fn test_resolve_prefers_explicit_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(exe_name("ffmpeg")), "").unwrap();
        std::fs::write(dir.path().join(exe_name("ffprobe")), "").unwrap();

        let tools = Toolset::resolve(Some(dir.path()));
        assert_eq!(tools.ffmpeg, dir.path().join(exe_name("ffmpeg")));
        assert_eq!(tools.ffprobe, dir.path().join(exe_name("ffprobe")));
    }
}
