//! Batch orchestration.
//!
//! Walks the input tree and runs each eligible file through the
//! probe -> compliance -> plan -> encode/replace pipeline, strictly one
//! file at a time. No single file's failure aborts the run.

use av1norm_av::{
    build_plan, execute_plan, probe, EncodeSettings, EncoderCaps, ReplaceOptions, Toolset,
    MEDIA_EXTENSIONS,
};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Options for one batch run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Root folder to scan recursively.
    pub root: PathBuf,
    /// Extension whitelist; empty means the default media extensions.
    pub extensions: Vec<String>,
    /// Encode preferences passed through to plan building.
    pub settings: EncodeSettings,
    /// Only report planned actions.
    pub dry_run: bool,
    /// Write outputs beside the originals instead of replacing them.
    pub no_replace: bool,
    /// Re-encode files that are already compliant.
    pub force: bool,
    /// Alternate temp directory.
    pub temp_dir: Option<PathBuf>,
}

/// Per-file outcome of a run.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub ok: bool,
    pub message: String,
}

/// Aggregated outcome of a run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<FileReport>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.reports.iter().filter(|r| r.ok).count()
    }

    pub fn failed(&self) -> usize {
        self.reports.iter().filter(|r| !r.ok).count()
    }
}

/// Walk the tree under `opts.root` and process every eligible file.
pub fn run(tools: &Toolset, opts: &RunOptions) -> RunSummary {
    // One capability probe per run, threaded through plan building.
    let caps = EncoderCaps::discover(&tools.ffmpeg);
    let allowed = allowed_extensions(&opts.extensions);

    // Materialize the candidate list before processing so outputs written
    // during the run are never picked up as new inputs.
    let candidates: Vec<PathBuf> = WalkDir::new(&opts.root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_media_file(p, &allowed))
        .collect();

    let mut summary = RunSummary::default();
    for path in &candidates {
        let (ok, message) = process_file(tools, &caps, path, opts);
        if ok {
            tracing::info!("{}: {}", path.display(), message);
        } else {
            tracing::error!("{}: {}", path.display(), message);
        }
        summary.reports.push(FileReport {
            path: path.clone(),
            ok,
            message,
        });
    }
    summary
}

fn process_file(
    tools: &Toolset,
    caps: &EncoderCaps,
    path: &Path,
    opts: &RunOptions,
) -> (bool, String) {
    let desc = match probe::inspect(tools, path) {
        Ok(desc) => desc,
        Err(e) => return (false, e.to_string()),
    };

    if desc.is_compliant() && !opts.force {
        return (true, "skip (already AV1 + Opus)".to_string());
    }

    let plan = build_plan(&desc, caps, &opts.settings);
    for warning in &plan.warnings {
        tracing::warn!("{}: {}", path.display(), warning);
    }

    if opts.dry_run {
        return (true, format!("dry-run: ffmpeg {}", plan.args.join(" ")));
    }

    let replace_opts = ReplaceOptions {
        no_replace: opts.no_replace,
        temp_dir: opts.temp_dir.clone(),
    };
    match execute_plan(&tools.ffmpeg, &plan, path, &replace_opts) {
        Ok(out) if opts.no_replace => (true, format!("wrote {}", out.display())),
        Ok(out) => (true, format!("replaced {}", out.display())),
        Err(e) => (false, e.to_string()),
    }
}

fn allowed_extensions(user: &[String]) -> Vec<String> {
    if user.is_empty() {
        MEDIA_EXTENSIONS.iter().map(|e| e.to_string()).collect()
    } else {
        user.iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect()
    }
}

fn is_media_file(path: &Path, allowed: &[String]) -> bool {
    // In-flight temp files from this or a concurrent instance match the
    // whitelist by extension; skip them by their name marker.
    if path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.contains(".tmp."))
    {
        return false;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| allowed.iter().any(|a| a == &e))
}
