//! Transactional file replacement.
//!
//! Runs the planned encode into a uniquely named temp file, then promotes it
//! over the original via a backup-then-swap protocol. Between the start and
//! end of a swap exactly one of these holds on disk: the original at its
//! path, the backup present with the destination absent, or the destination
//! present with backup and original gone. A failure after the backup rename
//! rolls the backup back to the original path before reporting.

use crate::plan::EncodePlan;
use crate::{Error, Result};
use std::path::{Component, Path, PathBuf};
use std::process::Command;

/// How the encoded output should land on disk.
#[derive(Debug, Clone, Default)]
pub struct ReplaceOptions {
    /// Leave the original untouched and write the output beside it.
    pub no_replace: bool,
    /// Alternate directory for temp files. Honored only when it shares the
    /// destination's filesystem root; cross-filesystem renames are not
    /// atomic, so a foreign root falls back to the destination directory.
    pub temp_dir: Option<PathBuf>,
}

/// Execute an encode plan and finalize the output.
///
/// Returns the final path on success. On any failure the temp file is
/// removed best-effort and the original file is left valid at its original
/// path.
pub fn execute_plan(
    ffmpeg: &Path,
    plan: &EncodePlan,
    original: &Path,
    opts: &ReplaceOptions,
) -> Result<PathBuf> {
    let tmp = temp_output_path(original, plan.container.extension(), opts.temp_dir.as_deref());
    if let Some(dir) = tmp.parent() {
        std::fs::create_dir_all(dir)
            .map_err(|e| Error::replace(original, format!("cannot create temp dir: {}", e)))?;
    }

    if let Err(e) = run_encoder(ffmpeg, plan, &tmp, original) {
        discard(&tmp);
        return Err(e);
    }

    if opts.no_replace {
        let out = no_replace_destination(original, plan.container.extension());
        if let Err(e) = move_over(&tmp, &out) {
            discard(&tmp);
            return Err(Error::replace(original, format!("move failed: {}", e)));
        }
        return Ok(out);
    }

    let dest = plan.destination_for(original);
    let tx = ReplaceTransaction::new(original, &dest);
    match tx.commit(&tmp) {
        Ok(path) => Ok(path),
        Err(e) => {
            discard(&tmp);
            Err(e)
        }
    }
}

/// Backup-then-swap replacement of one file.
///
/// Explicit state machine `Fresh -> BackedUp -> Promoted` so every partial
/// failure path is enumerable: a failure while `BackedUp` triggers a
/// rollback rename of the backup to the original path.
#[derive(Debug)]
pub struct ReplaceTransaction {
    original: PathBuf,
    destination: PathBuf,
    backup: PathBuf,
    state: TxState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxState {
    Fresh,
    BackedUp,
    Promoted,
}

impl ReplaceTransaction {
    /// Prepare a transaction replacing `original` with content at
    /// `destination` (same path unless the container extension changed).
    pub fn new(original: &Path, destination: &Path) -> Self {
        Self {
            original: original.to_path_buf(),
            destination: destination.to_path_buf(),
            backup: backup_path(original),
            state: TxState::Fresh,
        }
    }

    /// Run the full swap: back up the original, promote the temp file to
    /// the destination, then drop the backup. Rolls back on failure.
    pub fn commit(mut self, tmp: &Path) -> Result<PathBuf> {
        self.begin()?;
        if let Err(e) = self.promote(tmp) {
            self.rollback();
            return Err(e);
        }
        self.finish();
        Ok(self.destination)
    }

    /// Rename the original to its backup path, clearing any stale backup
    /// from a previous failed run first.
    fn begin(&mut self) -> Result<()> {
        debug_assert_eq!(self.state, TxState::Fresh);
        if self.backup.exists() {
            tracing::debug!("removing stale backup {:?}", self.backup);
            std::fs::remove_file(&self.backup).map_err(|e| {
                Error::replace(&self.original, format!("cannot clear stale backup: {}", e))
            })?;
        }
        if self.original.exists() {
            std::fs::rename(&self.original, &self.backup).map_err(|e| {
                Error::replace(&self.original, format!("cannot back up original: {}", e))
            })?;
            self.state = TxState::BackedUp;
        }
        Ok(())
    }

    /// Move the temp file onto the destination path.
    fn promote(&mut self, tmp: &Path) -> Result<()> {
        if self.destination.exists() {
            std::fs::remove_file(&self.destination).map_err(|e| {
                Error::replace(
                    &self.original,
                    format!("cannot clear destination: {}", e),
                )
            })?;
        }
        std::fs::rename(tmp, &self.destination).map_err(|e| {
            Error::replace(
                &self.original,
                format!("cannot promote output to destination: {}", e),
            )
        })?;
        self.state = TxState::Promoted;
        Ok(())
    }

    /// Best-effort restore of the original from its backup.
    fn rollback(&mut self) {
        if self.state == TxState::BackedUp && !self.original.exists() && self.backup.exists() {
            if let Err(e) = std::fs::rename(&self.backup, &self.original) {
                tracing::error!(
                    "rollback failed, original preserved at {:?}: {}",
                    self.backup,
                    e
                );
            } else {
                self.state = TxState::Fresh;
            }
        }
    }

    /// Drop the backup after a successful promote.
    fn finish(&self) {
        debug_assert_eq!(self.state, TxState::Promoted);
        if self.backup.exists() {
            if let Err(e) = std::fs::remove_file(&self.backup) {
                tracing::warn!("could not remove backup {:?}: {}", self.backup, e);
            }
        }
    }
}

/// Temp output path for one encode, collocated with the destination
/// directory (or `temp_dir` when it shares the same filesystem root).
///
/// The name embeds the process id and a random component so concurrently
/// running instances working on the same source never collide.
pub fn temp_output_path(original: &Path, extension: &str, temp_dir: Option<&Path>) -> PathBuf {
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let token = uuid::Uuid::new_v4().simple().to_string();
    let name = format!(
        "{}.av1.{}.{}.tmp.{}",
        stem,
        std::process::id(),
        &token[..8],
        extension
    );

    let dest_dir = original.parent().unwrap_or_else(|| Path::new("."));
    let dir = match temp_dir {
        Some(td) if same_filesystem_root(td, dest_dir) => td,
        _ => dest_dir,
    };
    dir.join(name)
}

/// Compare the filesystem anchors (drive prefixes) of two paths. On Unix
/// there are no prefixes, so every pair shares a root and an explicit temp
/// dir is always accepted, matching the drive-letter check this mirrors.
fn same_filesystem_root(a: &Path, b: &Path) -> bool {
    fn anchor(p: &Path) -> Option<std::ffi::OsString> {
        p.components().find_map(|c| match c {
            Component::Prefix(prefix) => Some(prefix.as_os_str().to_os_string()),
            _ => None,
        })
    }
    anchor(a) == anchor(b)
}

fn backup_path(original: &Path) -> PathBuf {
    let mut s = original.as_os_str().to_os_string();
    s.push(".bak");
    PathBuf::from(s)
}

/// Output path for no-replace mode: beside the original with the resolved
/// extension, never the original path itself.
fn no_replace_destination(original: &Path, extension: &str) -> PathBuf {
    let candidate = original.with_extension(extension);
    if candidate != original {
        return candidate;
    }
    // Same container as the source: add a marker so the original survives.
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    original.with_file_name(format!("{}.av1.{}", stem, extension))
}

fn run_encoder(ffmpeg: &Path, plan: &EncodePlan, tmp: &Path, original: &Path) -> Result<()> {
    tracing::debug!("ffmpeg args: {:?} -> {:?}", plan.args, tmp);

    let output = Command::new(ffmpeg)
        .args(&plan.args)
        .arg(tmp)
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found("ffmpeg")
            } else {
                Error::encode(original, format!("ffmpeg not invocable: {}", e))
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let last = stderr.lines().next_back().unwrap_or("").trim();
        return Err(Error::encode(
            original,
            format!("ffmpeg exited with {}: {}", output.status, last),
        ));
    }

    Ok(())
}

/// Overwrite `to` with `from`, falling back to copy+delete when a rename is
/// not possible.
fn move_over(from: &Path, to: &Path) -> std::io::Result<()> {
    if to.exists() {
        std::fs::remove_file(to)?;
    }
    match std::fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) => {
            std::fs::copy(from, to)?;
            std::fs::remove_file(from)
        }
    }
}

fn discard(tmp: &Path) {
    if tmp.exists() {
        if let Err(e) = std::fs::remove_file(tmp) {
            tracing::warn!("could not remove temp file {:?}: {}", tmp, e);
        }
    }
}
