//! `git blame --incremental` subprocess runner
//!
//! The blame parser is transport-agnostic; this module is the one place
//! that actually talks to git. It shells out rather than linking libgit2:
//! the incremental record stream is the interface the parser is built
//! around.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Run `git blame --incremental` for a file and return the raw record
/// lines. Non-zero exit (untracked file, not a repository) surfaces
/// git's own stderr message.
pub fn blame_incremental(file: &Path) -> Result<Vec<String>> {
    let name = file
        .file_name()
        .with_context(|| format!("{} has no file name", file.display()))?;
    let dir = match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    debug!("git blame --incremental {}", file.display());
    let output = Command::new("git")
        .args(["blame", "--incremental", "--"])
        .arg(name)
        .current_dir(dir)
        .output()
        .context("failed to run git; is it installed and on PATH?")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "git blame {} failed: {}",
            file.display(),
            stderr.trim().lines().next().unwrap_or("unknown error")
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(String::from)
        .collect())
}
