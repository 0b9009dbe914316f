//! Data model for an annotated file
//!
//! A parsed blame stream yields three things: the literal file text, one
//! [`Line`] per result line, and a [`CommitRegistry`] holding each commit
//! exactly once. Lines reference commits by index so that the many lines
//! of one commit share a single metadata record.

use crate::blame::{BlameError, BlameResult};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// The all-zero id git uses for not-yet-committed working tree lines.
pub const UNCOMMITTED_ID: &str = "0000000000000000000000000000000000000000";

/// Index of a commit in the registry, in first-seen stream order.
pub type CommitIdx = usize;

/// Metadata for one commit seen in the blame stream.
///
/// Fields are populated incrementally as metadata records arrive; a field
/// the stream never mentions stays `None`. Keys the parser does not
/// recognize land in `extra` verbatim.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Commit {
    /// 40-character hex content id.
    pub id: String,
    pub author: Option<String>,
    pub author_mail: Option<String>,
    /// Authoring time, epoch seconds.
    pub author_time: Option<i64>,
    pub author_tz: Option<String>,
    pub committer: Option<String>,
    pub committer_mail: Option<String>,
    pub committer_time: Option<i64>,
    pub committer_tz: Option<String>,
    pub summary: Option<String>,
    pub previous: Option<String>,
    pub filename: Option<String>,
    /// Set when the stream marks this commit as a boundary commit.
    pub boundary: bool,
    /// Unrecognized metadata keys, kept for forward compatibility.
    pub extra: HashMap<String, String>,
    /// Recency score in [0, 100], 100 = oldest. `None` until
    /// [`normalize_ages`](crate::blame::normalize_ages) has run.
    pub age: Option<u8>,
}

impl Commit {
    pub(crate) fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }

    /// True for the working-tree pseudo-commit.
    pub fn is_uncommitted(&self) -> bool {
        self.id == UNCOMMITTED_ID
    }

    /// Apply one metadata record to this commit.
    ///
    /// `key` arrives with `-` already normalized to `_`. Assigning a field
    /// that is already set to a different value is a protocol-consistency
    /// violation; assigning the same value again is a no-op.
    pub(crate) fn apply(&mut self, key: &str, value: &str) -> BlameResult<()> {
        match key {
            "author" => set_text(&self.id, key, &mut self.author, value),
            "author_mail" => set_text(&self.id, key, &mut self.author_mail, value),
            "author_time" => set_time(&self.id, key, &mut self.author_time, value),
            "author_tz" => set_text(&self.id, key, &mut self.author_tz, value),
            "committer" => set_text(&self.id, key, &mut self.committer, value),
            "committer_mail" => set_text(&self.id, key, &mut self.committer_mail, value),
            "committer_time" => set_time(&self.id, key, &mut self.committer_time, value),
            "committer_tz" => set_text(&self.id, key, &mut self.committer_tz, value),
            "summary" => set_text(&self.id, key, &mut self.summary, value),
            "previous" => set_text(&self.id, key, &mut self.previous, value),
            "filename" => set_text(&self.id, key, &mut self.filename, value),
            "boundary" => {
                self.boundary = true;
                Ok(())
            }
            _ => match self.extra.get(key) {
                Some(old) if old != value => Err(mismatch(&self.id, key, old, value)),
                Some(_) => Ok(()),
                None => {
                    self.extra.insert(key.to_string(), value.to_string());
                    Ok(())
                }
            },
        }
    }
}

/// Set an optional text field, rejecting a conflicting re-assignment.
fn set_text(id: &str, key: &str, slot: &mut Option<String>, value: &str) -> BlameResult<()> {
    match slot {
        Some(old) if old.as_str() != value => Err(mismatch(id, key, old, value)),
        Some(_) => Ok(()),
        None => {
            *slot = Some(value.to_string());
            Ok(())
        }
    }
}

/// Set an optional epoch-seconds field, rejecting a conflicting re-assignment.
fn set_time(id: &str, key: &str, slot: &mut Option<i64>, value: &str) -> BlameResult<()> {
    let parsed: i64 = value
        .trim()
        .parse()
        .map_err(|_| BlameError::InvalidTimestamp {
            commit: id.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        })?;
    match slot {
        Some(old) if *old != parsed => Err(mismatch(id, key, &old.to_string(), value)),
        Some(_) => Ok(()),
        None => {
            *slot = Some(parsed);
            Ok(())
        }
    }
}

fn mismatch(id: &str, key: &str, old: &str, new: &str) -> BlameError {
    BlameError::AttributeMismatch {
        commit: id.to_string(),
        key: key.to_string(),
        old: old.to_string(),
        new: new.to_string(),
    }
}

/// Deduplicated commit store, preserving first-seen stream order.
#[derive(Debug, Default)]
pub struct CommitRegistry {
    commits: Vec<Commit>,
    by_id: HashMap<String, CommitIdx>,
}

impl CommitRegistry {
    /// Look up a commit id, registering it on first sight.
    pub fn intern(&mut self, id: &str) -> CommitIdx {
        if let Some(&idx) = self.by_id.get(id) {
            return idx;
        }
        let idx = self.commits.len();
        self.commits.push(Commit::new(id));
        self.by_id.insert(id.to_string(), idx);
        idx
    }

    pub fn lookup(&self, id: &str) -> Option<CommitIdx> {
        self.by_id.get(id).copied()
    }

    pub fn get(&self, idx: CommitIdx) -> &Commit {
        &self.commits[idx]
    }

    pub(crate) fn get_mut(&mut self, idx: CommitIdx) -> &mut Commit {
        &mut self.commits[idx]
    }

    /// Commits in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &Commit> {
        self.commits.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Commit> {
        self.commits.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}

/// One annotated line of the result file.
///
/// The `num_lines` lines of a blame block all share one `text` allocation
/// and the block's `sourceline`/`num_lines`; each carries its own
/// `resultline`.
#[derive(Debug, Clone)]
pub struct Line {
    /// Literal source text (no trailing newline).
    pub text: Arc<str>,
    /// Owning commit, shared with every other line of that commit.
    pub commit: CommitIdx,
    /// 1-based line number in the commit's version of the file.
    pub sourceline: u32,
    /// 1-based line number in the current file version.
    pub resultline: u32,
    /// Run length of the contiguous block this record described.
    pub num_lines: u32,
}

/// The fully assembled annotation for one file.
#[derive(Debug)]
pub struct BlameModel {
    /// The full literal file text.
    pub text: String,
    /// One entry per file line, sorted ascending by `resultline`.
    pub lines: Vec<Line>,
    /// Every distinct commit seen in the stream, first-seen order.
    pub commits: CommitRegistry,
}

impl BlameModel {
    /// The commit a line belongs to.
    pub fn commit_of(&self, line: &Line) -> &Commit {
        self.commits.get(line.commit)
    }
}
