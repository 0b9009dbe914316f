//! Incremental blame stream parsing and age scoring
//!
//! `git blame --incremental` emits a line-oriented protocol: header
//! records attributing a run of result lines to a commit, each followed
//! by metadata records for that commit. This module turns such a stream
//! into a [`BlameModel`] (file text, ordered per-line annotations, and a
//! deduplicated commit registry) and derives a 0-100 recency score per
//! commit for heatmap coloring.

mod age;
mod model;
mod parser;

pub use age::{color_for_age, hex, normalize_ages};
pub use model::{BlameModel, Commit, CommitIdx, CommitRegistry, Line, UNCOMMITTED_ID};
pub use parser::{parse_stream, BlameParser};

use thiserror::Error;

/// Errors that can occur while building a blame model
#[derive(Error, Debug)]
pub enum BlameError {
    #[error("malformed blame header at record {record}: {raw:?}")]
    MalformedHeader { record: usize, raw: String },

    #[error("commit {commit}: conflicting values for {key}: had {old:?}, got {new:?}")]
    AttributeMismatch {
        commit: String,
        key: String,
        old: String,
        new: String,
    },

    #[error("commit {commit}: {key} is not an integer timestamp: {value:?}")]
    InvalidTimestamp {
        commit: String,
        key: String,
        value: String,
    },

    #[error("blame header at record {record} names result line {resultline} but the file has {file_lines} lines")]
    ResultLineOutOfRange {
        record: usize,
        resultline: u32,
        file_lines: usize,
    },

    #[error("nothing to annotate (is the file tracked by git?)")]
    NothingToAnnotate,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type BlameResult<T> = Result<T, BlameError>;
