//! Incremental blame stream parser
//!
//! Consumes the record stream of `git blame --incremental` one line at a
//! time and builds a [`BlameModel`]. Records come in two kinds: a header
//! (`<40-hex-id> <sourceline> <resultline> <num_lines>`) opening a block,
//! and `key value...` metadata lines for the block's commit. Manual
//! splitting instead of a regex; the grammar is too simple to warrant one.

use crate::blame::model::{BlameModel, CommitIdx, CommitRegistry, Line};
use crate::blame::{BlameError, BlameResult};
use std::sync::Arc;
use tracing::warn;

/// Streaming parser for `git blame --incremental` output.
///
/// Feed protocol lines with [`push_record`](Self::push_record), then call
/// [`finish`](Self::finish) to get the assembled model. [`parse_stream`]
/// wraps the whole dance for callers that already hold the full stream.
pub struct BlameParser {
    text: String,
    filelines: Vec<Arc<str>>,
    commits: CommitRegistry,
    lines: Vec<Line>,
    current: Option<CommitIdx>,
    record: usize,
}

impl BlameParser {
    /// Create a parser for a target file with the given literal text.
    pub fn new(file_text: &str) -> Self {
        Self {
            text: file_text.to_string(),
            filelines: file_text.lines().map(Arc::from).collect(),
            commits: CommitRegistry::default(),
            lines: Vec::new(),
            current: None,
            record: 0,
        }
    }

    /// Consume one protocol line.
    pub fn push_record(&mut self, raw: &str) -> BlameResult<()> {
        self.record += 1;
        let raw = raw.trim_end_matches(|c| c == '\n' || c == '\r');

        if looks_like_header(raw) {
            let (id, sourceline, resultline, num_lines) =
                parse_header(raw).ok_or_else(|| BlameError::MalformedHeader {
                    record: self.record,
                    raw: raw.to_string(),
                })?;
            self.begin_block(id, sourceline, resultline, num_lines)
        } else {
            self.push_metadata(raw)
        }
    }

    fn begin_block(
        &mut self,
        id: &str,
        sourceline: u32,
        resultline: u32,
        num_lines: u32,
    ) -> BlameResult<()> {
        let commit = self.commits.intern(id);
        self.current = Some(commit);

        // Every line of the block reuses the text of the block's *first*
        // result line. Historical behavior, kept on purpose: a block
        // spanning several result lines shows its first line's text
        // repeated (see block_lines_share_first_line_text).
        let text: Arc<str> = self
            .filelines
            .get(resultline as usize - 1)
            .cloned()
            .ok_or(BlameError::ResultLineOutOfRange {
                record: self.record,
                resultline,
                file_lines: self.filelines.len(),
            })?;
        let last = resultline as u64 + num_lines as u64 - 1;
        if last > self.filelines.len() as u64 {
            return Err(BlameError::ResultLineOutOfRange {
                record: self.record,
                resultline: last.min(u32::MAX as u64) as u32,
                file_lines: self.filelines.len(),
            });
        }

        for offset in 0..num_lines {
            self.lines.push(Line {
                text: Arc::clone(&text),
                commit,
                sourceline,
                resultline: resultline + offset,
                num_lines,
            });
        }
        Ok(())
    }

    fn push_metadata(&mut self, raw: &str) -> BlameResult<()> {
        // Metadata before any header has no commit to attach to.
        let Some(current) = self.current else {
            return Ok(());
        };
        let (key, value) = raw.split_once(' ').unwrap_or((raw, ""));
        let key = key.replace('-', "_");
        self.commits.get_mut(current).apply(&key, value)
    }

    /// Assemble the model once the stream has ended.
    pub fn finish(mut self) -> BlameResult<BlameModel> {
        if self.lines.is_empty() {
            return Err(BlameError::NothingToAnnotate);
        }

        // Blocks arrive in arbitrary order but each covers a distinct run
        // of result lines, so this is a plain sort plus a coverage check.
        self.lines.sort_by_key(|line| line.resultline);
        let covered = self
            .lines
            .iter()
            .enumerate()
            .all(|(i, line)| line.resultline as usize == i + 1);
        if !covered || self.lines.len() != self.filelines.len() {
            warn!(
                "blame records cover {} of {} file lines",
                self.lines.len(),
                self.filelines.len()
            );
        }

        Ok(BlameModel {
            text: self.text,
            lines: self.lines,
            commits: self.commits,
        })
    }
}

/// Parse a full blame stream against the target file's literal text.
pub fn parse_stream<I, S>(file_text: &str, records: I) -> BlameResult<BlameModel>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = BlameParser::new(file_text);
    for record in records {
        parser.push_record(record.as_ref())?;
    }
    parser.finish()
}

/// A record whose first token is a 40-char hex id is a header; anything
/// else is metadata for the current block.
fn looks_like_header(raw: &str) -> bool {
    let first = raw.split(' ').next().unwrap_or("");
    first.len() == 40 && first.chars().all(|c| c.is_ascii_hexdigit())
}

/// Split a header into `(id, sourceline, resultline, num_lines)`.
/// All three numeric fields must be positive integers.
fn parse_header(raw: &str) -> Option<(&str, u32, u32, u32)> {
    let mut parts = raw.split(' ');
    let id = parts.next()?;
    let sourceline: u32 = parts.next()?.parse().ok()?;
    let resultline: u32 = parts.next()?.parse().ok()?;
    let num_lines: u32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    if sourceline == 0 || resultline == 0 || num_lines == 0 {
        return None;
    }
    Some((id, sourceline, resultline, num_lines))
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn three_line_file() -> &'static str {
        "first\nsecond\nthird\n"
    }

    #[test]
    fn test_looks_like_header() {
        assert!(looks_like_header(&format!("{A} 1 1 3")));
        assert!(!looks_like_header("author John Doe"));
        assert!(!looks_like_header("summary Fix bug"));
        // 39 hex chars is metadata, not a header
        assert!(!looks_like_header(&format!("{} 1 1 1", &A[..39])));
    }

    #[test]
    fn test_parse_header_rejects_bad_fields() {
        assert!(parse_header(&format!("{A} 1 1 3")).is_some());
        assert!(parse_header(&format!("{A} 1 1")).is_none());
        assert!(parse_header(&format!("{A} 1 1 3 9")).is_none());
        assert!(parse_header(&format!("{A} 1 x 3")).is_none());
        assert!(parse_header(&format!("{A} 0 1 3")).is_none());
        assert!(parse_header(&format!("{A} 1 1 0")).is_none());
    }

    #[test]
    fn test_malformed_header_names_record() {
        let mut parser = BlameParser::new(three_line_file());
        parser.push_record(&format!("{A} 1 1 1")).unwrap();
        let err = parser.push_record(&format!("{B} 1 2 x")).unwrap_err();
        match err {
            BlameError::MalformedHeader { record, raw } => {
                assert_eq!(record, 2);
                assert!(raw.starts_with(B));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_metadata_before_header_is_ignored() {
        let model = parse_stream(
            three_line_file(),
            [
                "author Nobody".to_string(),
                format!("{A} 1 1 3"),
                "author Alice".to_string(),
            ],
        )
        .unwrap();
        assert_eq!(model.commits.len(), 1);
        assert_eq!(model.commits.get(0).author.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_block_lines_share_first_line_text() {
        // A 2-line block repeats the first result line's text; line 2's
        // own text never appears in the model.
        let model = parse_stream(three_line_file(), [
            format!("{A} 1 1 2"),
            format!("{B} 3 3 1"),
        ])
        .unwrap();
        assert_eq!(&*model.lines[0].text, "first");
        assert_eq!(&*model.lines[1].text, "first");
        assert_eq!(&*model.lines[2].text, "third");
        // Shared, not copied
        assert!(Arc::ptr_eq(&model.lines[0].text, &model.lines[1].text));
    }

    #[test]
    fn test_lines_are_sorted_strictly_increasing() {
        // Blocks fed out of order
        let model = parse_stream(three_line_file(), [
            format!("{B} 3 3 1"),
            format!("{A} 1 1 2"),
        ])
        .unwrap();
        let resultlines: Vec<u32> = model.lines.iter().map(|l| l.resultline).collect();
        assert_eq!(resultlines, vec![1, 2, 3]);
    }

    #[test]
    fn test_same_commit_metadata_unions_across_blocks() {
        let model = parse_stream(three_line_file(), [
            format!("{A} 1 1 1"),
            "author Alice".to_string(),
            format!("{A} 2 2 2"),
            "author-mail <alice@example.com>".to_string(),
        ])
        .unwrap();
        assert_eq!(model.commits.len(), 1);
        let commit = model.commits.get(0);
        assert_eq!(commit.author.as_deref(), Some("Alice"));
        assert_eq!(commit.author_mail.as_deref(), Some("<alice@example.com>"));
    }

    #[test]
    fn test_conflicting_metadata_fails() {
        let err = parse_stream(three_line_file(), [
            format!("{A} 1 1 3"),
            "author-time 100".to_string(),
            "author-time 200".to_string(),
        ])
        .unwrap_err();
        match err {
            BlameError::AttributeMismatch { commit, key, old, new } => {
                assert_eq!(commit, A);
                assert_eq!(key, "author_time");
                assert_eq!(old, "100");
                assert_eq!(new, "200");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_metadata_value_keeps_embedded_whitespace() {
        let model = parse_stream(three_line_file(), [
            format!("{A} 1 1 3"),
            "summary fix:  keep  inner   spacing".to_string(),
        ])
        .unwrap();
        assert_eq!(
            model.commits.get(0).summary.as_deref(),
            Some("fix:  keep  inner   spacing")
        );
    }

    #[test]
    fn test_empty_stream_is_nothing_to_annotate() {
        let err = parse_stream(three_line_file(), Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, BlameError::NothingToAnnotate));
    }

    #[test]
    fn test_result_line_out_of_range() {
        let err = parse_stream(three_line_file(), [format!("{A} 1 4 1")]).unwrap_err();
        assert!(matches!(err, BlameError::ResultLineOutOfRange { .. }));
        let err = parse_stream(three_line_file(), [format!("{A} 1 3 2")]).unwrap_err();
        assert!(matches!(err, BlameError::ResultLineOutOfRange { .. }));
    }

    #[test]
    fn test_model_text_is_the_literal_file() {
        let model = parse_stream(three_line_file(), [format!("{A} 1 1 3")]).unwrap();
        assert_eq!(model.text, three_line_file());
    }
}
