//! Text and JSON renderers for an annotated file
//!
//! The text renderer prints one row per line with an age-colored gutter,
//! the last author, and a short commit id, followed by a per-author
//! summary. The JSON renderer emits the full model for machine
//! consumption (piping to jq, editors, further processing).

use crate::blame::{color_for_age, BlameModel, Commit};
use anyhow::Result;
use chrono::{TimeZone, Utc};
use console::Style;
use serde_json::json;
use std::collections::HashMap;
use std::fmt::Write;

/// Render the annotated file as text, one row per line.
pub fn render_text(model: &BlameModel, color: bool) -> String {
    let mut out = String::new();

    for line in &model.lines {
        let commit = model.commit_of(line);
        let age = commit.age.unwrap_or(100);
        let gutter = if color {
            Style::new()
                .on_color256(ansi256(color_for_age(age)))
                .apply_to("  ")
                .to_string()
        } else {
            "  ".to_string()
        };
        let author = commit.author.as_deref().unwrap_or("unknown");
        let _ = writeln!(
            out,
            "{}{:>5} {} {:<18} {} {}",
            gutter,
            line.resultline,
            short_id(commit),
            truncate(author, 18),
            short_date(commit),
            line.text,
        );
    }

    out.push('\n');
    out.push_str(&author_summary(model));
    out
}

/// Render the model as pretty-printed JSON.
pub fn render_json(model: &BlameModel) -> Result<String> {
    let commits: Vec<_> = model.commits.iter().collect();
    let lines: Vec<_> = model
        .lines
        .iter()
        .map(|line| {
            json!({
                "resultline": line.resultline,
                "sourceline": line.sourceline,
                "num_lines": line.num_lines,
                "commit": model.commit_of(line).id,
                "text": &*line.text,
            })
        })
        .collect();
    Ok(serde_json::to_string_pretty(&json!({
        "commits": commits,
        "lines": lines,
    }))?)
}

/// Per-author totals, mirroring the annotation's side panel: lines owned
/// and distinct commits, in order of first appearance.
fn author_summary(model: &BlameModel) -> String {
    let mut order: Vec<&str> = Vec::new();
    let mut lines_by_author: HashMap<&str, usize> = HashMap::new();
    let mut commits_by_author: HashMap<&str, usize> = HashMap::new();

    for commit in model.commits.iter() {
        let author = commit.author.as_deref().unwrap_or("unknown");
        if !lines_by_author.contains_key(author) {
            order.push(author);
        }
        *commits_by_author.entry(author).or_insert(0) += 1;
        lines_by_author.entry(author).or_insert(0);
    }
    for line in &model.lines {
        let author = model.commit_of(line).author.as_deref().unwrap_or("unknown");
        *lines_by_author.entry(author).or_insert(0) += 1;
    }

    let mut out = String::new();
    for author in order {
        let _ = writeln!(
            out,
            "{} ({} lines, {} commits)",
            author, lines_by_author[author], commits_by_author[author]
        );
    }
    out
}

fn short_id(commit: &Commit) -> &str {
    &commit.id[..commit.id.len().min(8)]
}

fn short_date(commit: &Commit) -> String {
    match commit
        .author_time
        .and_then(|t| Utc.timestamp_opt(t, 0).single())
    {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => "----------".to_string(),
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        s.chars().take(width).collect()
    }
}

/// Nearest entry in the 6x6x6 ANSI color cube.
fn ansi256((r, g, b): (u8, u8, u8)) -> u8 {
    16 + 36 * (r / 51) + 6 * (g / 51) + (b / 51)
}
