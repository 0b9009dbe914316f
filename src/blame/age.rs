//! Commit age scoring and heatmap colors
//!
//! Maps each commit's authoring time onto a 0-100 recency scale relative
//! to the oldest and newest commits in the registry: 100 = oldest, 0 =
//! newest. Commits without an authoring time count as maximally aged.

use crate::blame::model::CommitRegistry;

/// Gradient endpoints: newest lines are a warm near-white, the oldest
/// fade toward grey.
const NEWEST_RGB: (u8, u8, u8) = (255, 247, 241);
const OLDEST_RGB: (u8, u8, u8) = (222, 214, 208);

/// Back-fill the `age` field of every commit in the registry.
///
/// When all known authoring times coincide (including the single-commit
/// case) every commit gets 100; otherwise ages interpolate with integer
/// floor division, so `age` is in [0, 100] and non-increasing in
/// `author_time`.
pub fn normalize_ages(commits: &mut CommitRegistry) {
    let oldest = commits.iter().filter_map(|c| c.author_time).min();
    let newest = commits.iter().filter_map(|c| c.author_time).max();

    for commit in commits.iter_mut() {
        commit.age = Some(match (commit.author_time, oldest, newest) {
            (Some(t), Some(oldest), Some(newest)) if newest > oldest => {
                (100 - (100 * (t - oldest)) / (newest - oldest)) as u8
            }
            _ => 100,
        });
    }
}

/// Color for an age score, clamped to [0, 100], as linear interpolation
/// between the gradient endpoints.
pub fn color_for_age(age: u8) -> (u8, u8, u8) {
    let age = age.min(100) as i32;
    let channel = |lo: u8, hi: u8| (lo as i32 + (hi as i32 - lo as i32) * age / 100) as u8;
    (
        channel(NEWEST_RGB.0, OLDEST_RGB.0),
        channel(NEWEST_RGB.1, OLDEST_RGB.1),
        channel(NEWEST_RGB.2, OLDEST_RGB.2),
    )
}

/// `#rrggbb` form of an RGB triple.
pub fn hex((r, g, b): (u8, u8, u8)) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}
