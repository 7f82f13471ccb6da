//! Lyrics module - parsing, retrieval and position lookup
//!
//! - `lrc`: Line-level LRC parsing with repeat timestamps
//! - `online`: Lyric retrieval from lrclib
//! - `types`: Shared lyric line and sequence types

mod lrc;
mod online;
mod types;

pub use lrc::parse_lrc;
pub use online::*;
pub use types::*;

/// Find the active line for a playback position in seconds
///
/// The active line is the last one whose offset has been reached. Before the
/// first offset the first line is returned, so the result is always a valid
/// index into `lyrics`.
pub fn find_current_line(lyrics: &LyricSequence, position_secs: f64) -> usize {
    // Lines are sorted, so "offset <= position" holds for a prefix
    let reached = lyrics.partition_point(|line| line.offset <= position_secs);
    reached.saturating_sub(1)
}
