//! Lyrics data types
//!
//! A parsed song is a [`LyricSequence`]: an immutable, shared, time-ordered
//! list of [`LyricLine`]s that is never empty.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use lazy_static::lazy_static;

/// Text shown when the lyric source had nothing for a song
pub const NOT_FOUND_TEXT: &str = "❌ Lyrics not found";

/// Text shown when lyrics were fetched but contained no usable timestamps
pub const UNPARSEABLE_TEXT: &str = "❌ No parseable lyrics found";

lazy_static! {
    static ref NOT_FOUND: LyricSequence = LyricSequence::sentinel(NOT_FOUND_TEXT);
    static ref UNPARSEABLE: LyricSequence = LyricSequence::sentinel(UNPARSEABLE_TEXT);
}

/// A single line of lyrics
#[derive(Debug, Clone, PartialEq)]
pub struct LyricLine {
    /// Seconds from the start of the track at which the line becomes active
    pub offset: f64,
    /// Display text, trimmed
    pub text: String,
}

impl LyricLine {
    pub fn new(offset: f64, text: impl Into<String>) -> Self {
        Self {
            offset,
            text: text.into(),
        }
    }
}

/// Ordered, non-empty, immutable lyric lines for one song
///
/// Cloning is cheap: all clones share the same allocation, so a cache hit
/// hands out the very value that was inserted.
#[derive(Clone, PartialEq)]
pub struct LyricSequence {
    lines: Arc<[LyricLine]>,
}

impl LyricSequence {
    /// Build a sequence from unsorted lines
    ///
    /// Lines are stable-sorted by offset, so lines sharing an offset keep
    /// their input order. Returns `None` when `lines` is empty.
    pub fn from_lines(mut lines: Vec<LyricLine>) -> Option<Self> {
        if lines.is_empty() {
            return None;
        }
        lines.sort_by(|a, b| a.offset.total_cmp(&b.offset));
        Some(Self {
            lines: lines.into(),
        })
    }

    /// One-line sequence at offset zero
    pub fn sentinel(text: &str) -> Self {
        Self {
            lines: Arc::from(vec![LyricLine::new(0.0, text)]),
        }
    }

    /// Shared sentinel for songs the lyric source could not provide
    pub fn not_found() -> Self {
        NOT_FOUND.clone()
    }

    /// Shared sentinel for lyrics without a single valid timestamp
    pub fn unparseable() -> Self {
        UNPARSEABLE.clone()
    }

    /// Whether both values point at the same shared allocation
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.lines, &other.lines)
    }
}

impl Deref for LyricSequence {
    type Target = [LyricLine];

    fn deref(&self) -> &Self::Target {
        &self.lines
    }
}

impl fmt::Debug for LyricSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.lines.iter()).finish()
    }
}
