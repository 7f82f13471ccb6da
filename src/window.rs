//! Sliding window of lyric lines around the active line

use std::num::NonZeroUsize;
use std::ops::Range;

/// How many lines the display shows at once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    size: NonZeroUsize,
}

impl WindowSpec {
    pub const DEFAULT_SIZE: usize = 10;

    pub fn new(size: NonZeroUsize) -> Self {
        Self { size }
    }

    pub fn size(&self) -> usize {
        self.size.get()
    }

    /// Window over `total_lines` lines around `active_index`
    pub fn select(&self, active_index: usize, total_lines: usize) -> DisplayWindow {
        select_window(active_index, total_lines, self.size())
    }
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            size: NonZeroUsize::new(Self::DEFAULT_SIZE).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

/// Half-open range `[start, end)` of line indices to display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayWindow {
    pub start: usize,
    pub end: usize,
}

impl DisplayWindow {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Pick the lines to show around `active_index`
///
/// The active line sits as close to the middle as the ends of the song
/// allow. Near either end the window is pinned to that end instead of
/// shrinking, so it stays `size` lines long whenever there are that many.
pub fn select_window(active_index: usize, total_lines: usize, size: usize) -> DisplayWindow {
    if total_lines <= size {
        return DisplayWindow {
            start: 0,
            end: total_lines,
        };
    }

    let half = size / 2;
    let top = active_index.saturating_sub(half);
    let bottom = (top + size).min(total_lines);
    let top = bottom.saturating_sub(size);

    DisplayWindow {
        start: top,
        end: bottom,
    }
}
