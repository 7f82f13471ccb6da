//! Terminal output of the lyrics window

use std::io::{self, Stdout, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Print, PrintStyledContent, Stylize};
use crossterm::terminal::{self, Clear, ClearType};

use crate::lyrics::LyricSequence;
use crate::player::TrackInfo;
use crate::window::DisplayWindow;

/// Fallback when the terminal size can't be queried (pipes, tests)
const FALLBACK_WIDTH: u16 = 80;

/// Everything needed to draw one tick
#[derive(Debug, Clone)]
pub struct Frame {
    pub track: TrackInfo,
    pub lyrics: LyricSequence,
    pub active_index: usize,
    pub window: DisplayWindow,
}

impl Frame {
    /// Visible lines with their distance from the active line
    pub fn visible_lines(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.window.range().filter_map(move |i| {
            self.lyrics
                .get(i)
                .map(|line| (i.abs_diff(self.active_index), line.text.as_str()))
        })
    }

    /// Whether drawing `other` would put the same thing on screen
    fn same_view(&self, other: &Frame) -> bool {
        self.active_index == other.active_index
            && self.window == other.window
            && self.track == other.track
            && self.lyrics.ptr_eq(&other.lyrics)
    }
}

/// Presents frames to the user
pub trait Renderer: Send {
    fn render(&mut self, frame: &Frame) -> io::Result<()>;
}

/// Full-screen ANSI renderer on stdout
#[derive(Debug)]
pub struct TerminalRenderer {
    out: Stdout,
    last: Option<Frame>,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self {
            out: io::stdout(),
            last: None,
        }
    }

    /// Clear the screen and leave a farewell line
    pub fn finish(&mut self, message: &str) -> io::Result<()> {
        queue!(
            self.out,
            Clear(ClearType::All),
            MoveTo(0, 0),
            PrintStyledContent(message.bold().yellow()),
            Print("\n")
        )?;
        self.out.flush()
    }

    /// Print a one-off status message (no player, startup errors)
    pub fn message(&mut self, message: &str) -> io::Result<()> {
        queue!(self.out, PrintStyledContent(message.bold().red()), Print("\n"))?;
        self.out.flush()
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn padding(width: u16, text: &str) -> String {
    let len = text.chars().count();
    " ".repeat((width as usize).saturating_sub(len) / 2)
}

impl Renderer for TerminalRenderer {
    fn render(&mut self, frame: &Frame) -> io::Result<()> {
        if self.last.as_ref().is_some_and(|last| last.same_view(frame)) {
            return Ok(());
        }

        let width = terminal::size().map(|(w, _)| w).unwrap_or(FALLBACK_WIDTH);
        let title = format!("{} - {}", frame.track.artist, frame.track.title);

        queue!(
            self.out,
            Clear(ClearType::All),
            MoveTo(0, 0),
            Print(padding(width, &title)),
            PrintStyledContent(title.as_str().bold().green()),
            Print("\r\n\r\n")
        )?;

        for (distance, text) in frame.visible_lines() {
            let styled = match distance {
                0 => text.black().on_cyan(),
                1 => text.white(),
                _ => text.dim(),
            };
            queue!(
                self.out,
                Print(padding(width, text)),
                PrintStyledContent(styled),
                Print("\r\n")
            )?;
        }

        self.out.flush()?;
        self.last = Some(frame.clone());
        Ok(())
    }
}
