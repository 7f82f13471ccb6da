//! Command line configuration
//!
//! Flags are parsed with clap and then validated into [`Config`]. Invalid
//! sizes are a startup error: the sync loop never starts with them.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use thiserror::Error;

use crate::diagnostics::DEFAULT_LOG_FILE;
use crate::window::WindowSpec;

/// Default number of songs whose lyrics are kept in memory
pub const DEFAULT_CACHE_SIZE: i64 = 50;

const DEFAULT_WINDOW: i64 = WindowSpec::DEFAULT_SIZE as i64;

/// Centered sliding window lyrics for the active media player
#[derive(Parser, Debug, Clone)]
#[command(name = "lyricsync", version, about)]
pub struct Args {
    /// Follow this player instead of auto-detecting one
    #[arg(short, long)]
    pub player: Option<String>,

    /// Number of lyric lines shown at once
    #[arg(long, default_value_t = DEFAULT_WINDOW, allow_negative_numbers = true)]
    pub window: i64,

    /// Number of songs whose lyrics are cached
    #[arg(long, default_value_t = DEFAULT_CACHE_SIZE, allow_negative_numbers = true)]
    pub cache_size: i64,

    /// Diagnostic log file for player and lookup failures
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// More logging on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("window size must be greater than 0 (got {0})")]
    InvalidWindow(i64),
    #[error("cache size must be at least 1 (got {0})")]
    InvalidCacheSize(i64),
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub player: Option<String>,
    pub window: WindowSpec,
    pub cache_size: NonZeroUsize,
    pub log_file: PathBuf,
    pub verbose: u8,
}

fn positive(value: i64) -> Option<NonZeroUsize> {
    usize::try_from(value).ok().and_then(NonZeroUsize::new)
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let window = positive(args.window).ok_or(ConfigError::InvalidWindow(args.window))?;
        let cache_size =
            positive(args.cache_size).ok_or(ConfigError::InvalidCacheSize(args.cache_size))?;

        Ok(Self {
            player: args.player,
            window: WindowSpec::new(window),
            cache_size,
            log_file: args.log_file,
            verbose: args.verbose,
        })
    }

    /// Max level for the stderr log
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
