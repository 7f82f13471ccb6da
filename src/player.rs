//! Media player queries over `playerctl`
//!
//! Any MPRIS player on the session bus can be followed. Every query runs with
//! a short timeout and degrades to "unknown" on failure.

use std::fmt;
use std::future::Future;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;

use crate::diagnostics::Diagnostics;

const PLAYERCTL: &str = "playerctl";

const QUERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Artist and title of the playing track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    pub artist: String,
    pub title: String,
}

impl TrackInfo {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
        }
    }

    /// Cache key for this track's lyrics
    pub fn key(&self) -> String {
        crate::cache::track_key(&self.artist, &self.title)
    }
}

/// Why a player query produced nothing
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("failed to run playerctl: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("playerctl {args} timed out after {timeout:?}")]
    Timeout { args: String, timeout: Duration },
    #[error("playerctl {args} exited with {status}")]
    Failed { args: String, status: String },
    #[error("no player found")]
    NoPlayer,
}

/// The media player being followed
pub trait Player: Send + Sync {
    /// Current track, `None` when nothing usable is playing
    fn current_track(&self) -> impl Future<Output = Option<TrackInfo>> + Send;

    /// Playback position in seconds, `0.0` when unavailable
    fn current_position(&self) -> impl Future<Output = f64> + Send;
}

/// Run `playerctl` with a timeout and return its trimmed stdout
async fn run_playerctl(args: &[&str]) -> Result<String, PlayerError> {
    let child = Command::new(PLAYERCTL)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()?;

    // Dropping the future on timeout kills the child
    let output = match tokio::time::timeout(QUERY_TIMEOUT, child.wait_with_output()).await {
        Ok(output) => output?,
        Err(_) => {
            return Err(PlayerError::Timeout {
                args: args.join(" "),
                timeout: QUERY_TIMEOUT,
            });
        }
    };

    if !output.status.success() {
        return Err(PlayerError::Failed {
            args: args.join(" "),
            status: output.status.to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Parse `playerctl position` output, rejecting garbage and negative values
fn parse_position(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|pos| pos.is_finite() && *pos >= 0.0)
}

/// A named MPRIS player driven through `playerctl -p <name>`
#[derive(Clone)]
pub struct PlayerctlPlayer {
    name: String,
    diagnostics: Arc<dyn Diagnostics>,
}

impl fmt::Debug for PlayerctlPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerctlPlayer")
            .field("name", &self.name)
            .field("diagnostics", &"<Diagnostics>")
            .finish()
    }
}

impl PlayerctlPlayer {
    pub fn new(name: impl Into<String>, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            name: name.into(),
            diagnostics,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    async fn query(&self, args: &[&str]) -> Result<String, PlayerError> {
        let mut full = vec!["-p", self.name.as_str()];
        full.extend_from_slice(args);
        run_playerctl(&full).await
    }

    /// Note a failed query
    ///
    /// A non-zero exit is how `playerctl` reports that nothing is playing, so
    /// only spawn failures and timeouts reach the diagnostic log.
    fn report(&self, what: &str, e: &PlayerError) {
        match e {
            PlayerError::Failed { .. } => {
                tracing::debug!("No {} from {}: {}", what, self.name, e);
            }
            _ => self
                .diagnostics
                .record(&format!("Player error getting {} from {}: {}", what, self.name, e)),
        }
    }

    async fn metadata(&self, field: &str) -> Option<String> {
        match self.query(&["metadata", field]).await {
            Ok(value) if !value.is_empty() => Some(value),
            Ok(_) => None,
            Err(e) => {
                self.report(field, &e);
                None
            }
        }
    }
}

impl Player for PlayerctlPlayer {
    async fn current_track(&self) -> Option<TrackInfo> {
        let (artist, title) = tokio::join!(
            self.metadata("xesam:artist"),
            self.metadata("xesam:title")
        );
        Some(TrackInfo::new(artist?, title?))
    }

    async fn current_position(&self) -> f64 {
        match self.query(&["position"]).await {
            Ok(raw) => parse_position(&raw).unwrap_or(0.0),
            Err(e) => {
                self.report("position", &e);
                0.0
            }
        }
    }
}

/// Pick the player to follow
///
/// A forced name is used as-is. Otherwise the first player listed by
/// `playerctl -l` that reports a valid position wins.
pub async fn choose_player(forced: Option<&str>) -> Result<String, PlayerError> {
    if let Some(name) = forced.filter(|n| !n.trim().is_empty()) {
        return Ok(name.trim().to_string());
    }

    let listing = run_playerctl(&["-l"]).await?;
    for candidate in listing.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match run_playerctl(&["position", "-p", candidate]).await {
            Ok(raw) if parse_position(&raw).is_some() => {
                tracing::info!("Following player {}", candidate);
                return Ok(candidate.to_string());
            }
            Ok(raw) => tracing::debug!("Player {} reported position {:?}", candidate, raw),
            Err(e) => tracing::debug!("Skipping player {}: {}", candidate, e),
        }
    }

    Err(PlayerError::NoPlayer)
}
