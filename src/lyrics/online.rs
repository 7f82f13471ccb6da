//! Online lyrics fetching module
//!
//! Fetches raw LRC text from lrclib. Parsing and caching happen elsewhere;
//! this layer only turns a song identity into text or a [`LyricsError`].

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

const LRCLIB_SEARCH_URL: &str = "https://lrclib.net/api/search";

const TIMEOUT: Duration = Duration::from_secs(5);

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Why a lyric lookup produced no text
#[derive(Debug, Error)]
pub enum LyricsError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("no lyrics found")]
    NotFound,
    #[error("lyrics entry has no text")]
    Empty,
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Something that can look up raw lyric text for a song
pub trait LyricsSource: Send + Sync {
    fn fetch(
        &self,
        artist: &str,
        title: &str,
    ) -> impl Future<Output = Result<String, LyricsError>> + Send;
}

/// One search hit from lrclib
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LrclibTrack {
    #[serde(default)]
    synced_lyrics: Option<String>,
    #[serde(default)]
    plain_lyrics: Option<String>,
}

impl LrclibTrack {
    /// Prefer synced lyrics, fall back to plain text
    fn into_text(self) -> Option<String> {
        self.synced_lyrics
            .filter(|s| !s.trim().is_empty())
            .or(self.plain_lyrics)
            .filter(|s| !s.trim().is_empty())
    }
}

/// lrclib.net search client
#[derive(Debug, Clone)]
pub struct LrclibClient {
    client: Client,
    search_url: String,
}

impl LrclibClient {
    pub fn new() -> Result<Self, LyricsError> {
        Self::with_search_url(LRCLIB_SEARCH_URL)
    }

    /// Client against a different search endpoint (mirrors, local proxies)
    pub fn with_search_url(search_url: impl Into<String>) -> Result<Self, LyricsError> {
        let client = Client::builder()
            .timeout(TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            search_url: search_url.into(),
        })
    }

    async fn search(&self, query: &str) -> Result<Vec<LrclibTrack>, LyricsError> {
        let tracks = self
            .client
            .get(&self.search_url)
            .query(&[("q", query)])
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<LrclibTrack>>()
            .await?;
        Ok(tracks)
    }

    /// Some entries carry a link to the lyrics instead of the lyrics
    async fn download(&self, url: &str) -> Result<String, LyricsError> {
        let text = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }
}

impl LyricsSource for LrclibClient {
    async fn fetch(&self, artist: &str, title: &str) -> Result<String, LyricsError> {
        let query = format!("{} {}", artist, title);
        tracing::debug!("Searching lrclib for {:?}", query);

        let track = self
            .search(&query)
            .await?
            .into_iter()
            .next()
            .ok_or(LyricsError::NotFound)?;
        let text = track.into_text().ok_or(LyricsError::Empty)?;

        if text.starts_with("http") {
            tracing::debug!("Following lyrics link for {} - {}", artist, title);
            let body = self.download(text.trim()).await?;
            if body.trim().is_empty() {
                return Err(LyricsError::Empty);
            }
            return Ok(body);
        }

        Ok(text)
    }
}
