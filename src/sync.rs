//! Lyrics synchronization loop
//!
//! Each tick asks the player what is playing and where, resolves the song's
//! lyrics through the cache, finds the active line and hands a [`Frame`] to
//! the renderer.

use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::cache::{CacheStats, CachedLyrics, LyricsCache};
use crate::diagnostics::Diagnostics;
use crate::lyrics::{LyricSequence, LyricsError, LyricsSource, find_current_line, parse_lrc};
use crate::player::{Player, TrackInfo};
use crate::render::{Frame, Renderer};
use crate::window::WindowSpec;

/// Delay between ticks while a track is playing
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Delay before retrying when no track is known
pub const IDLE_DELAY: Duration = Duration::from_millis(500);

/// Upper bound on one lyric retrieval, including any redirect download
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

type InFlight = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// A caller's claim on the retrieval gate of one song key
///
/// Dropping it removes the gate from the in-flight map once no other caller
/// holds or waits on it. This also runs when a resolving future is cancelled.
struct GateHandle<'a> {
    in_flight: &'a InFlight,
    key: &'a str,
    gate: Option<Arc<tokio::sync::Mutex<()>>>,
}

impl<'a> GateHandle<'a> {
    fn acquire(in_flight: &'a InFlight, key: &'a str) -> Self {
        let gate = Arc::clone(in_flight.lock().entry(key.to_string()).or_default());
        Self {
            in_flight,
            key,
            gate: Some(gate),
        }
    }

    /// Wait for our turn to retrieve this key
    async fn lock(&self) -> Option<tokio::sync::MutexGuard<'_, ()>> {
        Some(self.gate.as_ref()?.lock().await)
    }
}

impl Drop for GateHandle<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock();
        drop(self.gate.take());
        // Clones are only made and dropped under this lock, so the count is exact
        if in_flight
            .get(self.key)
            .is_some_and(|gate| Arc::strong_count(gate) == 1)
        {
            in_flight.remove(self.key);
        }
    }
}

/// Cache-backed lyric lookup, shared by everything that needs lyrics
///
/// At most one retrieval per song key is in flight at a time: concurrent
/// lookups of the same key wait for the first one and then read its result
/// from the cache.
pub struct LyricsResolver<S> {
    source: S,
    cache: Mutex<LyricsCache>,
    in_flight: InFlight,
    diagnostics: Arc<dyn Diagnostics>,
    fetch_timeout: Duration,
}

impl<S: LyricsSource> LyricsResolver<S> {
    pub fn new(source: S, capacity: NonZeroUsize, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            source,
            cache: Mutex::new(LyricsCache::new(capacity)),
            in_flight: Mutex::new(HashMap::new()),
            diagnostics,
            fetch_timeout: FETCH_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().stats()
    }

    /// Lyrics for a track, fetching and caching them on a miss
    ///
    /// Never fails: a failed retrieval is cached as "not found" and shown
    /// as the not-found sentinel.
    pub async fn resolve(&self, track: &TrackInfo) -> LyricSequence {
        let key = track.key();

        let cached = self.cache.lock().get(&key);
        if let Some(entry) = cached {
            debug!("Lyrics cache hit for {}", key);
            return entry.sequence();
        }

        let gate = GateHandle::acquire(&self.in_flight, &key);
        let _permit = gate.lock().await;

        // Someone else may have fetched this song while we waited
        let cached = self.cache.lock().peek(&key).cloned();
        let entry = match cached {
            Some(entry) => entry,
            None => {
                let entry = self.fetch(track).await;
                self.cache.lock().put(key.clone(), entry.clone());
                entry
            }
        };

        entry.sequence()
    }

    async fn fetch(&self, track: &TrackInfo) -> CachedLyrics {
        info!("Fetching lyrics for {} - {}", track.artist, track.title);

        let result = tokio::time::timeout(
            self.fetch_timeout,
            self.source.fetch(&track.artist, &track.title),
        )
        .await
        .unwrap_or_else(|_| Err(LyricsError::Timeout(self.fetch_timeout)));

        match result {
            Ok(raw) => {
                let lyrics = parse_lrc(&raw);
                debug!("Parsed {} lyric lines for {}", lyrics.len(), track.key());
                CachedLyrics::Synced(lyrics)
            }
            Err(e) => {
                warn!("No lyrics for {}: {}", track.key(), e);
                self.diagnostics.record(&format!(
                    "Failed to fetch lyrics for {} - {}: {}",
                    track.artist, track.title, e
                ));
                CachedLyrics::NotFound
            }
        }
    }
}

/// What a single tick did
#[derive(Debug, Clone)]
pub enum TickOutcome {
    /// No track is playing, nothing was rendered
    Idle,
    /// A frame was produced and handed to the renderer
    Rendered(Frame),
}

/// Drives the player, resolver and renderer
pub struct SyncOrchestrator<P, S, R> {
    player: P,
    resolver: Arc<LyricsResolver<S>>,
    renderer: R,
    window: WindowSpec,
    /// Last track seen and the lyrics resolved for it
    current: Option<(TrackInfo, LyricSequence)>,
}

impl<P, S, R> SyncOrchestrator<P, S, R>
where
    P: Player,
    S: LyricsSource,
    R: Renderer,
{
    pub fn new(
        player: P,
        resolver: Arc<LyricsResolver<S>>,
        renderer: R,
        window: WindowSpec,
    ) -> Self {
        Self {
            player,
            resolver,
            renderer,
            window,
            current: None,
        }
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Run one synchronization step
    pub async fn tick(&mut self) -> TickOutcome {
        let (track, mut position) =
            tokio::join!(self.player.current_track(), self.player.current_position());

        let Some(track) = track else {
            return TickOutcome::Idle;
        };

        let unchanged = match &self.current {
            Some((last, lyrics)) if *last == track => Some(lyrics.clone()),
            _ => None,
        };

        let lyrics = match unchanged {
            Some(lyrics) => lyrics,
            None => {
                info!("Now playing: {} - {}", track.artist, track.title);
                let lyrics = self.resolver.resolve(&track).await;
                // A slow retrieval leaves the first reading stale
                position = self.player.current_position().await;
                self.current = Some((track.clone(), lyrics.clone()));
                lyrics
            }
        };

        let active_index = find_current_line(&lyrics, position);
        let window = self.window.select(active_index, lyrics.len());
        let frame = Frame {
            track,
            lyrics,
            active_index,
            window,
        };

        if let Err(e) = self.renderer.render(&frame) {
            warn!("Failed to render lyrics: {}", e);
        }

        TickOutcome::Rendered(frame)
    }

    /// Tick until `shutdown` completes
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);

        loop {
            let delay = tokio::select! {
                _ = &mut shutdown => break,
                outcome = self.tick() => match outcome {
                    TickOutcome::Idle => IDLE_DELAY,
                    TickOutcome::Rendered(frame) => {
                        trace!(
                            "Line {} of {} for {}",
                            frame.active_index + 1,
                            frame.lyrics.len(),
                            frame.track.key()
                        );
                        TICK_INTERVAL
                    }
                },
            };

            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        let stats = self.resolver.cache_stats();
        info!(
            "Stopping: {} cache hits, {} misses, {} evictions",
            stats.hits, stats.misses, stats.evictions
        );
    }
}
