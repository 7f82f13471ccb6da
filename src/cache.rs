//! Cache management module
//!
//! Bounded in-memory cache of parsed lyrics, keyed by song identity, with
//! least-recently-used eviction.

use std::num::NonZeroUsize;

use lru::LruCache;
use tracing::debug;

use crate::lyrics::LyricSequence;

/// Song identity used as the cache key: `"artist - title"`, verbatim
pub fn track_key(artist: &str, title: &str) -> String {
    format!("{} - {}", artist, title)
}

/// What is known about a song's lyrics
///
/// A key missing from the cache means no lookup was ever attempted.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedLyrics {
    /// Lyrics were retrieved and parsed
    Synced(LyricSequence),
    /// The lyric source had nothing for this song
    NotFound,
}

impl CachedLyrics {
    /// Sequence to display for this entry
    pub fn sequence(&self) -> LyricSequence {
        match self {
            CachedLyrics::Synced(seq) => seq.clone(),
            CachedLyrics::NotFound => LyricSequence::not_found(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Parsed lyrics keyed by song identity
#[derive(Debug)]
pub struct LyricsCache {
    entries: LruCache<String, CachedLyrics>,
    stats: CacheStats,
}

impl LyricsCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
            stats: CacheStats::default(),
        }
    }

    /// Look up a song and mark it most recently used
    pub fn get(&mut self, key: &str) -> Option<CachedLyrics> {
        match self.entries.get(key) {
            Some(entry) => {
                self.stats.hits += 1;
                Some(entry.clone())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Check for an entry without counting a hit or refreshing it
    pub fn peek(&self, key: &str) -> Option<&CachedLyrics> {
        self.entries.peek(key)
    }

    /// Insert or overwrite an entry, evicting the least recently used one
    /// when the cache is full
    pub fn put(&mut self, key: String, lyrics: CachedLyrics) {
        let replacing = self.entries.contains(&key);
        // `push` hands back the old pair on overwrite as well as on eviction
        match self.entries.push(key, lyrics) {
            Some((evicted, _)) if !replacing => {
                self.stats.evictions += 1;
                debug!("Evicted lyrics for {} from cache", evicted);
            }
            _ => {}
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Keys from most to least recently used
    #[cfg(test)]
    fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|(key, _)| key.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyrics::{NOT_FOUND_TEXT, parse_lrc};

    fn cap(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn lyrics(text: &str) -> CachedLyrics {
        CachedLyrics::Synced(parse_lrc(&format!("[00:01.00]{}", text)))
    }

    fn filled(capacity: usize, keys: &[&str]) -> LyricsCache {
        let mut cache = LyricsCache::new(cap(capacity));
        for key in keys {
            cache.put(key.to_string(), lyrics(key));
        }
        cache
    }

    fn text(entry: Option<&CachedLyrics>) -> Option<String> {
        entry.map(|e| e.sequence()[0].text.clone())
    }

    #[test]
    fn test_evicts_least_recently_inserted() {
        let mut cache = filled(3, &["a", "b", "c"]);
        assert_eq!(cache.stats().evictions, 0);

        cache.put("d".to_string(), lyrics("d"));
        assert_eq!(cache.keys(), ["d", "c", "b"]);
        assert!(cache.peek("a").is_none());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_get_protects_from_eviction() {
        let mut cache = filled(3, &["a", "b", "c"]);

        assert!(cache.get("a").is_some());
        cache.put("d".to_string(), lyrics("d"));

        assert!(cache.peek("b").is_none());
        assert_eq!(cache.keys(), ["d", "a", "c"]);
    }

    #[test]
    fn test_put_existing_key_updates_and_promotes() {
        let mut cache = filled(2, &["a", "b"]);
        cache.put("a".to_string(), lyrics("a again"));
        assert_eq!(cache.keys(), ["a", "b"]);
        assert_eq!(cache.stats().evictions, 0);

        cache.put("c".to_string(), lyrics("c"));
        assert_eq!(text(cache.peek("a")).as_deref(), Some("a again"));
        assert!(cache.peek("b").is_none());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_peek_does_not_promote() {
        let mut cache = filled(2, &["a", "b"]);
        assert!(cache.peek("a").is_some());
        cache.put("c".to_string(), lyrics("c"));
        assert_eq!(cache.keys(), ["c", "b"]);
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn test_capacity_one() {
        let mut cache = filled(1, &["a"]);
        assert!(cache.get("a").is_some());
        cache.put("b".to_string(), lyrics("b"));
        assert_eq!(cache.keys(), ["b"]);
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn test_many_inserts_stay_bounded() {
        let mut cache = LyricsCache::new(cap(2));
        for i in 0..100 {
            cache.put(format!("k{}", i), CachedLyrics::NotFound);
        }
        assert_eq!(cache.keys(), ["k99", "k98"]);
        assert_eq!(cache.stats().evictions, 98);
    }

    #[test]
    fn test_track_key_is_verbatim() {
        assert_eq!(track_key("Daft Punk", "One More Time"), "Daft Punk - One More Time");
        assert_ne!(track_key("daft punk", "one more time"), track_key("Daft Punk", "One More Time"));
        assert_ne!(track_key(" A", "B"), track_key("A", "B"));
    }

    #[test]
    fn test_lyrics_cache_shares_sequence() {
        let mut cache = LyricsCache::new(cap(2));
        let seq = parse_lrc("[00:01.00]hello");
        cache.put("a - b".to_string(), CachedLyrics::Synced(seq.clone()));

        let hit = cache.get("a - b").unwrap().sequence();
        assert!(hit.ptr_eq(&seq));
        assert!(cache.get("x - y").is_none());
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                evictions: 0
            }
        );
    }

    #[test]
    fn test_not_found_entry_is_distinct_from_absent() {
        let mut cache = LyricsCache::new(cap(2));
        cache.put("a - b".to_string(), CachedLyrics::NotFound);

        let entry = cache.peek("a - b").unwrap();
        assert_eq!(entry, &CachedLyrics::NotFound);
        assert_eq!(entry.sequence()[0].text, NOT_FOUND_TEXT);
        assert!(cache.peek("c - d").is_none());
    }
}
