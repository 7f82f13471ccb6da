//! LRC format parser
//!
//! Line-level `[mm:ss.xx]text` lyrics. A line may carry several timestamps
//! (`[00:12.50][01:30.00]Chorus`), in which case the text after the last one
//! is repeated at each of them.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use super::types::{LyricLine, LyricSequence};

lazy_static! {
    /// A `[m:ss.xx]` tag anywhere in a record
    static ref TIMESTAMP_TAG: Regex = Regex::new(r"\[(\d+:\d+\.\d+)\]").unwrap();
    static ref TIMESTAMP: Regex = Regex::new(r"^(\d+):(\d+\.\d+)$").unwrap();
}

/// A timestamp whose numbers cannot be used
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed timestamp `[{0}]`")]
pub struct MalformedTimestamp(pub String);

/// Parse the inside of a `[...]` tag into seconds
///
/// Accepts `m:ss.x`, `mm:ss.xx`, `mmm:ss.xxx` and so on. The fraction is
/// required. Seconds are not range-checked, so `[1:75.0]` is 135 seconds.
pub fn parse_timestamp(tag: &str) -> Result<f64, MalformedTimestamp> {
    let malformed = || MalformedTimestamp(tag.to_string());

    let caps = TIMESTAMP.captures(tag.trim()).ok_or_else(malformed)?;
    let minutes: u32 = caps[1].parse().map_err(|_| malformed())?;
    let seconds: f64 = caps[2].parse().map_err(|_| malformed())?;
    if !seconds.is_finite() {
        return Err(malformed());
    }

    Ok(f64::from(minutes) * 60.0 + seconds)
}

/// Parse one record, appending a line for every valid timestamp
///
/// The display text is whatever follows the last timestamp tag, so text
/// before or between tags is dropped.
fn parse_record(record: &str, out: &mut Vec<LyricLine>) {
    let tags: Vec<_> = TIMESTAMP_TAG.captures_iter(record).collect();
    let Some(last) = tags.last().and_then(|caps| caps.get(0)) else {
        return;
    };
    let text = record[last.end()..].trim();

    for caps in &tags {
        match parse_timestamp(&caps[1]) {
            Ok(offset) => out.push(LyricLine::new(offset, text)),
            Err(e) => {
                tracing::trace!("Skipping timestamp in lyrics record: {}", e);
            }
        }
    }
}

/// Parse LRC content into a time-ordered sequence
///
/// Never fails. Content without a single valid timestamp gives the
/// "no parseable lyrics" sentinel.
pub fn parse_lrc(src: &str) -> LyricSequence {
    let mut lines = Vec::new();

    for record in src.lines() {
        parse_record(record, &mut lines);
    }

    match LyricSequence::from_lines(lines) {
        Some(sequence) => sequence,
        None => {
            tracing::debug!("No timestamped lines in {} bytes of lyrics", src.len());
            LyricSequence::unparseable()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyrics::types::UNPARSEABLE_TEXT;

    fn pairs(seq: &LyricSequence) -> Vec<(f64, &str)> {
        seq.iter().map(|l| (l.offset, l.text.as_str())).collect()
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("00:01.12"), Ok(1.12));
        assert_eq!(parse_timestamp("01:10.5"), Ok(70.5));
        assert_eq!(parse_timestamp("1:75.0"), Ok(135.0));
        assert!(parse_timestamp("2:03").is_err());
        assert!(parse_timestamp("bad").is_err());
        assert!(parse_timestamp("ar:Artist").is_err());
        assert!(parse_timestamp("-1:00.00").is_err());
        assert!(parse_timestamp("99999999999:00.00").is_err());
    }

    #[test]
    fn test_parse_single_line() {
        let seq = parse_lrc("[00:01.12] test LyRiC  ");
        assert_eq!(pairs(&seq), [(1.12, "test LyRiC")]);
    }

    #[test]
    fn test_repeat_directive() {
        let seq = parse_lrc("[0:01.0][0:05.0]hello");
        assert_eq!(pairs(&seq), [(1.0, "hello"), (5.0, "hello")]);
    }

    #[test]
    fn test_malformed_tag_is_dropped() {
        let seq = parse_lrc("[0:01.0][bad]hello");
        assert_eq!(pairs(&seq), [(1.0, "[bad]hello")]);
    }

    #[test]
    fn test_overflowing_minutes_are_skipped() {
        let seq = parse_lrc("[99999999999:00.00][0:02.0]kept");
        assert_eq!(pairs(&seq), [(2.0, "kept")]);
    }

    #[test]
    fn test_timestamps_inside_a_record() {
        let seq = parse_lrc("[0:01.0] hi [0:05.0] there");
        assert_eq!(pairs(&seq), [(1.0, "there"), (5.0, "there")]);
    }

    #[test]
    fn test_text_before_first_timestamp() {
        let seq = parse_lrc("Intro [0:03.0]words");
        assert_eq!(pairs(&seq), [(3.0, "words")]);
    }

    #[test]
    fn test_timestamp_without_fraction_is_not_a_tag() {
        let seq = parse_lrc("[2:03]x\n[0:04.5]y");
        assert_eq!(pairs(&seq), [(4.5, "y")]);
    }

    #[test]
    fn test_untimed_records_are_ignored() {
        let content = "[ti:Test Song]\n[ar:Test Artist]\njust some words\n\n[00:05.00]Second line\n[00:00.00]First line";
        let seq = parse_lrc(content);
        assert_eq!(pairs(&seq), [(0.0, "First line"), (5.0, "Second line")]);
    }

    #[test]
    fn test_brackets_inside_text_are_kept() {
        let seq = parse_lrc("[00:10.00]Hello [Chorus]");
        assert_eq!(pairs(&seq), [(10.0, "Hello [Chorus]")]);
    }

    #[test]
    fn test_sort_is_stable_on_equal_offsets() {
        let content = "[00:03.00]third\n[00:01.00]first\n[00:02.00]second a\n[00:02.00]second b";
        let seq = parse_lrc(content);
        assert_eq!(
            pairs(&seq),
            [
                (1.0, "first"),
                (2.0, "second a"),
                (2.0, "second b"),
                (3.0, "third"),
            ]
        );
    }

    #[test]
    fn test_empty_text_line_is_kept() {
        let seq = parse_lrc("[00:01.00]\n[00:02.00]words");
        assert_eq!(pairs(&seq), [(1.0, ""), (2.0, "words")]);
    }

    #[test]
    fn test_unparseable_input_gives_sentinel() {
        for content in ["", "plain lyrics\nwithout timing", "[bad]x", "[00:01.00"] {
            let seq = parse_lrc(content);
            assert_eq!(pairs(&seq), [(0.0, UNPARSEABLE_TEXT)], "input {:?}", content);
        }
    }

    #[test]
    fn test_output_is_sorted() {
        let content = "[01:00.00]c\n[00:30.00][02:00.00]b\n[00:10.00]a";
        let seq = parse_lrc(content);
        assert!(seq.windows(2).all(|w| w[0].offset <= w[1].offset));
        assert_eq!(seq.len(), 4);
    }
}
