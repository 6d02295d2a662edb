//! LRC format parser
//!
//! Turns raw LRC text into an ordered list of lines:
//! [mm:ss.xx] Lyrics line here
//!
//! Example:
//! [00:12.34] Hello world
//! [00:15.00] Another line
//! Credits line without a tag
//!
//! Input is handled line by line first. When that yields nothing (for
//! instance the whole file arrived on one physical line) the text is scanned
//! again for every tag, each tag's text running up to the next tag.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt::{self, Write as _};

/// One leading `[mm:ss.f]`, `[mm:ss.ff]` or `[mm:ss.fff]` tag.
static LEADING_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[([0-9]+):([0-9]{2})\.([0-9]{1,3})\]").expect("valid tag regex"));

/// Any timestamp tag, anywhere in the text.
static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([0-9]+):([0-9]{2})\.([0-9]{1,3})\]").expect("valid tag regex"));

/// Substrings that mark a line as LRC metadata rather than lyrics.
const METADATA_KEYS: [&str; 6] = ["id:", "ti:", "ar:", "al:", "by:", "offset:"];

/// When a line should be shown.
///
/// Timed lines always order before untimed ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Timestamp {
    /// Milliseconds from the start of the track
    Timed(u64),
    /// No tag (credits, titles, plain lyrics)
    Untimed,
}

impl Timestamp {
    pub fn millis(self) -> Option<u64> {
        match self {
            Timestamp::Timed(ms) => Some(ms),
            Timestamp::Untimed => None,
        }
    }

    pub fn is_timed(self) -> bool {
        matches!(self, Timestamp::Timed(_))
    }
}

impl fmt::Display for Timestamp {
    /// `mm:ss.cc`, the LRC tag body
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Timestamp::Timed(ms) => {
                let min = ms / 60_000;
                let sec = (ms % 60_000) / 1000;
                let cs = (ms % 1000) / 10;
                write!(f, "{:02}:{:02}.{:02}", min, sec, cs)
            }
            Timestamp::Untimed => f.write_str("--:--.--"),
        }
    }
}

/// A single line of lyrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LyricLine {
    #[serde(rename = "timestamp_ms", serialize_with = "serialize_timestamp")]
    pub timestamp: Timestamp,
    /// Trimmed, never empty
    pub text: String,
}

impl LyricLine {
    pub fn timed(time_ms: u64, text: impl Into<String>) -> Self {
        Self {
            timestamp: Timestamp::Timed(time_ms),
            text: text.into(),
        }
    }

    pub fn untimed(text: impl Into<String>) -> Self {
        Self {
            timestamp: Timestamp::Untimed,
            text: text.into(),
        }
    }
}

impl Ord for LyricLine {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.text.cmp(&other.text))
    }
}

impl PartialOrd for LyricLine {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn serialize_timestamp<S: serde::Serializer>(ts: &Timestamp, s: S) -> Result<S::Ok, S::Error> {
    match ts.millis() {
        Some(ms) => s.serialize_u64(ms),
        None => s.serialize_none(),
    }
}

/// Parsed lyrics, sorted by timestamp then text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLyrics {
    lines: Vec<LyricLine>,
}

impl ParsedLyrics {
    /// Parse LRC formatted lyrics. Never fails: malformed input just yields
    /// fewer (possibly zero) lines.
    pub fn parse(content: &str) -> Self {
        let mut lines = Vec::new();

        // Line-oriented pass, only meaningful when newlines survived.
        if content.lines().nth(1).is_some() {
            for line in content.lines() {
                parse_physical_line(line, &mut lines);
            }
        }

        if lines.is_empty() {
            scan_tags(content, &mut lines);
        }

        lines.sort();
        tracing::debug!(lines = lines.len(), "parsed lyrics");

        Self { lines }
    }

    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether at least one line carries a timestamp
    pub fn is_synced(&self) -> bool {
        self.lines.first().is_some_and(|l| l.timestamp.is_timed())
    }

    /// Render back to normalized LRC (`[mm:ss.cc]text`, untimed lines bare)
    pub fn to_lrc(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            if line.timestamp.is_timed() {
                let _ = write!(out, "[{}]", line.timestamp);
            }
            out.push_str(&line.text);
            out.push('\n');
        }
        out
    }
}

/// Handle one physical line of the line-oriented pass.
fn parse_physical_line(raw: &str, out: &mut Vec<LyricLine>) {
    let line = raw.trim();
    if line.is_empty() {
        return;
    }

    // Collect every leading tag: [00:10.00][00:20.00]Chorus. Each tag gets
    // its own line with the shared text, rather than leaving the later tags
    // inside the text.
    let mut timestamps = Vec::new();
    let mut rest = line;
    while let Some(caps) = LEADING_TAG_RE.captures(rest) {
        timestamps.push(tag_millis(&caps[1], &caps[2], &caps[3]));
        rest = &rest[caps[0].len()..];
    }

    if timestamps.is_empty() {
        push_untimed(line, out);
        return;
    }

    let text = rest.trim();
    if text.is_empty() || is_metadata(text) {
        return;
    }
    out.extend(timestamps.into_iter().map(|ms| LyricLine::timed(ms, text)));
}

/// Fallback pass: find every tag in the whole text.
fn scan_tags(content: &str, out: &mut Vec<LyricLine>) {
    // (millis, start of its text) for the tag whose text is still open
    let mut pending: Option<(u64, usize)> = None;
    let mut leading_end = content.len();

    for caps in TAG_RE.captures_iter(content) {
        let Some(tag) = caps.get(0) else { continue };
        match pending {
            Some((ms, start)) => push_timed(ms, &content[start..tag.start()], out),
            None => leading_end = tag.start(),
        }
        pending = Some((tag_millis(&caps[1], &caps[2], &caps[3]), tag.end()));
    }

    push_untimed(content[..leading_end].trim(), out);
    if let Some((ms, start)) = pending {
        push_timed(ms, &content[start..], out);
    }
}

fn push_timed(ms: u64, text: &str, out: &mut Vec<LyricLine>) {
    let text = text.trim();
    if text.is_empty() || is_metadata(text) {
        return;
    }
    out.push(LyricLine::timed(ms, text));
}

fn push_untimed(text: &str, out: &mut Vec<LyricLine>) {
    if text.is_empty() || is_bracket_only(text) || is_metadata(text) {
        return;
    }
    out.push(LyricLine::untimed(text));
}

/// Convert captured tag fields to milliseconds. Fields that don't fit count
/// as 0; a one or two digit fraction is scaled up to milliseconds.
fn tag_millis(min: &str, sec: &str, frac: &str) -> u64 {
    let min: u64 = min.parse().unwrap_or(0);
    let sec: u64 = sec.parse().unwrap_or(0);
    let frac_value: u64 = frac.parse().unwrap_or(0);
    let ms = match frac.len() {
        1 => frac_value * 100,
        2 => frac_value * 10,
        _ => frac_value,
    };
    min.saturating_mul(60)
        .saturating_add(sec)
        .saturating_mul(1000)
        .saturating_add(ms)
}

fn is_metadata(text: &str) -> bool {
    METADATA_KEYS.iter().any(|key| text.contains(key))
}

fn is_bracket_only(text: &str) -> bool {
    text.starts_with('[') && text.ends_with(']')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timed(ms: u64, text: &str) -> LyricLine {
        LyricLine::timed(ms, text)
    }

    #[test]
    fn test_tag_millis_scaling() {
        assert_eq!(tag_millis("00", "01", "5"), 1500);
        assert_eq!(tag_millis("00", "01", "50"), 1500);
        assert_eq!(tag_millis("00", "01", "500"), 1500);
        assert_eq!(tag_millis("01", "30", "00"), 90000);
        assert_eq!(tag_millis("99999999999999999999999", "01", "000"), 1000);
    }

    #[test]
    fn test_fraction_precision() {
        for input in ["[00:01.5]x\n", "[00:01.50]x\n", "[00:01.500]x\n", "[00:01.50]x"] {
            let parsed = ParsedLyrics::parse(input);
            assert_eq!(parsed.lines(), &[timed(1500, "x")], "input {input:?}");
        }
    }

    #[test]
    fn test_parse_lrc() {
        let lrc = "[00:00.00]Line One\n[00:03.50]Line Two\nCredits by Someone";
        let parsed = ParsedLyrics::parse(lrc);
        assert_eq!(
            parsed.lines(),
            &[
                timed(0, "Line One"),
                timed(3500, "Line Two"),
                LyricLine::untimed("Credits by Someone"),
            ]
        );
        assert!(parsed.is_synced());
    }

    #[test]
    fn test_metadata_dropped() {
        let lrc = r#"
[ti:Test Song]
[ar:Test Artist]
[00:00.00]ar: Some Artist
[00:12.34]First line
id: 12345
[offset:+200]
[00:15.00]Second line
"#;
        let parsed = ParsedLyrics::parse(lrc);
        assert_eq!(
            parsed.lines(),
            &[timed(12340, "First line"), timed(15000, "Second line")]
        );
    }

    #[test]
    fn test_untimed_sorted_last() {
        let parsed = ParsedLyrics::parse("[00:05.00]B\nIntro Credit\n[00:01.00]A");
        assert_eq!(
            parsed.lines(),
            &[
                timed(1000, "A"),
                timed(5000, "B"),
                LyricLine::untimed("Intro Credit"),
            ]
        );
    }

    #[test]
    fn test_ties_broken_by_text() {
        let parsed = ParsedLyrics::parse("[00:02.00]b\n[00:02.00]a\nzz\nyy");
        let texts: Vec<_> = parsed.lines().iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["a", "b", "yy", "zz"]);
    }

    #[test]
    fn test_parse_is_deterministic() {
        let lrc = "[00:05.00]B\nIntro\n[00:01.00]A\n[00:01.00]A\nOutro";
        assert_eq!(ParsedLyrics::parse(lrc), ParsedLyrics::parse(lrc));
    }

    #[test]
    fn test_blank_input() {
        assert!(ParsedLyrics::parse("").is_empty());
        assert!(ParsedLyrics::parse("\n\n   \n\t\n").is_empty());
        assert!(ParsedLyrics::parse("[ti:Only]\n[ar:Meta]").is_empty());
    }

    #[test]
    fn test_bracket_only_lines_dropped() {
        let parsed = ParsedLyrics::parse("[Chorus]\nChorus\n[00:01.00]la la");
        assert_eq!(
            parsed.lines(),
            &[timed(1000, "la la"), LyricLine::untimed("Chorus")]
        );
    }

    #[test]
    fn test_repeated_leading_tags() {
        let parsed = ParsedLyrics::parse("[00:10.00][00:20.00]Chorus\n[00:15.00]Verse");
        assert_eq!(
            parsed.lines(),
            &[timed(10000, "Chorus"), timed(15000, "Verse"), timed(20000, "Chorus")]
        );
    }

    #[test]
    fn test_non_ascii_digits_are_not_tags() {
        let parsed = ParsedLyrics::parse("[٠٠:٠١.٠٠]x\n[00:01.00]y");
        assert_eq!(
            parsed.lines(),
            &[timed(1000, "y"), LyricLine::untimed("[٠٠:٠١.٠٠]x")]
        );
    }

    #[test]
    fn test_timed_line_without_text_dropped() {
        let parsed = ParsedLyrics::parse("[00:01.00]\n[00:02.00]   \n[00:03.00]end");
        assert_eq!(parsed.lines(), &[timed(3000, "end")]);
    }

    #[test]
    fn test_single_line_fallback() {
        let parsed = ParsedLyrics::parse("Title [00:01.00]a [00:02.50]b[00:03.00]c");
        assert_eq!(
            parsed.lines(),
            &[
                timed(1000, "a"),
                timed(2500, "b"),
                timed(3000, "c"),
                LyricLine::untimed("Title"),
            ]
        );
    }

    #[test]
    fn test_fallback_drops_metadata_segments() {
        let parsed = ParsedLyrics::parse("[00:00.00]by: someone[00:01.00]hello");
        assert_eq!(parsed.lines(), &[timed(1000, "hello")]);
    }

    #[test]
    fn test_single_untimed_line() {
        let parsed = ParsedLyrics::parse("  just words  ");
        assert_eq!(parsed.lines(), &[LyricLine::untimed("just words")]);
        assert!(!parsed.is_synced());
    }

    #[test]
    fn test_to_lrc() {
        let parsed = ParsedLyrics::parse("[01:02.345]a\nplain\n[00:00.10]b");
        assert_eq!(parsed.to_lrc(), "[00:00.10]b\n[01:02.34]a\nplain\n");
        let reparsed = ParsedLyrics::parse(&parsed.to_lrc());
        assert_eq!(reparsed.lines().get(1), Some(&timed(62340, "a")));
    }

    #[test]
    fn test_json_shape() {
        let parsed = ParsedLyrics::parse("[00:01.00]a\nb");
        let json = serde_json::to_string(parsed.lines()).unwrap();
        assert_eq!(
            json,
            r#"[{"timestamp_ms":1000,"text":"a"},{"timestamp_ms":null,"text":"b"}]"#
        );
    }
}
