//! Active line lookup for a playback position

use super::parser::{LyricLine, Timestamp};

/// Index of the line to highlight at `position_ms`.
///
/// That is the last timed line starting at or before the position. Untimed
/// lines sort after every timed one, so they can never be picked and never
/// cut the search short. Returns `None` before the first timed line, for
/// empty input, and for untimed-only input.
pub fn active_index(lines: &[LyricLine], position_ms: u64) -> Option<usize> {
    // Sorted input: timed <= position, then timed > position, then untimed.
    let reached = lines.partition_point(|line| match line.timestamp {
        Timestamp::Timed(ms) => ms <= position_ms,
        Timestamp::Untimed => false,
    });
    reached.checked_sub(1)
}

/// The slice of lines a renderer shows around the active one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LyricsWindow<'a> {
    pub lines: &'a [LyricLine],
    /// Index in `lines` of the active line, if it is inside the window
    pub active: Option<usize>,
    /// Index in the full lyrics of `lines[0]`
    pub offset: usize,
}

impl<'a> LyricsWindow<'a> {
    /// `context` lines before and after the active line. With nothing active
    /// the window starts at the top.
    pub fn around(lines: &'a [LyricLine], active: Option<usize>, context: usize) -> Self {
        let center = active.unwrap_or(0).min(lines.len().saturating_sub(1));
        let start = center.saturating_sub(context);
        let end = center.saturating_add(context).saturating_add(1).min(lines.len());

        Self {
            lines: &lines[start..end],
            active: active.filter(|&i| i < lines.len()).map(|i| i - start),
            offset: start,
        }
    }
}
