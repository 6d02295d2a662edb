use crate::lyrics::{LyricLine, ParsedLyrics};

/// Player callbacks mirrored into the session
#[derive(Debug, Clone)]
pub enum PlaybackEvent {
    LyricsLoaded(ParsedLyrics),
    Position { ms: u64 },
    Seeked { ms: u64 },
    Paused,
    Resumed,
    Ended,
}

/// What a renderer needs to hear about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    /// The highlighted line moved (or went away)
    ActiveLine {
        index: Option<usize>,
        line: Option<LyricLine>,
    },
    Finished,
}
