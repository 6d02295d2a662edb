use super::events::{PlaybackEvent, SessionUpdate};
use crate::lyrics::{ParsedLyrics, active_index};

/// Lyrics plus the playback state they are resolved against
#[derive(Debug, Clone, Default)]
pub struct LyricsState {
    pub lyrics: Option<ParsedLyrics>,
    pub position_ms: u64,
    pub paused: bool,
    pub finished: bool,
    active: Option<usize>,
}

impl LyricsState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// Fold one player event in. Returns an update only when something a
    /// renderer shows has changed.
    pub fn apply(&mut self, event: PlaybackEvent) -> Option<SessionUpdate> {
        match event {
            PlaybackEvent::LyricsLoaded(lyrics) => {
                // Whole replacement: anything highlighted belongs to the old
                // lines, so report the new resolution unless nothing was or is
                // shown.
                let shown = self.active.take();
                self.lyrics = Some(lyrics);
                self.finished = false;
                self.refresh().or_else(|| shown.map(|_| self.current()))
            }
            PlaybackEvent::Position { ms } => {
                self.position_ms = ms;
                self.refresh()
            }
            PlaybackEvent::Seeked { ms } => {
                tracing::debug!(from = self.position_ms, to = ms, "seek");
                self.position_ms = ms;
                self.refresh()
            }
            PlaybackEvent::Paused => {
                self.paused = true;
                None
            }
            PlaybackEvent::Resumed => {
                self.paused = false;
                None
            }
            PlaybackEvent::Ended => {
                self.finished = true;
                Some(SessionUpdate::Finished)
            }
        }
    }

    fn refresh(&mut self) -> Option<SessionUpdate> {
        let lines = self.lyrics.as_ref().map(|l| l.lines()).unwrap_or_default();
        let next = active_index(lines, self.position_ms);
        if next == self.active {
            return None;
        }
        self.active = next;
        Some(self.current())
    }

    fn current(&self) -> SessionUpdate {
        let lines = self.lyrics.as_ref().map(|l| l.lines()).unwrap_or_default();
        SessionUpdate::ActiveLine {
            index: self.active,
            line: self.active.and_then(|i| lines.get(i).cloned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyrics::LyricLine;

    fn loaded() -> LyricsState {
        let mut state = LyricsState::new();
        state.apply(PlaybackEvent::LyricsLoaded(ParsedLyrics::parse(
            "[00:01.00]one\n[00:02.00]two\n[00:03.00]three\ncredits",
        )));
        state
    }

    fn index(update: Option<SessionUpdate>) -> Option<Option<usize>> {
        match update {
            Some(SessionUpdate::ActiveLine { index, .. }) => Some(index),
            _ => None,
        }
    }

    #[test]
    fn test_reports_only_changes() {
        let mut state = loaded();
        assert_eq!(state.active(), None);

        assert_eq!(state.apply(PlaybackEvent::Position { ms: 500 }), None);
        assert_eq!(index(state.apply(PlaybackEvent::Position { ms: 1000 })), Some(Some(0)));
        assert_eq!(state.apply(PlaybackEvent::Position { ms: 1500 }), None);
        assert_eq!(
            state.apply(PlaybackEvent::Position { ms: 2100 }),
            Some(SessionUpdate::ActiveLine {
                index: Some(1),
                line: Some(LyricLine::timed(2000, "two")),
            })
        );
    }

    #[test]
    fn test_backward_seek() {
        let mut state = loaded();
        state.apply(PlaybackEvent::Position { ms: 3500 });
        assert_eq!(state.active(), Some(2));

        assert_eq!(index(state.apply(PlaybackEvent::Seeked { ms: 1200 })), Some(Some(0)));
        assert_eq!(index(state.apply(PlaybackEvent::Seeked { ms: 0 })), Some(None));
    }

    #[test]
    fn test_reload_resolves_against_new_lyrics() {
        let mut state = loaded();
        state.apply(PlaybackEvent::Position { ms: 2500 });
        assert_eq!(state.active(), Some(1));

        let update = state.apply(PlaybackEvent::LyricsLoaded(ParsedLyrics::parse(
            "[00:00.00]new\n[00:10.00]later",
        )));
        assert_eq!(
            update,
            Some(SessionUpdate::ActiveLine {
                index: Some(0),
                line: Some(LyricLine::timed(0, "new")),
            })
        );

        let update = state.apply(PlaybackEvent::LyricsLoaded(ParsedLyrics::default()));
        assert_eq!(index(update), Some(None));
    }

    #[test]
    fn test_reload_clears_highlight() {
        let mut state = loaded();
        state.apply(PlaybackEvent::Position { ms: 2500 });
        assert_eq!(state.active(), Some(1));

        // Nothing active at 2500 in the new lines
        let update = state.apply(PlaybackEvent::LyricsLoaded(ParsedLyrics::parse(
            "[00:05.00]later\n[00:06.00]still later",
        )));
        assert_eq!(
            update,
            Some(SessionUpdate::ActiveLine {
                index: None,
                line: None,
            })
        );
        assert_eq!(state.active(), None);

        // Nothing shown before or after: quiet
        let update = state.apply(PlaybackEvent::LyricsLoaded(ParsedLyrics::default()));
        assert_eq!(update, None);
    }

    #[test]
    fn test_reload_same_index_reports_new_line() {
        let mut state = loaded();
        state.apply(PlaybackEvent::Position { ms: 1500 });
        assert_eq!(state.active(), Some(0));

        let update = state.apply(PlaybackEvent::LyricsLoaded(ParsedLyrics::parse(
            "[00:00.50]other\n[00:09.00]next",
        )));
        assert_eq!(
            update,
            Some(SessionUpdate::ActiveLine {
                index: Some(0),
                line: Some(LyricLine::timed(500, "other")),
            })
        );
    }

    #[test]
    fn test_pause_and_end() {
        let mut state = loaded();
        assert_eq!(state.apply(PlaybackEvent::Paused), None);
        assert!(state.paused);
        assert_eq!(state.apply(PlaybackEvent::Resumed), None);
        assert!(!state.paused);
        assert_eq!(state.apply(PlaybackEvent::Ended), Some(SessionUpdate::Finished));
        assert!(state.finished);
    }
}
