//! Simulated playback clock
//!
//! Stands in for a real player when following lyrics from the command line:
//! emits `Position` events at a fixed poll interval, then `Ended`. Pause,
//! resume and seek requests arrive on a control channel and are echoed as
//! the matching player events.

use crate::lyrics::LyricLine;
use crate::session::PlaybackEvent;
use anyhow::Context;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockControl {
    Pause,
    Resume,
    Seek(u64),
}

impl ClockControl {
    /// `p`/`pause`, `r`/`resume`, `s <pos>`/`seek <pos>`
    pub fn parse(input: &str) -> anyhow::Result<Self> {
        let mut parts = input.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("p" | "pause"), None) => Ok(Self::Pause),
            (Some("r" | "resume"), None) => Ok(Self::Resume),
            (Some("s" | "seek"), Some(pos)) => Ok(Self::Seek(parse_position(pos)?)),
            _ => anyhow::bail!("unknown command {input:?} (pause, resume, seek <pos>)"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlaybackClock {
    pub start_ms: u64,
    pub end_ms: u64,
    pub poll_interval: Duration,
    /// Playback speed multiplier
    pub speed: f64,
}

impl PlaybackClock {
    /// Default stop position: `tail_ms` after the last timed line
    pub fn default_end(lines: &[LyricLine], tail_ms: u64) -> u64 {
        let last = lines
            .iter()
            .filter_map(|l| l.timestamp.millis())
            .max()
            .unwrap_or(0);
        last.saturating_add(tail_ms)
    }

    /// Position reached `elapsed` wall time after being at `base_ms`
    pub fn advance(&self, base_ms: u64, elapsed: Duration) -> u64 {
        let played = elapsed.as_secs_f64() * 1000.0 * self.speed.max(0.0);
        base_ms.saturating_add(played as u64).min(self.end_ms)
    }

    /// Tick until `end_ms`, then send `Ended`. Stops early if the receiver
    /// goes away.
    pub async fn run(self, tx: mpsc::Sender<PlaybackEvent>, mut controls: mpsc::Receiver<ClockControl>) {
        let mut base_ms = self.start_ms.min(self.end_ms);
        let mut anchor = Instant::now();
        let mut paused = false;
        let mut controls_open = true;

        let mut ticker = tokio::time::interval(self.poll_interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if paused {
                        continue;
                    }
                    let ms = self.advance(base_ms, anchor.elapsed());
                    if tx.send(PlaybackEvent::Position { ms }).await.is_err() {
                        return;
                    }
                    if ms >= self.end_ms {
                        break;
                    }
                }
                ctl = controls.recv(), if controls_open => {
                    let Some(ctl) = ctl else {
                        controls_open = false;
                        continue;
                    };
                    let now_ms = if paused {
                        base_ms
                    } else {
                        self.advance(base_ms, anchor.elapsed())
                    };
                    let event = match ctl {
                        ClockControl::Pause => {
                            paused = true;
                            base_ms = now_ms;
                            PlaybackEvent::Paused
                        }
                        ClockControl::Resume => {
                            paused = false;
                            base_ms = now_ms;
                            anchor = Instant::now();
                            PlaybackEvent::Resumed
                        }
                        ClockControl::Seek(ms) => {
                            base_ms = ms.min(self.end_ms);
                            anchor = Instant::now();
                            PlaybackEvent::Seeked { ms: base_ms }
                        }
                    };
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
            }
        }
        let _ = tx.send(PlaybackEvent::Ended).await;
    }
}

/// Parse a position: `1500` (ms), `12.5` (seconds), `1:02` or `01:02.250`.
pub fn parse_position(s: &str) -> anyhow::Result<u64> {
    let s = s.trim();
    let (minutes, rest) = match s.split_once(':') {
        Some((m, rest)) => (
            m.parse::<u64>().with_context(|| format!("bad minutes in {s:?}"))?,
            rest,
        ),
        None if !s.contains('.') => {
            return s.parse::<u64>().with_context(|| format!("bad position {s:?}"));
        }
        None => (0, s),
    };

    let seconds: f64 = rest
        .parse()
        .with_context(|| format!("bad seconds in {s:?}"))?;
    if !seconds.is_finite() || seconds < 0.0 {
        anyhow::bail!("bad seconds in {s:?}");
    }
    let seconds_ms = (seconds * 1000.0).round();
    if seconds_ms >= u64::MAX as f64 {
        anyhow::bail!("position out of range: {s:?}");
    }
    minutes
        .checked_mul(60_000)
        .and_then(|ms| ms.checked_add(seconds_ms as u64))
        .with_context(|| format!("position out of range: {s:?}"))
}
