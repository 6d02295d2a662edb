//! Mirrors player events into lyrics state and reports active line changes.

pub mod events;
pub mod state;

pub use events::{PlaybackEvent, SessionUpdate};
pub use state::LyricsState;

use tokio::sync::mpsc;

/// Drain player events until playback ends or the player side hangs up.
///
/// Returns the final state so callers can inspect where playback stopped.
pub async fn run(
    mut state: LyricsState,
    mut rx: mpsc::Receiver<PlaybackEvent>,
    tx: mpsc::Sender<SessionUpdate>,
) -> LyricsState {
    while let Some(ev) = rx.recv().await {
        let Some(update) = state.apply(ev) else {
            continue;
        };
        let finished = update == SessionUpdate::Finished;
        if tx.send(update).await.is_err() {
            tracing::debug!("session listener gone");
            break;
        }
        if finished {
            break;
        }
    }
    state
}
