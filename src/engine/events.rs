use std::sync::mpsc::Sender;

use tracing::info;

use super::types::{TrackEvent, TrackState};
use crate::library::TrackInfo;

/// Receives every track state change, on the engine worker, in order.
pub trait PlayerListener: Send {
    fn track_state_changed(&mut self, track: &TrackInfo, state: TrackState);
}

impl PlayerListener for Sender<TrackEvent> {
    fn track_state_changed(&mut self, track: &TrackInfo, state: TrackState) {
        // A dropped receiver just stops listening.
        let _ = self.send(TrackEvent {
            track: track.clone(),
            state,
        });
    }
}

/// Logs each change at info level.
#[derive(Debug, Default)]
pub struct LogListener;

impl PlayerListener for LogListener {
    fn track_state_changed(&mut self, track: &TrackInfo, state: TrackState) {
        info!(
            ?state,
            elapsed_ms = track.elapsed_ms,
            duration_ms = track.duration_ms,
            "{}",
            track.display()
        );
    }
}
