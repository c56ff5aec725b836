//! The playback engine: one worker thread that owns the shuffle state and
//! the playing slot, fed by a command queue.

mod events;
mod player;
mod signals;
mod state;
mod store;
mod thread;
mod types;

pub use events::{LogListener, PlayerListener};
pub use player::{Engine, EngineBuilder};
pub use signals::{AudioFocus, MediaKey, NoFocus, Signal};
pub use state::ShuffleState;
pub use store::{FORMAT_VERSION, PersistenceStore, Record};
pub use types::{Command, PlaybackSnapshot, TrackEvent, TrackState};
