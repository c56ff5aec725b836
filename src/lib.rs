//! Album shuffle playback engine.
//!
//! Folders under a music root are treated as albums. They are played in a
//! shuffled order, each album's tracks in file-name order, and the position
//! survives restarts.

pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod library;
pub mod logging;

pub use engine::{Command, Engine, Signal, TrackEvent, TrackState};
pub use error::{AudioError, CommandError, EngineError, StoreError};
