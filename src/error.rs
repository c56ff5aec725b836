//! Error types shared across the crate.
//!
//! Failures inside the worker are logged there and never reach the caller.
//! Only start-up errors and malformed command input are returned.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the engine outside the command loop (start-up, I/O).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("persistence error: {0}")]
    Store(#[from] StoreError),

    #[error("rejected command: {0}")]
    Command(#[from] CommandError),

    #[error("no playable content found under {}", .0.display())]
    NoContent(PathBuf),

    #[error("engine worker is not running")]
    WorkerGone,
}

/// Failures from the decoder/renderer layer.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device: {0}")]
    Device(String),

    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("seek failed on {}: {reason}", path.display())]
    Seek { path: PathBuf, reason: String },

    #[error("playback slot for {} was already released", .0.display())]
    Released(PathBuf),
}

/// Malformed command input. Rejected before it reaches the queue.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("{command} expects exactly one argument, got {got}")]
    Arity { command: &'static str, got: usize },

    #[error("invalid integer argument: {0:?}")]
    NotAnInteger(String),

    #[error("seek percent out of range: {0}")]
    OutOfRange(i64),
}

/// Persistence failures. Loading maps all of these to "no record".
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("record version {found} is not supported (expected {expected})")]
    Version { found: u64, expected: u64 },

    #[error("record kind mismatch: found {found:?}, expected {expected:?}")]
    Kind { found: String, expected: &'static str },
}
