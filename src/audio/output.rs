use std::path::Path;
use std::time::Duration;

use crate::error::AudioError;

/// Something that can turn a file into a playable [`Voice`].
///
/// Implementations are created on the engine worker and never leave it, so
/// neither trait requires `Send`.
pub trait AudioOutput {
    /// Open `path` paused, positioned at `start_at`.
    fn open(&mut self, path: &Path, start_at: Duration) -> Result<Box<dyn Voice>, AudioError>;
}

/// One decoder bound to one file.
pub trait Voice {
    fn play(&mut self);
    fn pause(&mut self);
    fn is_paused(&self) -> bool;

    /// Position from the start of the file.
    fn position(&self) -> Duration;

    /// Total length as reported by the decoder, if it knows.
    fn duration(&self) -> Option<Duration>;

    fn seek(&mut self, to: Duration) -> Result<(), AudioError>;

    /// True once the decoder has run out of samples.
    fn is_finished(&self) -> bool;

    fn stop(&mut self);
}
