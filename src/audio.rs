//! Decoding and rendering of single tracks.
//!
//! [`AudioOutput`] opens files into [`Voice`]s; [`PlaybackSlot`] wraps one
//! voice with its metadata and an optional pre-armed successor.

mod output;
mod sink;
mod slot;

#[cfg(test)]
pub(crate) mod testing;

pub use output::{AudioOutput, Voice};
pub use sink::{RodioOutput, RodioVoice};
pub use slot::{PlaybackSlot, SlotState};
