use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use super::output::{AudioOutput, Voice};
use crate::error::AudioError;
use crate::library::{TrackInfo, load_track_info};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SlotState {
    New,
    Prepared,
    /// Terminal. The voice is gone and the slot cannot be reused.
    Released,
}

/// One track bound to one voice, plus an optional pre-armed successor.
///
/// The successor is prepared while this slot plays so that it can take over
/// without opening its file again when this one finishes.
pub struct PlaybackSlot {
    path: PathBuf,
    state: SlotState,
    voice: Option<Box<dyn Voice>>,
    info: Option<TrackInfo>,
    next: Option<Box<PlaybackSlot>>,
}

impl PlaybackSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: SlotState::New,
            voice: None,
            info: None,
            next: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> SlotState {
        self.state
    }

    /// Open the decoder and load metadata. A prepared slot is left alone.
    pub fn prepare(&mut self, output: &mut dyn AudioOutput) -> Result<(), AudioError> {
        match self.state {
            SlotState::Prepared => return Ok(()),
            SlotState::Released => return Err(AudioError::Released(self.path.clone())),
            SlotState::New => {}
        }

        let voice = output.open(&self.path, Duration::ZERO)?;
        self.info = Some(load_track_info(&self.path, voice.duration()));
        self.voice = Some(voice);
        self.state = SlotState::Prepared;
        debug!(path = %self.path.display(), "slot prepared");
        Ok(())
    }

    /// Whether the file behind this slot still exists.
    pub fn is_valid(&self) -> bool {
        self.path.is_file()
    }

    /// Start rendering at `start_at`, preparing first if needed.
    pub fn play(
        &mut self,
        output: &mut dyn AudioOutput,
        start_at: Duration,
    ) -> Result<(), AudioError> {
        self.prepare(output)?;

        if !start_at.is_zero() {
            let seeked = match self.voice.as_mut() {
                Some(voice) => voice.seek(start_at),
                None => Err(AudioError::Released(self.path.clone())),
            };
            if let Err(e) = seeked {
                warn!("{e}; reopening at offset");
                if let Some(mut old) = self.voice.take() {
                    old.stop();
                }
                self.voice = Some(output.open(&self.path, start_at)?);
            }
        }

        match self.voice.as_mut() {
            Some(voice) => {
                voice.play();
                Ok(())
            }
            None => Err(AudioError::Released(self.path.clone())),
        }
    }

    pub fn pause(&mut self) {
        if let Some(voice) = self.voice.as_mut() {
            voice.pause();
        }
    }

    pub fn resume(&mut self) {
        if let Some(voice) = self.voice.as_mut() {
            voice.play();
        }
    }

    pub fn is_playing(&self) -> bool {
        self.voice.as_ref().is_some_and(|v| !v.is_paused())
    }

    pub fn seek(&mut self, to: Duration) -> Result<(), AudioError> {
        match self.voice.as_mut() {
            Some(voice) => voice.seek(to),
            None => Err(AudioError::Released(self.path.clone())),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.voice
            .as_ref()
            .map(|v| v.position())
            .unwrap_or(Duration::ZERO)
    }

    pub fn duration(&self) -> Duration {
        self.info
            .as_ref()
            .map(TrackInfo::duration)
            .unwrap_or(Duration::ZERO)
    }

    /// Metadata with the current position filled in.
    pub fn info(&self) -> Option<TrackInfo> {
        let mut info = self.info.clone()?;
        info.set_elapsed(self.elapsed());
        Some(info)
    }

    /// Prepare `path` as the successor, replacing any armed one.
    pub fn arm_next(
        &mut self,
        output: &mut dyn AudioOutput,
        path: impl Into<PathBuf>,
    ) -> Result<(), AudioError> {
        self.disarm_next();
        let mut next = PlaybackSlot::new(path);
        next.prepare(output)?;
        self.next = Some(Box::new(next));
        Ok(())
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn next_path(&self) -> Option<&Path> {
        self.next.as_deref().map(PlaybackSlot::path)
    }

    pub fn take_next(&mut self) -> Option<PlaybackSlot> {
        self.next.take().map(|b| *b)
    }

    pub fn disarm_next(&mut self) {
        if let Some(mut next) = self.next.take() {
            next.release();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.voice.as_ref().is_some_and(|v| v.is_finished())
    }

    /// Stop and drop the voice. The armed successor goes with it.
    pub fn release(&mut self) {
        if self.state == SlotState::Released {
            return;
        }
        self.disarm_next();
        if let Some(mut voice) = self.voice.take() {
            voice.stop();
        }
        self.state = SlotState::Released;
    }
}

impl Drop for PlaybackSlot {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for PlaybackSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackSlot")
            .field("path", &self.path)
            .field("state", &self.state)
            .field("next", &self.next_path())
            .finish()
    }
}
