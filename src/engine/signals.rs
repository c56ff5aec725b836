//! External happenings and how the engine reacts to them.

use tracing::debug;

use super::types::Command;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MediaKey {
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Previous,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Signal {
    FocusGained,
    FocusLost,
    HeadsetUnplugged,
    BluetoothDisconnected,
    StorageMounted,
    StorageEjected,
    Shutdown,
    MediaKey(MediaKey),
    PlaybackCompleted,
}

impl Signal {
    /// The command this signal turns into.
    pub fn command(self) -> Command {
        match self {
            Signal::FocusGained => Command::SetAudioFocus,
            Signal::FocusLost => Command::UnsetAudioFocus,
            Signal::HeadsetUnplugged | Signal::BluetoothDisconnected => Command::Pause,
            Signal::StorageMounted => Command::CheckFolders,
            Signal::StorageEjected | Signal::Shutdown => Command::StopAndSave,
            Signal::MediaKey(key) => match key {
                MediaKey::Play | MediaKey::Pause | MediaKey::PlayPause => Command::PlayPause,
                MediaKey::Stop => Command::Stop,
                MediaKey::Next => Command::NextTrack,
                MediaKey::Previous => Command::PrevTrack,
            },
            Signal::PlaybackCompleted => Command::FinishCurrent,
        }
    }
}

/// The platform's audio focus arbiter.
///
/// `request` returns whether focus was granted. The engine requests focus
/// before starting a track and abandons it on stop.
pub trait AudioFocus: Send {
    fn request(&mut self) -> bool;
    fn abandon(&mut self);
}

/// Always grants focus. Used where no arbiter exists.
#[derive(Debug, Default)]
pub struct NoFocus;

impl AudioFocus for NoFocus {
    fn request(&mut self) -> bool {
        debug!("audio focus requested");
        true
    }

    fn abandon(&mut self) {
        debug!("audio focus abandoned");
    }
}
