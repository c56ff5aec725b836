//! Commands accepted by the engine and the events it reports.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use super::state::ShuffleState;
use crate::error::CommandError;
use crate::library::TrackInfo;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    NextFolder,
    PrevFolder,
    NextTrack,
    PrevTrack,
    Play,
    Pause,
    PlayPause,
    Stop,
    /// Jump to a percentage of the current track, `0..=100`.
    Seek(u8),
    SetAudioFocus,
    UnsetAudioFocus,
    /// The current track ran out; hand over to the armed successor.
    FinishCurrent,
    /// Reconcile the folder list with disk without touching playback.
    CheckFolders,
    /// Stop, keeping the position for the next start.
    StopAndSave,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::NextFolder => "NEXT_FOLDER",
            Command::PrevFolder => "PREV_FOLDER",
            Command::NextTrack => "NEXT_TRACK",
            Command::PrevTrack => "PREV_TRACK",
            Command::Play => "PLAY",
            Command::Pause => "PAUSE",
            Command::PlayPause => "PLAY_PAUSE",
            Command::Stop => "STOP",
            Command::Seek(_) => "SEEK",
            Command::SetAudioFocus => "SET_AUDIO_FOCUS",
            Command::UnsetAudioFocus => "UNSET_AUDIO_FOCUS",
            Command::FinishCurrent => "FINISH_CURRENT",
            Command::CheckFolders => "CHECK_FOLDERS",
            Command::StopAndSave => "STOP_AND_SAVE",
        }
    }

    /// Build a command from an action name and its string arguments.
    ///
    /// Only `SEEK` takes an argument: exactly one base-10 integer in `0..=100`.
    pub fn from_action(name: &str, args: &[&str]) -> Result<Self, CommandError> {
        let cmd = match name.trim().to_ascii_uppercase().as_str() {
            "NEXT_FOLDER" => Command::NextFolder,
            "PREV_FOLDER" => Command::PrevFolder,
            "NEXT_TRACK" => Command::NextTrack,
            "PREV_TRACK" => Command::PrevTrack,
            "PLAY" => Command::Play,
            "PAUSE" => Command::Pause,
            "PLAY_PAUSE" => Command::PlayPause,
            "STOP" => Command::Stop,
            "SET_AUDIO_FOCUS" => Command::SetAudioFocus,
            "UNSET_AUDIO_FOCUS" => Command::UnsetAudioFocus,
            "FINISH_CURRENT" => Command::FinishCurrent,
            "CHECK_FOLDERS" => Command::CheckFolders,
            "STOP_AND_SAVE" => Command::StopAndSave,
            "SEEK" => {
                let [arg] = args else {
                    return Err(CommandError::Arity {
                        command: "SEEK",
                        got: args.len(),
                    });
                };
                return parse_percent(arg).map(Command::Seek);
            }
            _ => return Err(CommandError::Unknown(name.to_string())),
        };
        Ok(cmd)
    }
}

fn parse_percent(raw: &str) -> Result<u8, CommandError> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| CommandError::NotAnInteger(raw.to_string()))?;
    match u8::try_from(value) {
        Ok(p) if p <= 100 => Ok(p),
        _ => Err(CommandError::OutOfRange(value)),
    }
}

/// Parses lines such as `"NEXT_TRACK"` or `"SEEK 50"`.
impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();
        Command::from_action(name, &args)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Seek(p) => write!(f, "SEEK {p}"),
            other => f.write_str(other.name()),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TrackState {
    Play,
    Pause,
    Stop,
    Complete,
}

/// One state change of one track, as delivered to channel listeners.
#[derive(Debug, Clone)]
pub struct TrackEvent {
    pub track: TrackInfo,
    pub state: TrackState,
}

/// What the worker last published for readers on other threads.
#[derive(Debug, Clone, Default)]
pub struct PlaybackSnapshot {
    /// The active track, with its position at publication time.
    pub track: Option<TrackInfo>,
    pub playing: bool,
    pub shuffle: ShuffleState,
}

pub type SnapshotHandle = Arc<Mutex<PlaybackSnapshot>>;
