use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use super::load::default_music_dir;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/albumshuffle/config.toml` or
/// `~/.config/albumshuffle/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `ALBUMSHUFFLE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub playback: PlaybackSettings,
    pub storage: StorageSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Directory whose sub-folders are shuffled as albums.
    pub root: PathBuf,
    /// File extensions that count as tracks (case-insensitive, without dot).
    /// Empty means every regular file counts.
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            root: default_music_dir(),
            extensions: Vec::new(),
            follow_links: true,
            include_hidden: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Seconds a user pause may last before playback is stopped (position is kept).
    /// Set to 0 to never auto-stop.
    pub idle_stop_secs: u64,
    /// How often the worker checks the current voice for natural completion
    /// while the command queue is idle (milliseconds).
    pub poll_interval_ms: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            idle_stop_secs: 30,
            poll_interval_ms: 100,
        }
    }
}

impl PlaybackSettings {
    pub fn idle_stop(&self) -> Option<Duration> {
        (self.idle_stop_secs > 0).then(|| Duration::from_secs(self.idle_stop_secs))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Where the shuffle state and resume snapshot live.
    /// Defaults to `$XDG_STATE_HOME/albumshuffle` or `~/.local/state/albumshuffle`.
    pub state_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}
