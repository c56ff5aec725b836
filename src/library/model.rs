use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::metadata::load_artwork;

/// Metadata for one track, plus how far into it playback got.
///
/// Produced when a slot is prepared and refreshed with the slot's position
/// whenever it is read. The copy kept by the persistence store is what lets
/// playback resume after a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackInfo {
    pub path: PathBuf,
    pub title: String,
    pub album: Option<String>,
    pub artist: Option<String>,
    pub track_number: u32,
    pub disc_number: u32,
    pub duration_ms: u64,
    pub elapsed_ms: u64,
    #[serde(skip)]
    artwork: Artwork,
}

impl TrackInfo {
    pub fn new(path: PathBuf, title: String, duration: Duration) -> Self {
        Self {
            path,
            title,
            album: None,
            artist: None,
            track_number: 1,
            disc_number: 1,
            duration_ms: duration.as_millis() as u64,
            elapsed_ms: 0,
            artwork: Artwork::default(),
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }

    pub fn set_elapsed(&mut self, elapsed: Duration) {
        self.elapsed_ms = elapsed.as_millis() as u64;
    }

    /// Where to start this track when resuming from a snapshot.
    ///
    /// Only a position strictly inside the track is honoured; anything at or
    /// past the end restarts the track.
    pub fn resume_offset(&self, duration: Duration) -> Duration {
        let elapsed = self.elapsed();
        if !elapsed.is_zero() && elapsed < duration {
            elapsed
        } else {
            Duration::ZERO
        }
    }

    pub fn is_for(&self, path: &Path) -> bool {
        self.path == path
    }

    /// Embedded cover art, read from the file on first use and cached.
    pub fn artwork(&self) -> Option<Arc<[u8]>> {
        self.artwork
            .0
            .get_or_init(|| {
                if self.path.is_file() {
                    load_artwork(&self.path)
                } else {
                    None
                }
            })
            .clone()
    }

    /// `"Artist - Title"`, or the bare title without an artist.
    pub fn display(&self) -> String {
        match self.artist.as_deref().map(str::trim) {
            Some(a) if !a.is_empty() => format!("{a} - {}", self.title),
            _ => self.title.clone(),
        }
    }
}

#[derive(Clone, Default)]
struct Artwork(OnceLock<Option<Arc<[u8]>>>);

impl fmt::Debug for Artwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.get() {
            None => f.write_str("Artwork(unresolved)"),
            Some(None) => f.write_str("Artwork(none)"),
            Some(Some(bytes)) => write!(f, "Artwork({} bytes)", bytes.len()),
        }
    }
}
