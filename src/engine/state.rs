use std::path::{Path, PathBuf};

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::library::MediaSource;

/// The shuffled folder order and the position inside it.
///
/// `folders` is the play order. `tracks` is the sorted listing of the
/// current folder, cached so that a restart resumes without rescanning.
/// Both lists can go stale; [`ShuffleState::reconcile`] brings them back in
/// line with the disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShuffleState {
    folders: Vec<PathBuf>,
    current_folder: Option<usize>,
    tracks: Vec<PathBuf>,
    current_track: Option<usize>,
}

impl ShuffleState {
    pub fn folders(&self) -> &[PathBuf] {
        &self.folders
    }

    pub fn tracks(&self) -> &[PathBuf] {
        &self.tracks
    }

    pub fn current_folder(&self) -> Option<usize> {
        self.current_folder.filter(|&i| i < self.folders.len())
    }

    pub fn current_track(&self) -> Option<usize> {
        self.current_track.filter(|&i| i < self.tracks.len())
    }

    pub fn current_folder_path(&self) -> Option<&Path> {
        self.current_folder().map(|i| self.folders[i].as_path())
    }

    pub fn current_track_path(&self) -> Option<&Path> {
        self.current_track().map(|i| self.tracks[i].as_path())
    }

    /// The track after the current one in the same folder, if there is one.
    pub fn next_track_path(&self) -> Option<&Path> {
        let next = self.current_track()? + 1;
        self.tracks.get(next).map(PathBuf::as_path)
    }

    pub fn has_tracks(&self) -> bool {
        !self.tracks.is_empty()
    }

    /// Indices point inside their lists, and a track list implies a folder.
    pub fn is_consistent(&self) -> bool {
        let folder_ok = match self.current_folder {
            Some(i) => i < self.folders.len(),
            None => self.tracks.is_empty(),
        };
        let track_ok = match self.current_track {
            Some(i) => i < self.tracks.len(),
            None => self.tracks.is_empty(),
        };
        folder_ok && track_ok
    }

    /// Bring the folder list in line with the disk.
    ///
    /// Surviving folders keep their order and removed ones are dropped. New
    /// folders are shuffled among themselves and appended. The current
    /// folder and track survive if they still exist; otherwise the position
    /// resets to the first track of the first folder.
    pub fn reconcile<R: Rng + ?Sized>(&mut self, source: &MediaSource, rng: &mut R) {
        let mut on_disk = source.find_folders();
        let current_folder = self.current_folder_path().map(Path::to_path_buf);
        let current_track = self.current_track_path().map(Path::to_path_buf);

        let before = self.folders.len();
        self.folders.retain(|f| on_disk.remove(f));
        let removed = before - self.folders.len();

        let mut added: Vec<PathBuf> = on_disk.into_iter().collect();
        added.shuffle(rng);
        if removed > 0 || !added.is_empty() {
            info!(removed, added = added.len(), "folder list changed");
        }
        self.folders.extend(added);

        if self.folders.is_empty() {
            warn!(root = %source.root().display(), "no playable folders found in root dir");
            self.current_folder = None;
            self.tracks.clear();
            self.current_track = None;
            return;
        }

        let found = current_folder.and_then(|c| self.folders.iter().position(|f| *f == c));
        let (folder_idx, keep_track) = match found {
            Some(i) => (i, current_track),
            None => (0, None),
        };

        self.current_folder = Some(folder_idx);
        self.tracks = source.list_tracks(&self.folders[folder_idx]);
        self.current_track = if self.tracks.is_empty() {
            None
        } else {
            let idx = keep_track
                .and_then(|t| self.tracks.iter().position(|p| *p == t))
                .unwrap_or(0);
            Some(idx)
        };
    }

    /// Move `delta` folders through the play order and load its tracks.
    ///
    /// Moving backwards wraps around. Moving past the end reshuffles the
    /// whole order first, and never lands on the folder that was current
    /// before the reshuffle when there is another choice.
    pub fn load_folder<R: Rng + ?Sized>(&mut self, delta: i64, source: &MediaSource, rng: &mut R) {
        self.reconcile(source, rng);

        let len = self.folders.len() as i64;
        if len == 0 {
            return;
        }

        let base = self.current_folder().map_or(-1, |i| i as i64);
        let mut next = base + delta;
        if next < 0 {
            next = next.rem_euclid(len);
        }
        if next >= len {
            next %= len;
            let previous = self.current_folder_path().map(Path::to_path_buf);
            self.folders.shuffle(rng);
            debug!("reshuffled {} folders", self.folders.len());

            if len > 1 && previous.as_deref() == Some(self.folders[next as usize].as_path()) {
                next = (next + 1) % len;
            }
        }

        let next = next as usize;
        self.current_folder = Some(next);
        self.tracks = source.list_tracks(&self.folders[next]);
        self.current_track = (!self.tracks.is_empty()).then_some(0);
    }

    /// Move `delta` tracks, crossing into neighbouring folders as needed.
    ///
    /// Empty folders are skipped. Returns whether the folder changed, or
    /// `None` when no track could be reached.
    pub fn step_track<R: Rng + ?Sized>(
        &mut self,
        delta: i64,
        source: &MediaSource,
        rng: &mut R,
    ) -> Option<bool> {
        let mut next = self.current_track().map_or(-1, |i| i as i64) + delta;
        let mut left_folder = false;
        let mut budget = (self.folders.len() + 1) * (delta.unsigned_abs() as usize + 1);

        while next < 0 {
            if budget == 0 {
                return None;
            }
            budget -= 1;
            self.load_folder(-1, source, rng);
            if self.folders.is_empty() {
                return None;
            }
            left_folder = true;
            next += self.tracks.len() as i64;
        }

        while next >= self.tracks.len() as i64 {
            if budget == 0 {
                return None;
            }
            budget -= 1;
            next -= self.tracks.len() as i64;
            self.load_folder(1, source, rng);
            if self.folders.is_empty() {
                return None;
            }
            left_folder = true;
        }

        self.current_track = Some(next as usize);
        Some(left_folder)
    }
}
