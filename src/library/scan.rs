use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

/// Finds album folders under a root directory and lists their tracks.
///
/// Holds no state besides its settings; every call goes to disk.
#[derive(Debug, Clone)]
pub struct MediaSource {
    root: PathBuf,
    settings: LibrarySettings,
}

impl MediaSource {
    pub fn new(root: impl Into<PathBuf>, settings: LibrarySettings) -> Self {
        let root = root.into();
        // The root may be on storage that is not mounted yet.
        let root = fs::canonicalize(&root).unwrap_or(root);
        Self { root, settings }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every directory under the root that directly contains a track.
    ///
    /// A directory registers on the first track found inside it; its
    /// sub-directories are walked and registered on their own.
    pub fn find_folders(&self) -> BTreeSet<PathBuf> {
        let mut folders = BTreeSet::new();

        let walker = WalkDir::new(&self.root).follow_links(self.settings.follow_links);
        for entry in walker
            .into_iter()
            .filter_entry(|e| {
                self.settings.include_hidden || e.depth() == 0 || !is_hidden(e.path())
            })
            .filter_map(|e| match e {
                Ok(e) => Some(e),
                Err(err) => {
                    debug!("skipping unreadable entry: {err}");
                    None
                }
            })
        {
            if entry.depth() == 0 || !entry.file_type().is_file() {
                continue;
            }
            if !self.is_track(entry.path()) {
                continue;
            }
            if let Some(parent) = entry.path().parent() {
                if !folders.contains(parent) {
                    folders.insert(parent.to_path_buf());
                }
            }
        }

        if folders.is_empty() {
            warn!(root = %self.root.display(), "no playable folders found");
        }
        folders
    }

    /// The tracks directly inside `folder`, sorted by path.
    ///
    /// This order is the playback order within an album.
    pub fn list_tracks(&self, folder: &Path) -> Vec<PathBuf> {
        let entries = match fs::read_dir(folder) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(folder = %folder.display(), "cannot list folder: {e}");
                return Vec::new();
            }
        };

        let mut tracks: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| self.is_regular_file(path))
            .filter(|path| self.settings.include_hidden || !is_hidden(path))
            .filter(|path| self.is_track(path))
            .collect();

        tracks.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
        tracks
    }

    fn is_regular_file(&self, path: &Path) -> bool {
        let meta = if self.settings.follow_links {
            fs::metadata(path)
        } else {
            fs::symlink_metadata(path)
        };
        meta.map(|m| m.is_file()).unwrap_or(false)
    }

    fn is_track(&self, path: &Path) -> bool {
        is_track_file(path, &self.settings)
    }
}

fn is_track_file(path: &Path, settings: &LibrarySettings) -> bool {
    if settings.extensions.is_empty() {
        return true;
    }

    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}
