use super::MediaSource;
use crate::config::LibrarySettings;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"not real audio").unwrap();
}

fn source(root: &Path) -> MediaSource {
    MediaSource::new(root, LibrarySettings::default())
}

#[test]
fn find_folders_registers_every_directory_holding_a_track() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    touch(&root.join("loose.mp3"));
    touch(&root.join("Artist/Album 1/01.mp3"));
    touch(&root.join("Artist/Album 1/02.mp3"));
    touch(&root.join("Artist/Album 1/Bonus/01.mp3"));
    touch(&root.join("Artist/Album 2/01.flac"));
    fs::create_dir_all(root.join("Empty/Nested")).unwrap();

    let src = source(root);
    let folders: Vec<PathBuf> = src.find_folders().into_iter().collect();
    let base = src.root();

    assert_eq!(
        folders,
        vec![
            base.to_path_buf(),
            base.join("Artist/Album 1"),
            base.join("Artist/Album 1/Bonus"),
            base.join("Artist/Album 2"),
        ]
    );
}

#[test]
fn find_folders_on_missing_root_is_empty() {
    let dir = tempdir().unwrap();
    let src = source(&dir.path().join("not-mounted"));
    assert!(src.find_folders().is_empty());
}

#[test]
fn list_tracks_is_sorted_and_skips_subdirectories() {
    let dir = tempdir().unwrap();
    let album = dir.path().join("album");
    touch(&album.join("10 last.mp3"));
    touch(&album.join("02 second.mp3"));
    touch(&album.join("01 first.mp3"));
    touch(&album.join("disc2/01.mp3"));

    let src = source(dir.path());
    let names: Vec<String> = src
        .list_tracks(&album)
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();

    assert_eq!(names, vec!["01 first.mp3", "02 second.mp3", "10 last.mp3"]);
    assert_eq!(src.list_tracks(&album), src.list_tracks(&album));
}

#[test]
fn list_tracks_of_missing_folder_is_empty() {
    let dir = tempdir().unwrap();
    let src = source(dir.path());
    assert!(src.list_tracks(&dir.path().join("gone")).is_empty());
}

#[test]
fn extension_filter_applies_to_folders_and_tracks() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    touch(&root.join("music/01.flac"));
    touch(&root.join("music/cover.jpg"));
    touch(&root.join("scans/back.jpg"));

    let settings = LibrarySettings {
        extensions: vec!["flac".into()],
        ..LibrarySettings::default()
    };
    let src = MediaSource::new(root, settings);

    let folders: Vec<PathBuf> = src.find_folders().into_iter().collect();
    assert_eq!(folders, vec![src.root().join("music")]);

    let tracks = src.list_tracks(&src.root().join("music"));
    assert_eq!(tracks, vec![src.root().join("music/01.flac")]);
}

#[test]
fn hidden_entries_can_be_excluded() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    touch(&root.join(".trash/01.mp3"));
    touch(&root.join("album/.01.mp3"));
    touch(&root.join("album/02.mp3"));

    let settings = LibrarySettings {
        include_hidden: false,
        ..LibrarySettings::default()
    };
    let src = MediaSource::new(root, settings);

    let folders: Vec<PathBuf> = src.find_folders().into_iter().collect();
    assert_eq!(folders, vec![src.root().join("album")]);
    assert_eq!(
        src.list_tracks(&src.root().join("album")),
        vec![src.root().join("album/02.mp3")]
    );

    let all = source(root);
    assert_eq!(all.find_folders().len(), 2);
    assert_eq!(all.list_tracks(&all.root().join("album")).len(), 2);
}
