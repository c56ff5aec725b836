use super::load::{default_config_path, default_state_dir, resolve_config_path};
use super::schema::*;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_explicit_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("ALBUMSHUFFLE_CONFIG_PATH", "/tmp/albumshuffle-test.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        PathBuf::from("/tmp/albumshuffle-test.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    assert_eq!(
        default_config_path().unwrap(),
        PathBuf::from("/tmp/xdg-config-home")
            .join("albumshuffle")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    assert_eq!(
        default_config_path().unwrap(),
        PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("albumshuffle")
            .join("config.toml")
    );
}

#[test]
fn default_state_dir_follows_xdg_then_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_STATE_HOME", "/tmp/xdg-state");
    assert_eq!(
        default_state_dir().unwrap(),
        PathBuf::from("/tmp/xdg-state/albumshuffle")
    );
    drop(_g1);

    let _g2 = EnvGuard::remove("XDG_STATE_HOME");
    let _g3 = EnvGuard::set("HOME", "/tmp/home-dir");
    assert_eq!(
        default_state_dir().unwrap(),
        PathBuf::from("/tmp/home-dir/.local/state/albumshuffle")
    );
}

#[test]
fn settings_load_from_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[library]
root = "/srv/music"
extensions = ["flac", "mp3"]
follow_links = false
include_hidden = false

[playback]
idle_stop_secs = 0
poll_interval_ms = 25

[storage]
state_dir = "/var/lib/albumshuffle"

[log]
filter = "albumshuffle=debug"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("ALBUMSHUFFLE_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("ALBUMSHUFFLE__PLAYBACK__IDLE_STOP_SECS");

    let s = Settings::load().unwrap();
    assert_eq!(s.library.root, PathBuf::from("/srv/music"));
    assert_eq!(s.library.extensions, vec!["flac".to_string(), "mp3".to_string()]);
    assert!(!s.library.follow_links);
    assert!(!s.library.include_hidden);
    assert_eq!(s.playback.idle_stop(), None);
    assert_eq!(s.playback.poll_interval(), Duration::from_millis(25));
    assert_eq!(s.state_dir(), Some(PathBuf::from("/var/lib/albumshuffle")));
    assert_eq!(s.log.filter, "albumshuffle=debug");
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[playback]
idle_stop_secs = 30
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("ALBUMSHUFFLE_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("ALBUMSHUFFLE__PLAYBACK__IDLE_STOP_SECS", "5");

    let s = Settings::load().unwrap();
    assert_eq!(s.playback.idle_stop(), Some(Duration::from_secs(5)));
}

#[test]
fn defaults_enable_idle_stop_and_accept_every_file() {
    let s = Settings::default();
    assert_eq!(s.playback.idle_stop(), Some(Duration::from_secs(30)));
    assert!(s.library.extensions.is_empty());
    assert!(s.validate().is_ok());
}

#[test]
fn validate_rejects_zero_poll_interval() {
    let mut s = Settings::default();
    s.playback.poll_interval_ms = 0;
    assert!(s.validate().is_err());
}
