use std::env;
use std::io::{self, BufRead};
use std::path::PathBuf;

use tracing::{info, warn};

use albumshuffle::audio::{AudioOutput, RodioOutput};
use albumshuffle::config::Settings;
use albumshuffle::engine::{Command, Engine, LogListener, PersistenceStore};
use albumshuffle::library::MediaSource;
use albumshuffle::logging;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load_or_default();
    logging::init(&settings.log);

    let root = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| settings.library.root.clone());
    let state_dir = settings
        .state_dir()
        .ok_or("cannot determine a state directory; set storage.state_dir")?;

    let source = MediaSource::new(root, settings.library.clone());
    let store = PersistenceStore::new(state_dir);
    info!(
        root = %source.root().display(),
        state = %store.dir().display(),
        "starting"
    );

    let engine = Engine::builder(&settings, source, store)
        .listener(LogListener)
        .start(|| {
            let output = RodioOutput::open_default()?;
            Ok(Box::new(output) as Box<dyn AudioOutput>)
        })?;

    // One command per line, e.g. `PLAY_PAUSE` or `SEEK 40`.
    for line in io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") {
            break;
        }
        match line.parse::<Command>() {
            Ok(cmd) => engine.submit(cmd)?,
            Err(e) => warn!("{e}"),
        }
    }

    engine.shutdown();
    Ok(())
}
