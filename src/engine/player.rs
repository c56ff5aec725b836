use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::warn;

use super::events::PlayerListener;
use super::signals::{AudioFocus, NoFocus, Signal};
use super::state::ShuffleState;
use super::store::PersistenceStore;
use super::thread::{Msg, WorkerParts, spawn_worker};
use super::types::{Command, PlaybackSnapshot, SnapshotHandle};
use crate::audio::AudioOutput;
use crate::config::Settings;
use crate::error::{AudioError, EngineError};
use crate::library::{MediaSource, TrackInfo};

/// Handle to the playback engine.
///
/// Commands are queued and executed in order on a single worker thread;
/// [`Engine::submit`] never waits for them. Getters read the snapshot the
/// worker last published, which may trail the queue.
pub struct Engine {
    tx: Sender<Msg>,
    snapshot: SnapshotHandle,
    store: PersistenceStore,
    join: Mutex<Option<JoinHandle<()>>>,
}

pub struct EngineBuilder {
    parts: WorkerParts,
}

impl EngineBuilder {
    pub fn listener(mut self, listener: impl PlayerListener + 'static) -> Self {
        self.parts.listeners.push(Box::new(listener));
        self
    }

    pub fn focus(mut self, focus: impl AudioFocus + 'static) -> Self {
        self.parts.focus = Box::new(focus);
        self
    }

    /// Spawn the worker and wait until it has loaded its state.
    ///
    /// `open_output` runs on the worker thread; its error is returned here.
    pub fn start<F>(self, open_output: F) -> Result<Engine, EngineError>
    where
        F: FnOnce() -> Result<Box<dyn AudioOutput>, AudioError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Msg>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let snapshot = self.parts.snapshot.clone();
        let store = self.parts.store.clone();

        let handle = spawn_worker(self.parts, open_output, rx, ready_tx)?;
        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Engine {
                tx,
                snapshot,
                store,
                join: Mutex::new(Some(handle)),
            }),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(EngineError::WorkerGone)
            }
        }
    }
}

impl Engine {
    pub fn builder(
        settings: &Settings,
        source: MediaSource,
        store: PersistenceStore,
    ) -> EngineBuilder {
        EngineBuilder {
            parts: WorkerParts {
                settings: settings.playback.clone(),
                source,
                store,
                focus: Box::new(NoFocus),
                listeners: Vec::new(),
                snapshot: Arc::new(Mutex::new(PlaybackSnapshot::default())),
            },
        }
    }

    fn send(&self, msg: Msg) -> Result<(), EngineError> {
        self.tx.send(msg).map_err(|_| EngineError::WorkerGone)
    }

    /// Queue `cmd`. Returns before it runs.
    pub fn submit(&self, cmd: Command) -> Result<(), EngineError> {
        self.send(Msg::Command(cmd))
    }

    /// Queue a command given by name, such as `("SEEK", ["40"])`.
    ///
    /// Malformed input is logged and rejected without reaching the queue.
    pub fn submit_action(&self, name: &str, args: &[&str]) -> Result<(), EngineError> {
        let cmd = Command::from_action(name, args).inspect_err(|e| warn!("{e}"))?;
        self.submit(cmd)
    }

    pub fn signal(&self, signal: Signal) -> Result<(), EngineError> {
        self.submit(signal.command())
    }

    pub fn add_listener(&self, listener: impl PlayerListener + 'static) -> Result<(), EngineError> {
        self.send(Msg::AddListener(Box::new(listener)))
    }

    /// Block until everything queued before this call has run.
    pub fn flush(&self) -> Result<(), EngineError> {
        let (done_tx, done_rx) = mpsc::channel();
        self.send(Msg::Flush(done_tx))?;
        done_rx.recv().map_err(|_| EngineError::WorkerGone)
    }

    fn read<T>(&self, f: impl FnOnce(&PlaybackSnapshot) -> T) -> Option<T> {
        self.snapshot.lock().ok().map(|snap| f(&*snap))
    }

    /// The active track, or the saved resume snapshot when nothing is loaded.
    pub fn current_info(&self) -> Option<TrackInfo> {
        self.read(|snap| snap.track.clone())
            .flatten()
            .or_else(|| self.store.load::<TrackInfo>())
    }

    pub fn elapsed(&self) -> Duration {
        self.current_info()
            .map(|info| info.elapsed())
            .unwrap_or(Duration::ZERO)
    }

    pub fn is_playing(&self) -> bool {
        self.read(|snap| snap.playing).unwrap_or(false)
    }

    pub fn shuffle_state(&self) -> ShuffleState {
        self.read(|snap| snap.shuffle.clone()).unwrap_or_default()
    }

    /// Drain the queue, stop saving the position and join the worker.
    ///
    /// Later calls do nothing.
    pub fn shutdown(&self) {
        let handle = match self.join.lock() {
            Ok(mut j) => j.take(),
            Err(_) => None,
        };
        if let Some(handle) = handle {
            let _ = self.send(Msg::Shutdown);
            let _ = handle.join();
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
