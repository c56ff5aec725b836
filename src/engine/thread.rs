use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, error, info, warn};

use super::events::PlayerListener;
use super::signals::AudioFocus;
use super::state::ShuffleState;
use super::store::PersistenceStore;
use super::types::{Command, SnapshotHandle, TrackState};
use crate::audio::{AudioOutput, PlaybackSlot};
use crate::config::PlaybackSettings;
use crate::error::{AudioError, EngineError};
use crate::library::{MediaSource, TrackInfo};

pub(super) enum Msg {
    Command(Command),
    AddListener(Box<dyn PlayerListener>),
    /// Acknowledged once every earlier message has been handled.
    Flush(Sender<()>),
    Shutdown,
}

/// Everything the worker needs besides its output device.
pub(super) struct WorkerParts {
    pub settings: PlaybackSettings,
    pub source: MediaSource,
    pub store: PersistenceStore,
    pub focus: Box<dyn AudioFocus>,
    pub listeners: Vec<Box<dyn PlayerListener>>,
    pub snapshot: SnapshotHandle,
}

pub(super) fn spawn_worker<F>(
    parts: WorkerParts,
    open_output: F,
    rx: Receiver<Msg>,
    ready: Sender<Result<(), EngineError>>,
) -> Result<JoinHandle<()>, EngineError>
where
    F: FnOnce() -> Result<Box<dyn AudioOutput>, AudioError> + Send + 'static,
{
    let handle = thread::Builder::new()
        .name("albumshuffle-engine".into())
        .spawn(move || {
            // The output is created here and never leaves this thread.
            let output = match open_output() {
                Ok(output) => output,
                Err(e) => {
                    let _ = ready.send(Err(e.into()));
                    return;
                }
            };

            let mut worker = Worker::new(parts, output);
            worker.init();
            let _ = ready.send(Ok(()));
            worker.run(rx);
        })?;
    Ok(handle)
}

struct Worker {
    source: MediaSource,
    store: PersistenceStore,
    output: Box<dyn AudioOutput>,
    focus: Box<dyn AudioFocus>,
    listeners: Vec<Box<dyn PlayerListener>>,
    snapshot: SnapshotHandle,

    state: ShuffleState,
    current: Option<PlaybackSlot>,

    paused_by_focus_loss: bool,
    focus_held: bool,

    idle_stop: Option<Duration>,
    idle_deadline: Option<Instant>,
    poll_interval: Duration,

    rng: StdRng,
}

impl Worker {
    fn new(parts: WorkerParts, output: Box<dyn AudioOutput>) -> Self {
        Self {
            source: parts.source,
            store: parts.store,
            output,
            focus: parts.focus,
            listeners: parts.listeners,
            snapshot: parts.snapshot,
            state: ShuffleState::default(),
            current: None,
            paused_by_focus_loss: false,
            focus_held: false,
            idle_stop: parts.settings.idle_stop(),
            idle_deadline: None,
            poll_interval: parts.settings.poll_interval(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Load the saved shuffle and reconcile it with the disk.
    fn init(&mut self) {
        self.state = match self.store.load::<ShuffleState>() {
            Some(state) if state.is_consistent() => state,
            Some(_) => {
                warn!("saved shuffle state is inconsistent, starting over");
                ShuffleState::default()
            }
            None => ShuffleState::default(),
        };
        self.check_folders();
        info!(
            root = %self.source.root().display(),
            folders = self.state.folders().len(),
            "engine ready"
        );
        self.publish(true);
    }

    fn run(&mut self, rx: Receiver<Msg>) {
        loop {
            match rx.recv_timeout(self.next_timeout()) {
                Ok(Msg::Command(cmd)) => {
                    self.dispatch(cmd);
                    self.publish(true);
                }
                Ok(Msg::AddListener(listener)) => self.listeners.push(listener),
                Ok(Msg::Flush(done)) => {
                    self.publish(true);
                    let _ = done.send(());
                }
                Ok(Msg::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }
            self.tick();
        }
        self.shutdown();
    }

    fn next_timeout(&self) -> Duration {
        match self.idle_deadline {
            Some(deadline) => deadline
                .saturating_duration_since(Instant::now())
                .min(self.poll_interval),
            None => self.poll_interval,
        }
    }

    /// Periodic checks: the idle deadline and natural end of the track.
    fn tick(&mut self) {
        if self.idle_deadline.is_some_and(|d| Instant::now() >= d) {
            self.idle_deadline = None;
            info!("paused for too long, stopping");
            self.dispatch(Command::StopAndSave);
            self.publish(true);
        }

        let finished = self
            .current
            .as_ref()
            .is_some_and(|slot| slot.is_playing() && slot.is_finished());
        if finished {
            self.dispatch(Command::FinishCurrent);
            self.publish(true);
        } else {
            self.publish(false);
        }
    }

    fn shutdown(&mut self) {
        if self.current.is_some() {
            self.dispatch(Command::StopAndSave);
        }
        self.abandon_focus();
        self.publish(true);
        debug!("engine worker exiting");
    }

    /// Run one command. Nothing escapes: errors and panics are logged.
    fn dispatch(&mut self, cmd: Command) {
        debug!(%cmd, "executing");
        match panic::catch_unwind(AssertUnwindSafe(|| self.execute(cmd))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(%cmd, "command failed: {e}"),
            Err(_) => error!(%cmd, "command panicked"),
        }
    }

    fn execute(&mut self, cmd: Command) -> Result<(), EngineError> {
        match cmd {
            Command::NextFolder => self.change_folder(1),
            Command::PrevFolder => self.change_folder(-1),
            Command::NextTrack => self.change_track(1, false),
            Command::PrevTrack => self.change_track(-1, false),
            Command::FinishCurrent => self.finish_current(),
            Command::PlayPause => self.play_pause(),
            Command::Play => {
                if self.is_playing() {
                    Ok(())
                } else {
                    self.play_pause()
                }
            }
            Command::Pause => {
                self.pause();
                Ok(())
            }
            Command::Stop => {
                self.stop(false);
                Ok(())
            }
            Command::StopAndSave => {
                self.stop(true);
                Ok(())
            }
            Command::Seek(percent) => self.seek(percent),
            Command::SetAudioFocus => {
                self.set_audio_focus(true);
                Ok(())
            }
            Command::UnsetAudioFocus => {
                self.set_audio_focus(false);
                Ok(())
            }
            Command::CheckFolders => {
                self.check_folders();
                self.save_state();
                Ok(())
            }
        }
    }

    fn is_playing(&self) -> bool {
        self.current.as_ref().is_some_and(PlaybackSlot::is_playing)
    }

    fn play_pause(&mut self) -> Result<(), EngineError> {
        if !self.state.has_tracks() {
            self.check_folders();
            if !self.state.has_tracks() {
                return Err(EngineError::NoContent(self.source.root().to_path_buf()));
            }
        }

        match self.current.as_ref() {
            None => return self.start_playback(true),
            Some(slot) if !slot.is_valid() => {
                info!(path = %slot.path().display(), "current track vanished");
                let released = slot.info();
                self.release_current();
                let started = self.start_playback(false);
                if started.is_err() {
                    self.abandon_move(None, released);
                }
                return started;
            }
            Some(_) => {}
        }

        self.save_state();
        let now_playing = match self.current.as_mut() {
            Some(slot) if slot.is_playing() => {
                slot.pause();
                false
            }
            Some(slot) => {
                slot.resume();
                true
            }
            None => return Ok(()),
        };
        self.paused_by_focus_loss = false;

        if now_playing {
            self.idle_deadline = None;
            self.emit(TrackState::Play);
        } else {
            self.arm_idle_stop();
            self.emit(TrackState::Pause);
        }
        Ok(())
    }

    fn pause(&mut self) {
        match self.current.as_mut() {
            Some(slot) if slot.is_playing() => slot.pause(),
            _ => return,
        }
        self.paused_by_focus_loss = false;
        self.arm_idle_stop();
        self.save_state();
        self.emit(TrackState::Pause);
    }

    /// Release the slot and persist the snapshot, keeping the position only
    /// when asked to.
    fn stop(&mut self, keep_position: bool) {
        let live = self.current.as_ref().map(PlaybackSlot::info);
        let info = match live {
            Some(info) => {
                if let Some(info) = &info {
                    self.emit_for(info, TrackState::Stop);
                }
                info
            }
            None => self.store.load::<TrackInfo>(),
        };
        self.release_current();

        let info = info.map(|mut info| {
            if !keep_position {
                info.set_elapsed(Duration::ZERO);
            }
            info
        });
        if let Err(e) = self.store.save(info.as_ref()) {
            warn!("cannot save track snapshot: {e}");
        }
        if let Err(e) = self.store.save(Some(&self.state)) {
            warn!("cannot save shuffle state: {e}");
        }

        self.paused_by_focus_loss = false;
        self.idle_deadline = None;
        self.abandon_focus();
    }

    fn change_folder(&mut self, delta: i64) -> Result<(), EngineError> {
        let released = self.current.as_ref().and_then(PlaybackSlot::info);
        let before = self.state.clone();
        self.release_current();
        self.state.load_folder(delta, &self.source, &mut self.rng);

        let started = self.start_playback(false);
        if started.is_err() {
            self.abandon_move(Some(before), released);
        }
        started
    }

    /// Move `delta` tracks. With `promote`, an armed successor that matches
    /// the new position takes over without being opened again.
    fn change_track(&mut self, delta: i64, promote: bool) -> Result<(), EngineError> {
        let released = self.current.as_ref().and_then(PlaybackSlot::info);
        let mut next = match self.current.take() {
            Some(mut slot) => {
                let next = if promote { slot.take_next() } else { None };
                slot.release();
                next
            }
            None => None,
        };

        let before = self.state.clone();
        match self.state.step_track(delta, &self.source, &mut self.rng) {
            None => {
                self.abandon_move(None, released);
                return Err(EngineError::NoContent(self.source.root().to_path_buf()));
            }
            Some(true) => next = None,
            Some(false) => {}
        }

        let target = self.state.current_track_path().map(Path::to_path_buf);
        let next =
            next.filter(|slot| Some(slot.path()) == target.as_deref() && slot.is_valid());

        let started = match next {
            Some(slot) => match self.promote(slot) {
                Ok(()) => Ok(()),
                Err(e) => {
                    warn!("armed track did not start: {e}");
                    self.start_playback(false)
                }
            },
            None => self.start_playback(false),
        };
        if started.is_err() {
            self.abandon_move(Some(before), released);
        }
        started
    }

    fn promote(&mut self, mut slot: PlaybackSlot) -> Result<(), EngineError> {
        self.request_focus();
        self.paused_by_focus_loss = false;
        slot.play(self.output.as_mut(), Duration::ZERO)?;
        self.current = Some(slot);
        self.idle_deadline = None;
        self.save_state();
        self.emit(TrackState::Play);
        self.arm_next();
        Ok(())
    }

    /// Settle after a move that left nothing playing. `released` is the
    /// track that was playing before; it is saved where it stopped and
    /// listeners see it stop.
    fn abandon_move(&mut self, before: Option<ShuffleState>, released: Option<TrackInfo>) {
        self.release_current();
        if let Some(before) = before {
            self.state = before;
        }
        if let Some(info) = &released {
            if let Err(e) = self.store.save(Some(info)) {
                warn!("cannot save track snapshot: {e}");
            }
            self.emit_for(info, TrackState::Stop);
        }
        self.save_state();
        self.paused_by_focus_loss = false;
        self.idle_deadline = None;
        self.abandon_focus();
    }

    fn finish_current(&mut self) -> Result<(), EngineError> {
        if let Some(info) = self.current.as_ref().and_then(PlaybackSlot::info) {
            self.emit_for(&info, TrackState::Complete);
        }
        self.change_track(1, true)
    }

    fn seek(&mut self, percent: u8) -> Result<(), EngineError> {
        if percent > 100 {
            warn!(percent, "seek percent out of range, ignoring");
            return Ok(());
        }
        let Some(slot) = self.current.as_mut() else {
            return Ok(());
        };
        let to = slot.duration() * u32::from(percent) / 100;
        slot.seek(to)?;
        debug!(percent, ?to, "seeked");
        Ok(())
    }

    fn set_audio_focus(&mut self, focused: bool) {
        if focused {
            if !self.paused_by_focus_loss {
                return;
            }
            self.paused_by_focus_loss = false;
            let resumed = match self.current.as_mut() {
                Some(slot) if !slot.is_playing() => {
                    slot.resume();
                    true
                }
                _ => false,
            };
            if resumed {
                self.idle_deadline = None;
                self.emit(TrackState::Play);
            }
        } else {
            let paused = match self.current.as_mut() {
                Some(slot) if slot.is_playing() => {
                    slot.pause();
                    true
                }
                _ => false,
            };
            if paused {
                self.paused_by_focus_loss = true;
                self.emit(TrackState::Pause);
            }
        }
    }

    fn check_folders(&mut self) {
        self.state.reconcile(&self.source, &mut self.rng);
    }

    fn start_playback(&mut self, resume: bool) -> Result<(), EngineError> {
        self.request_focus();

        let mut path: PathBuf = match self.state.current_track_path() {
            Some(p) => p.to_path_buf(),
            None => return Err(EngineError::NoContent(self.source.root().to_path_buf())),
        };
        if !path.is_file() {
            info!(path = %path.display(), "track vanished, rescanning");
            self.check_folders();
            path = match self.state.current_track_path() {
                Some(p) => p.to_path_buf(),
                None => return Err(EngineError::NoContent(self.source.root().to_path_buf())),
            };
        }

        let stored = if resume {
            self.store.load::<TrackInfo>()
        } else {
            None
        };

        let mut slot = PlaybackSlot::new(&path);
        slot.prepare(self.output.as_mut())?;
        let start_at = stored
            .filter(|info| info.is_for(&path))
            .map(|info| info.resume_offset(slot.duration()))
            .unwrap_or(Duration::ZERO);

        self.paused_by_focus_loss = false;
        slot.play(self.output.as_mut(), start_at)?;
        info!(path = %path.display(), ?start_at, "playing");

        self.current = Some(slot);
        self.idle_deadline = None;
        self.save_state();
        self.emit(TrackState::Play);
        self.arm_next();
        Ok(())
    }

    /// Prepare the following track of this folder, if there is one.
    fn arm_next(&mut self) {
        let Some(next) = self.state.next_track_path().map(Path::to_path_buf) else {
            debug!("last track in album");
            return;
        };
        if let Some(slot) = self.current.as_mut() {
            if let Err(e) = slot.arm_next(self.output.as_mut(), &next) {
                warn!("failed to prepare next track: {e}");
            }
        }
    }

    fn release_current(&mut self) {
        if let Some(mut slot) = self.current.take() {
            slot.release();
        }
    }

    fn arm_idle_stop(&mut self) {
        self.idle_deadline = self.idle_stop.map(|d| Instant::now() + d);
    }

    fn request_focus(&mut self) {
        if !self.focus_held {
            if !self.focus.request() {
                warn!("audio focus was not granted");
            }
            self.focus_held = true;
        }
    }

    fn abandon_focus(&mut self) {
        if self.focus_held {
            self.focus.abandon();
            self.focus_held = false;
        }
    }

    fn save_state(&mut self) {
        if let Some(info) = self.current.as_ref().and_then(PlaybackSlot::info) {
            if let Err(e) = self.store.save(Some(&info)) {
                warn!("cannot save track snapshot: {e}");
            }
        }
        if let Err(e) = self.store.save(Some(&self.state)) {
            warn!("cannot save shuffle state: {e}");
        }
    }

    fn emit(&mut self, state: TrackState) {
        if let Some(info) = self.current.as_ref().and_then(PlaybackSlot::info) {
            self.emit_for(&info, state);
        }
    }

    fn emit_for(&mut self, info: &TrackInfo, state: TrackState) {
        for listener in self.listeners.iter_mut() {
            listener.track_state_changed(info, state);
        }
    }

    /// Refresh the snapshot readers see. The shuffle state is only copied
    /// when `full` is set, since idle ticks never change it.
    fn publish(&self, full: bool) {
        let track = self.current.as_ref().and_then(PlaybackSlot::info);
        let playing = self.is_playing();
        let shuffle = full.then(|| self.state.clone());

        if let Ok(mut snap) = self.snapshot.lock() {
            snap.track = track;
            snap.playing = playing;
            if let Some(shuffle) = shuffle {
                snap.shuffle = shuffle;
            }
        }
    }
}
