//! In-memory output for exercising slots and the engine without a device.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::output::{AudioOutput, Voice};
use crate::error::AudioError;

pub(crate) const DEFAULT_DURATION: Duration = Duration::from_secs(180);

#[derive(Debug)]
pub(crate) struct VoiceState {
    pub path: PathBuf,
    pub paused: bool,
    pub position: Duration,
    pub finished: bool,
    pub stopped: bool,
}

#[derive(Default)]
pub(crate) struct FakeState {
    pub opens: Vec<(PathBuf, Duration)>,
    pub seeks: Vec<(PathBuf, Duration)>,
    pub failing: HashSet<PathBuf>,
    pub failing_seeks: HashSet<PathBuf>,
    pub durations: HashMap<PathBuf, Duration>,
    pub voices: Vec<Arc<Mutex<VoiceState>>>,
}

/// Shared view of everything the fake output has done.
#[derive(Clone, Default)]
pub(crate) struct FakeLog(Arc<Mutex<FakeState>>);

impl FakeLog {
    pub fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.0.lock().unwrap()
    }

    pub fn output(&self) -> FakeOutput {
        FakeOutput { log: self.clone() }
    }

    pub fn opens_of(&self, path: &Path) -> usize {
        self.lock().opens.iter().filter(|(p, _)| p == path).count()
    }

    pub fn open_count(&self) -> usize {
        self.lock().opens.len()
    }

    pub fn fail_open(&self, path: &Path) {
        self.lock().failing.insert(path.to_path_buf());
    }

    pub fn fail_seek(&self, path: &Path) {
        self.lock().failing_seeks.insert(path.to_path_buf());
    }

    pub fn set_duration(&self, path: &Path, duration: Duration) {
        self.lock().durations.insert(path.to_path_buf(), duration);
    }

    fn live(&self) -> Vec<Arc<Mutex<VoiceState>>> {
        self.lock()
            .voices
            .iter()
            .filter(|v| !v.lock().unwrap().stopped)
            .cloned()
            .collect()
    }

    /// Path of the voice currently rendering, if any.
    pub fn playing(&self) -> Option<PathBuf> {
        self.live().into_iter().find_map(|v| {
            let v = v.lock().unwrap();
            (!v.paused && !v.finished).then(|| v.path.clone())
        })
    }

    /// Number of voices opened and not yet stopped.
    pub fn live_count(&self) -> usize {
        self.live().len()
    }

    /// Make the rendering voice run out of samples.
    pub fn finish_playing(&self) {
        for v in self.live() {
            let mut v = v.lock().unwrap();
            if !v.paused && !v.finished {
                v.position = DEFAULT_DURATION;
                v.finished = true;
            }
        }
    }

    /// Move the rendering voice to `position`.
    pub fn set_position(&self, position: Duration) {
        for v in self.live() {
            let mut v = v.lock().unwrap();
            if !v.paused {
                v.position = position;
            }
        }
    }
}

pub(crate) struct FakeOutput {
    log: FakeLog,
}

impl AudioOutput for FakeOutput {
    fn open(&mut self, path: &Path, start_at: Duration) -> Result<Box<dyn Voice>, AudioError> {
        let mut log = self.log.lock();
        if log.failing.contains(path) {
            return Err(AudioError::Decode {
                path: path.to_path_buf(),
                reason: "fake decode failure".into(),
            });
        }
        log.opens.push((path.to_path_buf(), start_at));
        let duration = log
            .durations
            .get(path)
            .copied()
            .unwrap_or(DEFAULT_DURATION);
        let state = Arc::new(Mutex::new(VoiceState {
            path: path.to_path_buf(),
            paused: true,
            position: start_at,
            finished: false,
            stopped: false,
        }));
        log.voices.push(state.clone());
        Ok(Box::new(FakeVoice {
            log: self.log.clone(),
            state,
            duration,
        }))
    }
}

struct FakeVoice {
    log: FakeLog,
    state: Arc<Mutex<VoiceState>>,
    duration: Duration,
}

impl FakeVoice {
    fn state(&self) -> MutexGuard<'_, VoiceState> {
        self.state.lock().unwrap()
    }
}

impl Voice for FakeVoice {
    fn play(&mut self) {
        self.state().paused = false;
    }

    fn pause(&mut self) {
        self.state().paused = true;
    }

    fn is_paused(&self) -> bool {
        self.state().paused
    }

    fn position(&self) -> Duration {
        self.state().position
    }

    fn duration(&self) -> Option<Duration> {
        Some(self.duration)
    }

    fn seek(&mut self, to: Duration) -> Result<(), AudioError> {
        let path = self.state().path.clone();
        let mut log = self.log.lock();
        if log.failing_seeks.contains(&path) {
            return Err(AudioError::Seek {
                path,
                reason: "fake seek failure".into(),
            });
        }
        log.seeks.push((path, to));
        drop(log);
        let mut state = self.state();
        state.position = to;
        state.finished = false;
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.state().finished
    }

    fn stop(&mut self) {
        let mut state = self.state();
        state.stopped = true;
        state.paused = true;
    }
}
