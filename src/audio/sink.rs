//! `rodio` implementation of the output traits.
//!
//! Each voice owns one `Sink` on the shared mixer. Seeking rebuilds the sink
//! and skips into the file, which works for every format the decoder reads.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rodio::mixer::Mixer;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::debug;

use super::output::{AudioOutput, Voice};
use crate::error::AudioError;

/// The default system output device.
pub struct RodioOutput {
    stream: OutputStream,
}

impl RodioOutput {
    pub fn open_default() -> Result<Self, AudioError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| AudioError::Device(e.to_string()))?;
        // rodio logs to stderr when the stream is dropped.
        stream.log_on_drop(false);
        Ok(Self { stream })
    }
}

impl AudioOutput for RodioOutput {
    fn open(&mut self, path: &Path, start_at: Duration) -> Result<Box<dyn Voice>, AudioError> {
        let voice = RodioVoice::open(self.stream.mixer(), path, start_at)?;
        Ok(Box::new(voice))
    }
}

pub struct RodioVoice {
    path: PathBuf,
    mixer: Mixer,
    sink: Sink,
    duration: Option<Duration>,
    /// Where the current sink started inside the file.
    offset: Duration,
}

impl RodioVoice {
    fn open(mixer: &Mixer, path: &Path, start_at: Duration) -> Result<Self, AudioError> {
        let (sink, duration) = create_sink_at(mixer, path, start_at)?;
        Ok(Self {
            path: path.to_path_buf(),
            mixer: mixer.clone(),
            sink,
            duration,
            offset: start_at,
        })
    }
}

impl Voice for RodioVoice {
    fn play(&mut self) {
        self.sink.play();
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }

    fn position(&self) -> Duration {
        self.offset + self.sink.get_pos()
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn seek(&mut self, to: Duration) -> Result<(), AudioError> {
        let (sink, _) = create_sink_at(&self.mixer, &self.path, to).map_err(|e| {
            AudioError::Seek {
                path: self.path.clone(),
                reason: e.to_string(),
            }
        })?;
        if !self.sink.is_paused() {
            sink.play();
        }
        self.sink.stop();
        self.sink = sink;
        self.offset = to;
        debug!(path = %self.path.display(), ?to, "seeked");
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.sink.empty()
    }

    fn stop(&mut self) {
        self.sink.stop();
    }
}

/// Create a paused `Sink` for `path` that starts playback at `start_at`.
fn create_sink_at(
    mixer: &Mixer,
    path: &Path,
    start_at: Duration,
) -> Result<(Sink, Option<Duration>), AudioError> {
    let file = File::open(path).map_err(|source| AudioError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let decoder = Decoder::new(BufReader::new(file)).map_err(|e| AudioError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let duration = decoder.total_duration();

    // `skip_duration` is our seeking primitive; even Duration::ZERO is fine.
    let source = decoder.skip_duration(start_at);

    let sink = Sink::connect_new(mixer);
    sink.pause();
    sink.append(source);
    Ok((sink, duration))
}
