use anyhow::{Context, Result};
use rodio::{OutputStream, OutputStreamBuilder, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

/// A file playing on the default output device
///
/// Holds the output stream open for as long as it lives. Dropping it (or
/// calling `stop`) silences the output immediately.
pub struct AudioPlayback {
    sink: Arc<Sink>,
    _stream: OutputStream,
}

impl AudioPlayback {
    /// Open the file, decode it and start playing
    pub fn start(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open recording: {}", path.display()))?;

        let stream =
            OutputStreamBuilder::open_default_stream().context("Failed to open audio output")?;

        let sink = rodio::play(stream.mixer(), BufReader::new(file))
            .with_context(|| format!("Failed to decode recording: {}", path.display()))?;

        tracing::info!("Playback started: {}", path.display());
        Ok(Self {
            sink: Arc::new(sink),
            _stream: stream,
        })
    }

    /// Run `on_end` on a blocking thread once the sink has drained
    ///
    /// Also fires after `stop`, since stopping empties the sink.
    pub fn on_end<F>(&self, on_end: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let sink = self.sink.clone();
        tokio::task::spawn_blocking(move || {
            sink.sleep_until_end();
            on_end();
        });
    }

    pub fn stop(self) {
        self.sink.stop();
        tracing::info!("Playback stopped");
    }
}
