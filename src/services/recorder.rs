use super::{ActiveCapture, CaptureService};
use crate::audio::{AudioCapture, AudioFormat, AudioSink, CaptureStream, WavSink, device};
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Records the microphone into a WAV file
///
/// Coordinates audio capture and encoding:
/// - opens the cpal stream, then a WAV sink in the format the device delivers
/// - pumps captured chunks into the sink while recording
/// - stops the stream, drains the channel and publishes the file on finish
///
/// The previous recording is only replaced when a take finishes cleanly. The
/// capture stream is !Send, so `start` must run on a LocalSet.
pub struct MicRecorder {
    format: AudioFormat,
    device_name: Option<String>,
}

impl MicRecorder {
    pub fn new(format: AudioFormat, device_name: Option<String>) -> Self {
        Self {
            format,
            device_name,
        }
    }
}

#[async_trait(?Send)]
impl CaptureService for MicRecorder {
    fn microphone_available(&self) -> bool {
        device::microphone_available(self.device_name.as_deref())
    }

    async fn start(&self, path: &Path) -> Result<Box<dyn ActiveCapture>> {
        // Chunks wait in the channel until the pump is running
        let (audio_tx, audio_rx) = mpsc::channel(100);
        let stream = AudioCapture::start(self.format, self.device_name.as_deref(), audio_tx)?;

        let sink = match WavSink::create(path, stream.format()) {
            Ok(sink) => sink,
            Err(e) => {
                stream.stop().await;
                return Err(e);
            }
        };

        tracing::info!("Recording started: {}", sink.path().display());
        let pump = tokio::task::spawn_local(pump_chunks(audio_rx, Box::new(sink)));

        Ok(Box::new(MicRecording {
            stream: Some(stream),
            pump: Some(pump),
        }))
    }
}

type PumpResult = (Box<dyn AudioSink>, Result<()>);

/// Stream chunks into the sink until the capture side closes the channel
async fn pump_chunks(
    mut audio_rx: mpsc::Receiver<Vec<f32>>,
    mut sink: Box<dyn AudioSink>,
) -> PumpResult {
    let mut result = Ok(());

    while let Some(chunk) = audio_rx.recv().await {
        if result.is_err() {
            continue;
        }
        if let Err(e) = sink.write_chunk(chunk) {
            tracing::error!("Failed to write audio chunk: {}", e);
            result = Err(e);
        }
    }

    (sink, result)
}

struct MicRecording {
    stream: Option<CaptureStream>,
    pump: Option<JoinHandle<PumpResult>>,
}

#[async_trait(?Send)]
impl ActiveCapture for MicRecording {
    async fn finish(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            stream.stop().await;
        }

        let Some(pump) = self.pump.take() else {
            return Ok(());
        };

        let (mut sink, write_result) = pump
            .await
            .map_err(|e| anyhow::anyhow!("Audio pump task failed: {}", e))?;

        tracing::info!("Recording stopped");
        match write_result {
            Ok(()) => sink.finalize().await,
            Err(e) => {
                // A broken take must not replace the last good recording
                if let Err(discard_err) = sink.discard().await {
                    tracing::warn!("Failed to discard broken take: {}", discard_err);
                }
                Err(e)
            }
        }
    }
}
