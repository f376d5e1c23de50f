use super::format::AudioFormat;
use super::sink::AudioSink;
use anyhow::{Context, Result};
use async_trait::async_trait;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, oneshot};

enum WavCommand {
    WriteChunk(Vec<f32>),
    Finalize { reply: oneshot::Sender<Result<()>> },
    Discard { reply: oneshot::Sender<Result<()>> },
}

/// WAV encoder backed by a dedicated blocking thread for I/O
///
/// Samples go to a `.part` file next to `path`. Only `finalize` moves it over
/// `path`, so a take that is discarded or abandoned never touches the previous
/// recording.
pub struct WavSink {
    path: PathBuf,
    tx: mpsc::UnboundedSender<WavCommand>,
    closed: bool,
}

/// Where a take is written until it is finalized
pub fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

impl WavSink {
    pub fn create(path: impl AsRef<Path>, format: AudioFormat) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let staging = staging_path(&path);
        let spec = WavSpec {
            channels: format.channels,
            sample_rate: format.sample_rate,
            bits_per_sample: AudioFormat::BITS_PER_SAMPLE,
            sample_format: SampleFormat::Int,
        };

        let writer = WavWriter::create(&staging, spec)
            .with_context(|| format!("Failed to create WAV file: {}", staging.display()))?;

        let (tx, rx) = mpsc::unbounded_channel();

        let target = path.clone();
        std::thread::Builder::new()
            .name("wav-writer".to_string())
            .spawn(move || write_loop(writer, rx, &staging, &target))
            .context("Failed to spawn WAV writer thread")?;

        tracing::debug!("WAV sink opened for {}", path.display());
        Ok(Self {
            path,
            tx,
            closed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn close(&mut self, publish: bool) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let (reply, rx) = oneshot::channel();
        let cmd = if publish {
            WavCommand::Finalize { reply }
        } else {
            WavCommand::Discard { reply }
        };
        self.tx
            .send(cmd)
            .map_err(|e| anyhow::anyhow!("Failed to send close command: {}", e))?;

        rx.await
            .map_err(|e| anyhow::anyhow!("Failed to receive close response: {}", e))?
    }
}

fn write_loop(
    mut writer: WavWriter<BufWriter<File>>,
    mut rx: mpsc::UnboundedReceiver<WavCommand>,
    staging: &Path,
    target: &Path,
) {
    let mut write_error: Option<hound::Error> = None;

    while let Some(cmd) = rx.blocking_recv() {
        match cmd {
            WavCommand::WriteChunk(samples) => {
                if write_error.is_some() {
                    continue;
                }
                for sample in samples {
                    // f32 (-1.0 to 1.0) to i16
                    let amplitude = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                    if let Err(e) = writer.write_sample(amplitude) {
                        tracing::error!("Failed to write sample: {}", e);
                        write_error = Some(e);
                        break;
                    }
                }
            }
            WavCommand::Finalize { reply } => {
                let result = match write_error.take() {
                    Some(e) => {
                        drop(writer);
                        remove_staging(staging);
                        Err(anyhow::anyhow!("WAV write failed: {}", e))
                    }
                    None => publish(writer, staging, target),
                };
                let _ = reply.send(result);
                return;
            }
            WavCommand::Discard { reply } => {
                drop(writer);
                remove_staging(staging);
                let _ = reply.send(Ok(()));
                return;
            }
        }
    }

    // Sender dropped without a close: treat the take as abandoned
    drop(writer);
    remove_staging(staging);
    tracing::warn!("Abandoned WAV take discarded");
}

fn publish(writer: WavWriter<BufWriter<File>>, staging: &Path, target: &Path) -> Result<()> {
    if let Err(e) = writer.finalize() {
        remove_staging(staging);
        return Err(anyhow::anyhow!("Failed to finalize WAV: {}", e));
    }

    if let Err(e) = std::fs::rename(staging, target) {
        remove_staging(staging);
        return Err(e)
            .with_context(|| format!("Failed to move recording into {}", target.display()));
    }
    Ok(())
}

fn remove_staging(staging: &Path) {
    if let Err(e) = std::fs::remove_file(staging) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove {}: {}", staging.display(), e);
        }
    }
}

#[async_trait]
impl AudioSink for WavSink {
    fn write_chunk(&mut self, samples: Vec<f32>) -> Result<()> {
        self.tx
            .send(WavCommand::WriteChunk(samples))
            .map_err(|e| anyhow::anyhow!("Failed to send write command: {}", e))
    }

    async fn finalize(&mut self) -> Result<()> {
        self.close(true).await
    }

    async fn discard(&mut self) -> Result<()> {
        self.close(false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_count(path: &Path) -> u32 {
        hound::WavReader::open(path).unwrap().len()
    }

    async fn record_take(path: &Path, samples: usize) {
        let mut sink = WavSink::create(path, AudioFormat::default()).unwrap();
        sink.write_chunk(vec![0.25; samples]).unwrap();
        sink.finalize().await.unwrap();
    }

    #[tokio::test]
    async fn test_writes_readable_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audiotest.wav");

        let mut sink = WavSink::create(&path, AudioFormat::default()).unwrap();
        sink.write_chunk(vec![0.0, 0.5, -0.5, 1.0]).unwrap();
        sink.write_chunk(vec![2.0, -2.0]).unwrap();
        sink.finalize().await.unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 8000);
        assert_eq!(spec.bits_per_sample, 16);

        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 6);
        assert_eq!(samples[3], i16::MAX);
        // Out of range input is clamped
        assert_eq!(samples[4], i16::MAX);
        assert_eq!(samples[5], -i16::MAX);
        assert!(!staging_path(&path).exists());
    }

    #[tokio::test]
    async fn test_second_recording_replaces_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audiotest.wav");

        record_take(&path, 8000).await;
        let first_len = std::fs::metadata(&path).unwrap().len();
        assert_eq!(sample_count(&path), 8000);

        record_take(&path, 800).await;
        assert_eq!(sample_count(&path), 800);
        assert!(std::fs::metadata(&path).unwrap().len() < first_len);
    }

    #[tokio::test]
    async fn test_unfinished_take_keeps_previous_recording() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audiotest.wav");
        record_take(&path, 8000).await;

        let mut sink = WavSink::create(&path, AudioFormat::default()).unwrap();
        sink.write_chunk(vec![0.5; 100]).unwrap();
        assert_eq!(sample_count(&path), 8000);

        sink.discard().await.unwrap();
        assert_eq!(sample_count(&path), 8000);
        assert!(!staging_path(&path).exists());
    }

    #[tokio::test]
    async fn test_dropped_sink_keeps_previous_recording() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audiotest.wav");
        record_take(&path, 4000).await;

        let sink = WavSink::create(&path, AudioFormat::default()).unwrap();
        drop(sink);

        // The writer thread cleans up on its own once the channel closes
        for _ in 0..100 {
            if !staging_path(&path).exists() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(!staging_path(&path).exists());
        assert_eq!(sample_count(&path), 4000);
    }

    #[tokio::test]
    async fn test_close_twice_is_harmless() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audiotest.wav");

        let mut sink = WavSink::create(&path, AudioFormat::default()).unwrap();
        sink.write_chunk(vec![0.1; 10]).unwrap();
        sink.finalize().await.unwrap();
        sink.finalize().await.unwrap();
        sink.discard().await.unwrap();
        assert_eq!(sample_count(&path), 10);
    }

    #[test]
    fn test_create_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("audiotest.wav");

        assert!(WavSink::create(&path, AudioFormat::default()).is_err());
    }

    #[test]
    fn test_staging_path() {
        assert_eq!(
            staging_path(Path::new("/cache/audiotest.wav")),
            PathBuf::from("/cache/audiotest.wav.part")
        );
    }
}
