use super::device;
use super::format::AudioFormat;
use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, StreamConfig};
use ringbuf::{HeapRb, traits::*};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Notify, mpsc, oneshot};
use tokio::task::JoinHandle;

/// A running microphone stream
///
/// Dropping it stops the device callback. `stop` additionally flushes the
/// samples still sitting in the ring buffer and closes the chunk channel.
pub struct CaptureStream {
    stream: cpal::Stream,
    format: AudioFormat,
    stop_tx: oneshot::Sender<()>,
    bridge: JoinHandle<()>,
}

impl CaptureStream {
    /// The format the device actually delivers
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub async fn stop(self) {
        // Stop the device first so nothing lands in the ring after the flush
        let _ = self.stream.pause();
        drop(self.stream);

        let _ = self.stop_tx.send(());
        if let Err(e) = self.bridge.await {
            tracing::warn!("Capture bridge task ended abnormally: {}", e);
        }
    }
}

pub struct AudioCapture;

impl AudioCapture {
    /// Start audio capture from the named input device, or the default one
    ///
    /// `requested` is adjusted to the nearest format the device supports; the
    /// result is available from `CaptureStream::format`. Audio chunks are sent
    /// via chunk_tx. Must be called from within a `LocalSet`; the bridge task
    /// is spawned locally.
    pub fn start(
        requested: AudioFormat,
        device_name: Option<&str>,
        chunk_tx: mpsc::Sender<Vec<f32>>,
    ) -> Result<CaptureStream> {
        let device = device::input_device(device_name)?;

        let ranges = device::supported_input_ranges(&device)?;
        let Some(format) = device::negotiate(requested, &ranges) else {
            log_ranges(&ranges);
            anyhow::bail!("Input device offers no f32 capture format");
        };
        if format != requested {
            tracing::info!(
                "Device cannot capture {} Hz/{}ch, using {} Hz/{}ch",
                requested.sample_rate,
                requested.channels,
                format.sample_rate,
                format.channels
            );
        }

        let ring = HeapRb::<f32>::new(format.samples_for_duration(60.0));
        let (mut producer, consumer) = ring.split();

        let config = StreamConfig {
            channels: format.channels,
            sample_rate: SampleRate(format.sample_rate),
            buffer_size: BufferSize::Default,
        };

        let notify = Arc::new(Notify::new());
        let notify_callback = notify.clone();
        let dropped = Arc::new(AtomicUsize::new(0));
        let dropped_callback = dropped.clone();

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                    let pushed = producer.push_slice(data);
                    if pushed < data.len() {
                        dropped_callback.fetch_add(data.len() - pushed, Ordering::Relaxed);
                    }
                    notify_callback.notify_one();
                },
                move |err| {
                    tracing::error!("Audio input stream error: {}", err);
                },
                None,
            )
            .inspect_err(|_| log_ranges(&ranges))
            .context("Failed to build input stream")?;

        stream.play().context("Failed to start audio stream")?;

        let (stop_tx, stop_rx) = oneshot::channel();
        let chunk_size = format.samples_for_duration(0.5);
        let bridge = tokio::task::spawn_local(Self::bridge_task(
            consumer, chunk_tx, chunk_size, notify, dropped, stop_rx,
        ));

        tracing::info!(
            "Audio capture started ({} Hz, {} channel)",
            format.sample_rate,
            format.channels
        );
        Ok(CaptureStream {
            stream,
            format,
            stop_tx,
            bridge,
        })
    }

    async fn bridge_task(
        mut consumer: impl Consumer<Item = f32>,
        tx: mpsc::Sender<Vec<f32>>,
        chunk_size: usize,
        notify: Arc<Notify>,
        dropped: Arc<AtomicUsize>,
        mut stop_rx: oneshot::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                _ = notify.notified() => {
                    report_dropped(&dropped);
                    while consumer.occupied_len() >= chunk_size {
                        let mut chunk = vec![0.0f32; chunk_size];
                        let n = consumer.pop_slice(&mut chunk);
                        chunk.truncate(n);

                        if tx.send(chunk).await.is_err() {
                            return;
                        }
                    }
                }
                _ = &mut stop_rx => break,
            }
        }

        report_dropped(&dropped);

        // Flush the tail shorter than a full chunk
        let remaining = consumer.occupied_len();
        if remaining > 0 {
            let mut chunk = vec![0.0f32; remaining];
            let n = consumer.pop_slice(&mut chunk);
            chunk.truncate(n);
            let _ = tx.send(chunk).await;
        }
    }
}

fn report_dropped(dropped: &AtomicUsize) {
    let count = dropped.swap(0, Ordering::Relaxed);
    if count > 0 {
        tracing::warn!("Capture ring full, dropped {} samples", count);
    }
}

fn log_ranges(ranges: &[device::InputConfigRange]) {
    tracing::warn!("Supported input configs:");
    for range in ranges {
        tracing::warn!("  {}", range);
    }
}
