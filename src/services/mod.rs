//! Audio services the controller drives
//!
//! The controller only sees these traits. Each `start` hands back a resource
//! handle that the controller owns for exactly as long as its state lasts.

pub mod player;
pub mod recorder;

pub use player::SpeakerPlayer;
pub use recorder::MicRecorder;

use crate::messages::AppEvent;
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use tokio::sync::mpsc;

/// Turns microphone input into an encoded file
#[async_trait(?Send)]
pub trait CaptureService {
    /// Whether the host has a microphone to record from
    fn microphone_available(&self) -> bool;

    /// Begin a take that replaces `path` once it finishes cleanly
    ///
    /// On error nothing stays open and `path` is untouched: a partially
    /// prepared resource is released before returning.
    async fn start(&self, path: &Path) -> Result<Box<dyn ActiveCapture>>;
}

/// A recording in progress
#[async_trait(?Send)]
pub trait ActiveCapture {
    /// Stop capturing and flush the file to disk
    async fn finish(&mut self) -> Result<()>;
}

/// Decodes a file to audio output
pub trait PlaybackService {
    /// Load `path` and start playing it. `completion` must be fired when the
    /// file plays to the end.
    fn start(&self, path: &Path, completion: Completion) -> Result<Box<dyn ActivePlayback>>;
}

/// A playback in progress
pub trait ActivePlayback {
    /// Interrupt output and release the device
    fn stop(&mut self);
}

/// One-shot notifier for the natural end of a playback
#[derive(Debug)]
pub struct Completion {
    id: u64,
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl Completion {
    pub fn new(id: u64, tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn notify(self) {
        if self
            .tx
            .send(AppEvent::PlaybackFinished { id: self.id })
            .is_err()
        {
            tracing::debug!("Playback {} finished after event loop closed", self.id);
        }
    }
}
