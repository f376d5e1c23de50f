//! Record/playback controller
//!
//! Owns the session and the one active audio resource. Every transition goes
//! through `&mut self`, on the event loop thread, so the state read by the UI
//! is always derived from the resource actually held.

use crate::controls::{Controls, Status};
use crate::error::ControllerError;
use crate::messages::{AppEvent, AppState};
use crate::services::{ActiveCapture, ActivePlayback, CaptureService, Completion, PlaybackService};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// The single ownership slot. A resource lives exactly as long as its state.
enum Session {
    Idle,
    Recording(Box<dyn ActiveCapture>),
    Playing {
        id: u64,
        playback: Box<dyn ActivePlayback>,
    },
}

pub struct Controller {
    capture: Box<dyn CaptureService>,
    player: Box<dyn PlaybackService>,
    audio_path: PathBuf,
    permission_granted: bool,
    session: Session,
    status: Status,
    next_playback_id: u64,
    events_tx: mpsc::UnboundedSender<AppEvent>,
}

impl Controller {
    pub fn new(
        capture: Box<dyn CaptureService>,
        player: Box<dyn PlaybackService>,
        audio_path: PathBuf,
        permission_granted: bool,
        events_tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            capture,
            player,
            audio_path,
            permission_granted,
            session: Session::Idle,
            status: Status::Ready,
            next_playback_id: 0,
            events_tx,
        }
    }

    pub fn state(&self) -> AppState {
        match self.session {
            Session::Idle => AppState::Idle,
            Session::Recording(_) => AppState::Recording,
            Session::Playing { .. } => AppState::Playing,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn controls(&self) -> Controls {
        Controls::for_state(self.state(), self.recording_exists())
    }

    pub fn audio_path(&self) -> &Path {
        &self.audio_path
    }

    /// A previous recording is on disk and has content
    pub fn recording_exists(&self) -> bool {
        std::fs::metadata(&self.audio_path)
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false)
    }

    pub async fn start_recording(&mut self) -> Result<(), ControllerError> {
        match self.state() {
            AppState::Idle => {}
            AppState::Recording => return Err(ControllerError::AlreadyRecording),
            state => {
                return Err(ControllerError::InvalidTransition {
                    command: "start recording",
                    state,
                });
            }
        }

        if !self.permission_granted {
            return Err(ControllerError::PermissionDenied);
        }

        if !self.capture.microphone_available() {
            tracing::warn!("Recording requested but no microphone is available");
            return Err(ControllerError::DeviceUnavailable);
        }

        if let Some(dir) = self.audio_path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| {
                tracing::error!("Failed to create {}: {}", dir.display(), e);
                ControllerError::prepare("recorder", e.into())
            })?;
        }

        let capture = self.capture.start(&self.audio_path).await.map_err(|e| {
            tracing::error!("Recorder prepare failed: {:#}", e);
            ControllerError::prepare("recorder", e)
        })?;

        self.session = Session::Recording(capture);
        self.status = Status::Recording;
        tracing::info!("Recording to {}", self.audio_path.display());
        Ok(())
    }

    pub async fn stop_recording(&mut self) -> Result<(), ControllerError> {
        let mut capture = match std::mem::replace(&mut self.session, Session::Idle) {
            Session::Recording(capture) => capture,
            other => {
                self.session = other;
                tracing::debug!("Stop recording ignored while {}", self.state());
                return Ok(());
            }
        };

        let result = capture.finish().await;
        drop(capture);

        match result {
            Ok(()) => {
                self.status = Status::RecordingSaved;
                tracing::info!("Recording saved to {}", self.audio_path.display());
                Ok(())
            }
            Err(e) => {
                self.status = Status::Ready;
                tracing::error!("Failed to finalize recording: {:#}", e);
                Err(ControllerError::FinalizeFailure(format!("{:#}", e)))
            }
        }
    }

    pub fn start_playback(&mut self) -> Result<(), ControllerError> {
        let state = self.state();
        if state != AppState::Idle {
            return Err(ControllerError::InvalidTransition {
                command: "start playback",
                state,
            });
        }

        if !self.recording_exists() {
            tracing::error!("No recording at {}", self.audio_path.display());
            return Err(ControllerError::PrepareFailure {
                resource: "player",
                reason: format!("no recording at {}", self.audio_path.display()),
            });
        }

        let id = self.next_playback_id;
        self.next_playback_id += 1;

        let completion = Completion::new(id, self.events_tx.clone());
        let playback = self.player.start(&self.audio_path, completion).map_err(|e| {
            tracing::error!("Player prepare failed: {:#}", e);
            ControllerError::prepare("player", e)
        })?;

        self.session = Session::Playing { id, playback };
        self.status = Status::Playing;
        Ok(())
    }

    pub fn stop_playback(&mut self) -> Result<(), ControllerError> {
        if !self.end_playback(None, Status::PlaybackStopped) {
            tracing::debug!("Stop playback ignored while {}", self.state());
        }
        Ok(())
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::PlaybackFinished { id } => {
                if !self.end_playback(Some(id), Status::PlaybackFinished) {
                    tracing::debug!("Ignoring stale completion for playback {}", id);
                }
            }
        }
    }

    /// Release whatever is active before the application exits
    pub async fn shutdown(&mut self) {
        match self.state() {
            AppState::Recording => {
                if let Err(e) = self.stop_recording().await {
                    tracing::warn!("Recording lost on shutdown: {}", e);
                }
            }
            AppState::Playing => {
                self.end_playback(None, Status::PlaybackStopped);
            }
            AppState::Idle => {}
        }
    }

    /// Shared exit path for explicit stop and natural completion. With an
    /// `expected` id only that playback is ended.
    fn end_playback(&mut self, expected: Option<u64>, status: Status) -> bool {
        match std::mem::replace(&mut self.session, Session::Idle) {
            Session::Playing { id, mut playback } if expected.is_none_or(|e| e == id) => {
                playback.stop();
                self.status = status;
                tracing::info!("Playback {} ended: {}", id, status);
                true
            }
            other => {
                self.session = other;
                false
            }
        }
    }
}
