use crate::audio::device;
use crate::config::Config;
use crate::controller::Controller;
use crate::input;
use crate::messages::{AppEvent, UserCommand};
use crate::permission::{self, GrantSource, TerminalPrompt};
use crate::services::{MicRecorder, SpeakerPlayer};
use crate::view::TerminalView;

use anyhow::Result;
use tokio::sync::mpsc;

pub struct App {
    controller: Controller,
    view: TerminalView,
    lines: mpsc::Receiver<String>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
    /// Resolve permissions and wire up the audio services
    ///
    /// Fails with the permission error when the user says no; nothing else is
    /// set up in that case.
    pub async fn new(mut config: Config) -> Result<Self> {
        let mut lines = input::spawn_stdin_reader();
        Self::request_permissions(&mut config, &mut lines).await?;

        let devices = device::list_input_devices();
        tracing::debug!("Input devices: {:?}", devices);

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let recorder = MicRecorder::new(config.audio_format(), config.input_device.clone());
        let controller = Controller::new(
            Box::new(recorder),
            Box::new(SpeakerPlayer),
            config.audio_path(),
            config.permissions_granted,
            events_tx,
        );

        tracing::info!("Ready! Recording to {}", controller.audio_path().display());

        Ok(Self {
            controller,
            view: TerminalView::default(),
            lines,
            events_rx,
        })
    }

    async fn request_permissions(
        config: &mut Config,
        lines: &mut mpsc::Receiver<String>,
    ) -> Result<()> {
        let mut prompt = TerminalPrompt::new(lines);
        let source =
            permission::resolve(config.permissions_granted, &config.cache_dir(), &mut prompt)
                .await?;

        if source == GrantSource::Prompt {
            config.permissions_granted = true;
            if let Err(e) = config.save() {
                tracing::warn!("Failed to remember permission grant: {:#}", e);
            }
        }

        Ok(())
    }

    pub async fn run(mut self) -> Result<()> {
        self.view.help();
        self.refresh();

        loop {
            tracing::debug!("Main loop: waiting for event");
            tokio::select! {
                line = self.lines.recv() => {
                    let Some(line) = line else {
                        tracing::info!("Input closed, shutting down");
                        break;
                    };
                    match input::parse_command(&line) {
                        Some(UserCommand::Quit) => break,
                        Some(command) => self.handle_command(command).await,
                        None => {}
                    }
                }

                Some(event) = self.events_rx.recv() => {
                    tracing::debug!("Main loop: {:?}", event);
                    self.controller.handle_event(event);
                    self.refresh();
                }

                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received Ctrl+C, shutting down");
                    break;
                }
            }
        }

        self.controller.shutdown().await;
        self.refresh();
        tracing::info!("recplay shutdown complete");
        Ok(())
    }

    async fn handle_command(&mut self, command: UserCommand) {
        tracing::debug!(
            "handle_command: {:?} while {}",
            command,
            self.controller.state()
        );

        let result = match command {
            UserCommand::StartRecording => self.controller.start_recording().await,
            UserCommand::StopRecording => self.controller.stop_recording().await,
            UserCommand::StartPlayback => self.controller.start_playback(),
            UserCommand::StopPlayback => self.controller.stop_playback(),
            UserCommand::Help | UserCommand::Quit => {
                self.view.help();
                Ok(())
            }
        };

        if let Err(e) = result {
            tracing::warn!("{:?} refused: {}", command, e);
            self.view.notice(&e);
        }

        self.refresh();
    }

    fn refresh(&mut self) {
        self.view
            .show(self.controller.status(), self.controller.controls());
    }
}
