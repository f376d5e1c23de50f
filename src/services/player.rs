use super::{ActivePlayback, Completion, PlaybackService};
use crate::audio::AudioPlayback;
use anyhow::Result;
use std::path::Path;

/// Plays recordings on the default output device
#[derive(Default)]
pub struct SpeakerPlayer;

impl PlaybackService for SpeakerPlayer {
    fn start(&self, path: &Path, completion: Completion) -> Result<Box<dyn ActivePlayback>> {
        let playback = AudioPlayback::start(path)?;
        tracing::debug!("Playback {} waiting for end of file", completion.id());
        playback.on_end(move || completion.notify());

        Ok(Box::new(SpeakerPlayback {
            playback: Some(playback),
        }))
    }
}

struct SpeakerPlayback {
    playback: Option<AudioPlayback>,
}

impl ActivePlayback for SpeakerPlayback {
    fn stop(&mut self) {
        if let Some(playback) = self.playback.take() {
            playback.stop();
        }
    }
}
