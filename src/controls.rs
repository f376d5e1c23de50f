use crate::messages::AppState;
use std::fmt;

/// Which of the four triggers are usable
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Controls {
    pub record: bool,
    pub stop_record: bool,
    pub play: bool,
    pub stop_play: bool,
}

impl Controls {
    /// Enablement after a transition into `state`
    pub fn for_state(state: AppState, recording_exists: bool) -> Self {
        match state {
            AppState::Idle => Self {
                record: true,
                play: recording_exists,
                ..Self::default()
            },
            AppState::Recording => Self {
                stop_record: true,
                ..Self::default()
            },
            AppState::Playing => Self {
                stop_play: true,
                ..Self::default()
            },
        }
    }
}

/// Status line shown to the user
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Ready,
    Recording,
    RecordingSaved,
    Playing,
    PlaybackFinished,
    PlaybackStopped,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Status::Ready => "Ready",
            Status::Recording => "Recording...",
            Status::RecordingSaved => "Recording saved",
            Status::Playing => "Playing...",
            Status::PlaybackFinished => "Playback finished",
            Status::PlaybackStopped => "Playback stopped",
        };
        f.write_str(text)
    }
}
