/// Triggers coming from the user
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserCommand {
    StartRecording,
    StopRecording,
    StartPlayback,
    StopPlayback,
    Help,
    Quit,
}

/// Events emitted by active resources
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppEvent {
    /// A playback reached the end of the file on its own
    PlaybackFinished { id: u64 },
}

/// Session state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppState {
    Idle,
    Recording,
    Playing,
}

impl std::fmt::Display for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AppState::Idle => "idle",
            AppState::Recording => "recording",
            AppState::Playing => "playing",
        };
        f.write_str(name)
    }
}
