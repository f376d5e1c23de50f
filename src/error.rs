use crate::messages::AppState;

/// Why a controller transition was refused
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("could not prepare the {resource}: {reason}")]
    PrepareFailure {
        resource: &'static str,
        reason: String,
    },

    #[error("recording could not be saved: {0}")]
    FinalizeFailure(String),

    #[error("permission to record audio was not granted")]
    PermissionDenied,

    #[error("microphone not available")]
    DeviceUnavailable,

    #[error("already recording")]
    AlreadyRecording,

    #[error("cannot {command} while {state}")]
    InvalidTransition {
        command: &'static str,
        state: AppState,
    },
}

impl ControllerError {
    pub fn prepare(resource: &'static str, err: anyhow::Error) -> Self {
        Self::PrepareFailure {
            resource,
            reason: format!("{:#}", err),
        }
    }
}
