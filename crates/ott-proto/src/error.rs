use thiserror::Error;

/// Failures of the schedule service and the tracker that consumes it.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid schedule document: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no channel schedule could be fetched")]
    AllFailed,

    #[error("live channel tracker has stopped")]
    Closed,
}

impl ScheduleError {
    /// Stable code used to look up a user-facing message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Http(_) => "network_error",
            Self::Status { .. } => "bad_status",
            Self::Io { .. } => "io_error",
            Self::Decode(_) => "invalid_schedule",
            Self::AllFailed => "schedule_unavailable",
            Self::Closed => "tracker_stopped",
        }
    }
}
