use std::time::Duration;

use foundation::ids::PageId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NarrativeError {
    #[error("{0}: a narrative request is already in flight")]
    AlreadyPending(PageId),
    #[error("{0}: no clusters to describe")]
    NoClusters(PageId),
    #[error("model request failed: {0}")]
    Transport(String),
    #[error("model returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model response has no message content")]
    MissingContent,
    #[error("malformed model response: {0}")]
    Malformed(String),
    #[error("{got} narratives for {expected} clusters")]
    Misaligned { expected: usize, got: usize },
    #[error("narrative for unknown cluster id {0:?}")]
    UnknownId(String),
    #[error("model did not answer within {0:?}")]
    Timeout(Duration),
    #[error("request cancelled")]
    Cancelled,
}

impl From<serde_json::Error> for NarrativeError {
    fn from(err: serde_json::Error) -> Self {
        NarrativeError::Malformed(err.to_string())
    }
}

impl From<reqwest::Error> for NarrativeError {
    fn from(err: reqwest::Error) -> Self {
        NarrativeError::Transport(err.to_string())
    }
}
