use thiserror::Error;

/// Which layer a failure came from.  Callers surface all three identically;
/// the distinction only matters for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Application,
    Decode,
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced an HTTP response (connect, reset, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status line.
    #[error("Server answer: {status} - {reason}")]
    Status { status: u16, reason: String },

    /// Well-formed envelope with `state: "error"`.  Displays the server's
    /// message unchanged.
    #[error("{0}")]
    Application(String),

    /// The response body was not valid JSON, or lacked a required field.
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Network(_) | Self::Status { .. } | Self::InvalidUrl(_) => FailureKind::Transport,
            Self::Application(_) => FailureKind::Application,
            Self::Decode(_) => FailureKind::Decode,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
