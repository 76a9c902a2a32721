use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing credential or unusable settings. Fatal at start-up.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A single descriptor could not be fetched or parsed.
    #[error("Discovery failed for '{tool}': {reason}")]
    Discovery { tool: String, reason: String },

    /// The remote service refused to create a run.
    #[error("Run submission failed{}: {body}", status_suffix(.status))]
    Submission { status: Option<u16>, body: String },

    /// Non-success response on an idempotent call (listing, describe, status).
    #[error("Remote service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|s| format!(" with status {}", s))
        .unwrap_or_default()
}

impl Error {
    /// Helper for creating configuration errors
    ///
    /// # Example
    /// ```
    /// use runbridge_core::Error;
    /// let err = Error::config_error("RUNBRIDGE_API_KEY is not set");
    /// ```
    pub fn config_error(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub fn discovery(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Discovery {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Helper for creating general errors with a message
    pub fn message(msg: impl Into<String>) -> Self {
        Error::Other(anyhow::anyhow!("{}", msg.into()))
    }

    /// Whether retrying the same request could plausibly succeed.
    ///
    /// Timeouts, connection failures, throttling (429) and server errors (5xx)
    /// are transient. Everything else, including every submission failure, is not.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            Error::Status { status, .. } => *status == 429 || *status >= 500,
            Error::Stream(_) | Error::Io(_) => true,
            _ => false,
        }
    }
}
