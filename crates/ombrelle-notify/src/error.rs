use thiserror::Error;

/// Errors that can occur while sending a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Transport-level HTTP failure (connect, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("Send rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// No transport is configured.
    #[error("Notifier unavailable: {0}")]
    Unavailable(String),
}
