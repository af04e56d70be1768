//! Error types for the mail.tm client.

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during mail.tm operations.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed before a response status was available
    /// (DNS, connection refused, timeout, truncated body).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("HTTP {status} from provider (body snippet: {body})")]
    RemoteRejected {
        /// Response status code.
        status: u16,
        /// First bytes of the response body, for diagnostics.
        body: String,
    },

    /// The requested resource does not exist (HTTP 404).
    #[error("resource not found")]
    NotFound,

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// The provider returned an empty domain list.
    #[error("No domains available")]
    NoDomains,

    /// An argument was rejected before any request was made.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Base URL could not be parsed.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// An extraction pattern failed to compile.
    #[error("pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// Session file could not be read or written.
    #[error("session storage error: {0}")]
    Io(#[from] std::io::Error),

    /// No per-user configuration directory on this platform.
    #[error("no configuration directory available")]
    NoConfigDir,
}

impl Error {
    /// Classify this error into a serializable [`ErrorKind`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Request(_) => ErrorKind::Network,
            Self::RemoteRejected { status, .. } => ErrorKind::RemoteRejected { status: *status },
            Self::NotFound => ErrorKind::NotFound,
            Self::Json(_) | Self::NoDomains => ErrorKind::MalformedResponse,
            Self::InvalidInput(_) | Self::Url(_) => ErrorKind::InvalidInput,
            Self::Pattern(_) => ErrorKind::Extraction,
            Self::Io(_) | Self::NoConfigDir => ErrorKind::Storage,
        }
    }

    /// `true` when the failure happened before the provider answered.
    pub fn is_network(&self) -> bool {
        matches!(self.kind(), ErrorKind::Network)
    }
}

/// Coarse error classification callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorKind {
    /// Transport failure (DNS, connection refused, timeout).
    Network,
    /// Provider answered with a non-2xx status other than 404.
    RemoteRejected {
        /// HTTP status code.
        status: u16,
    },
    /// Provider answered 404.
    NotFound,
    /// Provider answered 2xx with a body we could not use.
    MalformedResponse,
    /// Rejected locally before sending.
    InvalidInput,
    /// Pattern scan failed.
    Extraction,
    /// Local session file problem.
    Storage,
}

/// Public operations, each with the display string shown when it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Create a mailbox and log in.
    CreateAccount,
    /// Delete the authenticated mailbox.
    DeleteAccount,
    /// List message summaries.
    ListMessages,
    /// Read one message.
    ReadMessage,
    /// Update the seen flag on one message.
    UpdateSeen,
    /// Scan for a one-time passcode.
    ExtractOtp,
    /// Scan for a verification link.
    ExtractLink,
}

impl Operation {
    /// Short human string surfaced to end users when this operation fails.
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::CreateAccount => "Temp mail failed",
            Self::DeleteAccount => "Delete failed",
            Self::ListMessages => "Failed to fetch emails",
            Self::ReadMessage => "Read failed",
            Self::UpdateSeen => "Failed to update seen status",
            Self::ExtractOtp => "Failed to extract OTP",
            Self::ExtractLink => "Failed to extract verification link",
        }
    }
}
