//! Unified error handling for the OP bot.
//!
//! Nothing here is fatal to the process. Each error stays local to the
//! command or event that produced it and is turned into a log line or a
//! user-visible reply by the caller.

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

// ============================================================================
// Registry Errors (snapshot persistence)
// ============================================================================

/// Errors reading or writing the registry snapshot.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl RegistryError {
    /// Get a static error code string for log labelling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "snapshot_io",
            Self::Json(_) => "snapshot_json",
        }
    }
}

// ============================================================================
// Transport Errors (IRC connection)
// ============================================================================

/// Errors raised by the IRC transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection closed")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("line codec error: {0}")]
    Codec(#[from] LinesCodecError),

    #[error("registration failed: {0}")]
    Registration(String),
}

impl TransportError {
    /// Get a static error code string for log labelling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Io(_) => "io",
            Self::Tls(_) => "tls",
            Self::Codec(_) => "codec",
            Self::Registration(_) => "registration",
        }
    }
}
