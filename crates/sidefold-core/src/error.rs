//! Error types for the Sidefold engine.

use thiserror::Error;

/// A shared error type for the Sidefold engine crates.
///
/// Most degraded conditions in this system are recovered locally (an empty
/// turn list on a resolution miss, a state reset on a corrupt blob, a no-op
/// on a dangling reference) and never surface here. The variants below cover
/// the conditions that must be reported to the caller.
#[derive(Error, Debug, Clone)]
pub enum SidefoldError {
    /// No provider resolver matched the host origin. This is the one fatal
    /// startup condition: without a resolver nothing else can operate.
    #[error("No provider matched origin '{origin}'")]
    NoProviderMatched { origin: String },

    /// Settings-store access failed (read or write).
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Serialization failure while persisting state.
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SidefoldError {
    /// Creates a NoProviderMatched error.
    pub fn no_provider(origin: impl Into<String>) -> Self {
        Self::NoProviderMatched {
            origin: origin.into(),
        }
    }

    /// Creates a Storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a Serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is the fatal unmatched-provider condition.
    pub fn is_no_provider(&self) -> bool {
        matches!(self, Self::NoProviderMatched { .. })
    }

    /// Check if this is a storage error.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }
}

impl From<std::io::Error> for SidefoldError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for SidefoldError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, SidefoldError>`.
pub type Result<T> = std::result::Result<T, SidefoldError>;
