//! Error types for the Opsdesk console core.

use thiserror::Error;

/// A shared error type for the console orchestration layer.
///
/// Remote failures collapse into two transport-visible kinds: the backend
/// was unreachable (`NetworkUnavailable`) or it answered with a non-2xx
/// response (`Rejected`). Finer-grained backend codes are not modeled here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OpsdeskError {
    /// No response from the backend at all.
    #[error("network unavailable: {message}")]
    NetworkUnavailable { message: String },

    /// The backend answered with a non-2xx response.
    #[error("request rejected: {message}")]
    Rejected { status: Option<u16>, message: String },

    /// The session is no longer valid. Session teardown is the transport
    /// collaborator's job; this variant only reports the condition.
    #[error("session expired or unauthorized")]
    Unauthorized,

    /// Entity not found error with type information
    #[error("{entity_type} not found: '{id}'")]
    NotFound { entity_type: &'static str, id: String },

    /// A guarded action was initiated from a state that does not allow it.
    #[error("action not available: {0}")]
    InvalidAction(String),

    /// Serialization/deserialization error
    #[error("serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Local key-value store error
    #[error("storage error: {0}")]
    Storage(String),

    /// Internal error (should not happen in normal operation)
    #[error("internal error: {0}")]
    Internal(String),
}

impl OpsdeskError {
    /// Creates a NetworkUnavailable error
    pub fn network_unavailable(message: impl Into<String>) -> Self {
        Self::NetworkUnavailable {
            message: message.into(),
        }
    }

    /// Creates a Rejected error from an HTTP status and response body.
    pub fn rejected(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an InvalidAction error
    pub fn invalid_action(message: impl Into<String>) -> Self {
        Self::InvalidAction(message.into())
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an Unauthorized error
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Check if this error came from the remote boundary.
    ///
    /// Returns true for both transport failures and rejected responses.
    /// Every remote failure in this layer is locally recoverable by retry.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::NetworkUnavailable { .. } | Self::Rejected { .. } | Self::Unauthorized
        )
    }
}

impl From<std::io::Error> for OpsdeskError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(format!("{} (kind: {:?})", err, err.kind()))
    }
}

impl From<serde_json::Error> for OpsdeskError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for OpsdeskError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for OpsdeskError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error (used at the key-value store seam)
impl From<anyhow::Error> for OpsdeskError {
    fn from(err: anyhow::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

/// A type alias for `Result<T, OpsdeskError>`.
pub type Result<T> = std::result::Result<T, OpsdeskError>;
