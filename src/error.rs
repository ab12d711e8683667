//! Crate-level error type.
//!
//! The rule engine is total and never produces an error. Everything else
//! (feedback, the session store, the report file, configuration and the
//! HTTP boundary) reports failures through [`AdvisorError`].

use thiserror::Error;

use crate::session::Outcome;

pub type Result<T> = std::result::Result<T, AdvisorError>;

#[derive(Debug, Error)]
pub enum AdvisorError {
    /// Malformed symptom vector, outcome string or report body.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// Feedback arrived for a session whose outcome is already terminal.
    #[error("session '{id}' already finalized as {outcome}")]
    AlreadyFinalized { id: String, outcome: Outcome },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AdvisorError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn session_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "session",
            id: id.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Error for a `RwLock`/`Mutex` whose holder panicked.
    pub fn poisoned(what: &str) -> Self {
        Self::Internal(format!("{what} lock poisoned"))
    }

    /// HTTP status the boundary answers with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AdvisorError::Validation(_) | AdvisorError::Json(_) => 400,
            AdvisorError::NotFound { .. } => 404,
            AdvisorError::AlreadyFinalized { .. } => 409,
            AdvisorError::Io(_) | AdvisorError::Config(_) | AdvisorError::Internal(_) => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

impl From<toml::de::Error> for AdvisorError {
    fn from(err: toml::de::Error) -> Self {
        AdvisorError::Config(err.to_string())
    }
}
