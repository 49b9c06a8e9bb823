use thiserror::Error;

use crate::models::Role;

/// Errors raised by the portal data layer.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Remote error: {0}")]
    Remote(#[from] reqwest::Error),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Storage not initialized. Run 'placement-hub init' first.")]
    NotInitialized,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Not signed in. Run 'placement-hub login' first.")]
    NotSignedIn,

    #[error("A {role} account cannot {action}")]
    Forbidden { role: Role, action: String },

    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl PortalError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        PortalError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

pub type Result<T, E = PortalError> = std::result::Result<T, E>;
