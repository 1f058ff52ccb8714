//! Authentication types for the domain layer.
//!
//! Identity validation itself is an external concern; these types are what
//! any `SessionValidator` adapter hands back to the core. The core trusts the
//! resolved warrior identifier as-is for every dispatched event.

use super::WarriorId;
use thiserror::Error;

/// Warrior identity resolved from a validated connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedWarrior {
    /// The warrior behind the connection.
    pub id: WarriorId,

    /// Display name, for logging and join notifications.
    pub name: String,
}

impl AuthenticatedWarrior {
    pub fn new(id: WarriorId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Authentication errors that can occur during token validation.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The token is missing or malformed.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Token is well formed but no such warrior exists.
    #[error("Warrior not found")]
    WarriorNotFound,

    /// The identity backend is unavailable.
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Returns true if this is a transient error that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::ServiceUnavailable(_))
    }
}
