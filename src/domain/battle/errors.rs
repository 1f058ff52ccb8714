//! Battle-specific error types.
//!
//! These are the errors reported to the originating participant. Storage
//! detail never crosses this boundary: a `DatabaseError` is logged on
//! conversion and surfaces as the generic `StorageFailure`.

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

/// Errors produced by battle operations and event dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BattleError {
    /// A battle, plan or warrior reference did not resolve.
    NotFound { entity: &'static str, id: String },
    /// The acting warrior may not perform this operation.
    Forbidden,
    /// The operation is not legal in the current plan/battle state.
    InvalidTransition(String),
    /// The dispatcher has no handler for this event kind.
    UnknownEventKind(String),
    /// Payload or value failed validation.
    ValidationFailed { field: String, message: String },
    /// The underlying store call failed.
    StorageFailure,
}

impl BattleError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        BattleError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
    pub fn invalid_transition(message: impl Into<String>) -> Self {
        BattleError::InvalidTransition(message.into())
    }
    pub fn unknown_event_kind(kind: impl Into<String>) -> Self {
        BattleError::UnknownEventKind(kind.into())
    }
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        BattleError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Stable wire code.
    pub fn code(&self) -> &'static str {
        match self {
            BattleError::NotFound { .. } => "NOT_FOUND",
            BattleError::Forbidden => "FORBIDDEN",
            BattleError::InvalidTransition(_) => "INVALID_TRANSITION",
            BattleError::UnknownEventKind(_) => "UNKNOWN_EVENT_KIND",
            BattleError::ValidationFailed { .. } => "VALIDATION_FAILED",
            BattleError::StorageFailure => "STORAGE_FAILURE",
        }
    }

    /// User-facing message.
    pub fn message(&self) -> String {
        match self {
            BattleError::NotFound { entity, id } if id.is_empty() => {
                format!("{} not found", capitalize(entity))
            }
            BattleError::NotFound { entity, id } => {
                format!("{} not found: {}", capitalize(entity), id)
            }
            BattleError::Forbidden => "Only the battle leader can do that".to_string(),
            BattleError::InvalidTransition(msg) => format!("Invalid transition: {}", msg),
            BattleError::UnknownEventKind(kind) => format!("Unknown event kind: {}", kind),
            BattleError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            BattleError::StorageFailure => "Something went wrong, please try again".to_string(),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl std::fmt::Display for BattleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for BattleError {}

impl From<DomainError> for BattleError {
    fn from(err: DomainError) -> Self {
        let id = err.details.get("id").cloned().unwrap_or_default();
        match err.code {
            ErrorCode::BattleNotFound => BattleError::NotFound { entity: "battle", id },
            ErrorCode::PlanNotFound => BattleError::NotFound { entity: "plan", id },
            ErrorCode::WarriorNotFound => BattleError::NotFound { entity: "warrior", id },
            ErrorCode::Forbidden | ErrorCode::Unauthorized => BattleError::Forbidden,
            ErrorCode::InvalidStateTransition => BattleError::InvalidTransition(err.message),
            ErrorCode::ValidationFailed => BattleError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                tracing::error!(code = %err.code, error = %err.message, "storage operation failed");
                BattleError::StorageFailure
            }
        }
    }
}

impl From<ValidationError> for BattleError {
    fn from(err: ValidationError) -> Self {
        BattleError::ValidationFailed {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_errors_hide_detail() {
        let err: BattleError =
            DomainError::new(ErrorCode::DatabaseError, "connection refused on 10.0.0.3").into();

        assert_eq!(err, BattleError::StorageFailure);
        assert!(!err.message().contains("10.0.0.3"));
    }

    #[test]
    fn not_found_codes_carry_entity_and_id() {
        let err: BattleError = DomainError::new(ErrorCode::PlanNotFound, "Plan not found")
            .with_detail("id", "abc")
            .into();

        assert_eq!(err, BattleError::not_found("plan", "abc"));
        assert_eq!(err.message(), "Plan not found: abc");
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn validation_error_keeps_field() {
        let err: BattleError = ValidationError::empty_field("name").into();
        assert!(matches!(err, BattleError::ValidationFailed { ref field, .. } if field == "name"));
    }

    #[test]
    fn unknown_event_kind_code() {
        let err = BattleError::unknown_event_kind("jab_warrior");
        assert_eq!(err.code(), "UNKNOWN_EVENT_KIND");
        assert_eq!(err.to_string(), "Unknown event kind: jab_warrior");
    }
}
