//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps, authentication and error types
//! that form the vocabulary of the battle domain.

mod auth;
mod errors;
mod ids;
mod timestamp;

pub use auth::{AuthError, AuthenticatedWarrior};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{BattleId, ClientId, PlanId, WarriorId};
pub use timestamp::Timestamp;
