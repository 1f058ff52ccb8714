//! Battle domain module.
//!
//! A battle is one planning-poker session: a leader proposes plans, opens
//! voting on one plan at a time, warriors vote, and the leader ends voting
//! and records points.
//!
//! Invariants:
//! - At most one plan per battle is active.
//! - Activating a plan clears its votes and points.
//! - Vote values are hidden in every projection while their plan is active.

mod aggregate;
mod errors;
mod events;
mod plan;
mod warrior;

pub use aggregate::{Battle, BattleSnapshot, MAX_BATTLE_NAME_LEN};
pub use errors::BattleError;
pub use events::{BattleEventKind, BattleUpdateType};
pub use plan::{
    validate_plan_name, validate_points, validate_vote_value, Plan, PlanStatus, Vote,
    MAX_PLAN_NAME_LEN, MAX_POINTS_LEN, MAX_VOTE_LEN,
};
pub use warrior::{Warrior, MAX_WARRIOR_NAME_LEN};

use crate::domain::foundation::ValidationError;

/// Trims `value` and checks it is non-empty and at most `max` characters.
pub(crate) fn validated_text(field: &str, value: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::empty_field(field));
    }
    let len = trimmed.chars().count();
    if len > max {
        return Err(ValidationError::too_long(field, max, len));
    }
    Ok(trimmed.to_string())
}
