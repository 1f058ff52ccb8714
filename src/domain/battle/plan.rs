//! Plan entity - an estimable work item inside a battle.
//!
//! A plan moves `Pending → Active → Revealed/Finalized` and may be reactivated
//! for a re-vote. The stored record only carries `active`, `points` and
//! `votes`; the status is derived from them.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{BattleId, PlanId, ValidationError, WarriorId};

use super::validated_text;

/// Maximum plan name length (matches the `plans.name` column).
pub const MAX_PLAN_NAME_LEN: usize = 256;

/// Maximum recorded point value length (matches the `plans.points` column).
pub const MAX_POINTS_LEN: usize = 3;

/// Maximum vote value length.
pub const MAX_VOTE_LEN: usize = 8;

/// One warrior's estimate for a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub warrior_id: WarriorId,
    #[serde(rename = "vote")]
    pub value: String,
}

impl Vote {
    pub fn new(warrior_id: WarriorId, value: impl Into<String>) -> Self {
        Self {
            warrior_id,
            value: value.into(),
        }
    }
}

/// Lifecycle status of a plan, derived from its stored fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    /// Created, never voted on (or ended with no votes).
    Pending,
    /// Open for voting; vote values are hidden.
    Active,
    /// Voting ended, votes visible, no points recorded.
    Revealed,
    /// Points recorded.
    Finalized,
}

impl PlanStatus {
    pub fn accepts_votes(&self) -> bool {
        matches!(self, PlanStatus::Active)
    }
}

/// An estimable work item owned by a battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: PlanId,
    #[serde(skip)]
    pub battle_id: BattleId,
    pub name: String,
    pub votes: Vec<Vote>,
    pub points: String,
    pub active: bool,
}

impl Plan {
    /// Creates a new pending plan with no votes.
    pub fn new(battle_id: BattleId, name: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            id: PlanId::new(),
            battle_id,
            name: validate_plan_name(name)?,
            votes: Vec::new(),
            points: String::new(),
            active: false,
        })
    }

    pub fn status(&self) -> PlanStatus {
        if self.active {
            PlanStatus::Active
        } else if !self.points.is_empty() {
            PlanStatus::Finalized
        } else if !self.votes.is_empty() {
            PlanStatus::Revealed
        } else {
            PlanStatus::Pending
        }
    }

    /// The vote cast by `warrior_id`, if any.
    pub fn vote_of(&self, warrior_id: &WarriorId) -> Option<&Vote> {
        self.votes.iter().find(|v| &v.warrior_id == warrior_id)
    }

    /// Upserts a vote keyed by warrior: overwrites an existing vote from the
    /// same warrior, otherwise appends.
    pub fn cast_vote(&mut self, warrior_id: WarriorId, value: impl Into<String>) {
        let value = value.into();
        match self.votes.iter_mut().find(|v| v.warrior_id == warrior_id) {
            Some(existing) => existing.value = value,
            None => self.votes.push(Vote::new(warrior_id, value)),
        }
    }

    /// Opens the plan for voting, wiping previous votes and points.
    pub fn activate(&mut self) {
        self.active = true;
        self.votes.clear();
        self.points.clear();
    }

    pub fn end_voting(&mut self) {
        self.active = false;
    }

    pub fn finalize(&mut self, points: impl Into<String>) {
        self.active = false;
        self.points = points.into();
    }

    /// Read-side projection: while the plan is active every vote value is
    /// emitted as an empty string. Stored values are untouched.
    pub fn projected(mut self) -> Self {
        if self.active {
            for vote in &mut self.votes {
                vote.value.clear();
            }
        }
        self
    }
}

pub fn validate_plan_name(name: &str) -> Result<String, ValidationError> {
    validated_text("name", name, MAX_PLAN_NAME_LEN)
}

pub fn validate_points(points: &str) -> Result<String, ValidationError> {
    validated_text("points", points, MAX_POINTS_LEN)
}

pub fn validate_vote_value(value: &str) -> Result<String, ValidationError> {
    validated_text("vote", value, MAX_VOTE_LEN)
}
