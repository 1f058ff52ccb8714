//! Battle aggregate - one estimation session.

use serde::{Serialize, Serializer};

use crate::domain::foundation::{BattleId, PlanId, ValidationError, WarriorId};

use super::{validated_text, Plan, Warrior};

/// Maximum battle name length (matches the `battles.name` column).
pub const MAX_BATTLE_NAME_LEN: usize = 256;

/// Stored battle record.
///
/// Invariant: `voting_locked == false` only while `active_plan_id` names a
/// plan that is open for voting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Battle {
    pub id: BattleId,
    pub leader_id: WarriorId,
    pub name: String,
    pub voting_locked: bool,
    pub active_plan_id: Option<PlanId>,
}

impl Battle {
    /// Creates a new battle led by `leader_id`, locked with no active plan.
    pub fn new(leader_id: WarriorId, name: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            id: BattleId::new(),
            leader_id,
            name: validated_text("name", name, MAX_BATTLE_NAME_LEN)?,
            voting_locked: true,
            active_plan_id: None,
        })
    }

    pub fn is_leader(&self, warrior_id: &WarriorId) -> bool {
        &self.leader_id == warrior_id
    }
}

/// Full battle state as sent to participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleSnapshot {
    pub id: BattleId,
    pub leader_id: WarriorId,
    pub name: String,
    pub warriors: Vec<Warrior>,
    pub plans: Vec<Plan>,
    pub voting_locked: bool,
    #[serde(serialize_with = "empty_when_none")]
    pub active_plan_id: Option<PlanId>,
}

impl BattleSnapshot {
    /// Assembles a snapshot. `plans` are expected to be projected already.
    pub fn new(battle: Battle, warriors: Vec<Warrior>, plans: Vec<Plan>) -> Self {
        Self {
            id: battle.id,
            leader_id: battle.leader_id,
            name: battle.name,
            warriors,
            plans,
            voting_locked: battle.voting_locked,
            active_plan_id: battle.active_plan_id,
        }
    }
}

fn empty_when_none<S: Serializer>(id: &Option<PlanId>, serializer: S) -> Result<S::Ok, S::Error> {
    match id {
        Some(id) => serializer.collect_str(id),
        None => serializer.serialize_str(""),
    }
}
