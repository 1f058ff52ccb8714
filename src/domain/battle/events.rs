//! Inbound event kinds and outbound update tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::BattleError;

/// Participant actions the dispatcher can route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BattleEventKind {
    Vote,
    Retreat,
    AddPlan,
    ActivatePlan,
    EndVoting,
    FinalizePlan,
    RevisePlan,
    BurnPlan,
}

impl BattleEventKind {
    pub const ALL: [BattleEventKind; 8] = [
        BattleEventKind::Vote,
        BattleEventKind::Retreat,
        BattleEventKind::AddPlan,
        BattleEventKind::ActivatePlan,
        BattleEventKind::EndVoting,
        BattleEventKind::FinalizePlan,
        BattleEventKind::RevisePlan,
        BattleEventKind::BurnPlan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BattleEventKind::Vote => "vote",
            BattleEventKind::Retreat => "retreat",
            BattleEventKind::AddPlan => "add_plan",
            BattleEventKind::ActivatePlan => "activate_plan",
            BattleEventKind::EndVoting => "end_voting",
            BattleEventKind::FinalizePlan => "finalize_plan",
            BattleEventKind::RevisePlan => "revise_plan",
            BattleEventKind::BurnPlan => "burn_plan",
        }
    }

    /// Tag carried by the snapshot this event produces.
    pub fn update_type(&self) -> BattleUpdateType {
        match self {
            BattleEventKind::Vote => BattleUpdateType::VoteActivity,
            BattleEventKind::Retreat => BattleUpdateType::WarriorRetreated,
            BattleEventKind::AddPlan => BattleUpdateType::PlanAdded,
            BattleEventKind::ActivatePlan => BattleUpdateType::PlanActivated,
            BattleEventKind::EndVoting => BattleUpdateType::VotingEnded,
            BattleEventKind::FinalizePlan => BattleUpdateType::PlanFinalized,
            BattleEventKind::RevisePlan => BattleUpdateType::PlanRevised,
            BattleEventKind::BurnPlan => BattleUpdateType::PlanBurned,
        }
    }
}

impl fmt::Display for BattleEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BattleEventKind {
    type Err = BattleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BattleEventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| BattleError::unknown_event_kind(s))
    }
}

/// Tags on outbound snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleUpdateType {
    /// Full battle snapshot sent to a warrior when it connects.
    Init,
    WarriorJoined,
    WarriorRetreated,
    VoteActivity,
    PlanAdded,
    PlanActivated,
    VotingEnded,
    PlanFinalized,
    PlanRevised,
    PlanBurned,
}
