//! Application handlers.
//!
//! Services that orchestrate battle operations over the ports, and the
//! event handlers the dispatcher routes participant actions to.

mod battle;
mod battle_events;
mod membership;
mod voting;

pub use battle::BattleService;
pub use battle_events::{
    battle_dispatcher, ActivatePlanHandler, AddPlanHandler, BurnPlanHandler, EndVotingHandler,
    FinalizePlanHandler, RetreatHandler, RevisePlanHandler, VoteHandler,
};
pub use membership::MembershipService;
pub use voting::VotingService;
