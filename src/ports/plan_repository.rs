//! Plan repository port.
//!
//! Plans, their votes, and the voting-state transitions. Transitions that
//! touch the owning battle row (active plan reference, voting lock) are
//! expressed here because they are driven by a plan.
//!
//! Every method commits on its own. Callers re-read with `list_by_battle`
//! after mutating rather than patching a local copy.

use async_trait::async_trait;

use crate::domain::battle::{Plan, Vote};
use crate::domain::foundation::{BattleId, DomainError, PlanId};

/// Repository port for plans and votes.
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// Save a new plan.
    ///
    /// # Errors
    ///
    /// - `BattleNotFound` if the owning battle doesn't exist
    async fn create(&self, plan: &Plan) -> Result<(), DomainError>;

    /// Find a plan by ID with its stored (unredacted) votes.
    async fn find_by_id(&self, id: &PlanId) -> Result<Option<Plan>, DomainError>;

    /// All plans of a battle in storage order, with stored votes.
    async fn list_by_battle(&self, battle_id: &BattleId) -> Result<Vec<Plan>, DomainError>;

    /// Replace the vote list of an active plan.
    ///
    /// # Errors
    ///
    /// - `PlanNotFound` if the plan doesn't exist
    /// - `InvalidStateTransition` if the plan is not active
    async fn save_votes(&self, id: &PlanId, votes: &[Vote]) -> Result<(), DomainError>;

    /// Rename a plan.
    ///
    /// # Errors
    ///
    /// - `PlanNotFound` if the plan doesn't exist
    async fn rename(&self, id: &PlanId, name: &str) -> Result<(), DomainError>;

    /// Open voting on `id`: every other plan of the battle becomes inactive,
    /// the target becomes active with votes and points wiped, and the battle is
    /// unlocked with `active_plan_id = id`.
    async fn activate(&self, battle_id: &BattleId, id: &PlanId) -> Result<(), DomainError>;

    /// Close voting: every plan of the battle inactive, battle locked.
    /// The active plan reference is kept.
    async fn end_voting(&self, battle_id: &BattleId) -> Result<(), DomainError>;

    /// Record points: plan inactive with `points`. The battle's active plan
    /// is cleared and voting locked unless a round is open on another plan.
    async fn finalize(
        &self,
        battle_id: &BattleId,
        id: &PlanId,
        points: &str,
    ) -> Result<(), DomainError>;

    /// Delete a plan and its votes. Returns whether it was active.
    ///
    /// # Errors
    ///
    /// - `PlanNotFound` if the plan doesn't exist
    async fn delete(&self, id: &PlanId) -> Result<bool, DomainError>;
}
