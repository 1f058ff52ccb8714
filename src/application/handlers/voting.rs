//! VotingService - the battle/plan lifecycle state machine.
//!
//! Every operation mutates the store and then re-reads the battle's full
//! plan list, returning that authoritative list (projected) rather than a
//! locally patched copy. The re-read bounds the lost-update window of two
//! concurrent votes to the width of the read query; a dropped vote shows up
//! again on the next full re-read.
//!
//! Known race: `submit_vote` is read-modify-write on the plan's vote list
//! with no lock held across the store round trip. Two first-time votes on the
//! same plan arriving together can interleave so the second write drops the
//! first. The damage is one vote per warrior, visible on the next snapshot.

use std::sync::Arc;

use crate::domain::battle::{
    validate_plan_name, validate_points, validate_vote_value, BattleError, Plan,
};
use crate::domain::foundation::{BattleId, PlanId, WarriorId};
use crate::ports::{BattleRepository, PlanRepository};

/// Enforces plan lifecycle rules on top of the repositories.
pub struct VotingService {
    battles: Arc<dyn BattleRepository>,
    plans: Arc<dyn PlanRepository>,
}

impl VotingService {
    pub fn new(battles: Arc<dyn BattleRepository>, plans: Arc<dyn PlanRepository>) -> Self {
        Self { battles, plans }
    }

    /// Current plans of a battle, with vote values hidden on the active plan.
    pub async fn plans(&self, battle_id: &BattleId) -> Result<Vec<Plan>, BattleError> {
        let plans = self.plans.list_by_battle(battle_id).await?;
        Ok(plans.into_iter().map(Plan::projected).collect())
    }

    /// Adds a pending plan with no votes.
    pub async fn create_plan(
        &self,
        battle_id: &BattleId,
        name: &str,
    ) -> Result<Vec<Plan>, BattleError> {
        let plan = Plan::new(*battle_id, name)?;
        self.plans.create(&plan).await?;

        tracing::info!(battle_id = %battle_id, plan_id = %plan.id, "plan created");
        self.plans(battle_id).await
    }

    /// Opens voting on a plan. Every other plan of the battle is forced
    /// inactive and the target's votes and points are wiped. Re-activating the
    /// already active plan is allowed and starts a fresh round.
    pub async fn activate_voting(
        &self,
        battle_id: &BattleId,
        plan_id: &PlanId,
    ) -> Result<Vec<Plan>, BattleError> {
        self.plan_in_battle(battle_id, plan_id).await?;
        self.plans.activate(battle_id, plan_id).await?;

        tracing::info!(battle_id = %battle_id, plan_id = %plan_id, "voting activated");
        self.plans(battle_id).await
    }

    /// Upserts the warrior's vote on the active plan.
    ///
    /// Votes on a plan that is not open for voting are rejected with
    /// `InvalidTransition`; they would be wiped on the next activation anyway.
    pub async fn submit_vote(
        &self,
        battle_id: &BattleId,
        warrior_id: &WarriorId,
        plan_id: &PlanId,
        value: &str,
    ) -> Result<Vec<Plan>, BattleError> {
        let value = validate_vote_value(value)?;
        let mut plan = self.plan_in_battle(battle_id, plan_id).await?;

        if !plan.status().accepts_votes() {
            return Err(BattleError::invalid_transition(format!(
                "plan {} is not open for voting",
                plan_id
            )));
        }

        plan.cast_vote(*warrior_id, value);
        self.plans.save_votes(plan_id, &plan.votes).await?;

        tracing::debug!(
            battle_id = %battle_id,
            plan_id = %plan_id,
            warrior_id = %warrior_id,
            "vote recorded"
        );
        self.plans(battle_id).await
    }

    /// Closes voting and reveals the votes. The active plan reference stays
    /// so clients can keep showing the revealed plan.
    pub async fn end_voting(
        &self,
        battle_id: &BattleId,
        plan_id: &PlanId,
    ) -> Result<Vec<Plan>, BattleError> {
        self.plan_in_battle(battle_id, plan_id).await?;
        self.plans.end_voting(battle_id).await?;

        tracing::info!(battle_id = %battle_id, plan_id = %plan_id, "voting ended");
        self.plans(battle_id).await
    }

    /// Records the agreed points and clears the battle's active plan.
    pub async fn finalize_plan(
        &self,
        battle_id: &BattleId,
        plan_id: &PlanId,
        points: &str,
    ) -> Result<Vec<Plan>, BattleError> {
        let points = validate_points(points)?;
        self.plan_in_battle(battle_id, plan_id).await?;
        self.plans.finalize(battle_id, plan_id, &points).await?;

        tracing::info!(
            battle_id = %battle_id,
            plan_id = %plan_id,
            points = %points,
            "plan finalized"
        );
        self.plans(battle_id).await
    }

    /// Deletes a plan. Burning the active plan, or the revealed plan the battle
    /// still points at, locks voting and clears the active plan reference.
    pub async fn burn_plan(
        &self,
        battle_id: &BattleId,
        plan_id: &PlanId,
    ) -> Result<Vec<Plan>, BattleError> {
        self.plan_in_battle(battle_id, plan_id).await?;
        let was_active = self.plans.delete(plan_id).await?;
        let referenced = match self.battles.find_by_id(battle_id).await? {
            Some(battle) => battle.active_plan_id == Some(*plan_id),
            None => false,
        };

        if was_active || referenced {
            self.battles.lock_voting(battle_id).await?;
        }

        tracing::info!(
            battle_id = %battle_id,
            plan_id = %plan_id,
            was_active,
            "plan burned"
        );
        self.plans(battle_id).await
    }

    pub async fn rename_plan(
        &self,
        battle_id: &BattleId,
        plan_id: &PlanId,
        name: &str,
    ) -> Result<Vec<Plan>, BattleError> {
        let name = validate_plan_name(name)?;
        self.plan_in_battle(battle_id, plan_id).await?;
        self.plans.rename(plan_id, &name).await?;

        tracing::info!(battle_id = %battle_id, plan_id = %plan_id, "plan renamed");
        self.plans(battle_id).await
    }

    /// Loads a plan and checks it belongs to the battle.
    async fn plan_in_battle(
        &self,
        battle_id: &BattleId,
        plan_id: &PlanId,
    ) -> Result<Plan, BattleError> {
        match self.plans.find_by_id(plan_id).await? {
            Some(plan) if &plan.battle_id == battle_id => Ok(plan),
            _ => Err(BattleError::not_found("plan", plan_id)),
        }
    }
}
