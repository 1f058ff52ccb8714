//! Battle event handlers, one per `BattleEventKind`.
//!
//! Plan management (add, activate, end, finalize, revise, burn) is reserved
//! for the battle leader. Voting and retreating are open to every warrior.
//! Payloads are camelCase JSON objects; plan-level events reply with the
//! battle's projected plan list, `retreat` with the remaining roster.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::application::dispatcher::{
    BattleEventHandler, DispatchContext, EventDispatcher, EventReply,
};
use crate::domain::battle::{Battle, BattleError, BattleEventKind, Plan};
use crate::domain::foundation::{PlanId, WarriorId};
use crate::ports::{BattleBroadcaster, BattleRepository};

use super::{MembershipService, VotingService};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VotePayload {
    plan_id: PlanId,
    vote_value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddPlanPayload {
    plan_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanRef {
    plan_id: PlanId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinalizePayload {
    plan_id: PlanId,
    plan_points: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RevisePayload {
    plan_id: PlanId,
    plan_name: String,
}

fn decode<T: DeserializeOwned>(payload: Value) -> Result<T, BattleError> {
    serde_json::from_value(payload).map_err(|e| BattleError::validation("payload", e.to_string()))
}

fn require_leader(battle: &Battle, warrior_id: &WarriorId) -> Result<(), BattleError> {
    if battle.is_leader(warrior_id) {
        Ok(())
    } else {
        Err(BattleError::Forbidden)
    }
}

fn plans_reply(kind: BattleEventKind, plans: Vec<Plan>) -> Result<EventReply, BattleError> {
    let payload = serde_json::to_value(plans).map_err(|e| {
        tracing::error!(error = %e, "failed to serialize plans");
        BattleError::StorageFailure
    })?;
    Ok(EventReply::broadcast(kind.update_type(), payload))
}

pub struct VoteHandler {
    voting: Arc<VotingService>,
}

impl VoteHandler {
    pub fn new(voting: Arc<VotingService>) -> Self {
        Self { voting }
    }
}

#[async_trait]
impl BattleEventHandler for VoteHandler {
    async fn handle(
        &self,
        _ctx: &DispatchContext,
        battle: &Battle,
        warrior_id: &WarriorId,
        payload: Value,
    ) -> Result<EventReply, BattleError> {
        let VotePayload {
            plan_id,
            vote_value,
        } = decode(payload)?;
        let plans = self
            .voting
            .submit_vote(&battle.id, warrior_id, &plan_id, &vote_value)
            .await?;
        plans_reply(BattleEventKind::Vote, plans)
    }
}

pub struct RetreatHandler {
    membership: Arc<MembershipService>,
}

impl RetreatHandler {
    pub fn new(membership: Arc<MembershipService>) -> Self {
        Self { membership }
    }
}

#[async_trait]
impl BattleEventHandler for RetreatHandler {
    async fn handle(
        &self,
        _ctx: &DispatchContext,
        battle: &Battle,
        warrior_id: &WarriorId,
        _payload: Value,
    ) -> Result<EventReply, BattleError> {
        let warriors = self.membership.leave(&battle.id, warrior_id).await?;
        let payload = serde_json::to_value(warriors).map_err(|e| {
            tracing::error!(error = %e, "failed to serialize warriors");
            BattleError::StorageFailure
        })?;
        Ok(EventReply::broadcast(
            BattleEventKind::Retreat.update_type(),
            payload,
        ))
    }
}

pub struct AddPlanHandler {
    voting: Arc<VotingService>,
}

impl AddPlanHandler {
    pub fn new(voting: Arc<VotingService>) -> Self {
        Self { voting }
    }
}

#[async_trait]
impl BattleEventHandler for AddPlanHandler {
    async fn handle(
        &self,
        _ctx: &DispatchContext,
        battle: &Battle,
        warrior_id: &WarriorId,
        payload: Value,
    ) -> Result<EventReply, BattleError> {
        require_leader(battle, warrior_id)?;
        let AddPlanPayload { plan_name } = decode(payload)?;
        let plans = self.voting.create_plan(&battle.id, &plan_name).await?;
        plans_reply(BattleEventKind::AddPlan, plans)
    }
}

pub struct ActivatePlanHandler {
    voting: Arc<VotingService>,
}

impl ActivatePlanHandler {
    pub fn new(voting: Arc<VotingService>) -> Self {
        Self { voting }
    }
}

#[async_trait]
impl BattleEventHandler for ActivatePlanHandler {
    async fn handle(
        &self,
        _ctx: &DispatchContext,
        battle: &Battle,
        warrior_id: &WarriorId,
        payload: Value,
    ) -> Result<EventReply, BattleError> {
        require_leader(battle, warrior_id)?;
        let PlanRef { plan_id } = decode(payload)?;
        let plans = self.voting.activate_voting(&battle.id, &plan_id).await?;
        plans_reply(BattleEventKind::ActivatePlan, plans)
    }
}

pub struct EndVotingHandler {
    voting: Arc<VotingService>,
}

impl EndVotingHandler {
    pub fn new(voting: Arc<VotingService>) -> Self {
        Self { voting }
    }
}

#[async_trait]
impl BattleEventHandler for EndVotingHandler {
    async fn handle(
        &self,
        _ctx: &DispatchContext,
        battle: &Battle,
        warrior_id: &WarriorId,
        payload: Value,
    ) -> Result<EventReply, BattleError> {
        require_leader(battle, warrior_id)?;
        let PlanRef { plan_id } = decode(payload)?;
        let plans = self.voting.end_voting(&battle.id, &plan_id).await?;
        plans_reply(BattleEventKind::EndVoting, plans)
    }
}

pub struct FinalizePlanHandler {
    voting: Arc<VotingService>,
}

impl FinalizePlanHandler {
    pub fn new(voting: Arc<VotingService>) -> Self {
        Self { voting }
    }
}

#[async_trait]
impl BattleEventHandler for FinalizePlanHandler {
    async fn handle(
        &self,
        _ctx: &DispatchContext,
        battle: &Battle,
        warrior_id: &WarriorId,
        payload: Value,
    ) -> Result<EventReply, BattleError> {
        require_leader(battle, warrior_id)?;
        let FinalizePayload {
            plan_id,
            plan_points,
        } = decode(payload)?;
        let plans = self
            .voting
            .finalize_plan(&battle.id, &plan_id, &plan_points)
            .await?;
        plans_reply(BattleEventKind::FinalizePlan, plans)
    }
}

pub struct RevisePlanHandler {
    voting: Arc<VotingService>,
}

impl RevisePlanHandler {
    pub fn new(voting: Arc<VotingService>) -> Self {
        Self { voting }
    }
}

#[async_trait]
impl BattleEventHandler for RevisePlanHandler {
    async fn handle(
        &self,
        _ctx: &DispatchContext,
        battle: &Battle,
        warrior_id: &WarriorId,
        payload: Value,
    ) -> Result<EventReply, BattleError> {
        require_leader(battle, warrior_id)?;
        let RevisePayload { plan_id, plan_name } = decode(payload)?;
        let plans = self
            .voting
            .rename_plan(&battle.id, &plan_id, &plan_name)
            .await?;
        plans_reply(BattleEventKind::RevisePlan, plans)
    }
}

pub struct BurnPlanHandler {
    voting: Arc<VotingService>,
}

impl BurnPlanHandler {
    pub fn new(voting: Arc<VotingService>) -> Self {
        Self { voting }
    }
}

#[async_trait]
impl BattleEventHandler for BurnPlanHandler {
    async fn handle(
        &self,
        _ctx: &DispatchContext,
        battle: &Battle,
        warrior_id: &WarriorId,
        payload: Value,
    ) -> Result<EventReply, BattleError> {
        require_leader(battle, warrior_id)?;
        let PlanRef { plan_id } = decode(payload)?;
        let plans = self.voting.burn_plan(&battle.id, &plan_id).await?;
        plans_reply(BattleEventKind::BurnPlan, plans)
    }
}

/// Builds a dispatcher routing every battle event kind.
pub fn battle_dispatcher(
    battles: Arc<dyn BattleRepository>,
    broadcaster: Arc<dyn BattleBroadcaster>,
    voting: Arc<VotingService>,
    membership: Arc<MembershipService>,
) -> EventDispatcher {
    EventDispatcher::new(battles, broadcaster)
        .register(BattleEventKind::Vote, Arc::new(VoteHandler::new(voting.clone())))
        .register(BattleEventKind::Retreat, Arc::new(RetreatHandler::new(membership)))
        .register(BattleEventKind::AddPlan, Arc::new(AddPlanHandler::new(voting.clone())))
        .register(
            BattleEventKind::ActivatePlan,
            Arc::new(ActivatePlanHandler::new(voting.clone())),
        )
        .register(
            BattleEventKind::EndVoting,
            Arc::new(EndVotingHandler::new(voting.clone())),
        )
        .register(
            BattleEventKind::FinalizePlan,
            Arc::new(FinalizePlanHandler::new(voting.clone())),
        )
        .register(
            BattleEventKind::RevisePlan,
            Arc::new(RevisePlanHandler::new(voting.clone())),
        )
        .register(BattleEventKind::BurnPlan, Arc::new(BurnPlanHandler::new(voting)))
}
