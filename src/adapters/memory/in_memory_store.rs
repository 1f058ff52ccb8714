//! In-memory store implementing every repository port.
//!
//! Enforces the same referential constraints the relational schema does
//! (battle → plan, battle ↔ warrior membership), so services behave the
//! same against it as against PostgreSQL. Useful for tests and for running
//! without a database in development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::battle::{Battle, Plan, Vote, Warrior};
use crate::domain::foundation::{BattleId, DomainError, ErrorCode, PlanId, WarriorId};
use crate::ports::{BattleRepository, PlanRepository, WarriorRepository};

#[derive(Debug, Clone)]
struct Membership {
    battle_id: BattleId,
    warrior_id: WarriorId,
    active: bool,
}

#[derive(Debug, Default)]
struct StoreState {
    battles: HashMap<BattleId, Battle>,
    warriors: HashMap<WarriorId, Warrior>,
    plans: Vec<Plan>,
    memberships: Vec<Membership>,
}

impl StoreState {
    fn battle_mut(&mut self, id: &BattleId) -> Result<&mut Battle, DomainError> {
        self.battles
            .get_mut(id)
            .ok_or_else(|| not_found(ErrorCode::BattleNotFound, "Battle", id))
    }

    fn plan_mut(&mut self, id: &PlanId) -> Result<&mut Plan, DomainError> {
        self.plans
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| not_found(ErrorCode::PlanNotFound, "Plan", id))
    }
}

fn not_found(code: ErrorCode, entity: &str, id: impl ToString) -> DomainError {
    let id = id.to_string();
    DomainError::new(code, format!("{} not found: {}", entity, id)).with_detail("id", id)
}

/// In-memory battle/plan/warrior storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `DatabaseError` (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of stored plans across all battles.
    pub async fn plan_count(&self) -> usize {
        self.state.read().await.plans.len()
    }

    fn check_available(&self) -> Result<(), DomainError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                "in-memory store is failing on purpose",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl WarriorRepository for InMemoryStore {
    async fn create(&self, warrior: &Warrior) -> Result<(), DomainError> {
        self.check_available()?;
        self.state
            .write()
            .await
            .warriors
            .insert(warrior.id, warrior.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &WarriorId) -> Result<Option<Warrior>, DomainError> {
        self.check_available()?;
        Ok(self.state.read().await.warriors.get(id).cloned())
    }
}

#[async_trait]
impl BattleRepository for InMemoryStore {
    async fn create(&self, battle: &Battle) -> Result<(), DomainError> {
        self.check_available()?;
        let mut state = self.state.write().await;
        if !state.warriors.contains_key(&battle.leader_id) {
            return Err(not_found(ErrorCode::WarriorNotFound, "Warrior", battle.leader_id));
        }
        state.battles.insert(battle.id, battle.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &BattleId) -> Result<Option<Battle>, DomainError> {
        self.check_available()?;
        Ok(self.state.read().await.battles.get(id).cloned())
    }

    async fn lock_voting(&self, id: &BattleId) -> Result<(), DomainError> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let battle = state.battle_mut(id)?;
        battle.voting_locked = true;
        battle.active_plan_id = None;
        Ok(())
    }

    async fn add_warrior(&self, id: &BattleId, warrior_id: &WarriorId) -> Result<(), DomainError> {
        self.check_available()?;
        let mut state = self.state.write().await;
        if !state.battles.contains_key(id) {
            return Err(not_found(ErrorCode::BattleNotFound, "Battle", id));
        }
        if !state.warriors.contains_key(warrior_id) {
            return Err(not_found(ErrorCode::WarriorNotFound, "Warrior", warrior_id));
        }
        match state
            .memberships
            .iter_mut()
            .find(|m| &m.battle_id == id && &m.warrior_id == warrior_id)
        {
            Some(membership) => membership.active = true,
            None => state.memberships.push(Membership {
                battle_id: *id,
                warrior_id: *warrior_id,
                active: true,
            }),
        }
        Ok(())
    }

    async fn retreat_warrior(
        &self,
        id: &BattleId,
        warrior_id: &WarriorId,
    ) -> Result<(), DomainError> {
        self.check_available()?;
        let mut state = self.state.write().await;
        if let Some(membership) = state
            .memberships
            .iter_mut()
            .find(|m| &m.battle_id == id && &m.warrior_id == warrior_id)
        {
            membership.active = false;
        }
        Ok(())
    }

    async fn active_warriors(&self, id: &BattleId) -> Result<Vec<Warrior>, DomainError> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .memberships
            .iter()
            .filter(|m| &m.battle_id == id && m.active)
            .filter_map(|m| state.warriors.get(&m.warrior_id).cloned())
            .collect())
    }
}

#[async_trait]
impl PlanRepository for InMemoryStore {
    async fn create(&self, plan: &Plan) -> Result<(), DomainError> {
        self.check_available()?;
        let mut state = self.state.write().await;
        if !state.battles.contains_key(&plan.battle_id) {
            return Err(not_found(ErrorCode::BattleNotFound, "Battle", plan.battle_id));
        }
        state.plans.push(plan.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &PlanId) -> Result<Option<Plan>, DomainError> {
        self.check_available()?;
        Ok(self
            .state
            .read()
            .await
            .plans
            .iter()
            .find(|p| &p.id == id)
            .cloned())
    }

    async fn list_by_battle(&self, battle_id: &BattleId) -> Result<Vec<Plan>, DomainError> {
        self.check_available()?;
        Ok(self
            .state
            .read()
            .await
            .plans
            .iter()
            .filter(|p| &p.battle_id == battle_id)
            .cloned()
            .collect())
    }

    async fn save_votes(&self, id: &PlanId, votes: &[Vote]) -> Result<(), DomainError> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let plan = state.plan_mut(id)?;
        if !plan.active {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("plan {} is not open for voting", id),
            ));
        }
        plan.votes = votes.to_vec();
        Ok(())
    }

    async fn rename(&self, id: &PlanId, name: &str) -> Result<(), DomainError> {
        self.check_available()?;
        self.state.write().await.plan_mut(id)?.name = name.to_string();
        Ok(())
    }

    async fn activate(&self, battle_id: &BattleId, id: &PlanId) -> Result<(), DomainError> {
        self.check_available()?;
        let mut state = self.state.write().await;
        state.plan_mut(id)?;
        for plan in state.plans.iter_mut().filter(|p| &p.battle_id == battle_id) {
            if &plan.id == id {
                plan.activate();
            } else {
                plan.end_voting();
            }
        }
        let battle = state.battle_mut(battle_id)?;
        battle.voting_locked = false;
        battle.active_plan_id = Some(*id);
        Ok(())
    }

    async fn end_voting(&self, battle_id: &BattleId) -> Result<(), DomainError> {
        self.check_available()?;
        let mut state = self.state.write().await;
        for plan in state.plans.iter_mut().filter(|p| &p.battle_id == battle_id) {
            plan.end_voting();
        }
        state.battle_mut(battle_id)?.voting_locked = true;
        Ok(())
    }

    async fn finalize(
        &self,
        battle_id: &BattleId,
        id: &PlanId,
        points: &str,
    ) -> Result<(), DomainError> {
        self.check_available()?;
        let mut state = self.state.write().await;
        state.plan_mut(id)?.finalize(points);
        let battle = state.battle_mut(battle_id)?;
        if battle.voting_locked || battle.active_plan_id == Some(*id) {
            battle.voting_locked = true;
            battle.active_plan_id = None;
        }
        Ok(())
    }

    async fn delete(&self, id: &PlanId) -> Result<bool, DomainError> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let index = state
            .plans
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| not_found(ErrorCode::PlanNotFound, "Plan", id))?;
        Ok(state.plans.remove(index).active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (InMemoryStore, Warrior, Battle) {
        let store = InMemoryStore::new();
        let leader = Warrior::new("Thor").unwrap();
        WarriorRepository::create(&store, &leader).await.unwrap();
        let battle = Battle::new(leader.id, "Sprint 12").unwrap();
        BattleRepository::create(&store, &battle).await.unwrap();
        (store, leader, battle)
    }

    #[tokio::test]
    async fn battle_requires_existing_leader() {
        let store = InMemoryStore::new();
        let battle = Battle::new(WarriorId::new(), "Orphan").unwrap();

        let err = BattleRepository::create(&store, &battle).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::WarriorNotFound);
    }

    #[tokio::test]
    async fn plan_requires_existing_battle() {
        let store = InMemoryStore::new();
        let plan = Plan::new(BattleId::new(), "Login bug").unwrap();

        let err = PlanRepository::create(&store, &plan).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BattleNotFound);
    }

    #[tokio::test]
    async fn membership_toggles_without_duplicates() {
        let (store, leader, battle) = seeded().await;

        store.add_warrior(&battle.id, &leader.id).await.unwrap();
        store.retreat_warrior(&battle.id, &leader.id).await.unwrap();
        assert!(store.active_warriors(&battle.id).await.unwrap().is_empty());

        store.add_warrior(&battle.id, &leader.id).await.unwrap();
        store.add_warrior(&battle.id, &leader.id).await.unwrap();
        assert_eq!(store.active_warriors(&battle.id).await.unwrap(), vec![leader]);
    }

    #[tokio::test]
    async fn activate_deactivates_other_plans_and_unlocks_battle() {
        let (store, _, battle) = seeded().await;
        let first = Plan::new(battle.id, "First").unwrap();
        let second = Plan::new(battle.id, "Second").unwrap();
        PlanRepository::create(&store, &first).await.unwrap();
        PlanRepository::create(&store, &second).await.unwrap();

        store.activate(&battle.id, &first.id).await.unwrap();
        store.activate(&battle.id, &second.id).await.unwrap();

        let plans = store.list_by_battle(&battle.id).await.unwrap();
        assert!(!plans[0].active);
        assert!(plans[1].active);
        let battle = BattleRepository::find_by_id(&store, &battle.id)
            .await
            .unwrap()
            .unwrap();
        assert!(!battle.voting_locked);
        assert_eq!(battle.active_plan_id, Some(second.id));
    }

    #[tokio::test]
    async fn finalizing_idle_plan_keeps_open_round() {
        let (store, _, battle) = seeded().await;
        let open = Plan::new(battle.id, "Open").unwrap();
        let idle = Plan::new(battle.id, "Idle").unwrap();
        PlanRepository::create(&store, &open).await.unwrap();
        PlanRepository::create(&store, &idle).await.unwrap();
        store.activate(&battle.id, &open.id).await.unwrap();

        store.finalize(&battle.id, &idle.id, "3").await.unwrap();

        let battle = BattleRepository::find_by_id(&store, &battle.id)
            .await
            .unwrap()
            .unwrap();
        assert!(!battle.voting_locked);
        assert_eq!(battle.active_plan_id, Some(open.id));
    }

    #[tokio::test]
    async fn finalizing_under_locked_voting_clears_stale_reference() {
        let (store, _, battle) = seeded().await;
        let first = Plan::new(battle.id, "First").unwrap();
        let second = Plan::new(battle.id, "Second").unwrap();
        PlanRepository::create(&store, &first).await.unwrap();
        PlanRepository::create(&store, &second).await.unwrap();
        store.activate(&battle.id, &second.id).await.unwrap();
        store.end_voting(&battle.id).await.unwrap();

        store.finalize(&battle.id, &first.id, "3").await.unwrap();

        let battle = BattleRepository::find_by_id(&store, &battle.id)
            .await
            .unwrap()
            .unwrap();
        assert!(battle.voting_locked);
        assert!(battle.active_plan_id.is_none());
    }

    #[tokio::test]
    async fn votes_are_only_saved_on_open_plans() {
        let (store, leader, battle) = seeded().await;
        let mut plan = Plan::new(battle.id, "Login bug").unwrap();
        PlanRepository::create(&store, &plan).await.unwrap();
        plan.cast_vote(leader.id, "5");

        let err = store.save_votes(&plan.id, &plan.votes).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);

        store.activate(&battle.id, &plan.id).await.unwrap();
        store.save_votes(&plan.id, &plan.votes).await.unwrap();
        let stored = PlanRepository::find_by_id(&store, &plan.id).await.unwrap().unwrap();
        assert_eq!(stored.votes, plan.votes);

        let err = store.save_votes(&PlanId::new(), &[]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PlanNotFound);
    }

    #[tokio::test]
    async fn delete_reports_whether_plan_was_active() {
        let (store, _, battle) = seeded().await;
        let plan = Plan::new(battle.id, "Login bug").unwrap();
        PlanRepository::create(&store, &plan).await.unwrap();
        store.activate(&battle.id, &plan.id).await.unwrap();

        assert!(store.delete(&plan.id).await.unwrap());
        let err = store.delete(&plan.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PlanNotFound);
    }

    #[tokio::test]
    async fn failing_store_returns_database_errors() {
        let (store, _, battle) = seeded().await;
        store.set_failing(true);

        let err = store.list_by_battle(&battle.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);

        store.set_failing(false);
        assert!(store.list_by_battle(&battle.id).await.is_ok());
    }
}
