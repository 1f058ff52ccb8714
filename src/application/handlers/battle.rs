//! BattleService - battle and warrior lifecycle outside the live session.

use std::sync::Arc;

use crate::domain::battle::{Battle, BattleError, BattleSnapshot, Plan, Warrior};
use crate::domain::foundation::{BattleId, WarriorId};
use crate::ports::{BattleRepository, PlanRepository, WarriorRepository};

pub struct BattleService {
    battles: Arc<dyn BattleRepository>,
    plans: Arc<dyn PlanRepository>,
    warriors: Arc<dyn WarriorRepository>,
}

impl BattleService {
    pub fn new(
        battles: Arc<dyn BattleRepository>,
        plans: Arc<dyn PlanRepository>,
        warriors: Arc<dyn WarriorRepository>,
    ) -> Self {
        Self {
            battles,
            plans,
            warriors,
        }
    }

    /// Registers a new global warrior identity.
    pub async fn create_warrior(&self, name: &str) -> Result<Warrior, BattleError> {
        let warrior = Warrior::new(name)?;
        self.warriors.create(&warrior).await?;

        tracing::info!(warrior_id = %warrior.id, "warrior created");
        Ok(warrior)
    }

    pub async fn get_warrior(&self, id: &WarriorId) -> Result<Warrior, BattleError> {
        self.warriors
            .find_by_id(id)
            .await?
            .ok_or_else(|| BattleError::not_found("warrior", id))
    }

    /// Creates a battle led by `leader_id`. The leader is not joined; that
    /// happens when they connect to the live session.
    pub async fn create_battle(
        &self,
        leader_id: &WarriorId,
        name: &str,
    ) -> Result<BattleSnapshot, BattleError> {
        let battle = Battle::new(*leader_id, name)?;
        self.battles.create(&battle).await?;

        tracing::info!(battle_id = %battle.id, leader_id = %leader_id, "battle created");
        Ok(BattleSnapshot::new(battle, Vec::new(), Vec::new()))
    }

    /// Full battle state: the battle row, its active warriors and its plans
    /// with the vote-visibility rule applied.
    pub async fn get_battle(&self, id: &BattleId) -> Result<BattleSnapshot, BattleError> {
        let battle = self
            .battles
            .find_by_id(id)
            .await?
            .ok_or_else(|| BattleError::not_found("battle", id))?;
        let warriors = self.battles.active_warriors(id).await?;
        let plans = self
            .plans
            .list_by_battle(id)
            .await?
            .into_iter()
            .map(Plan::projected)
            .collect();

        Ok(BattleSnapshot::new(battle, warriors, plans))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;

    fn service(store: &InMemoryStore) -> BattleService {
        BattleService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
        )
    }

    #[tokio::test]
    async fn create_and_get_warrior() {
        let store = InMemoryStore::new();
        let service = service(&store);

        let warrior = service.create_warrior("  Thor ").await.unwrap();
        let found = service.get_warrior(&warrior.id).await.unwrap();

        assert_eq!(found.name, "Thor");
    }

    #[tokio::test]
    async fn unknown_warrior_is_not_found() {
        let service = service(&InMemoryStore::new());

        let err = service.get_warrior(&WarriorId::new()).await.unwrap_err();

        assert!(matches!(err, BattleError::NotFound { entity: "warrior", .. }));
    }

    #[tokio::test]
    async fn new_battle_starts_locked_without_plans() {
        let store = InMemoryStore::new();
        let service = service(&store);
        let leader = service.create_warrior("Thor").await.unwrap();

        let snapshot = service.create_battle(&leader.id, "Sprint 12").await.unwrap();

        assert_eq!(snapshot.leader_id, leader.id);
        assert!(snapshot.voting_locked);
        assert!(snapshot.active_plan_id.is_none());
        assert!(snapshot.plans.is_empty());
    }

    #[tokio::test]
    async fn battle_with_unknown_leader_is_rejected() {
        let service = service(&InMemoryStore::new());

        let err = service
            .create_battle(&WarriorId::new(), "Sprint 12")
            .await
            .unwrap_err();

        assert!(matches!(err, BattleError::NotFound { entity: "warrior", .. }));
    }

    #[tokio::test]
    async fn get_battle_projects_active_plan_votes() {
        let store = InMemoryStore::new();
        let service = service(&store);
        let leader = service.create_warrior("Thor").await.unwrap();
        let snapshot = service.create_battle(&leader.id, "Sprint 12").await.unwrap();
        BattleRepository::add_warrior(&store, &snapshot.id, &leader.id)
            .await
            .unwrap();
        let mut plan = Plan::new(snapshot.id, "Login bug").unwrap();
        PlanRepository::create(&store, &plan).await.unwrap();
        store.activate(&snapshot.id, &plan.id).await.unwrap();
        plan.cast_vote(leader.id, "5");
        store.save_votes(&plan.id, &plan.votes).await.unwrap();

        let snapshot = service.get_battle(&snapshot.id).await.unwrap();

        assert_eq!(snapshot.warriors, vec![leader]);
        assert_eq!(snapshot.active_plan_id, Some(plan.id));
        assert_eq!(snapshot.plans[0].votes[0].value, "");
    }
}
