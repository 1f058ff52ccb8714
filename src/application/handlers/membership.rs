//! MembershipService - who is currently in a battle.
//!
//! Join and leave toggle the membership row; nothing is ever deleted, so a
//! warrior who retreats can rejoin under the same identity.

use std::sync::Arc;

use crate::domain::battle::{BattleError, Warrior};
use crate::domain::foundation::{BattleId, WarriorId};
use crate::ports::BattleRepository;

pub struct MembershipService {
    battles: Arc<dyn BattleRepository>,
}

impl MembershipService {
    pub fn new(battles: Arc<dyn BattleRepository>) -> Self {
        Self { battles }
    }

    /// Marks the warrior active in the battle and returns the active roster.
    pub async fn join(
        &self,
        battle_id: &BattleId,
        warrior_id: &WarriorId,
    ) -> Result<Vec<Warrior>, BattleError> {
        self.battles.add_warrior(battle_id, warrior_id).await?;
        tracing::info!(battle_id = %battle_id, warrior_id = %warrior_id, "warrior joined");
        self.list_active(battle_id).await
    }

    /// Marks the warrior inactive and returns the remaining roster.
    pub async fn leave(
        &self,
        battle_id: &BattleId,
        warrior_id: &WarriorId,
    ) -> Result<Vec<Warrior>, BattleError> {
        self.battles.retreat_warrior(battle_id, warrior_id).await?;
        tracing::info!(battle_id = %battle_id, warrior_id = %warrior_id, "warrior retreated");
        self.list_active(battle_id).await
    }

    /// Active warriors, in storage order.
    pub async fn list_active(&self, battle_id: &BattleId) -> Result<Vec<Warrior>, BattleError> {
        Ok(self.battles.active_warriors(battle_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::battle::Battle;
    use crate::ports::WarriorRepository;

    async fn setup() -> (MembershipService, Battle, Warrior, Warrior) {
        let store = InMemoryStore::new();
        let thor = Warrior::new("Thor").unwrap();
        let loki = Warrior::new("Loki").unwrap();
        WarriorRepository::create(&store, &thor).await.unwrap();
        WarriorRepository::create(&store, &loki).await.unwrap();
        let battle = Battle::new(thor.id, "Sprint 12").unwrap();
        BattleRepository::create(&store, &battle).await.unwrap();
        (MembershipService::new(Arc::new(store)), battle, thor, loki)
    }

    #[tokio::test]
    async fn join_returns_active_roster() {
        let (service, battle, thor, loki) = setup().await;

        service.join(&battle.id, &thor.id).await.unwrap();
        let roster = service.join(&battle.id, &loki.id).await.unwrap();

        assert_eq!(roster, vec![thor, loki]);
    }

    #[tokio::test]
    async fn leave_then_rejoin_keeps_identity() {
        let (service, battle, thor, loki) = setup().await;
        service.join(&battle.id, &thor.id).await.unwrap();
        service.join(&battle.id, &loki.id).await.unwrap();

        let roster = service.leave(&battle.id, &loki.id).await.unwrap();
        assert_eq!(roster, vec![thor.clone()]);

        let roster = service.join(&battle.id, &loki.id).await.unwrap();
        assert_eq!(roster.len(), 2);
        assert!(roster.contains(&loki));
    }

    #[tokio::test]
    async fn joining_missing_battle_is_not_found() {
        let (service, _, thor, _) = setup().await;

        let err = service.join(&BattleId::new(), &thor.id).await.unwrap_err();

        assert!(matches!(err, BattleError::NotFound { entity: "battle", .. }));
    }
}
