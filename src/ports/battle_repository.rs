//! Battle repository port.
//!
//! Battle rows plus the battle ↔ warrior membership relation. Membership is
//! a toggle, never a delete: retreating keeps the row so a warrior can rejoin
//! without re-creating identity.

use async_trait::async_trait;

use crate::domain::battle::{Battle, Warrior};
use crate::domain::foundation::{BattleId, DomainError, WarriorId};

/// Repository port for battles and their membership.
#[async_trait]
pub trait BattleRepository: Send + Sync {
    /// Save a new battle.
    ///
    /// # Errors
    ///
    /// - `WarriorNotFound` if the leader does not exist
    /// - `DatabaseError` on persistence failure
    async fn create(&self, battle: &Battle) -> Result<(), DomainError>;

    /// Find a battle by its ID. Returns `None` if not found.
    async fn find_by_id(&self, id: &BattleId) -> Result<Option<Battle>, DomainError>;

    /// Lock voting and clear the active plan reference.
    ///
    /// # Errors
    ///
    /// - `BattleNotFound` if the battle doesn't exist
    async fn lock_voting(&self, id: &BattleId) -> Result<(), DomainError>;

    /// Upsert the membership row for `(battle, warrior)` to active.
    ///
    /// # Errors
    ///
    /// - `BattleNotFound` / `WarriorNotFound` when either side is missing
    async fn add_warrior(&self, id: &BattleId, warrior_id: &WarriorId) -> Result<(), DomainError>;

    /// Mark the membership row inactive. A missing row is not an error.
    async fn retreat_warrior(
        &self,
        id: &BattleId,
        warrior_id: &WarriorId,
    ) -> Result<(), DomainError>;

    /// Warriors whose membership is active, in storage order.
    async fn active_warriors(&self, id: &BattleId) -> Result<Vec<Warrior>, DomainError>;
}
