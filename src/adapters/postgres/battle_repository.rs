//! PostgreSQL implementation of BattleRepository.
//!
//! Membership lives in `battles_warriors`; joining upserts the row with
//! `active = true` and retreating flips it back, so history is kept.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::battle::{Battle, Warrior};
use crate::domain::foundation::{BattleId, DomainError, ErrorCode, PlanId, WarriorId};
use crate::ports::BattleRepository;

use super::{not_found, violated_foreign_key};

#[derive(Clone)]
pub struct PostgresBattleRepository {
    pool: PgPool,
}

impl PostgresBattleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BattleRow {
    id: Uuid,
    leader_id: Uuid,
    name: String,
    voting_locked: bool,
    active_plan_id: Option<Uuid>,
}

impl From<BattleRow> for Battle {
    fn from(row: BattleRow) -> Self {
        Battle {
            id: BattleId::from_uuid(row.id),
            leader_id: WarriorId::from_uuid(row.leader_id),
            name: row.name,
            voting_locked: row.voting_locked,
            active_plan_id: row.active_plan_id.map(PlanId::from_uuid),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WarriorRow {
    id: Uuid,
    name: String,
}

#[async_trait]
impl BattleRepository for PostgresBattleRepository {
    async fn create(&self, battle: &Battle) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO battles (id, leader_id, name, voting_locked, active_plan_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(battle.id.as_uuid())
        .bind(battle.leader_id.as_uuid())
        .bind(&battle.name)
        .bind(battle.voting_locked)
        .bind(battle.active_plan_id.map(|id| *id.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(|e| match violated_foreign_key(&e) {
            Some(_) => not_found(ErrorCode::WarriorNotFound, "Warrior", battle.leader_id),
            None => DomainError::database("Failed to insert battle", e),
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: &BattleId) -> Result<Option<Battle>, DomainError> {
        let row: Option<BattleRow> = sqlx::query_as(
            r#"
            SELECT id, leader_id, name, voting_locked, active_plan_id
            FROM battles
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch battle", e))?;

        Ok(row.map(Battle::from))
    }

    async fn lock_voting(&self, id: &BattleId) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE battles
            SET voting_locked = true, active_plan_id = NULL
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to lock battle voting", e))?;

        if result.rows_affected() == 0 {
            return Err(not_found(ErrorCode::BattleNotFound, "Battle", id));
        }
        Ok(())
    }

    async fn add_warrior(&self, id: &BattleId, warrior_id: &WarriorId) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO battles_warriors (battle_id, warrior_id, active)
            VALUES ($1, $2, true)
            ON CONFLICT (battle_id, warrior_id) DO UPDATE SET active = true
            "#,
        )
        .bind(id.as_uuid())
        .bind(warrior_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| match violated_foreign_key(&e) {
            Some(constraint) if constraint.contains("warrior_id") => {
                not_found(ErrorCode::WarriorNotFound, "Warrior", warrior_id)
            }
            Some(_) => not_found(ErrorCode::BattleNotFound, "Battle", id),
            None => DomainError::database("Failed to add warrior to battle", e),
        })?;

        Ok(())
    }

    async fn retreat_warrior(
        &self,
        id: &BattleId,
        warrior_id: &WarriorId,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE battles_warriors
            SET active = false
            WHERE battle_id = $1 AND warrior_id = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(warrior_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to retreat warrior from battle", e))?;

        Ok(())
    }

    async fn active_warriors(&self, id: &BattleId) -> Result<Vec<Warrior>, DomainError> {
        let rows: Vec<WarriorRow> = sqlx::query_as(
            r#"
            SELECT w.id, w.name
            FROM battles_warriors bw
            JOIN warriors w ON w.id = bw.warrior_id
            WHERE bw.battle_id = $1 AND bw.active = true
            ORDER BY w.name, w.id
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to list battle warriors", e))?;

        Ok(rows
            .into_iter()
            .map(|row| Warrior {
                id: WarriorId::from_uuid(row.id),
                name: row.name,
            })
            .collect())
    }
}
