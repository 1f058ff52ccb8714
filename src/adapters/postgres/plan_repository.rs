//! PostgreSQL implementation of PlanRepository.
//!
//! Votes are stored as a JSONB array on the plan row and always rewritten
//! whole. Transitions that touch several plans or the owning battle run in
//! one transaction.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::battle::{Plan, Vote};
use crate::domain::foundation::{BattleId, DomainError, ErrorCode, PlanId};
use crate::ports::PlanRepository;

use super::{not_found, violated_foreign_key};

#[derive(Clone)]
pub struct PostgresPlanRepository {
    pool: PgPool,
}

impl PostgresPlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, DomainError> {
        self.pool
            .begin()
            .await
            .map_err(|e| DomainError::database("Failed to start transaction", e))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PlanRow {
    id: Uuid,
    battle_id: Uuid,
    name: String,
    points: String,
    active: bool,
    votes: Json<Vec<Vote>>,
}

impl From<PlanRow> for Plan {
    fn from(row: PlanRow) -> Self {
        Plan {
            id: PlanId::from_uuid(row.id),
            battle_id: BattleId::from_uuid(row.battle_id),
            name: row.name,
            votes: row.votes.0,
            points: row.points,
            active: row.active,
        }
    }
}

async fn commit(tx: Transaction<'static, Postgres>) -> Result<(), DomainError> {
    tx.commit()
        .await
        .map_err(|e| DomainError::database("Failed to commit transaction", e))
}

#[async_trait]
impl PlanRepository for PostgresPlanRepository {
    async fn create(&self, plan: &Plan) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO plans (id, battle_id, name, points, active, votes)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(plan.id.as_uuid())
        .bind(plan.battle_id.as_uuid())
        .bind(&plan.name)
        .bind(&plan.points)
        .bind(plan.active)
        .bind(Json(&plan.votes))
        .execute(&self.pool)
        .await
        .map_err(|e| match violated_foreign_key(&e) {
            Some(_) => not_found(ErrorCode::BattleNotFound, "Battle", plan.battle_id),
            None => DomainError::database("Failed to insert plan", e),
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: &PlanId) -> Result<Option<Plan>, DomainError> {
        let row: Option<PlanRow> = sqlx::query_as(
            r#"
            SELECT id, battle_id, name, points, active, votes
            FROM plans
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch plan", e))?;

        Ok(row.map(Plan::from))
    }

    async fn list_by_battle(&self, battle_id: &BattleId) -> Result<Vec<Plan>, DomainError> {
        let rows: Vec<PlanRow> = sqlx::query_as(
            r#"
            SELECT id, battle_id, name, points, active, votes
            FROM plans
            WHERE battle_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(battle_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to list plans", e))?;

        Ok(rows.into_iter().map(Plan::from).collect())
    }

    async fn save_votes(&self, id: &PlanId, votes: &[Vote]) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE plans SET votes = $2 WHERE id = $1 AND active = true")
            .bind(id.as_uuid())
            .bind(Json(votes))
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to save votes", e))?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM plans WHERE id = $1)")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to check plan", e))?;
        if !exists {
            return Err(not_found(ErrorCode::PlanNotFound, "Plan", id));
        }
        Err(DomainError::new(
            ErrorCode::InvalidStateTransition,
            format!("plan {} is not open for voting", id),
        ))
    }

    async fn rename(&self, id: &PlanId, name: &str) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE plans SET name = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to rename plan", e))?;

        if result.rows_affected() == 0 {
            return Err(not_found(ErrorCode::PlanNotFound, "Plan", id));
        }
        Ok(())
    }

    async fn activate(&self, battle_id: &BattleId, id: &PlanId) -> Result<(), DomainError> {
        let mut tx = self.begin().await?;

        sqlx::query("UPDATE plans SET active = false WHERE battle_id = $1 AND id <> $2")
            .bind(battle_id.as_uuid())
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::database("Failed to deactivate plans", e))?;

        let activated = sqlx::query(
            r#"
            UPDATE plans
            SET active = true, points = '', votes = '[]'::jsonb
            WHERE id = $1 AND battle_id = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(battle_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::database("Failed to activate plan", e))?;
        if activated.rows_affected() == 0 {
            return Err(not_found(ErrorCode::PlanNotFound, "Plan", id));
        }

        let unlocked = sqlx::query(
            "UPDATE battles SET voting_locked = false, active_plan_id = $2 WHERE id = $1",
        )
        .bind(battle_id.as_uuid())
        .bind(id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::database("Failed to unlock battle voting", e))?;
        if unlocked.rows_affected() == 0 {
            return Err(not_found(ErrorCode::BattleNotFound, "Battle", battle_id));
        }

        commit(tx).await
    }

    async fn end_voting(&self, battle_id: &BattleId) -> Result<(), DomainError> {
        let mut tx = self.begin().await?;

        sqlx::query("UPDATE plans SET active = false WHERE battle_id = $1")
            .bind(battle_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::database("Failed to end voting", e))?;

        let locked = sqlx::query("UPDATE battles SET voting_locked = true WHERE id = $1")
            .bind(battle_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::database("Failed to lock battle voting", e))?;
        if locked.rows_affected() == 0 {
            return Err(not_found(ErrorCode::BattleNotFound, "Battle", battle_id));
        }

        commit(tx).await
    }

    async fn finalize(
        &self,
        battle_id: &BattleId,
        id: &PlanId,
        points: &str,
    ) -> Result<(), DomainError> {
        let mut tx = self.begin().await?;

        let finalized = sqlx::query("UPDATE plans SET active = false, points = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(points)
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::database("Failed to finalize plan", e))?;
        if finalized.rows_affected() == 0 {
            return Err(not_found(ErrorCode::PlanNotFound, "Plan", id));
        }

        // A round open on another plan stays open.
        sqlx::query(
            r#"
            UPDATE battles
            SET voting_locked = true, active_plan_id = NULL
            WHERE id = $1 AND (voting_locked OR active_plan_id = $2)
            "#,
        )
        .bind(battle_id.as_uuid())
        .bind(id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::database("Failed to clear active plan", e))?;

        commit(tx).await
    }

    async fn delete(&self, id: &PlanId) -> Result<bool, DomainError> {
        let was_active: Option<bool> =
            sqlx::query_scalar("DELETE FROM plans WHERE id = $1 RETURNING active")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database("Failed to delete plan", e))?;

        was_active.ok_or_else(|| not_found(ErrorCode::PlanNotFound, "Plan", id))
    }
}
