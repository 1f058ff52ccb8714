//! PostgreSQL implementation of WarriorRepository.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::battle::Warrior;
use crate::domain::foundation::{DomainError, WarriorId};
use crate::ports::WarriorRepository;

#[derive(Clone)]
pub struct PostgresWarriorRepository {
    pool: PgPool,
}

impl PostgresWarriorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WarriorRow {
    id: Uuid,
    name: String,
}

impl From<WarriorRow> for Warrior {
    fn from(row: WarriorRow) -> Self {
        Warrior {
            id: WarriorId::from_uuid(row.id),
            name: row.name,
        }
    }
}

#[async_trait]
impl WarriorRepository for PostgresWarriorRepository {
    async fn create(&self, warrior: &Warrior) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO warriors (id, name)
            VALUES ($1, $2)
            "#,
        )
        .bind(warrior.id.as_uuid())
        .bind(&warrior.name)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to insert warrior", e))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &WarriorId) -> Result<Option<Warrior>, DomainError> {
        let row: Option<WarriorRow> = sqlx::query_as(
            r#"
            SELECT id, name
            FROM warriors
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch warrior", e))?;

        Ok(row.map(Warrior::from))
    }
}
