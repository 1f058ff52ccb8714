//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresWarriorRepository` - warrior identities
//! - `PostgresBattleRepository` - battles and battle membership
//! - `PostgresPlanRepository` - plans and their votes (JSONB)
//!
//! Schema lives in `migrations/`; `connect` applies it on startup.

mod battle_repository;
mod plan_repository;
mod warrior_repository;

pub use battle_repository::PostgresBattleRepository;
pub use plan_repository::PostgresPlanRepository;
pub use warrior_repository::PostgresWarriorRepository;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseConfig;
use crate::domain::foundation::{DomainError, ErrorCode};

/// SQLSTATE for `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Opens a connection pool and, when enabled, runs pending migrations.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DomainError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(config.idle_timeout())
        .max_lifetime(config.max_lifetime())
        .connect(&config.url)
        .await
        .map_err(|e| DomainError::database("Failed to connect to database", e))?;

    if config.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| DomainError::database("Failed to run migrations", e))?;
    }

    Ok(pool)
}

/// Name of the violated foreign key constraint, if `err` is one.
fn violated_foreign_key(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) => {
            Some(db.constraint().unwrap_or_default().to_string())
        }
        _ => None,
    }
}

fn not_found(code: ErrorCode, entity: &str, id: impl ToString) -> DomainError {
    let id = id.to_string();
    DomainError::new(code, format!("{} not found: {}", entity, id)).with_detail("id", id)
}
