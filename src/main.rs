//! Battle Poker server binary.
//!
//! Loads configuration from the environment, picks PostgreSQL when a
//! database URL is configured (in-memory otherwise) and serves the API
//! until Ctrl+C.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use battle_poker::adapters::auth::WarriorTokenValidator;
use battle_poker::adapters::http::{app_router, AuthState, BattleHandlers};
use battle_poker::adapters::postgres::{
    self, PostgresBattleRepository, PostgresPlanRepository, PostgresWarriorRepository,
};
use battle_poker::adapters::websocket::WebSocketState;
use battle_poker::adapters::{InMemoryStore, RoomManager};
use battle_poker::application::{
    battle_dispatcher, BattleService, MembershipService, VotingService,
};
use battle_poker::config::AppConfig;
use battle_poker::ports::{BattleRepository, PlanRepository, WarriorRepository};

/// Storage backends behind the repository ports.
struct Stores {
    battles: Arc<dyn BattleRepository>,
    plans: Arc<dyn PlanRepository>,
    warriors: Arc<dyn WarriorRepository>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    init_tracing(&config);

    let stores = open_stores(&config).await?;

    let rooms = Arc::new(RoomManager::new(config.realtime.room_capacity));
    let voting = Arc::new(VotingService::new(stores.battles.clone(), stores.plans.clone()));
    let membership = Arc::new(MembershipService::new(stores.battles.clone()));
    let battles = Arc::new(BattleService::new(
        stores.battles.clone(),
        stores.plans.clone(),
        stores.warriors.clone(),
    ));
    let dispatcher = Arc::new(battle_dispatcher(
        stores.battles.clone(),
        rooms.clone(),
        voting,
        membership.clone(),
    ));

    let auth: AuthState = Arc::new(WarriorTokenValidator::new(stores.warriors.clone()));
    let ws_state = WebSocketState::new(rooms, dispatcher, battles.clone(), membership);
    let router = app_router(BattleHandlers::new(battles), ws_state, auth, &config.server);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(address = %addr, "battle poker server started");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("battle poker server stopped");
    Ok(())
}

/// JSON lines in production, human-readable output elsewhere.
/// `RUST_LOG` overrides the configured level.
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.is_production() {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn open_stores(config: &AppConfig) -> anyhow::Result<Stores> {
    if config.database.is_configured() {
        let pool = postgres::connect(&config.database)
            .await
            .context("failed to open database")?;
        tracing::info!("using PostgreSQL storage");
        return Ok(Stores {
            battles: Arc::new(PostgresBattleRepository::new(pool.clone())),
            plans: Arc::new(PostgresPlanRepository::new(pool.clone())),
            warriors: Arc::new(PostgresWarriorRepository::new(pool)),
        });
    }

    tracing::warn!("no database configured, state is kept in memory only");
    let store = InMemoryStore::new();
    Ok(Stores {
        battles: Arc::new(store.clone()),
        plans: Arc::new(store.clone()),
        warriors: Arc::new(store),
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown signal received");
}
