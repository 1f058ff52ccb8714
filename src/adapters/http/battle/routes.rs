//! HTTP routes for battle endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{create_battle, create_warrior, get_battle, BattleHandlers};

/// Creates the battle router with all endpoints.
pub fn battle_routes(handlers: BattleHandlers) -> Router {
    Router::new()
        .route("/warriors", post(create_warrior))
        .route("/battles", post(create_battle))
        .route("/battles/:battle_id", get(get_battle))
        .with_state(handlers)
}
