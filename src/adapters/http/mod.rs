//! HTTP adapters - REST API and the composed application router.
//!
//! - `battle` - warrior and battle endpoints
//! - `middleware` - authentication layer and extractors
//!
//! `app_router` mounts everything (including the live websocket route)
//! under `/api` behind the auth layer and the shared tower-http stack.

pub mod battle;
pub mod middleware;

pub use battle::{battle_routes, BattleHandlers};
pub use middleware::{auth_middleware, AuthState, OptionalAuth, RequireAuth};

use axum::{http::HeaderValue, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::adapters::websocket::{websocket_router, WebSocketState};
use crate::config::ServerConfig;

/// Builds the full application router.
pub fn app_router(
    handlers: BattleHandlers,
    ws_state: WebSocketState,
    auth: AuthState,
    config: &ServerConfig,
) -> Router {
    let api = battle_routes(handlers)
        .merge(websocket_router().with_state(ws_state))
        .layer(axum::middleware::from_fn_with_state(auth, auth_middleware));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(config.request_timeout()))
                .layer(cors_layer(config)),
        )
}

async fn health() -> &'static str {
    "ok"
}

/// Permissive when no origins are configured; otherwise only the listed ones.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins_list()
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

