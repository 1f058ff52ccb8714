//! HTTP handlers for battle endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::middleware::RequireAuth;
use crate::application::BattleService;
use crate::domain::battle::BattleError;
use crate::domain::foundation::BattleId;

use super::dto::{CreateBattleRequest, CreateWarriorRequest, ErrorResponse, WarriorResponse};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct BattleHandlers {
    battles: Arc<BattleService>,
}

impl BattleHandlers {
    pub fn new(battles: Arc<BattleService>) -> Self {
        Self { battles }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/warriors - Register a warrior
pub async fn create_warrior(
    State(handlers): State<BattleHandlers>,
    Json(req): Json<CreateWarriorRequest>,
) -> Response {
    match handlers.battles.create_warrior(&req.name).await {
        Ok(warrior) => (StatusCode::CREATED, Json(WarriorResponse::from(warrior))).into_response(),
        Err(e) => handle_battle_error(e),
    }
}

/// POST /api/battles - Create a battle led by the caller
pub async fn create_battle(
    State(handlers): State<BattleHandlers>,
    RequireAuth(warrior): RequireAuth,
    Json(req): Json<CreateBattleRequest>,
) -> Response {
    match handlers.battles.create_battle(&warrior.id, &req.name).await {
        Ok(snapshot) => (StatusCode::CREATED, Json(snapshot)).into_response(),
        Err(e) => handle_battle_error(e),
    }
}

/// GET /api/battles/:battle_id - Current battle snapshot
pub async fn get_battle(
    State(handlers): State<BattleHandlers>,
    RequireAuth(_warrior): RequireAuth,
    Path(battle_id): Path<String>,
) -> Response {
    let battle_id = match battle_id.parse::<BattleId>() {
        Ok(id) => id,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request("Invalid battle ID")),
            )
                .into_response()
        }
    };

    match handlers.battles.get_battle(&battle_id).await {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(e) => handle_battle_error(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Error handling
// ════════════════════════════════════════════════════════════════════════════

fn handle_battle_error(error: BattleError) -> Response {
    let status = match &error {
        BattleError::NotFound { .. } => StatusCode::NOT_FOUND,
        BattleError::Forbidden => StatusCode::FORBIDDEN,
        BattleError::InvalidTransition(_) => StatusCode::CONFLICT,
        BattleError::UnknownEventKind(_) | BattleError::ValidationFailed { .. } => {
            StatusCode::BAD_REQUEST
        }
        BattleError::StorageFailure => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse::from(&error))).into_response()
}
