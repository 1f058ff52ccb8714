//! HTTP adapter for battle endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{CreateBattleRequest, CreateWarriorRequest, ErrorResponse, WarriorResponse};
pub use handlers::BattleHandlers;
pub use routes::battle_routes;
