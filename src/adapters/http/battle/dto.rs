//! HTTP DTOs for battle endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::battle::{BattleError, Warrior};

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Request to register a warrior.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWarriorRequest {
    pub name: String,
}

/// Request to create a battle. The caller becomes its leader.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBattleRequest {
    pub name: String,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// A newly registered warrior and the token it authenticates with.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarriorResponse {
    pub id: String,
    pub name: String,
    pub token: String,
}

impl From<Warrior> for WarriorResponse {
    fn from(warrior: Warrior) -> Self {
        Self {
            id: warrior.id.to_string(),
            token: warrior.id.to_string(),
            name: warrior.name,
        }
    }
}

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
        }
    }
}

impl From<&BattleError> for ErrorResponse {
    fn from(err: &BattleError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warrior_response_uses_id_as_token() {
        let warrior = Warrior::new("Thor").unwrap();
        let id = warrior.id.to_string();

        let response = WarriorResponse::from(warrior);

        assert_eq!(response.id, id);
        assert_eq!(response.token, id);
    }

    #[test]
    fn error_response_carries_battle_error_code() {
        let response = ErrorResponse::from(&BattleError::not_found("battle", "abc"));

        assert_eq!(response.code, "NOT_FOUND");
        assert_eq!(response.message, "Battle not found: abc");
    }
}
