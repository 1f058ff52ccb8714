//! WebSocket message types for live battles.
//!
//! Defines the protocol between server and connected warriors:
//! - Server → Client: connection status, battle updates, errors, pongs
//! - Client → Server: battle events (`{type, value}`) and pings

use serde::{Deserialize, Serialize};

use crate::domain::battle::{BattleError, BattleUpdateType};
use crate::domain::foundation::Timestamp;
use crate::ports::BattleUpdate;

// ============================================
// Server → Client Messages
// ============================================

/// All message types that can be sent from server to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection established and the warrior joined the battle.
    Connected(ConnectedMessage),

    /// Battle state snapshot, tagged with what produced it.
    #[serde(rename = "battle.update")]
    BattleUpdate(BattleUpdateMessage),

    /// An action of this client failed. Never broadcast.
    Error(ErrorMessage),

    /// Heartbeat response.
    Pong(PongMessage),
}

impl ServerMessage {
    pub fn error(err: &BattleError) -> Self {
        ServerMessage::Error(ErrorMessage {
            code: err.code().to_string(),
            message: err.message(),
            timestamp: Timestamp::now().to_rfc3339(),
        })
    }

    pub fn update(update_type: BattleUpdateType, value: serde_json::Value) -> Self {
        ServerMessage::BattleUpdate(BattleUpdateMessage {
            update_type,
            value,
            timestamp: Timestamp::now().to_rfc3339(),
        })
    }

    pub fn pong() -> Self {
        ServerMessage::Pong(PongMessage {
            timestamp: Timestamp::now().to_rfc3339(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedMessage {
    pub battle_id: String,
    pub client_id: String,
    pub warrior_id: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BattleUpdateMessage {
    #[serde(rename = "type")]
    pub update_type: BattleUpdateType,
    pub value: serde_json::Value,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessage {
    pub code: String,
    pub message: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PongMessage {
    pub timestamp: String,
}

impl From<BattleUpdate> for ServerMessage {
    fn from(update: BattleUpdate) -> Self {
        ServerMessage::BattleUpdate(BattleUpdateMessage {
            update_type: update.update_type,
            value: update.data,
            timestamp: update.timestamp.to_rfc3339(),
        })
    }
}

// ============================================
// Client → Server Messages
// ============================================

/// Inbound frame: an event kind plus its payload.
///
/// `type` is kept as a raw string so unknown kinds reach the dispatcher and
/// come back as `UNKNOWN_EVENT_KIND` instead of a parse failure.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl ClientMessage {
    pub fn is_ping(&self) -> bool {
        self.kind == "ping"
    }
}
