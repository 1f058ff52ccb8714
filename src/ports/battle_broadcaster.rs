//! Broadcast hub port.
//!
//! Pushes a serialized state update to every subscriber of one battle.
//! Delivery is fire-and-forget: a slow or vanished subscriber never fails or
//! stalls the publish, and a battle with no subscribers is a no-op.

use async_trait::async_trait;

use crate::domain::battle::BattleUpdateType;
use crate::domain::foundation::{BattleId, ClientId, Timestamp};

/// A state snapshot on its way to a battle's subscribers.
#[derive(Debug, Clone)]
pub struct BattleUpdate {
    pub update_type: BattleUpdateType,
    pub data: serde_json::Value,
    pub timestamp: Timestamp,
    /// Connection that triggered the update. It already has the payload
    /// through its direct reply and is skipped on delivery.
    pub origin: Option<ClientId>,
}

impl BattleUpdate {
    pub fn new(update_type: BattleUpdateType, data: serde_json::Value) -> Self {
        Self {
            update_type,
            data,
            timestamp: Timestamp::now(),
            origin: None,
        }
    }

    pub fn from_origin(mut self, origin: Option<ClientId>) -> Self {
        self.origin = origin;
        self
    }
}

/// Port for per-battle fan-out.
#[async_trait]
pub trait BattleBroadcaster: Send + Sync {
    /// Publish to every current subscriber of `battle_id`.
    ///
    /// Returns how many subscribers the update was handed to.
    async fn publish(&self, battle_id: &BattleId, update: BattleUpdate) -> usize;
}
