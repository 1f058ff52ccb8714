//! Event dispatcher - routes participant actions to battle event handlers.
//!
//! The routing table maps each `BattleEventKind` to one handler behind the
//! `BattleEventHandler` capability. The dispatcher resolves the battle, runs
//! the handler and, on success, hands broadcastable results to the
//! `BattleBroadcaster`. Failures go back to the caller only.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::battle::{Battle, BattleError, BattleEventKind, BattleUpdateType};
use crate::domain::foundation::{BattleId, ClientId, WarriorId};
use crate::ports::{BattleBroadcaster, BattleRepository, BattleUpdate};

/// Per-call context carried into every handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchContext {
    /// Connection the action arrived on. Broadcasts skip it.
    pub client_id: Option<ClientId>,
    /// Correlates log lines of one dispatched action.
    pub correlation_id: Uuid,
}

impl DispatchContext {
    pub fn new(client_id: Option<ClientId>) -> Self {
        Self {
            client_id,
            correlation_id: Uuid::new_v4(),
        }
    }
}

/// Result of a handled event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventReply {
    pub update_type: BattleUpdateType,
    pub payload: Value,
    /// Whether other subscribers of the battle should receive `payload`.
    pub broadcast: bool,
}

impl EventReply {
    pub fn broadcast(update_type: BattleUpdateType, payload: Value) -> Self {
        Self {
            update_type,
            payload,
            broadcast: true,
        }
    }

    pub fn direct(update_type: BattleUpdateType, payload: Value) -> Self {
        Self {
            update_type,
            payload,
            broadcast: false,
        }
    }
}

/// One participant action.
///
/// Handlers receive the acting warrior so each can apply its own
/// authorization policy.
#[async_trait]
pub trait BattleEventHandler: Send + Sync {
    async fn handle(
        &self,
        ctx: &DispatchContext,
        battle: &Battle,
        warrior_id: &WarriorId,
        payload: Value,
    ) -> Result<EventReply, BattleError>;
}

pub struct EventDispatcher {
    battles: Arc<dyn BattleRepository>,
    broadcaster: Arc<dyn BattleBroadcaster>,
    handlers: HashMap<BattleEventKind, Arc<dyn BattleEventHandler>>,
}

impl EventDispatcher {
    /// Creates a dispatcher with an empty routing table.
    pub fn new(battles: Arc<dyn BattleRepository>, broadcaster: Arc<dyn BattleBroadcaster>) -> Self {
        Self {
            battles,
            broadcaster,
            handlers: HashMap::new(),
        }
    }

    /// Routes `kind` to `handler`, replacing any previous registration.
    pub fn register(mut self, kind: BattleEventKind, handler: Arc<dyn BattleEventHandler>) -> Self {
        self.handlers.insert(kind, handler);
        self
    }

    pub fn handles(&self, kind: BattleEventKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Dispatches one inbound action.
    ///
    /// Unknown kinds fail with `UnknownEventKind` before any storage access.
    /// Broadcast happens only after the handler succeeded; delivery problems
    /// never turn a successful reply into an error.
    pub async fn dispatch(
        &self,
        ctx: &DispatchContext,
        battle_id: &BattleId,
        warrior_id: &WarriorId,
        kind: &str,
        payload: Value,
    ) -> Result<EventReply, BattleError> {
        let kind: BattleEventKind = kind.parse()?;
        let handler = self
            .handlers
            .get(&kind)
            .ok_or_else(|| BattleError::unknown_event_kind(kind.as_str()))?;

        let battle = self
            .battles
            .find_by_id(battle_id)
            .await?
            .ok_or_else(|| BattleError::not_found("battle", battle_id))?;

        let reply = match handler.handle(ctx, &battle, warrior_id, payload).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!(
                    correlation_id = %ctx.correlation_id,
                    battle_id = %battle_id,
                    warrior_id = %warrior_id,
                    kind = %kind,
                    code = err.code(),
                    error = %err,
                    "battle event rejected"
                );
                return Err(err);
            }
        };

        let delivered = if reply.broadcast {
            let update = BattleUpdate::new(reply.update_type, reply.payload.clone())
                .from_origin(ctx.client_id);
            self.broadcaster.publish(battle_id, update).await
        } else {
            0
        };

        tracing::debug!(
            correlation_id = %ctx.correlation_id,
            battle_id = %battle_id,
            warrior_id = %warrior_id,
            kind = %kind,
            delivered,
            "battle event handled"
        );
        Ok(reply)
    }
}
