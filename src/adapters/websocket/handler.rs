//! WebSocket upgrade handler for live battle connections.
//!
//! Connection lifecycle:
//! 1. Resolve the battle (the warrior comes from the auth middleware)
//! 2. Upgrade to WebSocket and join the battle room
//! 3. Mark the warrior active, send `init` with the full snapshot and
//!    broadcast `warrior_joined` to everyone else
//! 4. Dispatch inbound events until disconnect; replies go to this client,
//!    broadcasts to the rest of the room
//! 5. Leave the room and, unless the warrior already retreated or is still
//!    connected elsewhere, retreat them and broadcast `warrior_retreated`

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::adapters::http::middleware::RequireAuth;
use crate::application::{BattleService, DispatchContext, EventDispatcher, MembershipService};
use crate::domain::battle::{BattleError, BattleEventKind, BattleUpdateType};
use crate::domain::foundation::{AuthenticatedWarrior, BattleId, ClientId, Timestamp};
use crate::ports::BattleUpdate;

use super::messages::{ClientMessage, ConnectedMessage, ServerMessage};
use super::rooms::RoomManager;

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub rooms: Arc<RoomManager>,
    pub dispatcher: Arc<EventDispatcher>,
    pub battles: Arc<BattleService>,
    pub membership: Arc<MembershipService>,
}

impl WebSocketState {
    pub fn new(
        rooms: Arc<RoomManager>,
        dispatcher: Arc<EventDispatcher>,
        battles: Arc<BattleService>,
        membership: Arc<MembershipService>,
    ) -> Self {
        Self {
            rooms,
            dispatcher,
            battles,
            membership,
        }
    }
}

/// Handle WebSocket upgrade requests for a battle.
///
/// Route: `GET /api/battles/:battle_id/live`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(battle_id): Path<String>,
    State(state): State<WebSocketState>,
    RequireAuth(warrior): RequireAuth,
) -> Response {
    let battle_id: BattleId = match battle_id.parse() {
        Ok(id) => id,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": "Invalid battle ID",
                    "code": "VALIDATION_FAILED"
                })),
            )
                .into_response();
        }
    };

    if let Err(err) = state.battles.get_battle(&battle_id).await {
        let status = match err {
            BattleError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        return (
            status,
            Json(serde_json::json!({ "error": err.message(), "code": err.code() })),
        )
            .into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, battle_id, warrior, state))
}

/// Runs for the lifetime of one connection.
async fn handle_socket(
    socket: WebSocket,
    battle_id: BattleId,
    warrior: AuthenticatedWarrior,
    state: WebSocketState,
) {
    let (mut sender, mut receiver) = socket.split();
    let client_id = ClientId::new();

    let mut subscription = state.rooms.join(&battle_id, client_id, warrior.id).await;

    let warriors = match state.membership.join(&battle_id, &warrior.id).await {
        Ok(warriors) => warriors,
        Err(err) => {
            let _ = send_message(&mut sender, &ServerMessage::error(&err)).await;
            state.rooms.leave(&client_id).await;
            return;
        }
    };

    tracing::info!(
        battle_id = %battle_id,
        warrior_id = %warrior.id,
        client_id = %client_id,
        "warrior connected"
    );

    let connected = ServerMessage::Connected(ConnectedMessage {
        battle_id: battle_id.to_string(),
        client_id: client_id.to_string(),
        warrior_id: warrior.id.to_string(),
        timestamp: Timestamp::now().to_rfc3339(),
    });
    let init = match state.battles.get_battle(&battle_id).await {
        Ok(snapshot) => ServerMessage::update(BattleUpdateType::Init, to_json(&snapshot)),
        Err(err) => ServerMessage::error(&err),
    };
    if send_message(&mut sender, &connected).await.is_err()
        || send_message(&mut sender, &init).await.is_err()
    {
        tracing::debug!(client_id = %client_id, "client disconnected during handshake");
        disconnect(&state, battle_id, &warrior, client_id, false).await;
        return;
    }

    let joined = BattleUpdate::new(BattleUpdateType::WarriorJoined, to_json(&warriors))
        .from_origin(Some(client_id));
    state.rooms.broadcast_to_battle(&battle_id, joined).await;

    // Direct replies from the receive loop go through this channel so only
    // the send task writes to the socket.
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ServerMessage>();

    let mut send_task = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                Some(update) = subscription.recv() => ServerMessage::from(update),
                Some(msg) = outbound_rx.recv() => msg,
                else => break,
            };
            if let Err(e) = send_message(&mut sender, &msg).await {
                tracing::debug!(client_id = %client_id, error = %e, "send failed, closing connection");
                break;
            }
        }
    });

    let retreated = Arc::new(AtomicBool::new(false));
    let mut recv_task = {
        let dispatcher = state.dispatcher.clone();
        let retreated = retreated.clone();
        let warrior_id = warrior.id;
        tokio::spawn(async move {
            while let Some(result) = receiver.next().await {
                let text = match result {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Binary(_)) => {
                        tracing::warn!(client_id = %client_id, "received unsupported binary message");
                        continue;
                    }
                    Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
                    Ok(Message::Close(_)) => {
                        tracing::debug!(client_id = %client_id, "client sent close frame");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(client_id = %client_id, error = %e, "receive error");
                        break;
                    }
                };

                let msg = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(msg) => msg,
                    Err(e) => {
                        let err = BattleError::validation("message", e.to_string());
                        let _ = outbound_tx.send(ServerMessage::error(&err));
                        continue;
                    }
                };
                if msg.is_ping() {
                    let _ = outbound_tx.send(ServerMessage::pong());
                    continue;
                }

                let ctx = DispatchContext::new(Some(client_id));
                let outcome = dispatcher
                    .dispatch(&ctx, &battle_id, &warrior_id, &msg.kind, msg.value)
                    .await;
                let reply = match outcome {
                    Ok(reply) => {
                        if msg.kind == BattleEventKind::Retreat.as_str() {
                            retreated.store(true, Ordering::SeqCst);
                            break;
                        }
                        ServerMessage::update(reply.update_type, reply.payload)
                    }
                    Err(err) => ServerMessage::error(&err),
                };
                if outbound_tx.send(reply).is_err() {
                    break;
                }
            }
        })
    };

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    disconnect(
        &state,
        battle_id,
        &warrior,
        client_id,
        retreated.load(Ordering::SeqCst),
    )
    .await;
}

/// Leaves the room and retreats the warrior if this was their last
/// connection to the battle.
async fn disconnect(
    state: &WebSocketState,
    battle_id: BattleId,
    warrior: &AuthenticatedWarrior,
    client_id: ClientId,
    already_retreated: bool,
) {
    state.rooms.leave(&client_id).await;
    tracing::info!(
        battle_id = %battle_id,
        warrior_id = %warrior.id,
        client_id = %client_id,
        "warrior disconnected"
    );

    if already_retreated || state.rooms.is_connected(&battle_id, &warrior.id).await {
        return;
    }

    match state.membership.leave(&battle_id, &warrior.id).await {
        Ok(warriors) => {
            let update = BattleUpdate::new(BattleUpdateType::WarriorRetreated, to_json(&warriors));
            state.rooms.broadcast_to_battle(&battle_id, update).await;
        }
        Err(err) => {
            tracing::warn!(
                battle_id = %battle_id,
                warrior_id = %warrior.id,
                error = %err,
                "failed to retreat warrior on disconnect"
            );
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to serialize battle state");
        serde_json::Value::Null
    })
}

/// Send a JSON message over the WebSocket.
async fn send_message(
    sender: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json)).await,
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize server message");
            Ok(())
        }
    }
}

/// Router for the live battle endpoint.
pub fn websocket_router() -> axum::Router<WebSocketState> {
    use axum::routing::get;

    axum::Router::new().route("/battles/:battle_id/live", get(ws_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::application::battle_dispatcher;
    use crate::application::VotingService;

    fn state() -> WebSocketState {
        let store = InMemoryStore::new();
        let rooms = Arc::new(RoomManager::default());
        let voting = Arc::new(VotingService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
        ));
        let membership = Arc::new(MembershipService::new(Arc::new(store.clone())));
        let dispatcher = Arc::new(battle_dispatcher(
            Arc::new(store.clone()),
            rooms.clone(),
            voting,
            membership.clone(),
        ));
        let battles = Arc::new(BattleService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
        ));
        WebSocketState::new(rooms, dispatcher, battles, membership)
    }

    #[test]
    fn websocket_state_shares_room_manager() {
        let state = state();
        let cloned = state.clone();

        assert!(Arc::ptr_eq(&state.rooms, &cloned.rooms));
    }

    #[test]
    fn websocket_router_creates_route() {
        let _router: axum::Router = websocket_router().with_state(state());
    }

    #[test]
    fn to_json_serializes_snapshot_values() {
        assert_eq!(to_json(&vec!["a", "b"]), serde_json::json!(["a", "b"]));
    }
}
