//! WebSocket adapters for live battles.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         ws_handler                                   │
//! │   - Joins warrior to battle, sends init snapshot                    │
//! │   - Feeds inbound {type, value} frames to the EventDispatcher       │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ dispatch
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      EventDispatcher                                 │
//! │   - Routes to battle event handlers, publishes successful results   │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ publish (BattleBroadcaster)
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      RoomManager                                     │
//! │   Room: battle-123     Room: battle-456     Room: battle-789        │
//! │   ├── client-a         ├── client-d         ├── client-g            │
//! │   └── client-b         └── client-e         └── client-h            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`messages`] - WebSocket message protocol types
//! - [`rooms`] - Session registry and per-battle broadcast hub
//! - [`handler`] - Axum WebSocket upgrade handler

pub mod handler;
pub mod messages;
pub mod rooms;

pub use handler::{websocket_router, ws_handler, WebSocketState};
pub use messages::{
    BattleUpdateMessage, ClientMessage, ConnectedMessage, ErrorMessage, PongMessage,
    ServerMessage,
};
pub use rooms::{RoomManager, RoomSubscription};
