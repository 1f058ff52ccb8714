//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `auth` - session validators (warrior-id tokens, mock)
//! - `http` - REST endpoints and the composed router
//! - `memory` - in-memory store for tests and database-less runs
//! - `postgres` - PostgreSQL repositories
//! - `websocket` - live battle rooms and the per-connection loop

pub mod auth;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod websocket;

pub use memory::InMemoryStore;
pub use websocket::RoomManager;
