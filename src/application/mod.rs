//! Application layer - services and event dispatch.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Live-session actions enter through the `EventDispatcher`; the HTTP and
//! websocket adapters call the services directly for everything else.

pub mod dispatcher;
pub mod handlers;

pub use dispatcher::{BattleEventHandler, DispatchContext, EventDispatcher, EventReply};
pub use handlers::{battle_dispatcher, BattleService, MembershipService, VotingService};
