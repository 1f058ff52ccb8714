//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Storage Ports
//!
//! - `BattleRepository` - Battles and warrior membership
//! - `PlanRepository` - Plans, votes and voting-state transitions
//! - `WarriorRepository` - Global warrior identities
//!
//! ## Boundary Ports
//!
//! - `SessionValidator` - Resolves a connection credential to a warrior
//! - `BattleBroadcaster` - Per-battle fan-out of state updates

mod battle_broadcaster;
mod battle_repository;
mod plan_repository;
mod session_validator;
mod warrior_repository;

pub use battle_broadcaster::{BattleBroadcaster, BattleUpdate};
pub use battle_repository::BattleRepository;
pub use plan_repository::PlanRepository;
pub use session_validator::SessionValidator;
pub use warrior_repository::WarriorRepository;
