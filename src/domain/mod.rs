//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, auth, errors)
//! - `battle` - Battles, plans, votes and warriors

pub mod battle;
pub mod foundation;
