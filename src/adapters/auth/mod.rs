//! Authentication adapters.
//!
//! Implementations of the `SessionValidator` port:
//!
//! - `warrior_token` - Resolves the warrior-id token against the store
//! - `mock` - Test implementation that doesn't require a store

mod mock;
mod warrior_token;

pub use mock::MockSessionValidator;
pub use warrior_token::WarriorTokenValidator;
