//! Session validation port.
//!
//! Given the credential presented by a connection, resolve the warrior behind
//! it or fail. The resolved identifier is trusted as-is by the dispatcher.
//!
//! # Example Implementation
//!
//! ```ignore
//! pub struct CookieValidator { ... }
//!
//! #[async_trait]
//! impl SessionValidator for CookieValidator {
//!     async fn validate(&self, token: &str) -> Result<AuthenticatedWarrior, AuthError> {
//!         // 1. Verify the signed cookie
//!         // 2. Look up the warrior it names
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedWarrior};

/// Resolves connection credentials to a warrior identity.
///
/// # Contract
///
/// Implementations must:
/// - Return `AuthError::InvalidToken` for missing or malformed credentials
/// - Return `AuthError::WarriorNotFound` when the credential names no warrior
/// - Return `AuthError::ServiceUnavailable` for transient errors
#[async_trait]
pub trait SessionValidator: Send + Sync {
    async fn validate(&self, token: &str) -> Result<AuthenticatedWarrior, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::WarriorId;
    use std::collections::HashMap;
    use std::sync::RwLock;

    /// Simple implementation for exercising the trait object.
    struct TestSessionValidator {
        tokens: RwLock<HashMap<String, AuthenticatedWarrior>>,
    }

    #[async_trait]
    impl SessionValidator for TestSessionValidator {
        async fn validate(&self, token: &str) -> Result<AuthenticatedWarrior, AuthError> {
            self.tokens
                .read()
                .unwrap()
                .get(token)
                .cloned()
                .ok_or(AuthError::InvalidToken)
        }
    }

    #[tokio::test]
    async fn validates_through_trait_object() {
        let warrior = AuthenticatedWarrior::new(WarriorId::new(), "Thor");
        let mut tokens = HashMap::new();
        tokens.insert("good".to_string(), warrior.clone());
        let validator: Box<dyn SessionValidator> = Box::new(TestSessionValidator {
            tokens: RwLock::new(tokens),
        });

        assert_eq!(validator.validate("good").await.unwrap(), warrior);
        assert!(matches!(
            validator.validate("bad").await,
            Err(AuthError::InvalidToken)
        ));
    }
}
