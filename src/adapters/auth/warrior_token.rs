//! Warrior token validator.
//!
//! The credential a client presents is its warrior id. A token resolves when
//! it parses as an id and the warrior exists in the store.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedWarrior, WarriorId};
use crate::ports::{SessionValidator, WarriorRepository};

pub struct WarriorTokenValidator {
    warriors: Arc<dyn WarriorRepository>,
}

impl WarriorTokenValidator {
    pub fn new(warriors: Arc<dyn WarriorRepository>) -> Self {
        Self { warriors }
    }
}

#[async_trait]
impl SessionValidator for WarriorTokenValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedWarrior, AuthError> {
        let id: WarriorId = token.trim().parse().map_err(|_| AuthError::InvalidToken)?;

        match self.warriors.find_by_id(&id).await {
            Ok(Some(warrior)) => Ok(AuthenticatedWarrior::new(warrior.id, warrior.name)),
            Ok(None) => Err(AuthError::WarriorNotFound),
            Err(err) => {
                tracing::error!(error = %err.message, "warrior lookup failed during auth");
                Err(AuthError::service_unavailable("warrior lookup failed"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::battle::Warrior;

    async fn setup() -> (WarriorTokenValidator, InMemoryStore, Warrior) {
        let store = InMemoryStore::new();
        let warrior = Warrior::new("Thor").unwrap();
        WarriorRepository::create(&store, &warrior).await.unwrap();
        (WarriorTokenValidator::new(Arc::new(store.clone())), store, warrior)
    }

    #[tokio::test]
    async fn known_warrior_id_authenticates() {
        let (validator, _, warrior) = setup().await;

        let auth = validator.validate(&warrior.id.to_string()).await.unwrap();

        assert_eq!(auth, AuthenticatedWarrior::new(warrior.id, "Thor"));
    }

    #[tokio::test]
    async fn malformed_token_is_invalid() {
        let (validator, _, _) = setup().await;

        assert!(matches!(
            validator.validate("not-a-uuid").await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn unknown_warrior_is_rejected() {
        let (validator, _, _) = setup().await;

        assert!(matches!(
            validator.validate(&WarriorId::new().to_string()).await,
            Err(AuthError::WarriorNotFound)
        ));
    }

    #[tokio::test]
    async fn store_failure_is_transient() {
        let (validator, store, warrior) = setup().await;
        store.set_failing(true);

        let err = validator.validate(&warrior.id.to_string()).await.unwrap_err();

        assert!(err.is_transient());
    }
}
