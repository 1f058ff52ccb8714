//! Warrior repository port.

use async_trait::async_trait;

use crate::domain::battle::Warrior;
use crate::domain::foundation::{DomainError, WarriorId};

/// Repository port for global warrior identities.
#[async_trait]
pub trait WarriorRepository: Send + Sync {
    /// Save a new warrior.
    async fn create(&self, warrior: &Warrior) -> Result<(), DomainError>;

    /// Find a warrior by ID. Returns `None` if not found.
    async fn find_by_id(&self, id: &WarriorId) -> Result<Option<Warrior>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warrior_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn WarriorRepository) {}
    }
}
