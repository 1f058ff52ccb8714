//! Warrior - a battle participant.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ValidationError, WarriorId};

use super::validated_text;

/// Maximum warrior name length (matches the `warriors.name` column).
pub const MAX_WARRIOR_NAME_LEN: usize = 64;

/// Global participant identity, independent of any battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warrior {
    pub id: WarriorId,
    pub name: String,
}

impl Warrior {
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            id: WarriorId::new(),
            name: validated_text("name", name, MAX_WARRIOR_NAME_LEN)?,
        })
    }
}
