//! Realtime (websocket fan-out) configuration

use serde::Deserialize;

use super::error::ValidationError;

const MAX_ROOM_CAPACITY: usize = 4096;

#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Buffered updates per battle room before slow clients start lagging
    #[serde(default = "default_room_capacity")]
    pub room_capacity: usize,
}

impl RealtimeConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.room_capacity == 0 || self.room_capacity > MAX_ROOM_CAPACITY {
            return Err(ValidationError::InvalidRoomCapacity);
        }
        Ok(())
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            room_capacity: default_room_capacity(),
        }
    }
}

fn default_room_capacity() -> usize {
    128
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capacity_is_valid() {
        let config = RealtimeConfig::default();
        assert_eq!(config.room_capacity, 128);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn capacity_bounds_are_enforced() {
        assert!(RealtimeConfig { room_capacity: 0 }.validate().is_err());
        assert!(RealtimeConfig { room_capacity: 5000 }.validate().is_err());
    }
}
