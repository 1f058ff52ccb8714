//! Battle rooms: the session registry and per-battle broadcast hub.
//!
//! Each battle with at least one connected client owns a hub: a
//! `tokio::sync::broadcast` channel plus the set of connected clients and the
//! warrior behind each. The hub is created on first join and disposed when
//! its last client leaves.
//!
//! # Architecture
//!
//! ```text
//! Room: battle-123     Room: battle-456
//! ├── client-a (Thor)  ├── client-d (Sif)
//! ├── client-b (Loki)  └── client-e (Odin)
//! └── client-c (Thor)
//! ```
//!
//! A publish for battle-123 is handed to a, b and c in one `send`; each
//! client's receiver buffers independently, so a slow client only ever
//! lags itself.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::RwLock;

use crate::domain::foundation::{BattleId, ClientId, WarriorId};
use crate::ports::{BattleBroadcaster, BattleUpdate};

struct BattleHub {
    sender: broadcast::Sender<BattleUpdate>,
    subscribers: HashMap<ClientId, WarriorId>,
}

#[derive(Default)]
struct Registry {
    rooms: HashMap<BattleId, BattleHub>,
    /// client_id → battle_id for O(1) cleanup on disconnect.
    client_battles: HashMap<ClientId, BattleId>,
}

/// Manages battle rooms.
///
/// # Thread Safety
///
/// One `RwLock` guards the whole registry. Publishes take the read lock and
/// never await while holding it; joins and leaves take the write lock.
pub struct RoomManager {
    registry: RwLock<Registry>,
    /// Buffer size of each room's broadcast channel.
    channel_capacity: usize,
}

impl RoomManager {
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            channel_capacity: channel_capacity.max(1),
        }
    }

    /// Create with default capacity (128 messages).
    pub fn with_default_capacity() -> Self {
        Self::new(128)
    }

    /// Registers a client connection in a battle room, creating the room if
    /// needed.
    ///
    /// A client id already registered elsewhere is moved to this battle.
    pub async fn join(
        &self,
        battle_id: &BattleId,
        client_id: ClientId,
        warrior_id: WarriorId,
    ) -> RoomSubscription {
        let mut registry = self.registry.write().await;

        if let Some(previous) = registry.client_battles.insert(client_id, *battle_id) {
            if &previous != battle_id {
                remove_subscriber(&mut registry.rooms, &previous, &client_id);
            }
        }

        let capacity = self.channel_capacity;
        let hub = registry.rooms.entry(*battle_id).or_insert_with(|| {
            tracing::debug!(battle_id = %battle_id, "battle room opened");
            let (sender, _) = broadcast::channel(capacity);
            BattleHub {
                sender,
                subscribers: HashMap::new(),
            }
        });
        hub.subscribers.insert(client_id, warrior_id);

        RoomSubscription {
            client_id,
            receiver: hub.sender.subscribe(),
        }
    }

    /// Removes a client from its room. Leaving twice is harmless.
    ///
    /// Returns the battle the client was in.
    pub async fn leave(&self, client_id: &ClientId) -> Option<BattleId> {
        let mut registry = self.registry.write().await;
        let battle_id = registry.client_battles.remove(client_id)?;
        remove_subscriber(&mut registry.rooms, &battle_id, client_id);
        Some(battle_id)
    }

    /// Delivers an update to every client in the battle room except the
    /// update's origin. A missing or empty room is a no-op.
    ///
    /// Returns the number of clients the update was handed to.
    pub async fn broadcast_to_battle(&self, battle_id: &BattleId, update: BattleUpdate) -> usize {
        let registry = self.registry.read().await;
        let Some(hub) = registry.rooms.get(battle_id) else {
            return 0;
        };

        let origin_present = update
            .origin
            .map(|origin| hub.subscribers.contains_key(&origin))
            .unwrap_or(false);

        match hub.sender.send(update) {
            Ok(receivers) if origin_present => receivers.saturating_sub(1),
            Ok(receivers) => receivers,
            Err(_) => 0,
        }
    }

    /// Number of connections in a battle room (0 if the room doesn't exist).
    pub async fn client_count(&self, battle_id: &BattleId) -> usize {
        self.registry
            .read()
            .await
            .rooms
            .get(battle_id)
            .map(|hub| hub.subscribers.len())
            .unwrap_or(0)
    }

    /// Distinct warriors connected to a battle.
    pub async fn connected_warriors(&self, battle_id: &BattleId) -> Vec<WarriorId> {
        let registry = self.registry.read().await;
        let mut warriors: Vec<WarriorId> = registry
            .rooms
            .get(battle_id)
            .map(|hub| hub.subscribers.values().copied().collect())
            .unwrap_or_default();
        warriors.sort();
        warriors.dedup();
        warriors
    }

    /// Whether `warrior_id` still has another connection open in the battle.
    pub async fn is_connected(&self, battle_id: &BattleId, warrior_id: &WarriorId) -> bool {
        self.registry
            .read()
            .await
            .rooms
            .get(battle_id)
            .map(|hub| hub.subscribers.values().any(|w| w == warrior_id))
            .unwrap_or(false)
    }

    /// Battles with at least one connection.
    pub async fn active_rooms(&self) -> Vec<BattleId> {
        self.registry.read().await.rooms.keys().copied().collect()
    }

    pub async fn total_client_count(&self) -> usize {
        self.registry.read().await.client_battles.len()
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

fn remove_subscriber(
    rooms: &mut HashMap<BattleId, BattleHub>,
    battle_id: &BattleId,
    client_id: &ClientId,
) {
    let empty = match rooms.get_mut(battle_id) {
        Some(hub) => {
            hub.subscribers.remove(client_id);
            hub.subscribers.is_empty()
        }
        None => false,
    };
    if empty {
        rooms.remove(battle_id);
        tracing::debug!(battle_id = %battle_id, "battle room closed");
    }
}

#[async_trait]
impl BattleBroadcaster for RoomManager {
    async fn publish(&self, battle_id: &BattleId, update: BattleUpdate) -> usize {
        self.broadcast_to_battle(battle_id, update).await
    }
}

/// One client's view of its battle room.
pub struct RoomSubscription {
    client_id: ClientId,
    receiver: broadcast::Receiver<BattleUpdate>,
}

impl RoomSubscription {
    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Next update meant for this client, or `None` once the room is gone.
    ///
    /// Updates this client originated are skipped. A client that fell behind
    /// the channel buffer loses the overwritten updates and resumes with the
    /// oldest one still buffered.
    pub async fn recv(&mut self) -> Option<BattleUpdate> {
        loop {
            match self.receiver.recv().await {
                Ok(update) if update.origin == Some(self.client_id) => continue,
                Ok(update) => return Some(update),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(client_id = %self.client_id, skipped, "subscriber lagged");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::battle::BattleUpdateType;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    fn test_update() -> BattleUpdate {
        BattleUpdate::new(BattleUpdateType::PlanAdded, serde_json::json!({"test": "data"}))
    }

    #[tokio::test]
    async fn join_creates_room_if_not_exists() {
        let manager = RoomManager::with_default_capacity();
        let battle_id = BattleId::new();

        let _sub = manager.join(&battle_id, ClientId::new(), WarriorId::new()).await;

        assert_eq!(manager.active_rooms().await, vec![battle_id]);
    }

    #[tokio::test]
    async fn every_client_in_room_receives_broadcast() {
        let manager = Arc::new(RoomManager::with_default_capacity());
        let battle_id = BattleId::new();

        let mut a = manager.join(&battle_id, ClientId::new(), WarriorId::new()).await;
        let mut b = manager.join(&battle_id, ClientId::new(), WarriorId::new()).await;
        let mut c = manager.join(&battle_id, ClientId::new(), WarriorId::new()).await;

        let delivered = manager.broadcast_to_battle(&battle_id, test_update()).await;

        assert_eq!(delivered, 3);
        assert!(a.recv().await.is_some());
        assert!(b.recv().await.is_some());
        assert!(c.recv().await.is_some());
    }

    #[tokio::test]
    async fn origin_is_skipped() {
        let manager = RoomManager::with_default_capacity();
        let battle_id = BattleId::new();
        let origin = ClientId::new();

        let mut own = manager.join(&battle_id, origin, WarriorId::new()).await;
        let mut other = manager.join(&battle_id, ClientId::new(), WarriorId::new()).await;

        let delivered = manager
            .broadcast_to_battle(&battle_id, test_update().from_origin(Some(origin)))
            .await;

        assert_eq!(delivered, 1);
        assert!(other.recv().await.is_some());
        assert!(timeout(Duration::from_millis(50), own.recv()).await.is_err());
    }

    #[tokio::test]
    async fn rooms_are_isolated() {
        let manager = RoomManager::with_default_capacity();
        let battle_1 = BattleId::new();
        let battle_2 = BattleId::new();

        let mut sub_1 = manager.join(&battle_1, ClientId::new(), WarriorId::new()).await;
        let mut sub_2 = manager.join(&battle_2, ClientId::new(), WarriorId::new()).await;

        manager.broadcast_to_battle(&battle_1, test_update()).await;

        assert!(sub_1.recv().await.is_some());
        assert!(timeout(Duration::from_millis(50), sub_2.recv()).await.is_err());
    }

    #[tokio::test]
    async fn leave_disposes_empty_room() {
        let manager = RoomManager::with_default_capacity();
        let battle_id = BattleId::new();
        let client_id = ClientId::new();

        let _sub = manager.join(&battle_id, client_id, WarriorId::new()).await;
        assert_eq!(manager.leave(&client_id).await, Some(battle_id));
        assert_eq!(manager.leave(&client_id).await, None);

        assert!(manager.active_rooms().await.is_empty());
        assert_eq!(manager.total_client_count().await, 0);
    }

    #[tokio::test]
    async fn broadcast_to_missing_room_is_noop() {
        let manager = RoomManager::with_default_capacity();

        let delivered = manager
            .broadcast_to_battle(&BattleId::new(), test_update())
            .await;

        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn dropped_subscriber_does_not_block_others() {
        let manager = RoomManager::with_default_capacity();
        let battle_id = BattleId::new();

        let gone = manager.join(&battle_id, ClientId::new(), WarriorId::new()).await;
        let mut stays = manager.join(&battle_id, ClientId::new(), WarriorId::new()).await;
        drop(gone);

        manager.broadcast_to_battle(&battle_id, test_update()).await;

        assert!(stays.recv().await.is_some());
    }

    #[tokio::test]
    async fn lagging_subscriber_keeps_receiving_newer_updates() {
        let manager = RoomManager::new(2);
        let battle_id = BattleId::new();
        let mut slow = manager.join(&battle_id, ClientId::new(), WarriorId::new()).await;

        for n in 0..5 {
            let update = BattleUpdate::new(BattleUpdateType::VoteActivity, serde_json::json!(n));
            manager.broadcast_to_battle(&battle_id, update).await;
        }

        assert_eq!(slow.recv().await.unwrap().data, serde_json::json!(3));
        assert_eq!(slow.recv().await.unwrap().data, serde_json::json!(4));
    }

    #[tokio::test]
    async fn connected_warriors_deduplicates_connections() {
        let manager = RoomManager::with_default_capacity();
        let battle_id = BattleId::new();
        let thor = WarriorId::new();
        let first = ClientId::new();

        let _a = manager.join(&battle_id, first, thor).await;
        let _b = manager.join(&battle_id, ClientId::new(), thor).await;

        assert_eq!(manager.client_count(&battle_id).await, 2);
        assert_eq!(manager.connected_warriors(&battle_id).await, vec![thor]);

        manager.leave(&first).await;
        assert!(manager.is_connected(&battle_id, &thor).await);
    }

    #[tokio::test]
    async fn rejoining_elsewhere_moves_the_client() {
        let manager = RoomManager::with_default_capacity();
        let battle_1 = BattleId::new();
        let battle_2 = BattleId::new();
        let client_id = ClientId::new();

        let _a = manager.join(&battle_1, client_id, WarriorId::new()).await;
        let _b = manager.join(&battle_2, client_id, WarriorId::new()).await;

        assert_eq!(manager.active_rooms().await, vec![battle_2]);
    }

    #[tokio::test]
    async fn concurrent_joins_and_leaves_keep_registry_consistent() {
        let manager = Arc::new(RoomManager::with_default_capacity());
        let battle_id = BattleId::new();

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let manager = manager.clone();
                tokio::spawn(async move {
                    let client_id = ClientId::new();
                    let _sub = manager.join(&battle_id, client_id, WarriorId::new()).await;
                    manager.broadcast_to_battle(&battle_id, test_update()).await;
                    if i % 2 == 0 {
                        manager.leave(&client_id).await;
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(manager.client_count(&battle_id).await, 16);
        assert_eq!(manager.total_client_count().await, 16);
    }
}
