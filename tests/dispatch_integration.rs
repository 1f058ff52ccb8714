//! Integration tests for event dispatch and per-battle fan-out.
//!
//! Wires the real dispatcher to a `RoomManager` over the in-memory store and
//! observes what each connected client receives.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use battle_poker::adapters::websocket::RoomSubscription;
use battle_poker::adapters::{InMemoryStore, RoomManager};
use battle_poker::application::{
    battle_dispatcher, BattleService, DispatchContext, EventDispatcher, MembershipService,
    VotingService,
};
use battle_poker::domain::battle::{BattleError, BattleUpdateType, Warrior};
use battle_poker::domain::foundation::{BattleId, ClientId, WarriorId};
use battle_poker::ports::BattleUpdate;

// =============================================================================
// Test Infrastructure
// =============================================================================

struct Arena {
    store: InMemoryStore,
    rooms: Arc<RoomManager>,
    dispatcher: EventDispatcher,
    battles: BattleService,
    leader: Warrior,
    battle_id: BattleId,
}

async fn arena() -> Arena {
    let store = InMemoryStore::new();
    let rooms = Arc::new(RoomManager::new(16));
    let voting = Arc::new(VotingService::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
    ));
    let membership = Arc::new(MembershipService::new(Arc::new(store.clone())));
    let dispatcher = battle_dispatcher(Arc::new(store.clone()), rooms.clone(), voting, membership);
    let battles = BattleService::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
    );

    let leader = battles.create_warrior("Thor").await.unwrap();
    let battle_id = battles.create_battle(&leader.id, "Sprint 12").await.unwrap().id;

    Arena {
        store,
        rooms,
        dispatcher,
        battles,
        leader,
        battle_id,
    }
}

impl Arena {
    async fn connect(&self, warrior_id: WarriorId) -> RoomSubscription {
        self.rooms
            .join(&self.battle_id, ClientId::new(), warrior_id)
            .await
    }

    async fn send(
        &self,
        from: &RoomSubscription,
        warrior_id: WarriorId,
        kind: &str,
        payload: Value,
    ) -> Result<Value, BattleError> {
        let ctx = DispatchContext::new(Some(from.client_id()));
        self.dispatcher
            .dispatch(&ctx, &self.battle_id, &warrior_id, kind, payload)
            .await
            .map(|reply| reply.payload)
    }
}

/// Next update, or `None` if nothing arrives shortly.
async fn next(sub: &mut RoomSubscription) -> Option<BattleUpdate> {
    tokio::time::timeout(Duration::from_millis(50), sub.recv())
        .await
        .ok()
        .flatten()
}

// =============================================================================
// Fan-out
// =============================================================================

#[tokio::test]
async fn accepted_event_reaches_everyone_but_the_sender() {
    let a = arena().await;
    let freya = a.battles.create_warrior("Freya").await.unwrap();
    let mut leader_conn = a.connect(a.leader.id).await;
    let mut freya_conn = a.connect(freya.id).await;

    let reply = a
        .send(&leader_conn, a.leader.id, "add_plan", json!({"planName": "Login bug"}))
        .await
        .unwrap();

    let update = next(&mut freya_conn).await.unwrap();
    assert_eq!(update.update_type, BattleUpdateType::PlanAdded);
    assert_eq!(update.data, reply);
    assert_eq!(update.data[0]["name"], "Login bug");
    assert!(next(&mut leader_conn).await.is_none());
}

#[tokio::test]
async fn vote_broadcast_hides_values() {
    let a = arena().await;
    let freya = a.battles.create_warrior("Freya").await.unwrap();
    let leader_conn = a.connect(a.leader.id).await;
    let freya_conn = a.connect(freya.id).await;
    let mut watcher = a.connect(a.leader.id).await;

    let plans = a
        .send(&leader_conn, a.leader.id, "add_plan", json!({"planName": "Login bug"}))
        .await
        .unwrap();
    let plan_id = plans[0]["id"].clone();
    a.send(&leader_conn, a.leader.id, "activate_plan", json!({"planId": plan_id}))
        .await
        .unwrap();
    a.send(
        &freya_conn,
        freya.id,
        "vote",
        json!({"planId": plan_id, "voteValue": "8"}),
    )
    .await
    .unwrap();

    next(&mut watcher).await.unwrap();
    next(&mut watcher).await.unwrap();
    let vote = next(&mut watcher).await.unwrap();
    assert_eq!(vote.update_type, BattleUpdateType::VoteActivity);
    assert_eq!(vote.data[0]["votes"][0]["vote"], "");

    a.send(&leader_conn, a.leader.id, "end_voting", json!({"planId": plan_id}))
        .await
        .unwrap();
    let ended = next(&mut watcher).await.unwrap();
    assert_eq!(ended.update_type, BattleUpdateType::VotingEnded);
    assert_eq!(ended.data[0]["votes"][0]["vote"], "8");
}

#[tokio::test]
async fn other_battles_receive_nothing() {
    let a = arena().await;
    let other = a
        .battles
        .create_battle(&a.leader.id, "Sprint 13")
        .await
        .unwrap();
    let leader_conn = a.connect(a.leader.id).await;
    let mut elsewhere = a.rooms.join(&other.id, ClientId::new(), a.leader.id).await;

    a.send(&leader_conn, a.leader.id, "add_plan", json!({"planName": "Login bug"}))
        .await
        .unwrap();

    assert!(next(&mut elsewhere).await.is_none());
}

// =============================================================================
// Rejections
// =============================================================================

#[tokio::test]
async fn unknown_kind_is_rejected_without_broadcast() {
    let a = arena().await;
    let leader_conn = a.connect(a.leader.id).await;
    let mut watcher = a.connect(a.leader.id).await;

    let err = a
        .send(&leader_conn, a.leader.id, "jump", json!({}))
        .await
        .unwrap_err();

    assert_eq!(err, BattleError::unknown_event_kind("jump"));
    assert!(next(&mut watcher).await.is_none());
}

#[tokio::test]
async fn plan_management_is_reserved_for_the_leader() {
    let a = arena().await;
    let freya = a.battles.create_warrior("Freya").await.unwrap();
    let freya_conn = a.connect(freya.id).await;
    let mut watcher = a.connect(a.leader.id).await;

    let err = a
        .send(&freya_conn, freya.id, "add_plan", json!({"planName": "Sneaky"}))
        .await
        .unwrap_err();

    assert_eq!(err, BattleError::Forbidden);
    assert!(next(&mut watcher).await.is_none());
    assert_eq!(a.store.plan_count().await, 0);
}

#[tokio::test]
async fn malformed_payload_is_a_validation_error() {
    let a = arena().await;
    let leader_conn = a.connect(a.leader.id).await;

    let err = a
        .send(&leader_conn, a.leader.id, "activate_plan", json!({"plan": 1}))
        .await
        .unwrap_err();

    assert!(matches!(err, BattleError::ValidationFailed { .. }));
}

#[tokio::test]
async fn storage_failure_is_reported_only_to_the_sender() {
    let a = arena().await;
    let leader_conn = a.connect(a.leader.id).await;
    let mut watcher = a.connect(a.leader.id).await;
    a.send(&leader_conn, a.leader.id, "add_plan", json!({"planName": "Login bug"}))
        .await
        .unwrap();
    next(&mut watcher).await.unwrap();

    a.store.set_failing(true);
    let err = a
        .send(&leader_conn, a.leader.id, "add_plan", json!({"planName": "Checkout"}))
        .await
        .unwrap_err();

    assert_eq!(err, BattleError::StorageFailure);
    assert!(next(&mut watcher).await.is_none());
}

// =============================================================================
// Connection churn
// =============================================================================

#[tokio::test]
async fn dropped_connection_does_not_disturb_the_rest() {
    let a = arena().await;
    let leader_conn = a.connect(a.leader.id).await;
    let gone = a.connect(a.leader.id).await;
    let mut stays = a.connect(a.leader.id).await;
    let gone_id = gone.client_id();
    drop(gone);

    a.send(&leader_conn, a.leader.id, "add_plan", json!({"planName": "Login bug"}))
        .await
        .unwrap();
    assert!(next(&mut stays).await.is_some());

    a.rooms.leave(&gone_id).await;
    assert_eq!(a.rooms.client_count(&a.battle_id).await, 2);
}

#[tokio::test]
async fn room_is_disposed_after_the_last_client_leaves() {
    let a = arena().await;
    let first = a.connect(a.leader.id).await;
    let second = a.connect(a.leader.id).await;

    a.rooms.leave(&first.client_id()).await;
    assert_eq!(a.rooms.active_rooms().await, vec![a.battle_id]);

    a.rooms.leave(&second.client_id()).await;
    assert!(a.rooms.active_rooms().await.is_empty());

    let delivered = a
        .rooms
        .broadcast_to_battle(
            &a.battle_id,
            BattleUpdate::new(BattleUpdateType::PlanAdded, json!([])),
        )
        .await;
    assert_eq!(delivered, 0);
}

#[tokio::test]
async fn concurrent_events_all_reach_a_watcher() {
    let a = Arc::new(arena().await);
    let mut watcher = a.connect(a.leader.id).await;

    let mut tasks = Vec::new();
    for i in 0..8 {
        let a = a.clone();
        tasks.push(tokio::spawn(async move {
            let conn = a.connect(a.leader.id).await;
            a.send(
                &conn,
                a.leader.id,
                "add_plan",
                json!({ "planName": format!("Plan {}", i) }),
            )
            .await
            .unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let mut received = 0;
    while next(&mut watcher).await.is_some() {
        received += 1;
    }
    assert_eq!(received, 8);
    assert_eq!(a.store.plan_count().await, 8);
}
