#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use cuproom_core::protocol::event::EventRef;
use cuproom_core::protocol::OutboundEvent;
use cuproom_gateway::context::Identity;
use cuproom_gateway::realtime::{ConnId, Hub, PreparedMsg};

async fn connect(hub: &Hub, user: &str) -> (ConnId, mpsc::Receiver<PreparedMsg>) {
    connect_with_capacity(hub, user, 16).await
}

async fn connect_with_capacity(
    hub: &Hub,
    user: &str,
    capacity: usize,
) -> (ConnId, mpsc::Receiver<PreparedMsg>) {
    let conn = ConnId::new();
    let (tx, rx) = mpsc::channel(capacity);
    hub.register(conn, Arc::new(Identity::new(user, user)), tx)
        .await
        .unwrap();
    (conn, rx)
}

fn start(room: &str) -> OutboundEvent {
    OutboundEvent::NewStartEvent(EventRef {
        event_id: room.to_string(),
    })
}

#[tokio::test]
async fn joiners_share_the_creator_as_leader() {
    let hub = Hub::spawn();
    let (a, _ra) = connect(&hub, "host").await;
    let (b, _rb) = connect(&hub, "guest-b").await;
    let (c, _rc) = connect(&hub, "guest-c").await;

    hub.create_room(a, "e1").await.unwrap();
    assert_eq!(hub.join_room(b, "e1").await.unwrap(), "host");
    assert_eq!(hub.join_room(c, "e1").await.unwrap(), "host");
    assert_eq!(hub.leader_of("e1").await.unwrap().as_deref(), Some("host"));

    let sa = hub.client_state(a).await.unwrap().unwrap();
    let sb = hub.client_state(b).await.unwrap().unwrap();
    assert!(sa.is_leader);
    assert!(!sb.is_leader);
    assert_eq!(sb.room.as_deref(), Some("e1"));
    assert_eq!(sb.leader_id.as_deref(), Some("host"));
    assert_eq!(hub.members("e1").await.unwrap().len(), 3);
}

#[tokio::test]
async fn broadcast_stays_inside_the_room() {
    let hub = Hub::spawn();
    let (a, mut ra) = connect(&hub, "a").await;
    let (b, mut rb) = connect(&hub, "b").await;
    let (c, mut rc) = connect(&hub, "c").await;

    hub.create_room(a, "r1").await.unwrap();
    hub.create_room(b, "r2").await.unwrap();
    hub.join_room(c, "r1").await.unwrap();

    let delivered = hub.broadcast("r1", &start("r1")).await.unwrap();
    assert_eq!(delivered, 2);

    let got = ra.try_recv().unwrap();
    assert!(got.as_str().contains("new_start_event"));
    assert!(rc.try_recv().is_ok());
    assert!(rb.try_recv().is_err());
}

#[tokio::test]
async fn broadcast_to_unknown_room_delivers_nothing() {
    let hub = Hub::spawn();
    let (_a, mut ra) = connect(&hub, "a").await;

    assert_eq!(hub.broadcast("ghost", &start("ghost")).await.unwrap(), 0);
    assert!(ra.try_recv().is_err());
}

#[tokio::test]
async fn joining_a_missing_room_fails_and_places_nobody() {
    let hub = Hub::spawn();
    let (b, _rb) = connect(&hub, "b").await;

    let err = hub.join_room(b, "nope").await.unwrap_err();
    assert_eq!(err.client_code().as_str(), "ROOM_NOT_FOUND");

    let state = hub.client_state(b).await.unwrap().unwrap();
    assert_eq!(state.room, None);
    assert_eq!(hub.counts().await.unwrap(), (1, 0));
}

#[tokio::test]
async fn creating_an_occupied_room_is_rejected() {
    let hub = Hub::spawn();
    let (a, _ra) = connect(&hub, "a").await;
    let (b, _rb) = connect(&hub, "b").await;

    hub.create_room(a, "e1").await.unwrap();
    let err = hub.create_room(b, "e1").await.unwrap_err();
    assert_eq!(err.client_code().as_str(), "ROOM_EXISTS");

    // repeat by the same leader is a no-op
    hub.create_room(a, "e1").await.unwrap();
    assert_eq!(hub.members("e1").await.unwrap(), vec![a]);
}

#[tokio::test]
async fn last_leave_collects_the_room() {
    let hub = Hub::spawn();
    let (a, _ra) = connect(&hub, "a").await;
    let (b, _rb) = connect(&hub, "b").await;

    hub.create_room(a, "e1").await.unwrap();
    hub.join_room(b, "e1").await.unwrap();

    assert_eq!(hub.leave_room(a).await.unwrap().as_deref(), Some("e1"));
    // leader gone, room keeps its leader id
    assert_eq!(hub.leader_of("e1").await.unwrap().as_deref(), Some("a"));

    assert_eq!(hub.leave_room(b).await.unwrap().as_deref(), Some("e1"));
    assert_eq!(hub.leader_of("e1").await.unwrap(), None);
    assert_eq!(hub.counts().await.unwrap(), (2, 0));

    let state = hub.client_state(b).await.unwrap().unwrap();
    assert_eq!(state.room, None);
    assert!(!state.is_leader);
    assert_eq!(state.leader_id, None);

    assert_eq!(hub.leave_room(b).await.unwrap(), None);
}

#[tokio::test]
async fn joining_another_room_leaves_the_previous_one() {
    let hub = Hub::spawn();
    let (a, _ra) = connect(&hub, "a").await;
    let (b, mut rb) = connect(&hub, "b").await;
    let (c, _rc) = connect(&hub, "c").await;

    hub.create_room(a, "r1").await.unwrap();
    hub.create_room(c, "r2").await.unwrap();
    hub.join_room(b, "r1").await.unwrap();
    hub.join_room(b, "r2").await.unwrap();

    assert_eq!(hub.members("r1").await.unwrap(), vec![a]);
    assert_eq!(hub.members("r2").await.unwrap().len(), 2);

    hub.broadcast("r1", &start("r1")).await.unwrap();
    assert!(rb.try_recv().is_err());
}

#[tokio::test]
async fn reconnecting_leader_is_recognized_by_user_id() {
    let hub = Hub::spawn();
    let (first, _r1) = connect(&hub, "host").await;
    hub.create_room(first, "e1").await.unwrap();

    let (second, _r2) = connect(&hub, "host").await;
    hub.join_room(second, "e1").await.unwrap();
    let state = hub.client_state(second).await.unwrap().unwrap();
    assert!(state.is_leader);
}

#[tokio::test]
async fn unregister_is_idempotent_and_closes_the_mailbox_once() {
    let hub = Hub::spawn();
    let (a, mut ra) = connect(&hub, "a").await;
    let (b, _rb) = connect(&hub, "b").await;
    hub.create_room(a, "e1").await.unwrap();
    hub.join_room(b, "e1").await.unwrap();

    assert!(hub.unregister(b).await.unwrap());
    assert!(!hub.unregister(b).await.unwrap());
    assert_eq!(hub.members("e1").await.unwrap(), vec![a]);
    assert_eq!(hub.client_state(b).await.unwrap(), None);

    assert!(hub.unregister(a).await.unwrap());
    assert!(ra.recv().await.is_none());
    assert_eq!(hub.counts().await.unwrap(), (0, 0));
}

#[tokio::test]
async fn full_mailbox_drops_instead_of_blocking() {
    let hub = Hub::spawn();
    let (a, mut ra) = connect_with_capacity(&hub, "a", 1).await;
    hub.create_room(a, "e1").await.unwrap();

    assert_eq!(hub.broadcast("e1", &start("e1")).await.unwrap(), 1);
    assert_eq!(hub.broadcast("e1", &start("e1")).await.unwrap(), 0);

    assert!(ra.try_recv().is_ok());
    assert!(ra.try_recv().is_err());
}

#[tokio::test]
async fn room_ops_require_registration() {
    let hub = Hub::spawn();
    let err = hub.create_room(ConnId::new(), "e1").await.unwrap_err();
    assert_eq!(err.client_code().as_str(), "INTERNAL");
}

#[tokio::test]
async fn closed_hub_refuses_work_and_closes_mailboxes() {
    let hub = Hub::spawn();
    let (a, mut ra) = connect(&hub, "a").await;

    hub.close();
    hub.close();
    assert!(hub.is_closed());

    let err = hub.create_room(a, "e1").await.unwrap_err();
    assert_eq!(err.client_code().as_str(), "HUB_CLOSED");
    assert!(hub.counts().await.is_err());

    let closed = tokio::time::timeout(Duration::from_secs(1), ra.recv())
        .await
        .expect("mailbox should close");
    assert!(closed.is_none());
}
