//! Unit tests for `WsManager`.
//!
//! These exercise the connection manager directly, without HTTP upgrades:
//! add/remove bookkeeping, broadcast, owner-scoped delivery and shutdown.

use assert_matches::assert_matches;
use axum::extract::ws::Message;
use pausedej_api::ws::manager::WsIdentity;
use pausedej_api::ws::WsManager;

fn customer(user_id: i64) -> Option<WsIdentity> {
    Some(WsIdentity {
        user_id,
        is_admin: false,
    })
}

// ---------------------------------------------------------------------------
// Test: add() and remove() keep the count in step
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_and_remove_track_connection_count() {
    let manager = WsManager::new();
    assert_eq!(manager.connection_count().await, 0);

    let _rx1 = manager.add("conn-1".to_string(), None).await;
    let _rx2 = manager.add("conn-2".to_string(), customer(3)).await;
    assert_eq!(manager.connection_count().await, 2);

    manager.remove("conn-1").await;
    manager.remove("unknown").await;
    assert_eq!(manager.connection_count().await, 1);
}

// ---------------------------------------------------------------------------
// Test: broadcast() reaches anonymous and signed-in clients alike
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broadcast_sends_to_all_connections() {
    let manager = WsManager::new();

    let mut anonymous = manager.add("anon".to_string(), None).await;
    let mut signed_in = manager.add("user".to_string(), customer(8)).await;

    manager.broadcast(Message::Text("menu updated".into())).await;

    let msg1 = anonymous.recv().await.expect("anonymous should receive broadcast");
    let msg2 = signed_in.recv().await.expect("customer should receive broadcast");
    assert!(matches!(&msg1, Message::Text(t) if *t == "menu updated"));
    assert!(matches!(&msg2, Message::Text(t) if *t == "menu updated"));
}

// ---------------------------------------------------------------------------
// Test: broadcast() skips closed channels without panicking
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broadcast_skips_closed_channels() {
    let manager = WsManager::new();

    let rx1 = manager.add("conn-1".to_string(), None).await;
    let mut rx2 = manager.add("conn-2".to_string(), None).await;
    drop(rx1);

    manager.broadcast(Message::Text("still alive".into())).await;

    let msg = rx2.recv().await.expect("rx2 should still receive");
    assert!(matches!(&msg, Message::Text(t) if *t == "still alive"));
}

// ---------------------------------------------------------------------------
// Test: send_to_owner() reaches the owner's tabs and admins only
// ---------------------------------------------------------------------------

#[tokio::test]
async fn send_to_owner_targets_owner_and_admins() {
    let manager = WsManager::new();

    let mut tab1 = manager.add("tab-1".to_string(), customer(42)).await;
    let mut tab2 = manager.add("tab-2".to_string(), customer(42)).await;
    let mut stranger = manager.add("stranger".to_string(), customer(7)).await;
    let mut anonymous = manager.add("anon".to_string(), None).await;
    let mut admin = manager
        .add(
            "admin".to_string(),
            Some(WsIdentity {
                user_id: 1,
                is_admin: true,
            }),
        )
        .await;

    let sent = manager
        .send_to_owner(42, Message::Text("order 9 ready".into()))
        .await;

    assert_eq!(sent, 3);
    assert!(tab1.try_recv().is_ok());
    assert!(tab2.try_recv().is_ok());
    assert!(admin.try_recv().is_ok());
    assert!(stranger.try_recv().is_err());
    assert!(anonymous.try_recv().is_err());
}

// ---------------------------------------------------------------------------
// Test: shutdown_all() sends Close and clears all connections
// ---------------------------------------------------------------------------

#[tokio::test]
async fn shutdown_all_sends_close_and_clears() {
    let manager = WsManager::new();

    let mut rx1 = manager.add("conn-1".to_string(), None).await;
    let mut rx2 = manager.add("conn-2".to_string(), customer(2)).await;

    manager.shutdown_all().await;

    assert_eq!(manager.connection_count().await, 0);
    let msg1 = rx1.recv().await.expect("rx1 should receive Close");
    assert_matches!(msg1, Message::Close(None));
    let msg2 = rx2.recv().await.expect("rx2 should receive Close");
    assert_matches!(msg2, Message::Close(None));

    // The sender was dropped with the map.
    assert!(rx1.recv().await.is_none());
}

// ---------------------------------------------------------------------------
// Test: ping_all() sends a Ping frame
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ping_all_sends_ping() {
    let manager = WsManager::new();
    let mut rx = manager.add("conn-1".to_string(), None).await;

    manager.ping_all().await;

    let msg = rx.recv().await.expect("should receive Ping");
    assert_matches!(msg, Message::Ping(_));
}
