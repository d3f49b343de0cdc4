//! Mount-time reconciliation of the local cart with the server's.

#![allow(clippy::unwrap_used)]

use std::num::NonZeroU32;
use std::sync::Arc;

use foody_client::api::ApiError;
use foody_client::{CartError, CartStore, MemoryStorage, MountOutcome, SharedStorage};
use foody_core::{CartLineId, MenuId};
use foody_integration_tests::{Call, FakeRemote, cart_sync, menu, remote_cart};
use tokio_util::sync::CancellationToken;

fn memory() -> SharedStorage {
    Arc::new(MemoryStorage::new())
}

#[tokio::test]
async fn test_remote_cart_adopted_when_ids_differ() {
    let storage = memory();
    let remote = FakeRemote::guest();
    let (mut sync, _) = cart_sync(remote.clone(), Arc::clone(&storage));
    sync.add(menu(1, 10), NonZeroU32::MIN).await.unwrap();

    // Logging in elsewhere: the server holds a different cart.
    let server = remote_cart(&[(11, 5, 10, 2), (12, 6, 20, 1)]);
    let remote = FakeRemote::with_cart(server);
    let (mut sync, _) = cart_sync(remote.clone(), Arc::clone(&storage));

    let outcome = sync.on_mount(&CancellationToken::new()).await.unwrap();
    assert_eq!(outcome, MountOutcome::Adopted);
    assert_eq!(sync.state().menu_ids(), vec![MenuId::new(5), MenuId::new(6)]);
    assert_eq!(sync.lines()[0].remote_line_id, Some(CartLineId::new(11)));
    assert_eq!(sync.lines()[0].quantity.get(), 2);

    // The adoption was persisted.
    let reloaded = CartStore::load(storage);
    assert_eq!(reloaded.state(), sync.state());
    assert_eq!(remote.calls(), vec![Call::Fetch]);
}

#[tokio::test]
async fn test_quantity_difference_keeps_local() {
    let remote = FakeRemote::with_cart(remote_cart(&[(11, 1, 10, 7)]));
    let (mut sync, _) = cart_sync(remote.clone(), memory());

    // Seed a local line for the same menu without touching the network.
    remote.set_authenticated(false);
    sync.add(menu(1, 10), NonZeroU32::new(2).unwrap()).await.unwrap();
    remote.set_authenticated(true);

    let outcome = sync.on_mount(&CancellationToken::new()).await.unwrap();
    assert_eq!(outcome, MountOutcome::Kept);
    assert_eq!(sync.lines()[0].quantity.get(), 2);
}

#[tokio::test]
async fn test_empty_remote_keeps_local() {
    let remote = FakeRemote::logged_in();
    let (mut sync, _) = cart_sync(remote.clone(), memory());

    remote.set_authenticated(false);
    sync.add(menu(3, 10), NonZeroU32::MIN).await.unwrap();
    remote.set_authenticated(true);

    let outcome = sync.on_mount(&CancellationToken::new()).await.unwrap();
    assert_eq!(outcome, MountOutcome::Kept);
    assert_eq!(sync.state().menu_ids(), vec![MenuId::new(3)]);
}

#[tokio::test]
async fn test_second_mount_uses_cached_snapshot() {
    let remote = FakeRemote::with_cart(remote_cart(&[(11, 5, 10, 1)]));
    let (mut sync, _) = cart_sync(remote.clone(), memory());

    sync.on_mount(&CancellationToken::new()).await.unwrap();
    let outcome = sync.on_mount(&CancellationToken::new()).await.unwrap();

    assert_eq!(outcome, MountOutcome::Kept);
    assert_eq!(remote.calls(), vec![Call::Fetch]);
}

#[tokio::test]
async fn test_cancelled_mount_leaves_cart_alone() {
    let remote = FakeRemote::with_cart(remote_cart(&[(11, 5, 10, 1)]));
    let (mut sync, _) = cart_sync(remote.clone(), memory());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let outcome = sync.on_mount(&cancel).await.unwrap();

    assert_eq!(outcome, MountOutcome::Cancelled);
    assert!(sync.state().is_empty());
    assert!(sync.cache().cart().await.is_none());
}

#[tokio::test]
async fn test_mount_cancelled_during_fetch_drops_response() {
    let remote = FakeRemote::with_cart(remote_cart(&[(11, 5, 10, 2)]));
    let (mut sync, _) = cart_sync(remote.clone(), memory());

    remote.set_authenticated(false);
    sync.add(menu(1, 10), NonZeroU32::MIN).await.unwrap();
    remote.set_authenticated(true);
    let before = sync.state().clone();

    let gate = remote.hold_next_fetch();
    let cancel = CancellationToken::new();
    let superseded = async {
        while !remote.calls().contains(&Call::Fetch) {
            tokio::task::yield_now().await;
        }
        cancel.cancel();
        gate.notify_one();
    };
    let (outcome, ()) = tokio::join!(sync.on_mount(&cancel), superseded);

    assert_eq!(outcome.unwrap(), MountOutcome::Cancelled);
    assert_eq!(sync.state(), &before);
    assert!(sync.cache().cart().await.is_none());
    assert_eq!(remote.calls(), vec![Call::Fetch]);
}

#[tokio::test]
async fn test_unauthorized_fetch_asks_for_login() {
    let remote = FakeRemote::with_cart(remote_cart(&[(11, 5, 10, 1)]));
    let (mut sync, toasts) = cart_sync(remote.clone(), memory());

    remote.set_authenticated(false);
    sync.add(menu(1, 10), NonZeroU32::MIN).await.unwrap();
    remote.set_authenticated(true);

    remote.fail_next_with(ApiError::Unauthorized("Access token required".to_string()));
    let result = sync.on_mount(&CancellationToken::new()).await;

    assert!(matches!(result, Err(CartError::LoginRequired)));
    assert_eq!(sync.state().menu_ids(), vec![MenuId::new(1)]);
    // Only the add toast; a failed fetch is not a toast.
    assert_eq!(toasts.all().len(), 1);
}

#[tokio::test]
async fn test_view_prefers_populated_snapshot() {
    let remote = FakeRemote::with_cart(remote_cart(&[(11, 5, 10, 3)]));
    let (mut sync, _) = cart_sync(remote, memory());
    sync.on_mount(&CancellationToken::new()).await.unwrap();

    let view = sync.view().await;
    assert_eq!(view.groups.len(), 1);
    assert_eq!(view.summary.total_items, 3);
}
