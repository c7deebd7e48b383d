mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

use appointment_cell::AppointmentStatus::*;
use notification_cell::{AcknowledgedStore, NotificationError, PollerRegistry, MIN_POLL_INTERVAL};
use common::*;

#[tokio::test(start_paused = true)]
async fn test_first_tick_runs_immediately_and_fresh_is_tracked() {
    let fx = poller_with(
        ScriptedFeed::new(vec![appointment(1, Accepted, 2), appointment(2, Pending, 3)]),
        Duration::from_secs(30),
    );
    let handle = fx.poller.start(RECIPIENT).unwrap();
    let mut updates = handle.subscribe();

    updates.changed().await.unwrap();
    let first = updates.borrow_and_update().clone().unwrap();
    assert_eq!(first.recipient, RECIPIENT);
    assert_eq!(first.unread.len(), 1);
    assert_eq!(first.fresh.len(), 1);

    fx.feed.replace(vec![appointment(1, Accepted, 2), appointment(2, Declined, 3)]);
    updates.changed().await.unwrap();
    let second = updates.borrow_and_update().clone().unwrap();
    assert_eq!(second.unread.len(), 2);
    assert_eq!(second.fresh.len(), 1);
    assert_eq!(second.fresh[0].appointment_id, Uuid::from_u128(2));

    // Ticks never acknowledge on their own.
    assert!(fx.acknowledged.load(RECIPIENT).await.unwrap().is_empty());
    assert_eq!(handle.latest(), Some(second));

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_ticks_are_skipped_while_a_fetch_is_running() {
    let gate = Arc::new(Semaphore::new(0));
    let fx = poller_with(
        ScriptedFeed::new(vec![appointment(1, Accepted, 1)]).gated(gate.clone()),
        Duration::from_secs(1),
    );
    let handle = fx.poller.start(RECIPIENT).unwrap();
    let mut updates = handle.subscribe();

    // Five ticks come due while the first fetch is held.
    sleep(Duration::from_millis(5_500)).await;
    assert_eq!(fx.feed.calls(), 1);

    gate.add_permits(1);
    updates.changed().await.unwrap();
    assert_eq!(fx.feed.calls(), 1, "skipped ticks must not be replayed");

    gate.add_permits(1);
    sleep(Duration::from_secs(1)).await;
    assert_eq!(fx.feed.calls(), 2);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_discards_in_flight_result() {
    let gate = Arc::new(Semaphore::new(0));
    let fx = poller_with(
        ScriptedFeed::new(vec![appointment(1, Completed, 1)]).gated(gate.clone()),
        Duration::from_secs(30),
    );
    let handle = fx.poller.start(RECIPIENT).unwrap();
    let mut updates = handle.subscribe();

    sleep(Duration::from_millis(10)).await;
    assert_eq!(fx.feed.calls(), 1);

    handle.stop().await;
    gate.add_permits(1);
    sleep(Duration::from_secs(120)).await;

    assert_eq!(fx.feed.calls(), 1);
    assert!(updates.borrow().is_none());
    assert!(updates.changed().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_do_not_stop_polling() {
    let fx = poller_with(
        ScriptedFeed::new(vec![appointment(1, Declined, 1)]).failing(2),
        Duration::from_secs(10),
    );
    let handle = fx.poller.start(RECIPIENT).unwrap();
    let mut updates = handle.subscribe();

    updates.changed().await.unwrap();

    assert_eq!(fx.feed.calls(), 3);
    assert!(handle.is_running());
    assert_eq!(updates.borrow().as_ref().unwrap().unread.len(), 1);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_acknowledgement_between_ticks_is_honoured() {
    let fx = poller_with(
        ScriptedFeed::new(vec![appointment(1, Accepted, 1), appointment(2, Cancelled, 2)]),
        Duration::from_secs(5),
    );
    let handle = fx.poller.start(RECIPIENT).unwrap();
    let mut updates = handle.subscribe();

    updates.changed().await.unwrap();
    assert_eq!(updates.borrow_and_update().as_ref().unwrap().unread.len(), 2);

    fx.poller.mark_read(RECIPIENT, &[Uuid::from_u128(2)]).await.unwrap();

    updates.changed().await.unwrap();
    let update = updates.borrow_and_update().clone().unwrap();
    assert_eq!(update.unread.len(), 1);
    assert_eq!(update.unread[0].appointment_id, Uuid::from_u128(1));
    assert!(update.fresh.is_empty());

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_dropping_the_handle_ends_the_loop() {
    let fx = poller_with(ScriptedFeed::new(vec![]), Duration::from_secs(1));
    let handle = fx.poller.start(RECIPIENT).unwrap();

    sleep(Duration::from_millis(10)).await;
    drop(handle);
    sleep(Duration::from_secs(30)).await;

    assert_eq!(fx.feed.calls(), 1);
}

#[tokio::test]
async fn test_mark_all_read_covers_beyond_the_cap() {
    let mut appointments: Vec<_> = (1..=7).map(|n| appointment(n, Accepted, n as i64)).collect();
    appointments.push(appointment(8, Pending, 9));
    let fx = poller_with(ScriptedFeed::new(appointments.clone()), Duration::from_secs(30));

    let set = fx.poller.mark_all_read(RECIPIENT).await.unwrap();
    assert_eq!(set.len(), 7);
    assert!(fx.poller.poll_once(RECIPIENT).await.unwrap().is_empty());

    // The still-pending one was left alone and reports once accepted.
    appointments[7] = appointment(8, Accepted, 9);
    fx.feed.replace(appointments);
    let events = fx.poller.poll_once(RECIPIENT).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].appointment_id, Uuid::from_u128(8));
}

#[tokio::test]
async fn test_blank_recipient_is_rejected() {
    let fx = poller_with(ScriptedFeed::new(vec![]), Duration::from_secs(30));

    assert_matches!(fx.poller.poll_once("  ").await, Err(NotificationError::InvalidRecipient(_)));
    assert_matches!(fx.poller.start(""), Err(NotificationError::InvalidRecipient(_)));
}

#[tokio::test(start_paused = true)]
async fn test_registry_keeps_one_poller_per_recipient() {
    let fx = poller_with(ScriptedFeed::new(vec![appointment(1, Accepted, 1)]), Duration::from_secs(15));
    let registry = PollerRegistry::new(fx.poller.clone());

    assert!(registry.watch(RECIPIENT).await.unwrap());
    assert!(!registry.watch(RECIPIENT).await.unwrap());
    assert!(registry.is_watching(RECIPIENT).await);

    sleep(Duration::from_millis(10)).await;
    let latest = registry.latest(RECIPIENT).await.unwrap();
    assert_eq!(latest.unread.len(), 1);

    assert!(registry.unwatch(RECIPIENT).await);
    assert!(!registry.unwatch(RECIPIENT).await);
    assert!(!registry.is_watching(RECIPIENT).await);

    registry.watch("patient-007").await.unwrap();
    registry.shutdown().await;
    assert!(!registry.is_watching("patient-007").await);
}

#[tokio::test]
async fn test_acknowledgement_follows_the_patient_across_addresses() {
    let fx = poller_with(
        ScriptedFeed::new(vec![appointment(1, Accepted, 1), appointment(2, Declined, 2)]),
        Duration::from_secs(30),
    );

    assert_ok!(fx.poller.mark_read("Jonas.Weber@example.org", &[Uuid::from_u128(1)]).await);

    for recipient in ["jonas.weber@example.org", "JONAS.WEBER@EXAMPLE.ORG", RECIPIENT] {
        let unread = assert_ok!(fx.poller.poll_once(recipient).await);
        assert_eq!(unread.len(), 1, "{} still sees the dismissed event", recipient);
        assert_eq!(unread[0].appointment_id, Uuid::from_u128(2));
    }
    assert!(fx.acknowledged.load(RECIPIENT).await.unwrap().contains(&Uuid::from_u128(1)));

    assert_ok!(fx.poller.mark_all_read(RECIPIENT).await);
    assert!(assert_ok!(fx.poller.poll_once("jonas.weber@example.org").await).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_registry_shares_one_poller_across_addresses() {
    let fx = poller_with(ScriptedFeed::new(vec![appointment(1, Accepted, 1)]), Duration::from_secs(15));
    let registry = PollerRegistry::new(fx.poller.clone());

    assert!(assert_ok!(registry.watch(RECIPIENT).await));
    assert!(!assert_ok!(registry.watch("Jonas.Weber@example.org").await));
    assert!(registry.is_watching("jonas.weber@example.org").await);

    sleep(Duration::from_millis(10)).await;
    let latest = registry.latest("JONAS.WEBER@example.org").await.unwrap();
    assert_eq!(latest.recipient, RECIPIENT);

    assert!(registry.unwatch("jonas.weber@example.org").await);
    assert!(!registry.is_watching(RECIPIENT).await);
    assert_err!(registry.watch("   ").await);
}

#[tokio::test(start_paused = true)]
async fn test_zero_interval_is_raised_to_the_minimum() {
    let fx = poller_with(ScriptedFeed::new(vec![appointment(1, Completed, 1)]), Duration::ZERO);
    assert_eq!(fx.poller.interval(), MIN_POLL_INTERVAL);

    let handle = assert_ok!(fx.poller.start(RECIPIENT));
    let mut updates = handle.subscribe();
    updates.changed().await.unwrap();

    sleep(MIN_POLL_INTERVAL * 3).await;
    assert!(handle.is_running());
    assert!(fx.feed.calls() >= 3);

    handle.stop().await;
}
