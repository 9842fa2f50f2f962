use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use marquee_core::{BookingError, BookingStore, SeatRecord};
use marquee_inventory::HoldManager;
use marquee_store::MemoryStore;

const TTL_SECONDS: u64 = 300;

fn seat(showtime_id: Uuid, row: &str, column: i32) -> SeatRecord {
    SeatRecord {
        seat_id: Uuid::new_v4(),
        showtime_id,
        row: row.into(),
        column,
        location: "Stalls".into(),
        seat_type: "Standard".into(),
        price: 20000,
        is_active: true,
        vacant: true,
        held: false,
        held_by: None,
        held_until: None,
    }
}

async fn setup(seat_count: i32) -> (MemoryStore, HoldManager, Uuid, Vec<Uuid>) {
    let store = MemoryStore::new();
    let showtime = Uuid::new_v4();
    let mut seat_ids = Vec::new();
    for column in 1..=seat_count {
        let s = seat(showtime, "A", column);
        seat_ids.push(s.seat_id);
        store.seed_seat(s).await;
    }
    let manager = HoldManager::new(
        Arc::new(store.clone()) as Arc<dyn BookingStore>,
        TTL_SECONDS,
    );
    (store, manager, showtime, seat_ids)
}

#[tokio::test]
async fn test_place_holds_marks_all_seats() {
    let (store, manager, showtime, seat_ids) = setup(2).await;
    let user = Uuid::new_v4();

    let outcome = manager.place_holds(user, showtime, &seat_ids).await.unwrap();
    assert_eq!(outcome.held_seat_ids.len(), 2);
    assert!(outcome.expires_at > Utc::now());

    for seat_id in &seat_ids {
        let s = store.seat(*seat_id).await.unwrap();
        assert!(s.held);
        assert_eq!(s.held_by, Some(user));
        assert_eq!(s.held_until, Some(outcome.expires_at));
        assert!(s.vacant);
    }
}

#[tokio::test]
async fn test_overlapping_hold_reports_labels_and_places_nothing() {
    let (store, manager, showtime, seat_ids) = setup(3).await;
    let user_a = Uuid::new_v4();
    let user_b = Uuid::new_v4();

    manager
        .place_holds(user_a, showtime, &seat_ids[..2])
        .await
        .unwrap();

    // B wants A2 (taken) and A3 (free): the whole request fails and A3
    // stays unheld.
    let err = manager
        .place_holds(user_b, showtime, &[seat_ids[1], seat_ids[2]])
        .await
        .unwrap_err();
    match err {
        BookingError::SeatsUnavailable(labels) => assert_eq!(labels, vec!["A2".to_string()]),
        other => panic!("expected SeatsUnavailable, got {other:?}"),
    }

    let free = store.seat(seat_ids[2]).await.unwrap();
    assert!(!free.held);
}

#[tokio::test]
async fn test_expired_hold_is_reclaimed() {
    let (store, manager, showtime, seat_ids) = setup(1).await;
    let user_a = Uuid::new_v4();
    let user_b = Uuid::new_v4();

    let mut stale = store.seat(seat_ids[0]).await.unwrap();
    stale.held = true;
    stale.held_by = Some(user_a);
    stale.held_until = Some(Utc::now() - Duration::seconds(1));
    store.seed_seat(stale).await;

    // The row flags still show held=true for A, but the lease has lapsed.
    manager.place_holds(user_b, showtime, &seat_ids).await.unwrap();
    let s = store.seat(seat_ids[0]).await.unwrap();
    assert_eq!(s.held_by, Some(user_b));
}

#[tokio::test]
async fn test_rehold_does_not_extend_ttl() {
    let (store, manager, showtime, seat_ids) = setup(1).await;
    let user = Uuid::new_v4();

    let first = manager.place_holds(user, showtime, &seat_ids).await.unwrap();
    let original_until = store.seat(seat_ids[0]).await.unwrap().held_until;

    // Selecting the same seats again within the window succeeds but keeps
    // the original expiry.
    let second = manager.place_holds(user, showtime, &seat_ids).await.unwrap();
    assert_eq!(first.held_seat_ids, second.held_seat_ids);
    assert_eq!(store.seat(seat_ids[0]).await.unwrap().held_until, original_until);
}

#[tokio::test]
async fn test_empty_selection_rejected() {
    let (_store, manager, showtime, _seat_ids) = setup(1).await;
    let err = manager
        .place_holds(Uuid::new_v4(), showtime, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::NoTicketsSelected));
}

#[tokio::test]
async fn test_unknown_seat_fails_whole_batch() {
    let (store, manager, showtime, seat_ids) = setup(1).await;
    let user = Uuid::new_v4();

    let err = manager
        .place_holds(user, showtime, &[seat_ids[0], Uuid::new_v4()])
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::NotFound(_)));
    assert!(!store.seat(seat_ids[0]).await.unwrap().held);
}

#[tokio::test]
async fn test_validate_holds_passes_while_live() {
    let (_store, manager, showtime, seat_ids) = setup(2).await;
    let user = Uuid::new_v4();

    manager.place_holds(user, showtime, &seat_ids).await.unwrap();
    manager
        .validate_holds(user, showtime, &seat_ids)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_validate_holds_flags_expired_seat() {
    let (store, manager, showtime, seat_ids) = setup(2).await;
    let user = Uuid::new_v4();

    manager.place_holds(user, showtime, &seat_ids).await.unwrap();

    let mut expired = store.seat(seat_ids[1]).await.unwrap();
    expired.held_until = Some(Utc::now() - Duration::seconds(1));
    store.seed_seat(expired).await;

    let err = manager
        .validate_holds(user, showtime, &seat_ids)
        .await
        .unwrap_err();
    match err {
        BookingError::HoldExpiredOrTaken(labels) => {
            assert_eq!(labels, vec!["A2".to_string()]);
        }
        other => panic!("expected HoldExpiredOrTaken, got {other:?}"),
    }
}

#[tokio::test]
async fn test_validate_holds_flags_foreign_hold() {
    let (_store, manager, showtime, seat_ids) = setup(1).await;
    let user_a = Uuid::new_v4();
    let user_b = Uuid::new_v4();

    manager.place_holds(user_a, showtime, &seat_ids).await.unwrap();
    let err = manager
        .validate_holds(user_b, showtime, &seat_ids)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::HoldExpiredOrTaken(_)));
}

#[tokio::test]
async fn test_release_is_idempotent() {
    let (store, manager, showtime, seat_ids) = setup(2).await;
    let user = Uuid::new_v4();

    manager.place_holds(user, showtime, &seat_ids).await.unwrap();

    assert_eq!(manager.release_holds(user, &seat_ids).await.unwrap(), 2);
    // Second call finds nothing to clear and is not an error.
    assert_eq!(manager.release_holds(user, &seat_ids).await.unwrap(), 0);

    for seat_id in &seat_ids {
        let s = store.seat(*seat_id).await.unwrap();
        assert!(!s.held);
        assert_eq!(s.held_by, None);
        assert_eq!(s.held_until, None);
        assert!(s.vacant);
    }
}

#[tokio::test]
async fn test_release_ignores_other_users_holds() {
    let (store, manager, showtime, seat_ids) = setup(2).await;
    let user_a = Uuid::new_v4();
    let user_b = Uuid::new_v4();

    manager
        .place_holds(user_a, showtime, &seat_ids[..1])
        .await
        .unwrap();
    manager
        .place_holds(user_b, showtime, &seat_ids[1..])
        .await
        .unwrap();

    // A releasing both ids only clears A's own hold.
    assert_eq!(manager.release_holds(user_a, &seat_ids).await.unwrap(), 1);
    assert_eq!(
        store.seat(seat_ids[1]).await.unwrap().held_by,
        Some(user_b)
    );
}

#[tokio::test]
async fn test_contending_holds_admit_exactly_one_user() {
    let (store, manager, showtime, seat_ids) = setup(1).await;
    let user_a = Uuid::new_v4();
    let user_b = Uuid::new_v4();

    let (a, b) = tokio::join!(
        manager.place_holds(user_a, showtime, &seat_ids),
        manager.place_holds(user_b, showtime, &seat_ids),
    );
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);

    let winner = if a.is_ok() { user_a } else { user_b };
    assert_eq!(store.seat(seat_ids[0]).await.unwrap().held_by, Some(winner));
}
