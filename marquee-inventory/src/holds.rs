use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use marquee_core::{BookingError, BookingStore, SeatChange, SeatMutation, SeatRecord};

/// Fixed hold lease, five minutes from placement (not sliding).
pub const DEFAULT_HOLD_TTL_SECONDS: u64 = 300;

/// Result of a successful `place_holds`.
#[derive(Debug, Clone)]
pub struct HoldOutcome {
    pub held_seat_ids: Vec<Uuid>,
    pub expires_at: DateTime<Utc>,
}

/// Confirm that every row carries a live hold owned by `user_id`. Shared by
/// the standalone validation call and the finalizer, which re-checks inside
/// its own transaction.
pub fn check_holds(
    rows: &[SeatRecord],
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<(), BookingError> {
    let stale: Vec<String> = rows
        .iter()
        .filter(|seat| !seat.held_for(user_id, now))
        .map(|seat| seat.label())
        .collect();
    if stale.is_empty() {
        Ok(())
    } else {
        Err(BookingError::HoldExpiredOrTaken(stale))
    }
}

/// Turns a user's seat selection into time-bounded holds and validates or
/// releases them later. All mutation happens under batch row locks so two
/// callers contending for overlapping seats cannot both succeed.
#[derive(Clone)]
pub struct HoldManager {
    store: Arc<dyn BookingStore>,
    ttl: Duration,
}

impl HoldManager {
    pub fn new(store: Arc<dyn BookingStore>, ttl_seconds: u64) -> Self {
        Self {
            store,
            ttl: Duration::seconds(ttl_seconds as i64),
        }
    }

    /// Place holds on all requested seats, or none of them.
    ///
    /// A seat is available to hold iff it is unsold and either unheld, held
    /// by this same user (idempotent re-hold, TTL not extended), or carrying
    /// an expired hold. If any seat fails the test the whole operation rolls
    /// back and the offending labels are reported.
    pub async fn place_holds(
        &self,
        user_id: Uuid,
        showtime_id: Uuid,
        seat_ids: &[Uuid],
    ) -> Result<HoldOutcome, BookingError> {
        if seat_ids.is_empty() {
            return Err(BookingError::NoTicketsSelected);
        }

        // Stable lock order across callers; duplicate ids collapse to one.
        let mut seat_ids: Vec<Uuid> = seat_ids.to_vec();
        seat_ids.sort_unstable();
        seat_ids.dedup();

        let mut tx = self.store.begin().await?;
        let rows = match tx.lock_seats(showtime_id, &seat_ids).await {
            Ok(rows) => rows,
            Err(err) => {
                tx.rollback().await?;
                return Err(err);
            }
        };

        let now = Utc::now();
        let unavailable: Vec<String> = rows
            .iter()
            .filter(|seat| !seat.available_to(user_id, now))
            .map(|seat| seat.label())
            .collect();
        if !unavailable.is_empty() {
            tx.rollback().await?;
            debug!(%user_id, %showtime_id, ?unavailable, "seats unavailable");
            return Err(BookingError::SeatsUnavailable(unavailable));
        }

        let expires_at = now + self.ttl;
        // The batch expires when its earliest lease does.
        let mut batch_expiry = expires_at;
        let mutations: Vec<SeatMutation> = rows
            .iter()
            .map(|seat| {
                // Re-holding a seat the user already holds keeps the original
                // expiry; the five-minute window is fixed at first placement.
                let until = if seat.hold_active(now) && seat.held_by == Some(user_id) {
                    seat.held_until.unwrap_or(expires_at)
                } else {
                    expires_at
                };
                batch_expiry = batch_expiry.min(until);
                SeatMutation {
                    seat_id: seat.seat_id,
                    change: SeatChange::Hold { user_id, until },
                }
            })
            .collect();

        if mutations.is_empty() {
            tx.rollback().await?;
            return Err(BookingError::NoTicketsSelected);
        }

        if let Err(err) = tx.commit_seat_update(&mutations).await {
            tx.rollback().await?;
            return Err(err);
        }
        tx.commit().await?;

        info!(%user_id, %showtime_id, seats = mutations.len(), "holds placed");
        Ok(HoldOutcome {
            held_seat_ids: rows.iter().map(|seat| seat.seat_id).collect(),
            expires_at: batch_expiry,
        })
    }

    /// Re-lock the seats and confirm every hold is still owned and
    /// unexpired. Used immediately before finalizing payment.
    pub async fn validate_holds(
        &self,
        user_id: Uuid,
        showtime_id: Uuid,
        seat_ids: &[Uuid],
    ) -> Result<(), BookingError> {
        let mut tx = self.store.begin().await?;
        let outcome = match tx.lock_seats(showtime_id, seat_ids).await {
            Ok(rows) => check_holds(&rows, user_id, Utc::now()),
            Err(err) => Err(err),
        };
        tx.rollback().await?;
        outcome
    }

    /// Clear the hold triple on every listed seat currently held by
    /// `user_id`. Seats not held by the user (or unknown) are per-seat
    /// no-ops, so the call is idempotent. Used on error paths to free seats
    /// without waiting for TTL expiry.
    pub async fn release_holds(
        &self,
        user_id: Uuid,
        seat_ids: &[Uuid],
    ) -> Result<usize, BookingError> {
        if seat_ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self.store.begin().await?;
        let rows = match tx.lock_seats_held_by(user_id, seat_ids).await {
            Ok(rows) => rows,
            Err(err) => {
                tx.rollback().await?;
                return Err(err);
            }
        };
        if rows.is_empty() {
            tx.rollback().await?;
            return Ok(0);
        }

        let mutations: Vec<SeatMutation> = rows
            .iter()
            .map(|seat| SeatMutation {
                seat_id: seat.seat_id,
                change: SeatChange::Release,
            })
            .collect();
        if let Err(err) = tx.commit_seat_update(&mutations).await {
            tx.rollback().await?;
            return Err(err);
        }
        tx.commit().await?;

        info!(%user_id, released = mutations.len(), "holds released");
        Ok(mutations.len())
    }
}
