use async_trait::async_trait;
use uuid::Uuid;

use crate::booking::Booking;
use crate::error::BookingError;
use crate::promo::PromoCode;
use crate::seat::{SeatMutation, SeatRecord};
use crate::showtime::ShowtimeContext;

/// Storage behind the booking core.
///
/// Cross-request coordination happens entirely through the transaction and
/// row-locking exposed here, never through in-process synchronization, so
/// the core stays correct across multiple server processes. Two
/// implementations are provided: Postgres (row-level `FOR UPDATE` locks)
/// and in-memory (tokio-mutex serialized) for tests.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Open one transaction. Every mutating core operation runs inside
    /// exactly one; any failure inside it triggers a full rollback.
    async fn begin(&self) -> Result<Box<dyn BookingTx>, BookingError>;

    /// Plain (non-locking) seat snapshot, for server-side subtotal
    /// recomputation at the prepare step.
    async fn seats(
        &self,
        showtime_id: Uuid,
        seat_ids: &[Uuid],
    ) -> Result<Vec<SeatRecord>, BookingError>;

    async fn showtime(&self, showtime_id: Uuid)
        -> Result<Option<ShowtimeContext>, BookingError>;

    async fn find_promo(&self, code: &str) -> Result<Option<PromoCode>, BookingError>;

    /// All seat rows committed under one booking reference.
    async fn bookings_for_reference(
        &self,
        reference: &str,
    ) -> Result<Vec<Booking>, BookingError>;
}

/// One storage transaction. Locks acquired here are scoped to this
/// transaction and released on commit/rollback; no lock is ever held across
/// a network round-trip to the user (holds are expressed as data on the
/// seat rows instead).
#[async_trait]
pub trait BookingTx: Send {
    /// Acquire exclusive row locks on exactly the given seats, scoped to the
    /// showtime, returning their current status. All-or-nothing: if any id
    /// does not exist or is inactive for that showtime, fails with
    /// `NotFound` and acquires no locks.
    async fn lock_seats(
        &mut self,
        showtime_id: Uuid,
        seat_ids: &[Uuid],
    ) -> Result<Vec<SeatRecord>, BookingError>;

    /// Lenient lock for release paths: locks and returns only the rows
    /// currently held by `user_id`. Ids that are unknown or not held by the
    /// user are simply absent from the result.
    async fn lock_seats_held_by(
        &mut self,
        user_id: Uuid,
        seat_ids: &[Uuid],
    ) -> Result<Vec<SeatRecord>, BookingError>;

    /// Apply status mutations to previously locked rows. Fails with
    /// `ConcurrencyViolation` if the affected-row count differs from the
    /// mutation count — cannot happen under correct locking, checked
    /// regardless.
    async fn commit_seat_update(
        &mut self,
        mutations: &[SeatMutation],
    ) -> Result<(), BookingError>;

    async fn insert_bookings(&mut self, rows: &[Booking]) -> Result<(), BookingError>;

    /// Consume one redemption unit iff `times_used < max_redemptions`,
    /// returning the stored discount value so the caller prices from the
    /// row, never from request data. `None` means the cap was reached
    /// concurrently; the caller must then abort the entire booking
    /// transaction.
    async fn redeem_promo(&mut self, promo_id: Uuid) -> Result<Option<i64>, BookingError>;

    /// Activity flags for the showtime and its venue/city, read within this
    /// transaction.
    async fn showtime_context(
        &mut self,
        showtime_id: Uuid,
    ) -> Result<Option<ShowtimeContext>, BookingError>;

    async fn commit(self: Box<Self>) -> Result<(), BookingError>;

    async fn rollback(self: Box<Self>) -> Result<(), BookingError>;
}
