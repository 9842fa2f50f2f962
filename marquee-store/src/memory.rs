use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use marquee_core::{
    Booking, BookingError, BookingStore, BookingTx, PromoCode, SeatChange, SeatMutation,
    SeatRecord, ShowtimeContext,
};

#[derive(Debug, Default, Clone)]
struct MemoryState {
    seats: HashMap<Uuid, SeatRecord>,
    bookings: Vec<Booking>,
    promos: HashMap<Uuid, PromoCode>,
    showtimes: HashMap<Uuid, ShowtimeContext>,
}

/// In-memory store for tests and local runs.
///
/// A transaction takes the whole-state mutex for its duration, so competing
/// transactions serialize exactly like contending row locks would, and
/// rollback restores a snapshot taken at `begin`. This is coarser locking
/// than the Postgres implementation's per-row `FOR UPDATE`; the observable
/// semantics are the same.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_seat(&self, seat: SeatRecord) {
        self.inner.lock().await.seats.insert(seat.seat_id, seat);
    }

    pub async fn seed_promo(&self, promo: PromoCode) {
        self.inner.lock().await.promos.insert(promo.id, promo);
    }

    pub async fn seed_showtime(&self, context: ShowtimeContext) {
        self.inner
            .lock()
            .await
            .showtimes
            .insert(context.showtime_id, context);
    }

    /// Current state of one seat, for test assertions.
    pub async fn seat(&self, seat_id: Uuid) -> Option<SeatRecord> {
        self.inner.lock().await.seats.get(&seat_id).cloned()
    }

    pub async fn promo(&self, promo_id: Uuid) -> Option<PromoCode> {
        self.inner.lock().await.promos.get(&promo_id).cloned()
    }

    pub async fn all_bookings(&self) -> Vec<Booking> {
        self.inner.lock().await.bookings.clone()
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    snapshot: MemoryState,
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn BookingTx>, BookingError> {
        let guard = self.inner.clone().lock_owned().await;
        let snapshot = guard.clone();
        Ok(Box::new(MemoryTx { guard, snapshot }))
    }

    async fn seats(
        &self,
        showtime_id: Uuid,
        seat_ids: &[Uuid],
    ) -> Result<Vec<SeatRecord>, BookingError> {
        let state = self.inner.lock().await;
        collect_seats(&state, showtime_id, seat_ids)
    }

    async fn showtime(
        &self,
        showtime_id: Uuid,
    ) -> Result<Option<ShowtimeContext>, BookingError> {
        Ok(self.inner.lock().await.showtimes.get(&showtime_id).cloned())
    }

    async fn find_promo(&self, code: &str) -> Result<Option<PromoCode>, BookingError> {
        Ok(self
            .inner
            .lock()
            .await
            .promos
            .values()
            .find(|promo| promo.code == code)
            .cloned())
    }

    async fn bookings_for_reference(
        &self,
        reference: &str,
    ) -> Result<Vec<Booking>, BookingError> {
        Ok(self
            .inner
            .lock()
            .await
            .bookings
            .iter()
            .filter(|booking| booking.reference == reference)
            .cloned()
            .collect())
    }
}

fn collect_seats(
    state: &MemoryState,
    showtime_id: Uuid,
    seat_ids: &[Uuid],
) -> Result<Vec<SeatRecord>, BookingError> {
    let mut rows = Vec::with_capacity(seat_ids.len());
    for seat_id in seat_ids {
        match state.seats.get(seat_id) {
            Some(seat) if seat.showtime_id == showtime_id && seat.is_active => {
                rows.push(seat.clone());
            }
            _ => return Err(BookingError::NotFound("seat".to_string())),
        }
    }
    Ok(rows)
}

#[async_trait]
impl BookingTx for MemoryTx {
    async fn lock_seats(
        &mut self,
        showtime_id: Uuid,
        seat_ids: &[Uuid],
    ) -> Result<Vec<SeatRecord>, BookingError> {
        collect_seats(&self.guard, showtime_id, seat_ids)
    }

    async fn lock_seats_held_by(
        &mut self,
        user_id: Uuid,
        seat_ids: &[Uuid],
    ) -> Result<Vec<SeatRecord>, BookingError> {
        Ok(seat_ids
            .iter()
            .filter_map(|seat_id| self.guard.seats.get(seat_id))
            .filter(|seat| seat.held && seat.held_by == Some(user_id))
            .cloned()
            .collect())
    }

    async fn commit_seat_update(
        &mut self,
        mutations: &[SeatMutation],
    ) -> Result<(), BookingError> {
        let mut affected = 0;
        for mutation in mutations {
            if let Some(seat) = self.guard.seats.get_mut(&mutation.seat_id) {
                match &mutation.change {
                    SeatChange::Hold { user_id, until } => {
                        if !seat.vacant {
                            continue;
                        }
                        seat.held = true;
                        seat.held_by = Some(*user_id);
                        seat.held_until = Some(*until);
                    }
                    SeatChange::Release => {
                        seat.held = false;
                        seat.held_by = None;
                        seat.held_until = None;
                    }
                    SeatChange::Book => {
                        if !seat.vacant {
                            continue;
                        }
                        seat.vacant = false;
                        seat.held = false;
                        seat.held_by = None;
                        seat.held_until = None;
                    }
                }
                affected += 1;
            }
        }
        if affected != mutations.len() {
            return Err(BookingError::ConcurrencyViolation {
                expected: mutations.len(),
                affected,
            });
        }
        Ok(())
    }

    async fn insert_bookings(&mut self, rows: &[Booking]) -> Result<(), BookingError> {
        self.guard.bookings.extend_from_slice(rows);
        Ok(())
    }

    async fn redeem_promo(&mut self, promo_id: Uuid) -> Result<Option<i64>, BookingError> {
        match self.guard.promos.get_mut(&promo_id) {
            Some(promo) if promo.is_active && promo.times_used < promo.max_redemptions => {
                promo.times_used += 1;
                Ok(Some(promo.discount_value))
            }
            _ => Ok(None),
        }
    }

    async fn showtime_context(
        &mut self,
        showtime_id: Uuid,
    ) -> Result<Option<ShowtimeContext>, BookingError> {
        Ok(self.guard.showtimes.get(&showtime_id).cloned())
    }

    async fn commit(self: Box<Self>) -> Result<(), BookingError> {
        // Mutations were applied in place; dropping the guard publishes them.
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), BookingError> {
        let mut tx = *self;
        *tx.guard = tx.snapshot;
        Ok(())
    }
}
