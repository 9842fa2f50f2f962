use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use marquee_core::{
    Booking, BookingError, BookingSession, BookingStore, BookingTx, SeatChange, SeatMutation,
};
use marquee_inventory::{check_holds, HoldManager};
use marquee_shared::{booking_reference, split_discount};

use crate::promo::PromoLedger;

/// Lifecycle of one purchase attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseStage {
    Selecting,
    Held,
    Validating,
    Committing,
    Booked,
    Failed,
}

impl PurchaseStage {
    /// Legal forward transitions; both terminal failure and success can be
    /// reached from any in-flight stage.
    pub fn can_transition(self, to: PurchaseStage) -> bool {
        use PurchaseStage::*;
        matches!(
            (self, to),
            (Selecting, Held)
                | (Held, Validating)
                | (Validating, Committing)
                | (Committing, Booked)
                | (Held, Failed)
                | (Validating, Failed)
                | (Committing, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PurchaseStage::Booked | PurchaseStage::Failed)
    }
}

/// Everything the finalizer needs to commit one checkout. Money never comes
/// from the request: seat prices are read from the locked rows and the promo
/// discount from the promo row, so `promo` contributes only its id and code.
#[derive(Debug, Clone)]
pub struct FinalizeRequest {
    pub user_id: Uuid,
    pub showtime_id: Uuid,
    pub held_seat_ids: Vec<Uuid>,
    pub payment_method: String,
    pub promo: Option<marquee_core::AppliedPromo>,
}

impl FinalizeRequest {
    pub fn from_session(session: &BookingSession, payment_method: String) -> Self {
        Self {
            user_id: session.user_id,
            showtime_id: session.showtime_id,
            held_seat_ids: session.held_seat_ids.clone(),
            payment_method,
            promo: session.promo.clone(),
        }
    }
}

/// Converts a valid hold set into permanent bookings: re-validates holds,
/// redeems the promo, inserts booking rows, and flips seats to booked, all
/// in one transaction that succeeds or fails together.
#[derive(Clone)]
pub struct BookingFinalizer {
    store: Arc<dyn BookingStore>,
    holds: HoldManager,
    promos: PromoLedger,
}

impl BookingFinalizer {
    pub fn new(store: Arc<dyn BookingStore>, holds: HoldManager, promos: PromoLedger) -> Self {
        Self {
            store,
            holds,
            promos,
        }
    }

    /// Commit the purchase and return the booking reference.
    ///
    /// Any failure rolls the transaction back in full (booking rows, seat
    /// flips, and promo redemption together) and then releases the caller's
    /// holds best-effort; a failed release is logged, not escalated, since
    /// the hold still self-expires.
    pub async fn finalize(&self, req: FinalizeRequest) -> Result<String, BookingError> {
        if req.held_seat_ids.is_empty() {
            return Err(BookingError::NoTicketsSelected);
        }

        let mut stage = PurchaseStage::Held;
        let mut tx = self.store.begin().await?;

        stage = self.advance(stage, PurchaseStage::Validating);
        let rows = match tx.lock_seats(req.showtime_id, &req.held_seat_ids).await {
            Ok(rows) => rows,
            Err(err) => return Err(self.abort(tx, &req, err).await),
        };

        let now = Utc::now();
        if let Err(err) = check_holds(&rows, req.user_id, now) {
            return Err(self.abort(tx, &req, err).await);
        }

        // The showtime, venue, and city must all still be live; any of them
        // can be deactivated between selection and payment.
        match tx.showtime_context(req.showtime_id).await {
            Ok(Some(ctx)) => {
                if let Some(entity) = ctx.inactive_entity() {
                    let err = BookingError::NotFound(entity.to_string());
                    return Err(self.abort(tx, &req, err).await);
                }
            }
            Ok(None) => {
                let err = BookingError::NotFound("showtime".to_string());
                return Err(self.abort(tx, &req, err).await);
            }
            Err(err) => return Err(self.abort(tx, &req, err).await),
        }

        let subtotal: i64 = rows.iter().map(|seat| seat.price).sum();
        if subtotal <= 0 {
            return Err(self.abort(tx, &req, BookingError::ZeroTotal).await);
        }

        // The discount is recomputed from the promo row inside this
        // transaction; the session's previewed number is never charged.
        let discount = match &req.promo {
            Some(promo) => match self.promos.redeem(&mut *tx, promo, subtotal).await {
                Ok(discount) => discount,
                Err(err) => return Err(self.abort(tx, &req, err).await),
            },
            None => 0,
        };

        stage = self.advance(stage, PurchaseStage::Committing);
        let reference = booking_reference(req.user_id);
        let share = split_discount(discount, rows.len());
        let bookings: Vec<Booking> = rows
            .iter()
            .map(|seat| {
                Booking::new(
                    reference.clone(),
                    seat.seat_id,
                    seat.showtime_id,
                    req.user_id,
                    seat.price,
                    share,
                    req.payment_method.clone(),
                )
            })
            .collect();
        if let Err(err) = tx.insert_bookings(&bookings).await {
            return Err(self.abort(tx, &req, err).await);
        }

        let mutations: Vec<SeatMutation> = rows
            .iter()
            .map(|seat| SeatMutation {
                seat_id: seat.seat_id,
                change: SeatChange::Book,
            })
            .collect();
        if let Err(err) = tx.commit_seat_update(&mutations).await {
            return Err(self.abort(tx, &req, err).await);
        }

        if let Err(err) = tx.commit().await {
            self.release_best_effort(&req).await;
            return Err(err);
        }

        stage = self.advance(stage, PurchaseStage::Booked);
        debug_assert!(stage.is_terminal());
        info!(
            %req.user_id,
            %req.showtime_id,
            reference = %reference,
            seats = bookings.len(),
            discount,
            "booking committed"
        );
        Ok(reference)
    }

    fn advance(&self, from: PurchaseStage, to: PurchaseStage) -> PurchaseStage {
        debug_assert!(from.can_transition(to), "{:?} -> {:?}", from, to);
        debug!(?from, ?to, "purchase stage");
        to
    }

    /// Roll back the transaction, release the caller's holds best-effort,
    /// and hand the original error back.
    async fn abort(
        &self,
        tx: Box<dyn BookingTx>,
        req: &FinalizeRequest,
        err: BookingError,
    ) -> BookingError {
        if let Err(rollback_err) = tx.rollback().await {
            warn!(error = %rollback_err, "rollback failed during checkout abort");
        }
        self.release_best_effort(req).await;
        debug!(?err, "checkout failed");
        err
    }

    async fn release_best_effort(&self, req: &FinalizeRequest) {
        if let Err(release_err) = self
            .holds
            .release_holds(req.user_id, &req.held_seat_ids)
            .await
        {
            warn!(
                %req.user_id,
                error = %release_err,
                "failed to release holds after aborted checkout; holds will self-expire"
            );
        }
    }
}
