use axum::{
    extract::{Json, State},
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use marquee_core::{BookingError, BookingSession, SeatSelection};
use marquee_order::FinalizeRequest;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/checkout/seats", post(select_seats))
        .route("/v1/checkout/prepare", post(prepare_payment))
        .route("/v1/checkout/promo", post(apply_promo))
        .route("/v1/checkout/pay", post(finalize_payment))
}

#[derive(Debug, Deserialize)]
pub struct SelectSeatsRequest {
    pub user_id: Uuid,
    pub showtime_id: Uuid,
    pub event_id: Uuid,
    pub seat_selections: Vec<SeatSelection>,
}

#[derive(Debug, Serialize)]
pub struct SelectSeatsResponse {
    pub session: BookingSession,
}

/// Step one: place holds on the chosen seats and open a booking session.
pub async fn select_seats(
    State(state): State<AppState>,
    Json(req): Json<SelectSeatsRequest>,
) -> Result<Json<SelectSeatsResponse>, AppError> {
    let context = state
        .store
        .showtime(req.showtime_id)
        .await?
        .ok_or_else(|| BookingError::NotFound("showtime".to_string()))?;
    if let Some(entity) = context.inactive_entity() {
        return Err(BookingError::NotFound(entity.to_string()).into());
    }

    let seat_ids: Vec<Uuid> = req.seat_selections.iter().map(|s| s.seat_id).collect();
    let outcome = state
        .holds
        .place_holds(req.user_id, req.showtime_id, &seat_ids)
        .await?;

    let mut session = BookingSession::new(
        req.user_id,
        req.showtime_id,
        req.event_id,
        context.venue_id,
        req.seat_selections,
    );
    session.record_holds(outcome.held_seat_ids, outcome.expires_at);

    Ok(Json(SelectSeatsResponse { session }))
}

#[derive(Debug, Deserialize)]
pub struct PrepareRequest {
    pub session: BookingSession,
}

#[derive(Debug, Serialize)]
pub struct PrepareResponse {
    pub session: BookingSession,
}

/// Step two: re-validate the catalog context and recompute the subtotal from
/// authoritative seat rows. Client-supplied prices are display-only.
pub async fn prepare_payment(
    State(state): State<AppState>,
    Json(req): Json<PrepareRequest>,
) -> Result<Json<PrepareResponse>, AppError> {
    let mut session = req.session;
    if session.held_seat_ids.is_empty() {
        return Err(BookingError::NoTicketsSelected.into());
    }

    let context = state
        .store
        .showtime(session.showtime_id)
        .await?
        .ok_or_else(|| BookingError::NotFound("showtime".to_string()))?;
    if let Some(entity) = context.inactive_entity() {
        return Err(BookingError::NotFound(entity.to_string()).into());
    }

    let rows = state
        .store
        .seats(session.showtime_id, &session.held_seat_ids)
        .await?;
    session.selections = rows
        .iter()
        .map(|seat| SeatSelection {
            seat_id: seat.seat_id,
            label: seat.label(),
            seat_type: seat.seat_type.clone(),
            price: seat.price,
        })
        .collect();
    session.pre_discount_total = rows.iter().map(|seat| seat.price).sum();

    Ok(Json(PrepareResponse { session }))
}

#[derive(Debug, Deserialize)]
pub struct PromoRequest {
    pub session: BookingSession,
    /// `null` (or absent) removes any applied promo.
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PromoResponse {
    pub session: BookingSession,
}

/// Step three (optional): preview a promo discount against the session, or
/// remove one. Redemption happens only at final commit.
pub async fn apply_promo(
    State(state): State<AppState>,
    Json(req): Json<PromoRequest>,
) -> Result<Json<PromoResponse>, AppError> {
    let mut session = req.session;
    match req.code {
        Some(code) => {
            let applied = state
                .promos
                .apply(&code, session.pre_discount_total)
                .await?;
            session.apply_promo(applied);
        }
        None => session.clear_promo(),
    }
    Ok(Json(PromoResponse { session }))
}

#[derive(Debug, Deserialize)]
pub struct PayRequest {
    pub session: BookingSession,
    pub payment_method: String,
}

#[derive(Debug, Serialize)]
pub struct PayResponse {
    pub reference: String,
    pub total_charged: i64,
    pub seats: usize,
}

/// Step four: finalize the purchase. On failure the session stays valid for
/// retry, except `HoldExpiredOrTaken` (the response tells the caller to
/// discard it and reselect).
pub async fn finalize_payment(
    State(state): State<AppState>,
    Json(req): Json<PayRequest>,
) -> Result<Json<PayResponse>, AppError> {
    let request = FinalizeRequest::from_session(&req.session, req.payment_method);
    let reference = state.finalizer.finalize(request).await?;

    let bookings = state.store.bookings_for_reference(&reference).await?;
    let total_charged = bookings.iter().map(|b| b.total_amount).sum();
    info!(reference = %reference, seats = bookings.len(), "checkout complete");

    Ok(Json(PayResponse {
        reference,
        total_charged,
        seats: bookings.len(),
    }))
}
