use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use marquee_core::{Booking, BookingError};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/bookings/{reference}", get(get_booking))
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub reference: String,
    pub total_charged: i64,
    pub seats: Vec<Booking>,
}

/// Confirmation read-back: every seat row committed under one reference.
pub async fn get_booking(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    let seats = state.store.bookings_for_reference(&reference).await?;
    if seats.is_empty() {
        return Err(BookingError::NotFound("booking".to_string()).into());
    }
    let total_charged = seats.iter().map(|b| b.total_amount).sum();
    Ok(Json(BookingResponse {
        reference,
        total_charged,
        seats,
    }))
}
