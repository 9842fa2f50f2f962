use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use marquee_core::BookingError;

#[derive(Debug)]
pub struct AppError(pub BookingError);

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::SeatsUnavailable(_)
            | BookingError::HoldExpiredOrTaken(_)
            | BookingError::PromoExpired(_)
            | BookingError::ConcurrencyViolation { .. } => StatusCode::CONFLICT,
            BookingError::NoTicketsSelected
            | BookingError::ZeroTotal
            | BookingError::InvalidCode(_)
            | BookingError::DiscountTooLarge => StatusCode::BAD_REQUEST,
            BookingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal Server Error: {}", self.0);
        }

        let body = Json(json!({
            "error": self.0.to_string(),
            "discard_session": self.0.discards_session(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: BookingError) -> StatusCode {
        AppError(err).into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(BookingError::NotFound("seat".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(BookingError::SeatsUnavailable(vec!["A2".into()])),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(BookingError::HoldExpiredOrTaken(vec!["A2".into()])),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(BookingError::PromoExpired("SAVE50".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(status_of(BookingError::ZeroTotal), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(BookingError::InvalidCode("X".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(BookingError::Storage("abc123".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
