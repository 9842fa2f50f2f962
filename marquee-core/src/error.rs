use thiserror::Error;

/// Outcome taxonomy for every core operation.
///
/// Each variant is user-displayable; `Storage` deliberately carries only a
/// short diagnostic code, with full detail logged server-side where the
/// failure happened.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("{0} not found or inactive")]
    NotFound(String),

    /// One or more requested seats are booked or actively held by someone
    /// else. Carries the offending seat labels for display.
    #[error("seats unavailable: {}", .0.join(", "))]
    SeatsUnavailable(Vec<String>),

    /// A previously placed hold is no longer valid at finalize time. The
    /// caller must discard the session and reselect.
    #[error("hold expired or taken for seats: {}", .0.join(", "))]
    HoldExpiredOrTaken(Vec<String>),

    #[error("no tickets selected")]
    NoTicketsSelected,

    #[error("order total must be greater than zero")]
    ZeroTotal,

    #[error("promo code '{0}' is invalid or exhausted")]
    InvalidCode(String),

    #[error("discount exceeds the allowed fraction of the subtotal")]
    DiscountTooLarge,

    /// The redemption increment lost a race against a concurrent booking;
    /// aborts an otherwise-ready purchase.
    #[error("promo code '{0}' was fully redeemed")]
    PromoExpired(String),

    /// A locked update affected fewer rows than expected. Fatal to the
    /// current attempt; never retried automatically.
    #[error("concurrent update conflict: expected {expected} rows, {affected} affected")]
    ConcurrencyViolation { expected: usize, affected: usize },

    #[error("a storage error occurred, please try again (ref {0})")]
    Storage(String),
}

impl BookingError {
    /// Whether the external layer must discard the booking session and send
    /// the user back to seat selection.
    pub fn discards_session(&self) -> bool {
        matches!(self, BookingError::HoldExpiredOrTaken(_))
    }
}
