use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One purchased seat. All seats bought in a single checkout share the same
/// `reference`. Rows are immutable once written; there is no update or
/// delete path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub reference: String,
    pub seat_id: Uuid,
    pub showtime_id: Uuid,
    pub user_id: Uuid,
    /// Pre-discount seat price in minor units.
    pub price: i64,
    /// This seat's share of the checkout-wide discount.
    pub discount_share: i64,
    /// Amount charged: `price - discount_share`, floored at zero.
    pub total_amount: i64,
    pub payment_method: String,
    pub checked_in: bool,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        reference: String,
        seat_id: Uuid,
        showtime_id: Uuid,
        user_id: Uuid,
        price: i64,
        discount_share: i64,
        payment_method: String,
    ) -> Self {
        Self {
            reference,
            seat_id,
            showtime_id,
            user_id,
            price,
            discount_share,
            total_amount: marquee_shared::money::seat_total(price, discount_share),
            payment_method,
            checked_in: false,
            created_at: Utc::now(),
        }
    }
}
