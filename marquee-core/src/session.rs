use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::promo::AppliedPromo;

/// One seat as chosen at selection time. Labels and types are carried for
/// display; prices here are the hold-time snapshot and are always recomputed
/// server-side before money changes hands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatSelection {
    pub seat_id: Uuid,
    pub label: String,
    pub seat_type: String,
    pub price: i64,
}

/// The user's in-progress checkout, carried between the three request steps
/// by the external request layer. The core reads and writes its fields as
/// the source of truth for what is being committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingSession {
    pub user_id: Uuid,
    pub showtime_id: Uuid,
    pub event_id: Uuid,
    pub venue_id: Uuid,
    pub selections: Vec<SeatSelection>,
    pub held_seat_ids: Vec<Uuid>,
    pub hold_expires_at: Option<DateTime<Utc>>,
    /// Server-computed subtotal before any discount, in minor units.
    pub pre_discount_total: i64,
    pub promo: Option<AppliedPromo>,
}

impl BookingSession {
    pub fn new(
        user_id: Uuid,
        showtime_id: Uuid,
        event_id: Uuid,
        venue_id: Uuid,
        selections: Vec<SeatSelection>,
    ) -> Self {
        Self {
            user_id,
            showtime_id,
            event_id,
            venue_id,
            selections,
            held_seat_ids: Vec::new(),
            hold_expires_at: None,
            pre_discount_total: 0,
            promo: None,
        }
    }

    /// Record the hold outcome after seats were successfully held.
    pub fn record_holds(&mut self, seat_ids: Vec<Uuid>, expires_at: DateTime<Utc>) {
        self.held_seat_ids = seat_ids;
        self.hold_expires_at = Some(expires_at);
    }

    pub fn apply_promo(&mut self, promo: AppliedPromo) {
        self.promo = Some(promo);
    }

    pub fn clear_promo(&mut self) {
        self.promo = None;
    }

    pub fn discount(&self) -> i64 {
        self.promo.as_ref().map_or(0, |p| p.discount)
    }

    /// Amount due after discount, never negative.
    pub fn total_due(&self) -> i64 {
        (self.pre_discount_total - self.discount()).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> BookingSession {
        BookingSession::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            vec![],
        )
    }

    #[test]
    fn test_total_due_with_promo() {
        let mut s = session();
        s.pre_discount_total = 10000;
        s.apply_promo(AppliedPromo {
            promo_id: Uuid::new_v4(),
            code: "SAVE50".into(),
            discount: 5000,
        });
        assert_eq!(s.total_due(), 5000);

        s.clear_promo();
        assert_eq!(s.total_due(), 10000);
    }

    #[test]
    fn test_total_due_never_negative() {
        let mut s = session();
        s.pre_discount_total = 1000;
        s.apply_promo(AppliedPromo {
            promo_id: Uuid::new_v4(),
            code: "BIG".into(),
            discount: 5000,
        });
        assert_eq!(s.total_due(), 0);
    }
}
