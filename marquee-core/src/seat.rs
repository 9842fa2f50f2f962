use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One physical seat for one showtime, as read under lock.
///
/// A hold is not a separate entity: it is the `(held, held_by, held_until)`
/// triple on this row. Invariants: `held` implies both `held_by` and
/// `held_until` are set; `!vacant` means permanently booked and `held` must
/// be false.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatRecord {
    pub seat_id: Uuid,
    pub showtime_id: Uuid,
    pub row: String,
    pub column: i32,
    pub location: String,
    pub seat_type: String,
    /// Price in minor currency units.
    pub price: i64,
    pub is_active: bool,
    pub vacant: bool,
    pub held: bool,
    pub held_by: Option<Uuid>,
    pub held_until: Option<DateTime<Utc>>,
}

impl SeatRecord {
    /// User-facing label, e.g. `A7`.
    pub fn label(&self) -> String {
        format!("{}{}", self.row, self.column)
    }

    /// Whether the hold on this seat is live at `now`. A hold whose
    /// `held_until` has passed counts as released even though the row flags
    /// still show it.
    pub fn hold_active(&self, now: DateTime<Utc>) -> bool {
        self.held && self.held_until.map_or(false, |until| until > now)
    }

    /// Whether `user_id` may place (or re-place) a hold on this seat at
    /// `now`: the seat must be unsold, and either unheld, held by this same
    /// user, or carrying an expired hold.
    pub fn available_to(&self, user_id: Uuid, now: DateTime<Utc>) -> bool {
        self.vacant && (!self.hold_active(now) || self.held_by == Some(user_id))
    }

    /// Whether `user_id` holds a live, unexpired hold on this unsold seat.
    /// Checked immediately before finalizing payment.
    pub fn held_for(&self, user_id: Uuid, now: DateTime<Utc>) -> bool {
        self.vacant
            && self.held
            && self.held_by == Some(user_id)
            && self.held_until.map_or(false, |until| until >= now)
    }
}

/// A status mutation to apply to one locked seat row.
#[derive(Debug, Clone)]
pub struct SeatMutation {
    pub seat_id: Uuid,
    pub change: SeatChange,
}

#[derive(Debug, Clone)]
pub enum SeatChange {
    /// Place or refresh a hold for `user_id` lasting until `until`.
    Hold { user_id: Uuid, until: DateTime<Utc> },
    /// Clear the hold triple, leaving the seat vacant.
    Release,
    /// Flip to permanently booked, clearing the hold triple.
    Book,
}
