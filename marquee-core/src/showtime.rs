use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Read-only activity snapshot for a showtime and its containing venue and
/// city, re-checked immediately before a booking commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowtimeContext {
    pub showtime_id: Uuid,
    pub event_id: Uuid,
    pub venue_id: Uuid,
    pub city_id: Uuid,
    pub showtime_active: bool,
    pub venue_active: bool,
    pub city_active: bool,
}

impl ShowtimeContext {
    pub fn is_active(&self) -> bool {
        self.showtime_active && self.venue_active && self.city_active
    }

    /// Name of the first inactive entity, for the error message.
    pub fn inactive_entity(&self) -> Option<&'static str> {
        if !self.showtime_active {
            Some("showtime")
        } else if !self.venue_active {
            Some("venue")
        } else if !self.city_active {
            Some("city")
        } else {
            None
        }
    }
}
