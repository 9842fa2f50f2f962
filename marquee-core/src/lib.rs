pub mod booking;
pub mod error;
pub mod promo;
pub mod seat;
pub mod session;
pub mod showtime;
pub mod store;

pub use booking::Booking;
pub use error::BookingError;
pub use promo::{AppliedPromo, PromoCode};
pub use seat::{SeatChange, SeatMutation, SeatRecord};
pub use session::{BookingSession, SeatSelection};
pub use showtime::ShowtimeContext;
pub use store::{BookingStore, BookingTx};
