pub mod finalizer;
pub mod promo;

pub use finalizer::{BookingFinalizer, FinalizeRequest, PurchaseStage};
pub use promo::{PromoLedger, DEFAULT_MAX_DISCOUNT_BPS};
