pub mod money;
pub mod reference;

pub use money::split_discount;
pub use reference::booking_reference;
