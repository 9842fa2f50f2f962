//! Money arithmetic on minor currency units (paise).
//!
//! All amounts in the system are `i64` minor units; floats never touch a
//! price path.

/// Per-seat share of a flat discount.
///
/// The discount is divided evenly across `seat_count` seats using integer
/// division; the remainder is simply not charged back (each seat pays
/// `price - discount / seat_count`, floored at zero by the caller).
pub fn split_discount(discount: i64, seat_count: usize) -> i64 {
    if seat_count == 0 {
        return 0;
    }
    discount / seat_count as i64
}

/// Amount due for one seat after its discount share, never negative.
pub fn seat_total(price: i64, discount_share: i64) -> i64 {
    (price - discount_share).max(0)
}
