use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A flat-value promo code with a usage cap.
///
/// Invariant: `times_used <= max_redemptions`. Many users may *apply* a code
/// concurrently (see the discount preview), but at most `max_redemptions`
/// checkouts can *redeem* it, first commit wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoCode {
    pub id: Uuid,
    pub code: String,
    /// Flat discount in minor units.
    pub discount_value: i64,
    pub max_redemptions: i32,
    pub times_used: i32,
    pub is_active: bool,
}

impl PromoCode {
    /// Whether the code can still be applied: active and under its cap.
    pub fn redeemable(&self) -> bool {
        self.is_active && self.times_used < self.max_redemptions
    }
}

/// A validated discount attached to a session at checkout-preview time.
/// Redemption only happens at final commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedPromo {
    pub promo_id: Uuid,
    pub code: String,
    /// Discount granted against the previewed subtotal, in minor units.
    pub discount: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redeemable() {
        let mut promo = PromoCode {
            id: Uuid::new_v4(),
            code: "SAVE50".into(),
            discount_value: 5000,
            max_redemptions: 2,
            times_used: 0,
            is_active: true,
        };
        assert!(promo.redeemable());

        promo.times_used = 2;
        assert!(!promo.redeemable());

        promo.times_used = 0;
        promo.is_active = false;
        assert!(!promo.redeemable());
    }
}
