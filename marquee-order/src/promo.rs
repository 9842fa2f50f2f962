use std::sync::Arc;

use tracing::debug;

use marquee_core::{AppliedPromo, BookingError, BookingStore, BookingTx};

/// Discount cap as basis points of the pre-discount subtotal (75%).
pub const DEFAULT_MAX_DISCOUNT_BPS: i64 = 7500;

/// Validates promo codes against usage limits and value caps, and reserves
/// redemptions atomically with booking commit.
///
/// Application and redemption are deliberately separate: many concurrent
/// users can see a discount previewed, but at most `max_redemptions` of
/// them can redeem it, first commit wins.
#[derive(Clone)]
pub struct PromoLedger {
    store: Arc<dyn BookingStore>,
    max_discount_bps: i64,
}

impl PromoLedger {
    pub fn new(store: Arc<dyn BookingStore>, max_discount_bps: i64) -> Self {
        Self {
            store,
            max_discount_bps,
        }
    }

    /// Validate `code` against `subtotal` (minor units) and compute the
    /// discount it grants. Does not consume a redemption.
    pub async fn apply(&self, code: &str, subtotal: i64) -> Result<AppliedPromo, BookingError> {
        let promo = self
            .store
            .find_promo(code)
            .await?
            .ok_or_else(|| BookingError::InvalidCode(code.to_string()))?;

        if !promo.redeemable() {
            return Err(BookingError::InvalidCode(code.to_string()));
        }
        // Integer basis-point comparison; floats never touch money.
        if promo.discount_value * 10_000 > subtotal * self.max_discount_bps {
            debug!(code, subtotal, value = promo.discount_value, "discount over cap");
            return Err(BookingError::DiscountTooLarge);
        }

        let discount = promo.discount_value.min(subtotal);
        Ok(AppliedPromo {
            promo_id: promo.id,
            code: promo.code,
            discount,
        })
    }

    /// Consume one redemption unit inside the caller's booking transaction
    /// and return the discount actually granted, recomputed from the stored
    /// value against `subtotal`. The session's previewed discount is
    /// display-only and never trusted here. A cap lost to a concurrent
    /// booking is fatal to the whole checkout, never silently ignored.
    pub async fn redeem(
        &self,
        tx: &mut dyn BookingTx,
        promo: &AppliedPromo,
        subtotal: i64,
    ) -> Result<i64, BookingError> {
        let value = tx
            .redeem_promo(promo.promo_id)
            .await?
            .ok_or_else(|| BookingError::PromoExpired(promo.code.clone()))?;

        if value * 10_000 > subtotal * self.max_discount_bps {
            debug!(code = %promo.code, subtotal, value, "discount over cap at commit");
            return Err(BookingError::DiscountTooLarge);
        }
        Ok(value.min(subtotal))
    }
}
