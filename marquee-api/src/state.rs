use std::sync::Arc;

use marquee_core::BookingStore;
use marquee_inventory::HoldManager;
use marquee_order::{BookingFinalizer, PromoLedger};
use marquee_store::BusinessRules;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BookingStore>,
    pub holds: HoldManager,
    pub promos: PromoLedger,
    pub finalizer: BookingFinalizer,
}

impl AppState {
    pub fn new(store: Arc<dyn BookingStore>, rules: BusinessRules) -> Self {
        let holds = HoldManager::new(store.clone(), rules.hold_ttl_seconds);
        let promos = PromoLedger::new(store.clone(), rules.max_discount_bps);
        let finalizer = BookingFinalizer::new(store.clone(), holds.clone(), promos.clone());
        Self {
            store,
            holds,
            promos,
            finalizer,
        }
    }
}
