pub mod holds;

pub use holds::{check_holds, HoldManager, HoldOutcome, DEFAULT_HOLD_TTL_SECONDS};
