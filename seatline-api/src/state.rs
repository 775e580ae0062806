use std::sync::Arc;

use seatline_core::{Clock, SeatLedger};
use seatline_store::app_config::BusinessRules;

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<SeatLedger>,
    pub clock: Arc<dyn Clock>,
    pub business_rules: BusinessRules,
}

impl AppState {
    pub fn now(&self) -> i64 {
        self.clock.now()
    }
}
