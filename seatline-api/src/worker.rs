use std::sync::Arc;

use seatline_core::{Clock, SeatLedger};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

/// Periodically release expired holds through the same `sweep_expired`
/// the ledger runs lazily on each call.
pub fn start_expiry_sweeper(
    ledger: Arc<SeatLedger>,
    clock: Arc<dyn Clock>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Expiry sweeper started, every {:?}", every);

        loop {
            ticker.tick().await;
            match ledger.sweep_expired(clock.now()).await {
                Ok(0) => {}
                Ok(released) => info!(released, "Sweeper released expired holds"),
                Err(e) => error!("Expiry sweep failed: {}", e),
            }
        }
    })
}
