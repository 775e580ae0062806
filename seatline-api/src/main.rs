use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use seatline_api::{app, state::AppState, worker};
use seatline_core::{Clock, InventoryLayout, SeatLedger, SystemClock};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seatline_api=debug,seatline_core=info,seatline_store=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = seatline_store::Config::load().context("Failed to load config")?;
    tracing::info!("Starting Seatline API on port {}", config.server.port);

    let repo = seatline_store::open_repository(&config.storage)
        .await
        .context("Failed to open seat store")?;
    let ledger = Arc::new(SeatLedger::new(repo));

    let layout = InventoryLayout::new(config.inventory.seat_count, config.inventory.label_prefix.clone());
    ledger.initialize(&layout).await.context("Failed to initialize inventory")?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    if config.sweeper.enabled {
        worker::start_expiry_sweeper(
            ledger.clone(),
            clock.clone(),
            std::time::Duration::from_secs(config.sweeper.interval_seconds.max(1)),
        );
    }

    let app_state = AppState {
        ledger,
        clock,
        business_rules: config.business_rules.clone(),
    };

    let app = app(app_state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid listen address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
