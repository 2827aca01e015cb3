// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `cartpulse serve` command implementation.
//!
//! Wires the full service: SQLite storage, the Telegram sink, the carrier
//! client, the report scheduler, and the inbound webhook server. Supports
//! graceful shutdown via signal handlers.

use std::path::Path;
use std::sync::Arc;

use cartpulse_carrier::CarrierClient;
use cartpulse_config::CartpulseConfig;
use cartpulse_core::{CartpulseError, MessageSink};
use cartpulse_reporting::{ReportRunner, ReportScheduler, ScheduleSpec};
use cartpulse_storage::{CartStore, Database, UndeliveredOrderStore};
use cartpulse_telegram::TelegramSink;
use cartpulse_webhook::{NotificationReconciler, WebhookState};
use tracing::{error, info};

use crate::shutdown;

/// Runs the `cartpulse serve` command.
pub async fn run_serve(config: CartpulseConfig) -> Result<(), CartpulseError> {
    init_tracing(&config.agent.log_level);

    info!(agent = config.agent.name.as_str(), "starting cartpulse serve");

    let db = Database::open(
        Path::new(&config.storage.database_path),
        config.storage.wal_mode,
    )
    .await?;
    info!(
        path = config.storage.database_path.as_str(),
        wal = config.storage.wal_mode,
        "storage initialized"
    );

    let cart_store = Arc::new(CartStore::new(db.connection()));
    let undelivered_store = Arc::new(UndeliveredOrderStore::new(db.connection()));

    let sink: Arc<dyn MessageSink> = {
        let sink = TelegramSink::new(&config.telegram).map_err(|e| {
            error!(error = %e, "failed to initialize Telegram sink");
            eprintln!(
                "error: Telegram delivery required. Set telegram.bot_token and \
                 telegram.chat_id via config or CARTPULSE_TELEGRAM_* env vars."
            );
            e
        })?;
        Arc::new(sink)
    };

    let carrier = Arc::new(CarrierClient::from_config(&config.carrier)?);
    if config.carrier.use_fixture {
        info!("carrier client running in fixture mode");
    }

    let runner = Arc::new(ReportRunner::new(
        carrier,
        sink.clone(),
        undelivered_store,
        &config.reporting,
    )?);

    let spec = ScheduleSpec::from_config(&config.schedule, &config.reporting)?;
    let mut scheduler = ReportScheduler::new(spec, runner);
    scheduler.start();

    let reconciler = Arc::new(NotificationReconciler::new(cart_store, sink));
    let state = WebhookState { reconciler };

    let cancel = shutdown::install_signal_handler();

    tokio::select! {
        result = cartpulse_webhook::start_server(&config.webhook, state) => {
            result?;
        }
        _ = cancel.cancelled() => {
            info!("shutdown signal received, stopping");
        }
    }

    scheduler.stop();
    info!("cartpulse serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cartpulse={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
