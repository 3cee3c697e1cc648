use anyhow::{Context, Result};
use dotenv::dotenv;
use gamezone::handler::AppRouter;
use shared::{
    abstract_trait::DynOrderCommandService,
    config::{Config, ConnectionManager},
    state::AppState,
    utils::{Telemetry, init_logger},
};
use std::time::Duration;
use tracing::{error, info};

fn spawn_reconciler(orders: DynOrderCommandService, every_secs: u64, after_secs: i64) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(every_secs.max(1)));
        let older_than = chrono::Duration::seconds(after_secs);

        loop {
            ticker.tick().await;

            match orders.reconcile_pending(older_than).await {
                Ok(0) => {}
                Ok(repaired) => info!("🔧 Reconciled {repaired} stuck pending orders"),
                Err(e) => error!("❌ Order reconciliation failed: {e}"),
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let config = Config::init().context("Failed to load configuration")?;

    let mut telemetry = Telemetry::new("gamezone", config.otel_endpoint.clone());
    let logger_provider = telemetry
        .init()
        .context("Failed to initialize telemetry")?;

    init_logger(
        logger_provider,
        "server",
        config.is_dev,
        config.enable_file_log,
    );

    let pool = ConnectionManager::new_pool(&config.database_url, config.db_max_conn)
        .await
        .context("Failed to connect to database")?;

    if config.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;
        info!("✅ Migrations applied");
    }

    let state = AppState::new(pool, &config).await;

    spawn_reconciler(
        state.di_container.order_service.command.clone(),
        config.checkout.reconcile_interval_secs,
        config.checkout.reconcile_after_secs,
    );

    info!("🚀 GameZone started");

    AppRouter::serve(config.port, state)
        .await
        .context("Failed to start server")?;

    info!("Shutting down servers...");

    telemetry.shutdown().await?;

    Ok(())
}
