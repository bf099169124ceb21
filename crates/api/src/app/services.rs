use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use fleetstock_infra::{AppConfig, InMemoryInventoryStore, InventoryServices, PostgresInventoryStore, SharedStore, SystemClock};

/// Services shared by every handler.
pub type AppServices = InventoryServices;

/// Pick the store from configuration and wire the services around it.
///
/// Postgres is used when a database URL is configured; otherwise everything
/// lives in memory and is lost on restart.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let store: SharedStore = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .connect(url)
                .await
                .context("failed to connect to Postgres")?;
            let store = PostgresInventoryStore::new(pool);
            store.migrate().await.context("failed to apply inventory schema")?;
            tracing::info!(max_connections = config.db_max_connections, "using Postgres inventory store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not configured; using in-memory inventory store");
            Arc::new(InMemoryInventoryStore::new())
        }
    };

    Ok(InventoryServices::new(store, Arc::new(SystemClock), config.ledger))
}
