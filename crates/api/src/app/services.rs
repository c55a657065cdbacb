//! Infrastructure wiring: pick a store, prepare it, build the shared state.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use juris_infra::{AppConfig, MemoryStore, PgStore, SharedStore, seed_demo_data};

use super::AppState;

/// Build the application state from configuration.
///
/// With `DATABASE_URL` set the Postgres store is used (and its schema
/// created); otherwise an in-memory store. Demo data is seeded when enabled.
pub async fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let store: SharedStore = match &config.database {
        Some(db) => {
            let store = PgStore::connect(db)
                .await
                .context("connecting to postgres")?;
            store.migrate().await.context("applying schema")?;
            info!("using postgres store");
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set; using in-memory store (data is lost on exit)");
            Arc::new(MemoryStore::new())
        }
    };

    if config.seed_demo_data && seed_demo_data(store.as_ref()).await? {
        info!("seeded demo firm");
    }

    Ok(AppState::new(store, config.auth.clone()))
}
