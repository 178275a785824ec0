//! Townsquare Store - schema bootstrap entry point.
//!
//! Opens the configured database and creates any missing entity tables.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use townsquare_domain::all_schemas;
use townsquare_store::{
    ClockPort, DatastorePort, EntityStore, SqliteDatastore, StoreConfig, SystemClock,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root so the binary works from any crate dir.
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "townsquare_store=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Townsquare Store");

    let config = StoreConfig::from_env();
    tracing::info!(
        database_url = %config.database_url,
        table_naming = %config.table_naming,
        validate_before_write = config.validate_before_write,
        max_connections = config.max_connections,
        "Loaded configuration"
    );

    let datastore = SqliteDatastore::connect(&config).await?;
    let naming = datastore.naming();
    let datastore: Arc<dyn DatastorePort> = Arc::new(datastore);
    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());

    let store = EntityStore::from_config(datastore, clock, &config);
    store.ensure_schema().await?;

    for schema in all_schemas() {
        tracing::info!(
            entity = schema.kind.name(),
            table = schema.table_name(naming),
            columns = schema.columns.len(),
            "Table available"
        );
    }

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
