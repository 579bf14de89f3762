mod config;

use std::sync::Arc;

use tracing::info;

use envision_api::auth::AppStateInner;
use envision_api::catalog::Catalog;
use envision_api::routes;
use envision_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "envision=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = Arc::new(Database::open_with_readers(
        &config.db_path,
        config.db_readers,
    )?);
    let catalog = Catalog::load(config.team_path.as_deref())?;

    let state = AppStateInner::new(db, catalog, config.jwt_secret);
    let app = routes::router(state);

    info!("EnvisionTech server listening on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
