mod config;

use std::sync::Arc;

use tracing::info;

use bloodlink_api::{AppState, AppStateInner, build_router};
use bloodlink_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "bloodlink=debug,bloodlink_api=debug,bloodlink_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = Database::open_with_timeout(&config.db_path, config.busy_timeout)?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret.clone(),
        token_ttl_days: config.token_ttl_days,
    });

    let app = build_router(state);

    let addr = config.listen_addr()?;
    info!("Bloodlink server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
