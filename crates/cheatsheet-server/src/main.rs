mod config;

use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::info;

use cheatsheet_api::routes::router;
use cheatsheet_api::state::{AppState, AppStateInner};
use cheatsheet_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "cheatsheets=debug,cheatsheet_api=debug,cheatsheet_db=debug,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = Database::open(&config.db_path)?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        session_secret: config.session_secret.clone(),
        secure_cookies: config.secure_cookies,
        default_from: config.default_from.clone(),
        default_to: config.default_to.clone(),
    });

    let app = router(state).layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("Cheat sheets listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
