mod config;
mod error;
mod handlers;
mod models;
mod router;
mod state;

use config::Config;
use matching_engine::Engine;
use order_store::{OrderStore, PgOrderStore};
use state::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!("starting order book gateway");

    let store: Arc<dyn OrderStore> = {
        let pg = PgOrderStore::connect(&config.database_url).await?;
        pg.ensure_schema().await?;
        Arc::new(pg)
    };

    let (engine, _match_loop) = Engine::start(Arc::clone(&store)).await?;
    let state = AppState { engine, store };

    let app = router::create_router(state);
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
