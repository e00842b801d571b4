use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use page_load_stats::config::{self, Config, CONFIG_ENV};
use page_load_stats::error::Result;
use page_load_stats::store::{HistoryStore, MemoryStore, RedisStore};
use page_load_stats::{server, AppState};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "page-load-stats exited");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // ── 1. Config ────────────────────────────────────────────────
    let config = match std::env::var(CONFIG_ENV) {
        Ok(path) => {
            info!(%path, "loading config");
            config::load_from_file(&path)?
        }
        Err(_) => Config::default(),
    };

    // ── 2. History storage ───────────────────────────────────────
    let store: Arc<dyn HistoryStore> = match &config.redis_url {
        Some(url) => {
            info!("connecting to Redis");
            Arc::new(RedisStore::connect(url).await?)
        }
        None => {
            warn!("no redis_url configured, load-time history lives in memory");
            Arc::new(MemoryStore::new())
        }
    };

    if config.admin_token.is_none() {
        warn!("no admin_token configured, every visitor sees page stats");
    }
    tokio::fs::create_dir_all(&config.content_dir).await?;

    info!(
        sample_rate = config.sample_rate.percent(),
        log = %config.log_path().display(),
        "page stats enabled"
    );

    // ── 3. Router ────────────────────────────────────────────────
    let listen = config.listen.clone();
    let state = Arc::new(AppState::new(config, store));
    let app = server::create_router(state);

    // ── 4. Bind & serve ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&listen).await?;
    info!(%listen, "serving");

    axum::serve(listener, app).await?;
    Ok(())
}
