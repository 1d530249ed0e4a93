mod config;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use bloglist_api::auth::{AppState, AppStateInner};
use bloglist_api::password::PasswordHasher;
use bloglist_api::routes;
use bloglist_api::tokens::TokenService;
use bloglist_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    let default_filter = "bloglist=debug,bloglist_api=debug,bloglist_db=debug,tower_http=debug";
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let config = Config::from_env()?;

    let db = if config.db_path == ":memory:" {
        Database::open_in_memory()?
    } else {
        Database::open(Path::new(&config.db_path))?
    };

    let hasher = match config.argon2 {
        Some(cost) => PasswordHasher::with_cost(cost.memory_kib, cost.iterations, cost.parallelism)?,
        None => PasswordHasher::default(),
    };

    let state: AppState = Arc::new(AppStateInner {
        db,
        tokens: TokenService::new(&config.secret),
        hasher,
    });

    if let Some(dir) = &config.static_dir {
        info!("Serving static files from {}", dir.display());
    }

    let app = routes::router(state, config.static_dir.clone())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Bloglist server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    info!("Received Ctrl+C, shutting down...");
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
