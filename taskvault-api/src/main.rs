//! # TaskVault API Server
//!
//! The main API server for TaskVault: user registration and login, plus
//! owner-scoped task CRUD backed by PostgreSQL with a write-through Redis
//! cache.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskvault-api
//! ```

use taskvault_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskvault_shared::cache::{CacheConfig, RedisClient, TaskCache};
use taskvault_shared::db::{migrations::run_migrations, pool};
use taskvault_shared::tasks::TaskService;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskvault_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "TaskVault API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    run_migrations(&db).await?;

    let redis = RedisClient::new(CacheConfig::new(config.redis.url.clone())).await?;

    let tasks = TaskService::new(db.clone(), TaskCache::new(redis.clone()));

    let bind_address = config.bind_address();
    let state = AppState::new(db, tasks, redis, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
