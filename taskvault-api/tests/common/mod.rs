/// Shared test harness for API integration tests
///
/// Builds a full router against live Postgres and Redis, creates a fresh
/// user per context, and mints a real identity token for it.

use axum::Router;
use sqlx::PgPool;
use uuid::Uuid;

use taskvault_api::app::{build_router, AppState};
use taskvault_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig, RedisConfig};
use taskvault_shared::auth::jwt::{create_token, Claims};
use taskvault_shared::cache::{CacheConfig, RedisClient, TaskCache};
use taskvault_shared::db::migrations::run_migrations;
use taskvault_shared::db::pool;
use taskvault_shared::models::user::{CreateUser, User};
use taskvault_shared::tasks::TaskService;

/// Secret used for tokens minted by the tests
pub const TEST_JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

pub struct TestContext {
    pub app: Router,
    pub db: PgPool,
}

impl TestContext {
    pub async fn new() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set for integration tests");
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        let db = pool::create_pool(pool::DatabaseConfig {
            url: database_url.clone(),
            ..Default::default()
        })
        .await?;

        run_migrations(&db).await?;

        let redis = RedisClient::new(CacheConfig::new(redis_url.clone())).await?;
        let tasks = TaskService::new(db.clone(), TaskCache::new(redis.clone()));

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: 5,
            },
            redis: RedisConfig { url: redis_url },
            jwt: JwtConfig {
                secret: TEST_JWT_SECRET.to_string(),
            },
        };

        let app = build_router(AppState::new(db.clone(), tasks, redis, config));

        Ok(Self { app, db })
    }

    /// Creates a user directly in the store and returns its id with a valid
    /// bearer header
    pub async fn create_user(&self) -> anyhow::Result<(Uuid, String)> {
        let user = User::create(
            &self.db,
            CreateUser {
                username: format!("user-{}", Uuid::new_v4()),
                password_hash: "$argon2id$test".to_string(),
            },
        )
        .await?;

        let token = create_token(&Claims::new(user.id), TEST_JWT_SECRET)?;

        Ok((user.id, format!("Bearer {}", token)))
    }
}
