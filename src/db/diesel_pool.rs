// Diesel Database Pool Configuration
// Diesel-async + bb8 connection pooling

use bb8::{Pool, RunError};
use diesel_async::pooled_connection::{AsyncDieselConnectionManager, PoolError as ManagerError};
use diesel_async::AsyncPgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations};
use std::time::Duration;

// Embed migrations at compile time
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/diesel");

pub type DieselPool = Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;

pub type PoolError = RunError<ManagerError>;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DieselDatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
    pub test_on_checkout: bool,
}

impl Default for DieselDatabaseConfig {
    fn default() -> Self {
        Self::from(&crate::app_config::config().database)
    }
}

impl From<&crate::app_config::DatabaseConfig> for DieselDatabaseConfig {
    fn from(database: &crate::app_config::DatabaseConfig) -> Self {
        Self {
            url: database.url.clone(),
            max_connections: database.max_connections,
            min_connections: database.min_connections,
            connection_timeout: Duration::from_secs(database.connect_timeout),
            idle_timeout: Duration::from_secs(database.idle_timeout),
            max_lifetime: Duration::from_secs(database.max_lifetime),
            test_on_checkout: true,
        }
    }
}

/// Create Diesel connection pool
pub async fn create_diesel_pool(config: DieselDatabaseConfig) -> Result<DieselPool, PoolError> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.url.clone());

    let pool = Pool::builder()
        .max_size(config.max_connections)
        .min_idle(Some(config.min_connections))
        .connection_timeout(config.connection_timeout)
        .idle_timeout(Some(config.idle_timeout))
        .max_lifetime(Some(config.max_lifetime))
        .test_on_check_out(config.test_on_checkout)
        .build(manager)
        .await
        .map_err(RunError::User)?;

    // Test the connection
    let conn = pool.get().await?;
    drop(conn);

    tracing::info!(
        "[DIESEL] Pool initialized for {} with {} max connections",
        mask_connection_string(&config.url),
        config.max_connections
    );

    Ok(pool)
}

/// Mask database connection string for logging
pub fn mask_connection_string(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        let scheme = parsed.scheme();
        let host = parsed.host_str().unwrap_or("***");
        let path = parsed.path();

        // Always normalize to postgresql:// prefix
        let normalized_scheme = if scheme == "postgres" {
            "postgresql"
        } else {
            scheme
        };

        if parsed.username().is_empty() && parsed.password().is_none() {
            format!("{}://{}{}", normalized_scheme, host, path)
        } else {
            format!("{}://***:***@{}{}", normalized_scheme, host, path)
        }
    } else {
        "postgresql://***:***@***".to_string()
    }
}
