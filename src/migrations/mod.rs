// Migration orchestrator
// Embedded in the application binary for distroless container compatibility

pub mod diesel;

use std::error::Error;
use tracing::{error, info, warn};

/// Configuration for migration execution
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub database_url: String,
    pub skip_diesel: bool,
    pub environment: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        let config = crate::app_config::config();

        Self {
            database_url: config.database.url.clone(),
            skip_diesel: config.disable_embedded_migrations,
            environment: config.environment.to_string(),
        }
    }
}

/// Run embedded migrations, or report what is pending when they are disabled
pub async fn run_all_migrations(config: MigrationConfig) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!(
        "[MIGRATIONS] Starting migration process for environment: {}",
        config.environment
    );

    if config.skip_diesel {
        info!("[MIGRATIONS] Skipping Diesel migrations (disabled in config)");
        match diesel::check_migration_status(&config.database_url).await {
            Ok(status) if status.needs_migration() => warn!(
                "[MIGRATIONS] {} pending migrations not applied: {:?}",
                status.pending_count, status.pending_migrations
            ),
            Ok(_) => info!("[MIGRATIONS] ✓ Schema up to date"),
            Err(e) => warn!("[MIGRATIONS] Could not check migration status: {}", e),
        }
        return Ok(());
    }

    info!("[MIGRATIONS] Running Diesel (PostgreSQL) migrations...");
    match diesel::run_migrations(&config.database_url).await {
        Ok(applied_count) if applied_count > 0 => {
            info!("[MIGRATIONS] ✓ Applied {} Diesel migrations", applied_count);
        },
        Ok(_) => info!("[MIGRATIONS] ✓ Diesel migrations up to date"),
        Err(e) => {
            error!("[MIGRATIONS] ✗ Diesel migration failed: {}", e);
            return Err(format!("Diesel migration failed: {}", e).into());
        },
    }

    Ok(())
}
