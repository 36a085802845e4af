/**
 * Server Configuration
 *
 * Configuration is loaded from environment variables with sensible defaults
 * for local development. Configuration errors are logged but do not prevent
 * startup: a server without `DATABASE_URL` runs on the in-memory store so
 * the realtime channel can still be exercised locally.
 */
use sqlx::PgPool;

/// Server settings read from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind (`SERVER_PORT`, default 3000)
    pub port: u16,
    /// Whether declining a friend request notifies the original sender
    /// (`RIPPLE_NOTIFY_ON_DECLINE`, default false)
    pub notify_on_decline: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let port = std::env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .unwrap_or(3000);

        let notify_on_decline = std::env::var("RIPPLE_NOTIFY_ON_DECLINE")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            port,
            notify_on_decline,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            notify_on_decline: false,
        }
    }
}

/// Load and initialize the database connection pool
///
/// Returns `None` if `DATABASE_URL` is not set or the connection fails; the
/// caller falls back to the in-memory store. Migration failures are logged
/// and tolerated because they may simply have been applied already.
pub async fn load_database() -> Option<PgPool> {
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!("DATABASE_URL not set, falling back to the in-memory store");
            return None;
        }
    };

    tracing::info!("Connecting to database...");

    let pool = match PgPool::connect(&database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {:?}", e);
            tracing::warn!("Falling back to the in-memory store");
            return None;
        }
    };

    tracing::info!("Database connection pool created successfully");

    tracing::info!("Running database migrations...");
    match sqlx::migrate!().run(&pool).await {
        Ok(_) => {
            tracing::info!("Database migrations completed successfully");
        }
        Err(e) => {
            tracing::error!("Failed to run database migrations: {:?}", e);
            tracing::warn!("Continuing without migrations - database might not be up to date");
        }
    }

    Some(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 3000);
        assert!(!config.notify_on_decline);
    }
}
