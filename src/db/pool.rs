use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Connects lazily so the service starts even when the mirror is down.
pub fn create_pool(database_url: &str, acquire_timeout_secs: u64) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(std::time::Duration::from_secs(acquire_timeout_secs))
        .connect_lazy(database_url)
}

/// Creates the `daily_logs` table if needed. Failure is not fatal: the remote
/// tier simply keeps failing over to the local cache.
pub async fn run_migrations(pool: &PgPool) {
    match sqlx::migrate!("./migrations").run(pool).await {
        Ok(()) => tracing::info!("Remote database migrations applied"),
        Err(e) => tracing::warn!(error = %e, "Remote migrations failed, continuing local-first"),
    }
}
