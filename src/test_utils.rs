#[cfg(test)]
pub mod test_utils {
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum_test::TestServer;
    use chrono::NaiveDateTime;
    use compute::{DatabaseStore, FixedClock, MemoryStore};
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{Database, DatabaseConnection};
    use std::sync::Arc;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        // Run migrations
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Create a database-backed AppState whose clock stands still at `now`
    pub async fn setup_test_app_state(now: NaiveDateTime) -> (AppState, Arc<FixedClock>) {
        let db = setup_test_db().await;
        let clock = Arc::new(FixedClock::new(now));
        let state = AppState::new(Arc::new(DatabaseStore::new(db)), clock.clone());
        (state, clock)
    }

    /// Same as [`setup_test_app_state`] on the in-memory store
    pub fn setup_memory_app_state(now: NaiveDateTime) -> (AppState, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(now));
        let state = AppState::new(Arc::new(MemoryStore::new()), clock.clone());
        (state, clock)
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level is taken from RUST_LOG and defaults to WARN.
    /// The subscriber is removed when the returned guard is dropped.
    pub fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn test_server(state: AppState) -> TestServer {
        TestServer::new(create_router(state)).expect("Failed to build test server")
    }

    /// Database-backed test server with its clock
    pub async fn setup_test_app(now: NaiveDateTime) -> (TestServer, Arc<FixedClock>) {
        let (state, clock) = setup_test_app_state(now).await;
        (test_server(state), clock)
    }
}
