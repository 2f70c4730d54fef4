use crate::configuration::DatabaseSettings;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::OnceCell;

/// SQLSTATE raised by Postgres when an insert violates a unique constraint.
const UNIQUE_VIOLATION: &str = "23505";

/// Process-wide handle to the submissions database.
///
/// The pool is opened on first use. Concurrent first callers share a single
/// connection attempt; a failed attempt is not cached, so the next caller
/// tries again.
pub struct Store {
    settings: DatabaseSettings,
    pool: OnceCell<PgPool>,
}

impl Store {
    pub fn new(settings: DatabaseSettings) -> Self {
        Self {
            settings,
            pool: OnceCell::new(),
        }
    }

    #[tracing::instrument(name = "Ensuring the database is connected", skip(self))]
    pub async fn ensure_connected(&self) -> Result<&PgPool, sqlx::Error> {
        self.pool
            .get_or_try_init(|| async {
                tracing::info!("Opening database connection pool");
                PgPoolOptions::new()
                    .acquire_timeout(self.settings.pool_timeout())
                    .connect_with(self.settings.with_db())
                    .await
                    .map_err(|e| {
                        tracing::error!("Failed to connect to the database: {:?}", e);
                        e
                    })
            })
            .await
    }

    pub fn is_connected(&self) -> bool {
        self.pool.initialized()
    }
}

pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_error) => db_error.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}
