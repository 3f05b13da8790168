use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Owns the Postgres pool.
///
/// Lifecycle is `init -> ready -> closed`: [`Database::new`] only records the
/// settings, the first [`Database::connect`] opens the pool and every later call
/// hands back the same one. Concurrent first calls open it exactly once.
pub struct Database {
    url: String,
    max_connections: u32,
    pool: OnceCell<PgPool>,
}

impl Database {
    pub fn new(url: impl Into<String>, max_connections: u32) -> Self {
        Self {
            url: url.into(),
            max_connections,
            pool: OnceCell::new(),
        }
    }

    /// Builds the pool without opening a connection; the database is ready
    /// immediately and connections are made on first use.
    pub fn lazy(url: impl Into<String>, max_connections: u32) -> anyhow::Result<Self> {
        let url = url.into();
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_lazy(&url)
            .context("configure database pool")?;
        Ok(Self {
            url,
            max_connections,
            pool: OnceCell::new_with(Some(pool)),
        })
    }

    pub async fn connect(&self) -> anyhow::Result<&PgPool> {
        if let Some(pool) = self.pool.get() {
            debug!("database already connected");
            return Ok(pool);
        }
        self.pool
            .get_or_try_init(|| async {
                let pool = PgPoolOptions::new()
                    .max_connections(self.max_connections)
                    .connect(&self.url)
                    .await
                    .context("connect to database")?;
                info!("database connected");
                Ok::<PgPool, anyhow::Error>(pool)
            })
            .await
    }

    /// True once connected and until closed.
    pub fn is_ready(&self) -> bool {
        self.pool.get().is_some_and(|pool| !pool.is_closed())
    }

    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
            info!("database connection closed");
        }
    }

    /// Round-trips a trivial query.
    pub async fn ping(&self) -> anyhow::Result<()> {
        let pool = self.connect().await?;
        sqlx::query("SELECT 1")
            .execute(pool)
            .await
            .context("ping database")?;
        Ok(())
    }
}
