//! # Fidei Store
//!
//! Persistence layer for Fidei - SQLite through sqlx.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Database                               │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────────┐  │
//! │  │   SQLite    │    │ migrations  │    │     Repos       │  │
//! │  │   (state)   │    │  (schema)   │    │ (pool or tx)    │  │
//! │  └─────────────┘    └─────────────┘    └─────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fidei_store::{AssetRepo, Database};
//!
//! let db = Database::connect("sqlite:fidei.db").await?;
//!
//! let mut tx = db.begin().await?;
//! AssetRepo::insert(&mut *tx, &asset).await?;
//! tx.commit().await?;
//! ```

pub mod error;
pub mod repos;
pub mod schema;

pub use error::{StoreError, StoreResult};
pub use repos::{
    ActorRepo, AlertRepo, AssetQuery, AssetRepo, AuditRepo, FeeRepo, MembershipRepo, TrustRepo,
    VoteRepo,
};
pub use schema::{AlertRow, AuditRow};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// How long a writer waits for the database lock before failing
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Database facade - owns the pool, applies migrations on open
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if missing) the database at `database_url` and migrate it
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        Self::file_backed(options).await
    }

    /// Open a database file by path
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);
        Self::file_backed(options).await
    }

    /// WAL lets readers proceed while one writer holds the lock
    async fn file_backed(options: SqliteConnectOptions) -> StoreResult<Self> {
        let options = options
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePool::connect_with(options).await?;
        Self::migrated(pool).await
    }

    /// Private in-memory database. One connection, never recycled,
    /// so the data lives as long as the pool.
    pub async fn in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::migrated(pool).await
    }

    async fn migrated(pool: SqlitePool) -> StoreResult<Self> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::debug!("Database migrations applied");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start a write transaction.
    ///
    /// `BEGIN IMMEDIATE` takes the write lock up front, so a transaction
    /// that reads before it writes waits for other writers (up to
    /// [`BUSY_TIMEOUT`]) instead of failing on the lock upgrade.
    pub async fn begin(&self) -> StoreResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }
}
