use anyhow::{Context, Result};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::StoreError;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Handle to the roster database.
///
/// SQLite connections are cheap and not shareable across threads, so every
/// operation opens its own connection on the blocking pool. Concurrent writers
/// are serialized by SQLite itself; the busy timeout keeps them from failing
/// immediately on a locked database.
#[derive(Clone, Debug)]
pub struct Store {
    database_url: Arc<str>,
}

/// Default database location under the platform cache directory.
pub fn default_db_path() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .context("Failed to determine cache directory for this platform")?;

    let dir = cache_dir.join("rostersync");

    std::fs::create_dir_all(&dir)
        .context("Failed to create rostersync data directory")?;

    Ok(dir.join("roster.db"))
}

impl Store {
    /// Opens (creating if needed) the database at `db_path` and runs pending migrations.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let database_url = db_path.display().to_string();
        info!(path = %database_url, "opening roster database");

        let mut conn = SqliteConnection::establish(&database_url)
            .context("Failed to connect to roster database")?;

        // Must run outside of a transaction.
        conn.batch_execute("PRAGMA journal_mode = WAL;")
            .context("Failed to enable WAL mode")?;

        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;

        debug!("roster database migrations applied");

        Ok(Self {
            database_url: database_url.into(),
        })
    }

    pub(crate) async fn with_connection<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T, StoreError> + Send + 'static,
    {
        let url = Arc::clone(&self.database_url);
        tokio::task::spawn_blocking(move || {
            let mut conn = establish(&url)?;
            op(&mut conn)
        })
        .await?
    }
}

fn establish(url: &str) -> Result<SqliteConnection, StoreError> {
    let mut conn = SqliteConnection::establish(url)?;
    conn.batch_execute("PRAGMA busy_timeout = 5000; PRAGMA foreign_keys = ON;")?;
    Ok(conn)
}
