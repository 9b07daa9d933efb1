//! `DuckDB` connection pool management.
//!
//! A single database instance is opened per warehouse; every pooled handle is a
//! clone of the root connection so concurrent writers share one catalog and
//! one write-ahead log.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ::duckdb::Connection;
use parking_lot::Mutex;

struct PoolInner {
    db_path: PathBuf,
    max_pool_size: usize,
    root: Mutex<Connection>,
    idle: Mutex<Vec<Connection>>,
}

/// A connection pool manager for `DuckDB` connections.
#[derive(Clone)]
pub struct DuckDbConnectionManager {
    inner: Arc<PoolInner>,
}

impl DuckDbConnectionManager {
    /// Open the database file and create a pool around it.
    ///
    /// # Arguments
    /// * `path` - Path to the `DuckDB` database file
    /// * `max_pool_size` - Maximum number of idle connections kept for reuse
    ///
    /// # Errors
    /// Returns an error if the database file cannot be opened or configured.
    pub fn open(path: impl Into<PathBuf>, max_pool_size: usize) -> Result<Self, ::duckdb::Error> {
        let db_path = path.into();
        let root = Connection::open(db_path.as_path())?;
        configure_connection(&root)?;

        Ok(Self {
            inner: Arc::new(PoolInner {
                db_path,
                max_pool_size: max_pool_size.max(1),
                root: Mutex::new(root),
                idle: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Acquire a connection from the pool, cloning the root handle when no
    /// idle connection is available.
    ///
    /// # Errors
    /// Returns an error if a new handle cannot be cloned or configured.
    pub fn acquire(&self) -> Result<PooledConnection, ::duckdb::Error> {
        let connection = self.inner.idle.lock().pop();

        let connection = match connection {
            Some(connection) => connection,
            None => {
                let connection = self.inner.root.lock().try_clone()?;
                configure_connection(&connection)?;
                connection
            }
        };

        Ok(PooledConnection {
            pool: Arc::clone(&self.inner),
            connection: Some(connection),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        self.inner.db_path.as_path()
    }
}

/// A pooled connection that returns to the pool when dropped.
pub struct PooledConnection {
    pool: Arc<PoolInner>,
    connection: Option<Connection>,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        self.connection
            .as_ref()
            .expect("pooled connection unexpectedly missing")
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.connection
            .as_mut()
            .expect("pooled connection unexpectedly missing")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };

        let mut idle = self.pool.idle.lock();
        if idle.len() < self.pool.max_pool_size {
            idle.push(connection);
        }
    }
}

fn configure_connection(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch("PRAGMA disable_progress_bar;")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn released_connections_are_reused() {
        let temp = tempdir().expect("tempdir");
        let manager =
            DuckDbConnectionManager::open(temp.path().join("pool.duckdb"), 1).expect("open");

        {
            let first = manager.acquire().expect("first");
            first
                .execute_batch("CREATE TABLE t (id INTEGER); INSERT INTO t VALUES (7);")
                .expect("create");
        }
        assert_eq!(manager.inner.idle.lock().len(), 1);

        let second = manager.acquire().expect("second");
        let value: i32 = second
            .query_row("SELECT id FROM t", [], |row| row.get(0))
            .expect("read back");
        assert_eq!(value, 7);
        assert!(manager.inner.idle.lock().is_empty());
    }

    #[test]
    fn concurrent_handles_share_one_catalog() {
        let temp = tempdir().expect("tempdir");
        let manager =
            DuckDbConnectionManager::open(temp.path().join("pool.duckdb"), 2).expect("open");

        let writer = manager.acquire().expect("writer");
        let reader = manager.acquire().expect("reader");
        writer
            .execute_batch("CREATE TABLE shared (v TEXT); INSERT INTO shared VALUES ('x');")
            .expect("write");
        let count: i64 = reader
            .query_row("SELECT COUNT(*) FROM shared", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 1);
    }
}
