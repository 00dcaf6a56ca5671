pub mod schema;

use color_eyre::{eyre::eyre, Result};
use rusqlite::Connection;
use std::path::Path;
use tracing::warn;

/// Database connection wrapper for the cache
pub struct Database {
  conn: Connection,
}

impl Database {
  /// Open or create the database at `path`
  pub fn open(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create database directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open database at {}: {}", path.display(), e))?;

    let db = Self { conn };
    db.run_migrations()?;

    Ok(db)
  }

  /// Open a private in-memory database
  pub fn open_in_memory() -> Result<Self> {
    let conn =
      Connection::open_in_memory().map_err(|e| eyre!("Failed to open in-memory database: {}", e))?;

    let db = Self { conn };
    db.run_migrations()?;

    Ok(db)
  }

  /// Create tables, resetting the cache when the stored schema version differs
  fn run_migrations(&self) -> Result<()> {
    let version: i64 = self
      .conn
      .query_row("PRAGMA user_version", [], |row| row.get(0))
      .map_err(|e| eyre!("Failed to read schema version: {}", e))?;

    if version != 0 && version != schema::SCHEMA_VERSION {
      warn!(
        found = version,
        expected = schema::SCHEMA_VERSION,
        "Cache schema version mismatch, resetting cache"
      );
      self
        .conn
        .execute_batch(schema::DROP_ALL)
        .map_err(|e| eyre!("Failed to reset cache: {}", e))?;
    }

    self
      .conn
      .execute_batch(schema::SCHEMA)
      .map_err(|e| eyre!("Failed to run migrations: {}", e))?;

    self
      .conn
      .pragma_update(None, "user_version", schema::SCHEMA_VERSION)
      .map_err(|e| eyre!("Failed to record schema version: {}", e))?;

    Ok(())
  }

  /// Get a reference to the connection
  pub fn conn(&self) -> &Connection {
    &self.conn
  }

  pub fn into_connection(self) -> Connection {
    self.conn
  }
}
