//! SQLite implementation of the local store.

use async_trait::async_trait;
use color_eyre::Result as EyreResult;
use futures::StreamExt;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use super::traits::{LocalStore, QueryCursor, WatchStream};
use crate::db::Database;
use crate::error::StoreError;
use crate::github::types::{OwnerRecord, RepositoryRecord};

const REPOSITORY_COLUMNS: &str = "id, name, full_name, description, owner_avatar_url, html_url, \
  stargazers_count, forks_count, open_issues_count, last_updated, language, license";

const UPSERT_REPOSITORY: &str = "INSERT OR REPLACE INTO repositories
  (id, name, full_name, description, owner_avatar_url, html_url,
   stargazers_count, forks_count, open_issues_count, last_updated, language, license)
  VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)";

const UPSERT_OWNER: &str =
  "INSERT OR REPLACE INTO owners (id, username, avatar_url) VALUES (?1, ?2, ?3)";

/// SQLite-backed store.
///
/// Every call runs on the blocking pool. Writes to the repositories table bump
/// a watch channel that drives all open item streams.
pub struct SqliteStorage {
  conn: Arc<Mutex<Connection>>,
  items_changed: watch::Sender<u64>,
}

impl SqliteStorage {
  pub fn open(path: &Path) -> EyreResult<Self> {
    Ok(Self::from_database(Database::open(path)?))
  }

  pub fn open_in_memory() -> EyreResult<Self> {
    Ok(Self::from_database(Database::open_in_memory()?))
  }

  fn from_database(db: Database) -> Self {
    let (items_changed, _) = watch::channel(0);
    Self {
      conn: Arc::new(Mutex::new(db.into_connection())),
      items_changed,
    }
  }

  async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
  where
    T: Send + 'static,
    F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Send + 'static,
  {
    let conn = Arc::clone(&self.conn);
    tokio::task::spawn_blocking(move || -> Result<T, StoreError> {
      let mut guard = conn.lock().map_err(|e| StoreError::Lock(e.to_string()))?;
      Ok(f(&mut *guard)?)
    })
    .await?
  }

  /// Run raw SQL against the store, bypassing change notification.
  #[cfg(test)]
  pub(crate) fn execute_batch(&self, sql: &str) -> rusqlite::Result<()> {
    let guard = self.conn.lock().unwrap();
    guard.execute_batch(sql)
  }

  fn notify_items_changed(&self) {
    self.items_changed.send_modify(|version| *version = version.wrapping_add(1));
  }

  /// Stream `query` now and again after every repositories write.
  fn observe<T, F>(&self, query: F) -> WatchStream<T>
  where
    T: Send + 'static,
    F: Fn(&Connection) -> Result<T, StoreError> + Send + Sync + 'static,
  {
    let conn = Arc::clone(&self.conn);
    let query = Arc::new(query);

    tokio_stream::wrappers::WatchStream::new(self.items_changed.subscribe())
      .then(move |_| {
        let conn = Arc::clone(&conn);
        let query = Arc::clone(&query);
        async move {
          tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|e| StoreError::Lock(e.to_string()))?;
            (*query)(&*guard)
          })
          .await?
        }
      })
      .boxed()
  }
}

fn read_repository(row: &Row<'_>) -> rusqlite::Result<RepositoryRecord> {
  Ok(RepositoryRecord {
    id: row.get(0)?,
    name: row.get(1)?,
    full_name: row.get(2)?,
    description: row.get(3)?,
    owner_avatar_url: row.get(4)?,
    html_url: row.get(5)?,
    stargazers_count: row.get(6)?,
    forks_count: row.get(7)?,
    open_issues_count: row.get(8)?,
    last_updated: row.get(9)?,
    language: row.get(10)?,
    license: row.get(11)?,
  })
}

fn write_repository(conn: &Connection, repo: &RepositoryRecord) -> rusqlite::Result<usize> {
  conn.prepare_cached(UPSERT_REPOSITORY)?.execute(params![
    repo.id,
    repo.name,
    repo.full_name,
    repo.description,
    repo.owner_avatar_url,
    repo.html_url,
    repo.stargazers_count,
    repo.forks_count,
    repo.open_issues_count,
    repo.last_updated,
    repo.language,
    repo.license,
  ])
}

fn write_owner(conn: &Connection, owner: &OwnerRecord) -> rusqlite::Result<usize> {
  conn
    .prepare_cached(UPSERT_OWNER)?
    .execute(params![owner.id, owner.username, owner.avatar_url])
}

/// LIKE pattern matching values that start with `prefix`; LIKE is
/// case-insensitive for ASCII in SQLite.
fn like_prefix(prefix: &str) -> String {
  let mut pattern = String::with_capacity(prefix.len() + 1);
  for c in prefix.chars() {
    if matches!(c, '\\' | '%' | '_') {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  pattern
}

fn select_repositories(
  conn: &Connection,
  language_prefix: Option<&str>,
  offset: usize,
  limit: Option<usize>,
) -> rusqlite::Result<Vec<RepositoryRecord>> {
  // SQLite treats a negative LIMIT as unbounded
  let limit = limit.map(|l| l as i64).unwrap_or(-1);
  let offset = offset as i64;

  match language_prefix {
    Some(prefix) => {
      let sql = format!(
        "SELECT {} FROM repositories WHERE language LIKE ?1 ESCAPE '\\' \
         ORDER BY id ASC LIMIT ?2 OFFSET ?3",
        REPOSITORY_COLUMNS
      );
      let mut stmt = conn.prepare_cached(&sql)?;
      let rows = stmt.query_map(params![like_prefix(prefix), limit, offset], read_repository)?;
      rows.collect()
    }
    None => {
      let sql = format!(
        "SELECT {} FROM repositories ORDER BY id ASC LIMIT ?1 OFFSET ?2",
        REPOSITORY_COLUMNS
      );
      let mut stmt = conn.prepare_cached(&sql)?;
      let rows = stmt.query_map(params![limit, offset], read_repository)?;
      rows.collect()
    }
  }
}

fn select_repository(conn: &Connection, id: i64) -> rusqlite::Result<Option<RepositoryRecord>> {
  let sql = format!("SELECT {} FROM repositories WHERE id = ?1", REPOSITORY_COLUMNS);
  conn
    .prepare_cached(&sql)?
    .query_row(params![id], read_repository)
    .optional()
}

#[async_trait]
impl LocalStore for SqliteStorage {
  async fn upsert_item(&self, item: RepositoryRecord) -> Result<(), StoreError> {
    self
      .with_conn(move |conn| write_repository(conn, &item).map(|_| ()))
      .await?;
    self.notify_items_changed();
    Ok(())
  }

  async fn upsert_items(&self, items: Vec<RepositoryRecord>) -> Result<(), StoreError> {
    if items.is_empty() {
      return Ok(());
    }
    self
      .with_conn(move |conn| {
        let tx = conn.transaction()?;
        for item in &items {
          write_repository(&tx, item)?;
        }
        tx.commit()
      })
      .await?;
    self.notify_items_changed();
    Ok(())
  }

  async fn upsert_owner(&self, owner: OwnerRecord) -> Result<(), StoreError> {
    self
      .with_conn(move |conn| write_owner(conn, &owner).map(|_| ()))
      .await
  }

  async fn upsert_owners(&self, owners: Vec<OwnerRecord>) -> Result<(), StoreError> {
    if owners.is_empty() {
      return Ok(());
    }
    self
      .with_conn(move |conn| {
        let tx = conn.transaction()?;
        for owner in &owners {
          write_owner(&tx, owner)?;
        }
        tx.commit()
      })
      .await
  }

  async fn get_item_by_id(&self, id: i64) -> Result<Option<RepositoryRecord>, StoreError> {
    self.with_conn(move |conn| select_repository(conn, id)).await
  }

  async fn get_owner_by_id(&self, id: i64) -> Result<Option<OwnerRecord>, StoreError> {
    self
      .with_conn(move |conn| {
        conn
          .prepare_cached("SELECT id, username, avatar_url FROM owners WHERE id = ?1")?
          .query_row(params![id], |row| {
            Ok(OwnerRecord {
              id: row.get(0)?,
              username: row.get(1)?,
              avatar_url: row.get(2)?,
            })
          })
          .optional()
      })
      .await
  }

  async fn count_items(&self) -> Result<u64, StoreError> {
    self
      .with_conn(|conn| {
        conn.query_row("SELECT COUNT(*) FROM repositories", [], |row| {
          row.get::<_, i64>(0)
        })
      })
      .await
      .map(|n| n as u64)
  }

  async fn count_owners(&self) -> Result<u64, StoreError> {
    self
      .with_conn(|conn| {
        conn.query_row("SELECT COUNT(*) FROM owners", [], |row| row.get::<_, i64>(0))
      })
      .await
      .map(|n| n as u64)
  }

  async fn max_item_id(&self) -> Result<Option<i64>, StoreError> {
    self
      .with_conn(|conn| conn.query_row("SELECT MAX(id) FROM repositories", [], |row| row.get(0)))
      .await
  }

  async fn items_window(
    &self,
    language_prefix: Option<String>,
    offset: usize,
    limit: usize,
  ) -> Result<Vec<RepositoryRecord>, StoreError> {
    self
      .with_conn(move |conn| select_repositories(conn, language_prefix.as_deref(), offset, Some(limit)))
      .await
  }

  async fn get_cursor(&self, query: &str) -> Result<Option<QueryCursor>, StoreError> {
    let query = query.to_string();
    self
      .with_conn(move |conn| {
        conn
          .prepare_cached("SELECT query, next_page FROM remote_pages WHERE query = ?1 LIMIT 1")?
          .query_row(params![query], |row| {
            Ok(QueryCursor {
              query: row.get(0)?,
              next_page: row.get(1)?,
            })
          })
          .optional()
      })
      .await
  }

  async fn set_cursor(&self, query: &str, next_page: Option<u32>) -> Result<(), StoreError> {
    let query = query.to_string();
    self
      .with_conn(move |conn| {
        conn
          .execute(
            "INSERT INTO remote_pages (query, next_page) VALUES (?1, ?2)
             ON CONFLICT(query) DO UPDATE SET next_page = excluded.next_page",
            params![query, next_page],
          )
          .map(|_| ())
      })
      .await
  }

  fn observe_all_items(&self) -> WatchStream<Vec<RepositoryRecord>> {
    self.observe(|conn| Ok(select_repositories(conn, None, 0, None)?))
  }

  fn observe_items_by_language_prefix(&self, prefix: &str) -> WatchStream<Vec<RepositoryRecord>> {
    let prefix = prefix.to_string();
    self.observe(move |conn| Ok(select_repositories(conn, Some(&prefix), 0, None)?))
  }

  fn observe_item_by_id(&self, id: i64) -> WatchStream<RepositoryRecord> {
    self.observe(move |conn| select_repository(conn, id)?.ok_or(StoreError::NotFound(id)))
  }
}
