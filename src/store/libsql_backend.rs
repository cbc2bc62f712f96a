//! libSQL backend — async `UserStore` implementation.
//!
//! Supports local file and in-memory databases. In-memory is used by the
//! test suites; the binary opens a file under `REGISTRAR_DB_PATH`.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::info;

use crate::error::StorageError;
use crate::store::migrations;
use crate::store::model::{NewUser, User};
use crate::store::traits::UserStore;

/// Select list shared by every user query. Order matches `row_to_user`.
const USER_COLUMNS: &str = "telegram_id, full_name, email, phone_number, is_admin, created_at";

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Open(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StorageError::Open(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StorageError::Open(format!("Failed to create connection: {e}")))?;

        migrations::run_migrations(&conn).await?;
        info!(path = %path.display(), "Database opened");

        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    /// Create an in-memory database (for tests).
    pub async fn memory() -> Result<Self, StorageError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StorageError::Open(format!("Failed to create in-memory database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StorageError::Open(format!("Failed to create connection: {e}")))?;

        migrations::run_migrations(&conn).await?;

        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

/// Map a libsql row to a User.
///
/// Column order matches USER_COLUMNS:
/// 0:telegram_id, 1:full_name, 2:email, 3:phone_number, 4:is_admin, 5:created_at
fn row_to_user(row: &libsql::Row) -> Result<User, libsql::Error> {
    let telegram_id: i64 = row.get(0)?;
    let full_name: String = row.get(1)?;
    let email: String = row.get(2)?;
    let phone_number: String = row.get(3)?;
    let is_admin: i64 = row.get(4)?;
    let created_str: String = row.get(5)?;

    Ok(User {
        telegram_id,
        full_name,
        email,
        phone_number,
        is_admin: is_admin != 0,
        created_at: parse_datetime(&created_str),
    })
}

/// Distinguish uniqueness violations from other insert failures.
fn map_insert_err(e: libsql::Error) -> StorageError {
    let msg = e.to_string();
    if msg.contains("UNIQUE constraint failed") {
        StorageError::Constraint(msg)
    } else {
        StorageError::Query(msg)
    }
}

/// Run a single-user query and map the optional first row.
async fn fetch_optional_user(
    conn: &Connection,
    sql: &str,
    query_params: impl libsql::params::IntoParams,
) -> Result<Option<User>, StorageError> {
    let mut rows = conn
        .query(sql, query_params)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

    let row = rows
        .next()
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

    match row {
        Some(row) => {
            let user = row_to_user(&row).map_err(|e| StorageError::Query(e.to_string()))?;
            Ok(Some(user))
        }
        None => Ok(None),
    }
}

/// Run a multi-user query and collect the rows.
async fn fetch_users(
    conn: &Connection,
    sql: &str,
    query_params: impl libsql::params::IntoParams,
) -> Result<Vec<User>, StorageError> {
    let mut rows = conn
        .query(sql, query_params)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

    let mut users = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?
    {
        users.push(row_to_user(&row).map_err(|e| StorageError::Query(e.to_string()))?);
    }
    Ok(users)
}

// ── UserStore implementation ────────────────────────────────────────

#[async_trait]
impl UserStore for LibSqlBackend {
    async fn find_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>, StorageError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE telegram_id = ?1");
        fetch_optional_user(self.conn(), &sql, params![telegram_id]).await
    }

    async fn find_by_email_or_telegram_id(
        &self,
        email: &str,
        telegram_id: i64,
    ) -> Result<Option<User>, StorageError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?1 OR telegram_id = ?2 LIMIT 1"
        );
        fetch_optional_user(self.conn(), &sql, params![email, telegram_id]).await
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StorageError> {
        let created_at = Utc::now();

        self.conn()
            .execute(
                "INSERT INTO users (telegram_id, full_name, email, phone_number, is_admin, created_at)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5)",
                params![
                    new_user.telegram_id,
                    new_user.full_name.as_str(),
                    new_user.email.as_str(),
                    new_user.phone_number.as_str(),
                    created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(map_insert_err)?;

        Ok(User {
            telegram_id: new_user.telegram_id,
            full_name: new_user.full_name,
            email: new_user.email,
            phone_number: new_user.phone_number,
            is_admin: false,
            created_at,
        })
    }

    async fn update(&self, user: &User) -> Result<(), StorageError> {
        self.conn()
            .execute(
                "UPDATE users
                 SET full_name = ?1, email = ?2, phone_number = ?3, is_admin = ?4
                 WHERE telegram_id = ?5",
                params![
                    user.full_name.as_str(),
                    user.email.as_str(),
                    user.phone_number.as_str(),
                    user.is_admin as i64,
                    user.telegram_id,
                ],
            )
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, telegram_id: i64) -> Result<bool, StorageError> {
        let affected = self
            .conn()
            .execute(
                "DELETE FROM users WHERE telegram_id = ?1",
                params![telegram_id],
            )
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;
        Ok(affected > 0)
    }

    async fn count(&self) -> Result<u64, StorageError> {
        let mut rows = self
            .conn()
            .query("SELECT COUNT(*) FROM users", ())
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;

        let row = rows
            .next()
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let count: i64 = row.get(0).map_err(|e| StorageError::Query(e.to_string()))?;
                Ok(count as u64)
            }
            None => Ok(0),
        }
    }

    async fn find_page(&self, limit: u32, offset: u64) -> Result<Vec<User>, StorageError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id LIMIT ?1 OFFSET ?2");
        fetch_users(self.conn(), &sql, params![limit as i64, offset as i64]).await
    }

    async fn find_admins(&self) -> Result<Vec<User>, StorageError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE is_admin = 1 ORDER BY id");
        fetch_users(self.conn(), &sql, ()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(telegram_id: i64, name: &str, email: &str) -> NewUser {
        NewUser {
            telegram_id,
            full_name: name.into(),
            email: email.into(),
            phone_number: "1234567890".into(),
        }
    }

    #[tokio::test]
    async fn create_and_find() {
        let store = LibSqlBackend::memory().await.unwrap();

        let user = store
            .create(new_user(100, "Ann", "ann@example.com"))
            .await
            .unwrap();
        assert!(!user.is_admin);

        let found = store.find_by_telegram_id(100).await.unwrap().unwrap();
        assert_eq!(found.full_name, "Ann");
        assert_eq!(found.email, "ann@example.com");
        assert!(!found.is_admin);

        assert!(store.find_by_telegram_id(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn uniqueness_probe_matches_either_field() {
        let store = LibSqlBackend::memory().await.unwrap();
        store
            .create(new_user(100, "Ann", "ann@example.com"))
            .await
            .unwrap();

        // Same email, different id
        let by_email = store
            .find_by_email_or_telegram_id("ann@example.com", 200)
            .await
            .unwrap();
        assert!(by_email.is_some());

        // Same id, different email
        let by_id = store
            .find_by_email_or_telegram_id("other@example.com", 100)
            .await
            .unwrap();
        assert!(by_id.is_some());

        // Neither
        let neither = store
            .find_by_email_or_telegram_id("other@example.com", 200)
            .await
            .unwrap();
        assert!(neither.is_none());
    }

    #[tokio::test]
    async fn duplicate_create_is_constraint_error() {
        let store = LibSqlBackend::memory().await.unwrap();
        store
            .create(new_user(100, "Ann", "ann@example.com"))
            .await
            .unwrap();

        let err = store
            .create(new_user(100, "Ann Again", "ann2@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Constraint(_)));
    }

    #[tokio::test]
    async fn update_persists_admin_flag() {
        let store = LibSqlBackend::memory().await.unwrap();
        let mut user = store
            .create(new_user(100, "Ann", "ann@example.com"))
            .await
            .unwrap();

        user.is_admin = true;
        store.update(&user).await.unwrap();

        let found = store.find_by_telegram_id(100).await.unwrap().unwrap();
        assert!(found.is_admin);

        let admins = store.find_admins().await.unwrap();
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0].telegram_id, 100);
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let store = LibSqlBackend::memory().await.unwrap();
        store
            .create(new_user(100, "Ann", "ann@example.com"))
            .await
            .unwrap();

        assert!(store.delete(100).await.unwrap());
        assert!(store.find_by_telegram_id(100).await.unwrap().is_none());

        // Deleting again is a no-op
        assert!(!store.delete(100).await.unwrap());
    }

    #[tokio::test]
    async fn count_and_pagination_in_registration_order() {
        let store = LibSqlBackend::memory().await.unwrap();
        for i in 1..=25 {
            store
                .create(new_user(i, &format!("User {i}"), &format!("u{i}@example.com")))
                .await
                .unwrap();
        }

        assert_eq!(store.count().await.unwrap(), 25);

        let page1 = store.find_page(10, 0).await.unwrap();
        assert_eq!(page1.len(), 10);
        assert_eq!(page1[0].telegram_id, 1);

        let page3 = store.find_page(10, 20).await.unwrap();
        assert_eq!(page3.len(), 5);
        assert_eq!(page3[0].telegram_id, 21);

        let past_end = store.find_page(10, 30).await.unwrap();
        assert!(past_end.is_empty());
    }

    #[tokio::test]
    async fn open_creates_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registrar.db");

        let store = LibSqlBackend::open(&path).await.unwrap();
        store
            .create(new_user(1, "Ann", "ann@example.com"))
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
        assert!(path.exists());
    }
}
