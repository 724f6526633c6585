//! SQLite persistence for groups and members.
//!
//! The connection pool is built lazily on first use and shared for the life
//! of the process. Schema creation is idempotent and runs whenever a pool is
//! created, and again before every full read.

mod group_repo;
mod member_repo;

pub use group_repo::GroupRepository;
pub use member_repo::MemberRepository;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tokio::sync::OnceCell;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS roast_groups (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS roast_members (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        group_id INTEGER NOT NULL REFERENCES roast_groups(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        checked_in INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_roast_members_group_id ON roast_members(group_id)",
];

/// Errors raised by the store.
#[derive(Debug)]
pub enum StoreError {
    /// The referenced entity does not exist. Holds the entity kind.
    NotFound(&'static str),
    /// A member update carried neither a name nor a check-in flag.
    NoFieldsProvided,
    /// The underlying database failed or was unreachable.
    Database(sqlx::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(entity) => write!(f, "{} not found", entity),
            StoreError::NoFieldsProvided => write!(f, "No fields provided"),
            StoreError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Database(e)
    }
}

/// Process-wide handle to the database.
///
/// Nothing touches the database until the first call to [`Store::pool`].
#[derive(Debug)]
pub struct Store {
    options: SqliteConnectOptions,
    pool: OnceCell<SqlitePool>,
}

impl Store {
    /// Creates a store for `database_url`, which is either a `sqlite:` URL or
    /// a plain file path.
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        let url = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            let path = Path::new(database_url);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
            }
            format!("sqlite:{}?mode=rwc", path.display())
        };

        let options = SqliteConnectOptions::from_str(&url)?
            .foreign_keys(true)
            .create_if_missing(true);

        Ok(Self {
            options,
            pool: OnceCell::new(),
        })
    }

    /// Returns the shared pool, connecting and bootstrapping the schema on
    /// first use.
    pub async fn pool(&self) -> Result<&SqlitePool, StoreError> {
        self.pool
            .get_or_try_init(|| async {
                tracing::info!("Opening database {}", self.options.get_filename().display());
                let pool = SqlitePoolOptions::new()
                    .max_connections(5)
                    .connect_with(self.options.clone())
                    .await?;
                ensure_schema(&pool).await?;
                Ok::<_, StoreError>(pool)
            })
            .await
    }

    pub async fn groups(&self) -> Result<GroupRepository, StoreError> {
        Ok(GroupRepository::new(self.pool().await?.clone()))
    }

    pub async fn members(&self) -> Result<MemberRepository, StoreError> {
        Ok(MemberRepository::new(self.pool().await?.clone()))
    }
}

/// Creates the group and member tables if they are absent.
///
/// Safe to call any number of times.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), StoreError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Timestamps are stored as fixed-width RFC 3339 text so that they sort
/// lexically in creation order.
fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Store;
    use tempfile::TempDir;

    pub struct TestStore {
        pub store: Store,
        _temp_dir: TempDir, // Keep alive for duration of test
    }

    pub fn test_store() -> TestStore {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        TestStore {
            store: Store::new(db_path.to_str().unwrap()).unwrap(),
            _temp_dir: temp_dir,
        }
    }
}
