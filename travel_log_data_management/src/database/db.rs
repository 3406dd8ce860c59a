use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use const_format::concatcp;
use sqlx::{query, query_as, sqlite::SqliteConnectOptions, Executor, Pool, Sqlite, SqlitePool};

use crate::{store::KeyValueStore, DataManagerError};

use super::constants::*;

/// Key-value store backed by a single SQLite table.
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    pub async fn connect(path: &Path) -> Result<Self, DataManagerError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options).await
            .map_err(|err| DataManagerError::Database(format!("Failed to connect to database {:?}: {err}", path)))?;

        let db = Self {
            pool
        };

        db.init().await?;

        Ok(db)
    }

    async fn init(&self) -> Result<(), DataManagerError> {
        self.pool.execute(concatcp!("
            CREATE TABLE IF NOT EXISTS ", KEY_VALUE_TABLE_NAME, "(",
                KEY,        " TEXT PRIMARY KEY NOT NULL,",
                VALUE,      " BLOB NOT NULL,",
                UPDATED_AT, " TIMESTAMP NOT NULL
            )")).await
            .map_err(|err| DataManagerError::Database(format!("Failed to create tables: {err}")))
            .map(|_| ())
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DataManagerError> {
        query_as::<_, (Vec<u8>,)>(concatcp!("SELECT ", VALUE, " FROM ", KEY_VALUE_TABLE_NAME, " WHERE ", KEY, " = ?1"))
            .bind(key)
            .fetch_optional(&self.pool).await
            .map_err(|err| DataManagerError::Database(format!("Failed to read {key}: {err}")))
            .map(|row| row.map(|row| row.0))
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), DataManagerError> {
        query(concatcp!("
            INSERT INTO ", KEY_VALUE_TABLE_NAME, "(", KEY, ", ", VALUE, ", ", UPDATED_AT, ")
            VALUES (?1, ?2, ?3)
            ON CONFLICT(", KEY, ") DO UPDATE SET ", VALUE, " = excluded.", VALUE, ", ", UPDATED_AT, " = excluded.", UPDATED_AT))
            .bind(key)
            .bind(value)
            .bind(Utc::now())
            .execute(&self.pool).await
            .map_err(|err| DataManagerError::Database(format!("Failed to write {key}: {err}")))
            .map(|_| ())
    }
}
