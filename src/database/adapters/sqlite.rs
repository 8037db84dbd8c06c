//! SQLite database adapter implementation

use super::PoolTimings;
use crate::database::adapter::{DatabaseAdapter, QueryResult};
use crate::database::config::DatabaseConnectionConfig;
use crate::database::{DialectProvider, SqlValue};
use crate::error::{QueryError, Result};
use crate::query_builder::Dialect;
use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool, ValueRef};
use std::sync::Arc;

/// SQLite database adapter
#[derive(Clone)]
pub struct SqliteAdapter {
    name: String,
    pool: Arc<SqlitePool>,
}

impl SqliteAdapter {
    /// Connect with default pool settings
    pub async fn new(name: impl Into<String>, connection_url: &str) -> Result<Self> {
        Self::connect(name, &DatabaseConnectionConfig::new(connection_url)).await
    }

    /// Connect using the pool settings of `config`
    pub async fn connect(
        name: impl Into<String>,
        config: &DatabaseConnectionConfig,
    ) -> Result<Self> {
        let timings = PoolTimings::from(config);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(timings.acquire_timeout)
            .idle_timeout(timings.idle_timeout)
            .max_lifetime(timings.max_lifetime)
            .connect(&config.url)
            .await
            .map_err(|e| QueryError::database(format!("Failed to connect to SQLite: {}", e)))?;

        Ok(Self::from_pool(name, pool))
    }

    /// Create adapter from existing pool
    pub fn from_pool(name: impl Into<String>, pool: SqlitePool) -> Self {
        Self {
            name: name.into(),
            pool: Arc::new(pool),
        }
    }

    /// Get reference to the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Bind one argument using SQLite's storage classes
    pub fn bind_param<'q>(
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
        value: SqlValue,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        match value {
            SqlValue::Null => query.bind(None::<i32>), // SQLite accepts NULL for any type
            SqlValue::Bool(b) => query.bind(if b { 1i32 } else { 0i32 }),

            // Integer types - SQLite stores all as INTEGER
            SqlValue::TinyInt(i) => query.bind(i as i32),
            SqlValue::SmallInt(i) => query.bind(i as i32),
            SqlValue::Int(i) => query.bind(i),
            SqlValue::BigInt(i) => query.bind(i),

            SqlValue::UnsignedTinyInt(i) => query.bind(i as i32),
            SqlValue::UnsignedSmallInt(i) => query.bind(i as i32),
            SqlValue::UnsignedInt(i) => query.bind(i as i64),
            // INTEGER is 8 bytes signed; larger values go in as text
            SqlValue::UnsignedBigInt(i) => match i64::try_from(i) {
                Ok(v) => query.bind(v),
                Err(_) => query.bind(i.to_string()),
            },

            SqlValue::Float(f) => query.bind(f as f64),
            SqlValue::Double(f) => query.bind(f),
            SqlValue::Decimal(d) => query.bind(d.to_string()), // no native decimal

            SqlValue::String(s) => query.bind(s),
            SqlValue::Bytes(b) => query.bind(b),

            // Semantic types - all stored as text in SQLite
            SqlValue::Uuid(s) => query.bind(s),
            SqlValue::Json(j) => query.bind(j.to_string()),
            SqlValue::Date(s) => query.bind(s),
            SqlValue::Time(s) => query.bind(s),
            SqlValue::DateTime(s) => query.bind(s),
            array @ SqlValue::Array(_) => query.bind(array.to_json().to_string()),
        }
    }

    fn prepare<'q>(sql: &'q str, params: Vec<SqlValue>) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        params
            .into_iter()
            .fold(sqlx::query(sql), |query, param| Self::bind_param(query, param))
    }

    /// Decode the first column of a row
    ///
    /// SQLite is dynamically typed, so only the storage classes matter.
    fn decode_scalar(row: &SqliteRow) -> Result<SqlValue> {
        let raw = row.try_get_raw(0)?;
        if raw.is_null() {
            return Ok(SqlValue::Null);
        }

        if let Ok(v) = row.try_get::<i64, _>(0) {
            return Ok(SqlValue::BigInt(v));
        }
        if let Ok(v) = row.try_get::<f64, _>(0) {
            return Ok(SqlValue::Double(v));
        }
        if let Ok(v) = row.try_get::<String, _>(0) {
            return Ok(SqlValue::String(v));
        }
        row.try_get::<Vec<u8>, _>(0)
            .map(SqlValue::Bytes)
            .map_err(|e| QueryError::database(format!("SQLite scalar decode failed: {}", e)))
    }
}

impl DialectProvider for SqliteAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }
}

#[async_trait]
impl DatabaseAdapter for SqliteAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, sql: &str, params: Vec<SqlValue>) -> Result<QueryResult> {
        #[cfg(debug_assertions)]
        {
            log::debug!("SQLite EXECUTE: {}", sql);
            log::debug!("  Parameters: {:?}", params);
        }

        let result = Self::prepare(sql, params)
            .execute(&*self.pool)
            .await
            .map_err(|e| QueryError::database(format!("SQLite execute failed: {}", e)))?;

        Ok(QueryResult {
            rows_affected: result.rows_affected(),
            last_insert_id: Some(result.last_insert_rowid()),
        })
    }

    async fn fetch_scalar(&self, sql: &str, params: Vec<SqlValue>) -> Result<SqlValue> {
        #[cfg(debug_assertions)]
        {
            log::debug!("SQLite FETCH_SCALAR: {}", sql);
            log::debug!("  Parameters: {:?}", params);
        }

        let rows = Self::prepare(sql, params)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| QueryError::database(format!("SQLite fetch failed: {}", e)))?;

        match rows.last() {
            Some(row) => Self::decode_scalar(row),
            None => Ok(SqlValue::Null),
        }
    }

    async fn ping(&self) -> Result<bool> {
        sqlx::query("SELECT 1")
            .fetch_one(&*self.pool)
            .await
            .map(|_| true)
            .map_err(|e| QueryError::database(format!("SQLite ping failed: {}", e)))
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn clone_box(&self) -> Box<dyn DatabaseAdapter> {
        Box::new(self.clone())
    }
}
