//! MySQL database adapter implementation

use super::PoolTimings;
use crate::database::adapter::{DatabaseAdapter, QueryResult};
use crate::database::config::DatabaseConnectionConfig;
use crate::database::{DialectProvider, SqlValue};
use crate::error::{QueryError, Result};
use crate::query_builder::Dialect;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::mysql::{MySqlArguments, MySqlPoolOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::{MySql, MySqlPool, Row, ValueRef};
use std::sync::Arc;

/// MySQL database adapter
#[derive(Clone)]
pub struct MySqlAdapter {
    name: String,
    pool: Arc<MySqlPool>,
}

impl MySqlAdapter {
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
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(timings.acquire_timeout)
            .idle_timeout(timings.idle_timeout)
            .max_lifetime(timings.max_lifetime)
            .connect(&config.url)
            .await
            .map_err(|e| QueryError::database(format!("Failed to connect to MySQL: {}", e)))?;

        Ok(Self::from_pool(name, pool))
    }

    /// Create adapter from existing pool
    pub fn from_pool(name: impl Into<String>, pool: MySqlPool) -> Self {
        Self {
            name: name.into(),
            pool: Arc::new(pool),
        }
    }

    /// Get reference to the underlying pool
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Bind one argument with the closest native MySQL type
    pub fn bind_param<'q>(
        query: Query<'q, MySql, MySqlArguments>,
        value: SqlValue,
    ) -> Query<'q, MySql, MySqlArguments> {
        match value {
            SqlValue::Null => query.bind(None::<Vec<u8>>), // MySQL accepts NULL for any type
            SqlValue::Bool(b) => query.bind(b),

            SqlValue::TinyInt(i) => query.bind(i),
            SqlValue::SmallInt(i) => query.bind(i),
            SqlValue::Int(i) => query.bind(i),
            SqlValue::BigInt(i) => query.bind(i),

            // Unsigned integers - MySQL supports unsigned types natively
            SqlValue::UnsignedTinyInt(i) => query.bind(i),
            SqlValue::UnsignedSmallInt(i) => query.bind(i),
            SqlValue::UnsignedInt(i) => query.bind(i),
            SqlValue::UnsignedBigInt(i) => query.bind(i),

            SqlValue::Float(f) => query.bind(f),
            SqlValue::Double(f) => query.bind(f),
            SqlValue::Decimal(d) => query.bind(d),

            SqlValue::String(s) => query.bind(s),
            SqlValue::Bytes(b) => query.bind(b),

            SqlValue::Uuid(s) => query.bind(s), // MySQL stores UUID as CHAR(36)
            SqlValue::Json(j) => query.bind(j),
            SqlValue::Date(s) => match NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
                Ok(date) => query.bind(date),
                Err(_) => query.bind(s),
            },
            SqlValue::Time(s) => {
                if let Ok(time) = NaiveTime::parse_from_str(&s, "%H:%M:%S") {
                    query.bind(time)
                } else if let Ok(time) = NaiveTime::parse_from_str(&s, "%H:%M:%S%.f") {
                    query.bind(time)
                } else {
                    query.bind(s)
                }
            }
            SqlValue::DateTime(s) => {
                // MySQL DATETIME has no timezone
                if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
                    query.bind(dt.naive_utc())
                } else if let Ok(ndt) = NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S") {
                    query.bind(ndt)
                } else {
                    query.bind(s)
                }
            }
            // no native arrays; sent as a JSON document
            array @ SqlValue::Array(_) => query.bind(array.to_json()),
        }
    }

    fn prepare<'q>(sql: &'q str, params: Vec<SqlValue>) -> Query<'q, MySql, MySqlArguments> {
        params
            .into_iter()
            .fold(sqlx::query(sql), |query, param| Self::bind_param(query, param))
    }

    /// Decode the first column of a row
    ///
    /// `COUNT` comes back as BIGINT, `SUM`/`AVG` as DECIMAL and `MAX`/`MIN`
    /// in the column's own type.
    fn decode_scalar(row: &MySqlRow) -> Result<SqlValue> {
        let raw = row.try_get_raw(0)?;
        if raw.is_null() {
            return Ok(SqlValue::Null);
        }

        if let Ok(v) = row.try_get::<i64, _>(0) {
            return Ok(SqlValue::BigInt(v));
        }
        if let Ok(v) = row.try_get::<u64, _>(0) {
            return Ok(SqlValue::UnsignedBigInt(v));
        }
        if let Ok(v) = row.try_get::<rust_decimal::Decimal, _>(0) {
            return Ok(SqlValue::Decimal(v));
        }
        if let Ok(v) = row.try_get::<f64, _>(0) {
            return Ok(SqlValue::Double(v));
        }
        if let Ok(v) = row.try_get::<f32, _>(0) {
            return Ok(SqlValue::Float(v));
        }
        if let Ok(v) = row.try_get::<String, _>(0) {
            return Ok(SqlValue::String(v));
        }
        row.try_get::<Vec<u8>, _>(0)
            .map(SqlValue::Bytes)
            .map_err(|e| QueryError::database(format!("MySQL scalar decode failed: {}", e)))
    }
}

impl DialectProvider for MySqlAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }
}

#[async_trait]
impl DatabaseAdapter for MySqlAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, sql: &str, params: Vec<SqlValue>) -> Result<QueryResult> {
        #[cfg(debug_assertions)]
        {
            log::debug!("MySQL EXECUTE: {}", sql);
            log::debug!("  Parameters: {:?}", params);
        }

        let result = Self::prepare(sql, params)
            .execute(&*self.pool)
            .await
            .map_err(|e| QueryError::database(format!("MySQL execute failed: {}", e)))?;

        Ok(QueryResult {
            rows_affected: result.rows_affected(),
            last_insert_id: i64::try_from(result.last_insert_id()).ok(),
        })
    }

    async fn fetch_scalar(&self, sql: &str, params: Vec<SqlValue>) -> Result<SqlValue> {
        #[cfg(debug_assertions)]
        {
            log::debug!("MySQL FETCH_SCALAR: {}", sql);
            log::debug!("  Parameters: {:?}", params);
        }

        let rows = Self::prepare(sql, params)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| QueryError::database(format!("MySQL fetch failed: {}", e)))?;

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
            .map_err(|e| QueryError::database(format!("MySQL ping failed: {}", e)))
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn clone_box(&self) -> Box<dyn DatabaseAdapter> {
        Box::new(self.clone())
    }
}
