//! Database adapter implementations for different database backends

pub mod mysql;
pub mod postgres;
pub mod sqlite;

pub use mysql::MySqlAdapter;
pub use postgres::PostgresAdapter;
pub use sqlite::SqliteAdapter;

use crate::database::adapter::DatabaseAdapter;
use crate::database::config::DatabaseConnectionConfig;
use crate::error::Result;
use crate::query_builder::Dialect;
use std::time::Duration;

/// Open a pool for `config` and wrap it in the adapter for its dialect
pub async fn connect(
    name: &str,
    config: &DatabaseConnectionConfig,
) -> Result<Box<dyn DatabaseAdapter>> {
    let dialect = config.resolve_dialect()?;
    log::debug!("Connecting database '{}' ({})", name, dialect);

    let adapter: Box<dyn DatabaseAdapter> = match dialect {
        Dialect::MySql => Box::new(MySqlAdapter::connect(name, config).await?),
        Dialect::Postgres => Box::new(PostgresAdapter::connect(name, config).await?),
        Dialect::Sqlite => Box::new(SqliteAdapter::connect(name, config).await?),
    };
    Ok(adapter)
}

/// Pool timing settings shared by every backend
pub(crate) struct PoolTimings {
    pub acquire_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
}

impl From<&DatabaseConnectionConfig> for PoolTimings {
    fn from(config: &DatabaseConnectionConfig) -> Self {
        // zero disables the idle and lifetime limits
        let optional = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));
        Self {
            acquire_timeout: Duration::from_secs(config.connect_timeout),
            idle_timeout: optional(config.idle_timeout),
            max_lifetime: optional(config.max_lifetime),
        }
    }
}
