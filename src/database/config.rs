//! Database connection configuration
//!
//! Named connection settings, usually loaded from a TOML file with one table
//! per connection:
//!
//! ```toml
//! [primary]
//! url = "postgres://localhost/app"
//! max_connections = 20
//! is_default = true
//!
//! [reports]
//! url = "mysql://localhost/reports"
//! ```

use crate::error::{QueryError, Result};
use crate::query_builder::Dialect;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration for a single database connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConnectionConfig {
    /// Database connection URL (required)
    pub url: String,

    /// Dialect name overriding the one implied by the URL scheme
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialect: Option<String>,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: u64,

    /// Maximum lifetime of a connection in seconds
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime: u64,

    /// Whether this database should be used when no name is given
    #[serde(default)]
    pub is_default: bool,
}

impl DatabaseConnectionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            dialect: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout: default_connect_timeout(),
            idle_timeout: default_idle_timeout(),
            max_lifetime: default_max_lifetime(),
            is_default: false,
        }
    }

    /// The SQL dialect spoken by this connection
    ///
    /// An explicit `dialect` wins (so a CockroachDB URL can be marked
    /// `postgres`). Otherwise the URL scheme decides.
    pub fn resolve_dialect(&self) -> Result<Dialect> {
        if let Some(dialect) = &self.dialect {
            return dialect.parse();
        }

        let url = self.url.trim();
        if url.starts_with("postgresql://") || url.starts_with("postgres://") {
            Ok(Dialect::Postgres)
        } else if url.starts_with("mysql://") || url.starts_with("mariadb://") {
            Ok(Dialect::MySql)
        } else if url.starts_with("sqlite:") {
            Ok(Dialect::Sqlite)
        } else {
            let scheme = url.split(':').next().unwrap_or_default();
            Err(QueryError::UnsupportedDialect(scheme.to_string()))
        }
    }
}

/// Configuration for multiple named databases
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabasesConfig {
    /// Map of database name to configuration
    #[serde(flatten)]
    pub databases: BTreeMap<String, DatabaseConnectionConfig>,
}

impl DatabasesConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_database(&mut self, name: impl Into<String>, config: DatabaseConnectionConfig) {
        self.databases.insert(name.into(), config);
    }

    pub fn get(&self, name: &str) -> Option<&DatabaseConnectionConfig> {
        self.databases.get(name)
    }

    /// Get the default database configuration
    ///
    /// Returns the database marked as default, or the first one by name if
    /// none is marked
    pub fn get_default(&self) -> Option<(&String, &DatabaseConnectionConfig)> {
        self.databases
            .iter()
            .find(|(_, config)| config.is_default)
            .or_else(|| self.databases.iter().next())
    }

    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }

    pub fn len(&self) -> usize {
        self.databases.len()
    }

    pub fn list_names(&self) -> Vec<String> {
        self.databases.keys().cloned().collect()
    }

    /// Merge with another configuration (other takes precedence)
    pub fn merge(&mut self, other: DatabasesConfig) {
        self.databases.extend(other.databases);
    }

    /// Parse a TOML document with one table per connection
    #[cfg(feature = "config")]
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DatabasesConfig = toml::from_str(content)
            .map_err(|e| QueryError::config(format!("Failed to parse database config: {}", e)))?;
        for (name, db) in &config.databases {
            db.resolve_dialect().map_err(|e| {
                QueryError::config(format!("Database '{}' has no usable dialect: {}", name, e))
            })?;
        }
        Ok(config)
    }

    /// Load a TOML configuration file
    #[cfg(feature = "config")]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            QueryError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        log::debug!("Loaded database config from {}", path.display());
        Self::from_toml_str(&content)
    }
}

// Default values for configuration
fn default_max_connections() -> u32 {
    10
}
fn default_min_connections() -> u32 {
    1
}
fn default_connect_timeout() -> u64 {
    30
}
fn default_idle_timeout() -> u64 {
    600
} // 10 minutes
fn default_max_lifetime() -> u64 {
    1800
} // 30 minutes

/// Builder for DatabaseConnectionConfig
#[derive(Debug, Clone)]
pub struct DatabaseConnectionConfigBuilder {
    url: Option<String>,
    dialect: Option<String>,
    max_connections: u32,
    min_connections: u32,
    connect_timeout: u64,
    idle_timeout: u64,
    max_lifetime: u64,
    is_default: bool,
}

impl DatabaseConnectionConfigBuilder {
    pub fn new() -> Self {
        Self {
            url: None,
            dialect: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout: default_connect_timeout(),
            idle_timeout: default_idle_timeout(),
            max_lifetime: default_max_lifetime(),
            is_default: false,
        }
    }

    /// Set the database URL (required)
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn dialect(mut self, dialect: impl Into<String>) -> Self {
        self.dialect = Some(dialect.into());
        self
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Set connection timeout in seconds
    pub fn connect_timeout(mut self, timeout: u64) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set idle timeout in seconds
    pub fn idle_timeout(mut self, timeout: u64) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set maximum lifetime in seconds
    pub fn max_lifetime(mut self, lifetime: u64) -> Self {
        self.max_lifetime = lifetime;
        self
    }

    pub fn is_default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    /// Build the configuration
    ///
    /// Fails without a URL or when no dialect can be resolved.
    pub fn build(self) -> Result<DatabaseConnectionConfig> {
        let url = self
            .url
            .ok_or_else(|| QueryError::config("Database URL is required"))?;

        let config = DatabaseConnectionConfig {
            url,
            dialect: self.dialect,
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            connect_timeout: self.connect_timeout,
            idle_timeout: self.idle_timeout,
            max_lifetime: self.max_lifetime,
            is_default: self.is_default,
        };
        config.resolve_dialect()?;
        Ok(config)
    }
}

impl Default for DatabaseConnectionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config() {
        let config = DatabasesConfig::new();
        assert!(config.is_empty());
        assert_eq!(config.len(), 0);
        assert!(config.get_default().is_none());
    }

    #[test]
    fn test_resolve_dialect_from_url() {
        let cases = [
            ("postgres://localhost/app", Dialect::Postgres),
            ("postgresql://localhost/app", Dialect::Postgres),
            ("mysql://root@localhost/app", Dialect::MySql),
            ("mariadb://localhost/app", Dialect::MySql),
            ("sqlite://./app.db", Dialect::Sqlite),
            ("sqlite::memory:", Dialect::Sqlite),
        ];
        for (url, expected) in cases {
            assert_eq!(
                DatabaseConnectionConfig::new(url).resolve_dialect().unwrap(),
                expected,
                "{}",
                url
            );
        }

        let err = DatabaseConnectionConfig::new("oracle://db/app")
            .resolve_dialect()
            .unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedDialect(ref s) if s == "oracle"));
    }

    #[test]
    fn test_dialect_override() {
        let mut config = DatabaseConnectionConfig::new("postgres://cockroach:26257/app");
        config.dialect = Some("cockroachdb".to_string());
        assert_eq!(config.resolve_dialect().unwrap(), Dialect::Postgres);

        config.dialect = Some("db2".to_string());
        assert!(config.resolve_dialect().is_err());
    }

    #[test]
    fn test_get_default() {
        let mut config = DatabasesConfig::new();
        config.add_database("analytics", DatabaseConnectionConfig::new("mysql://a/b"));
        assert_eq!(config.get_default().unwrap().0, "analytics");

        let mut primary = DatabaseConnectionConfig::new("postgres://p/app");
        primary.is_default = true;
        config.add_database("primary", primary);

        let (name, db) = config.get_default().unwrap();
        assert_eq!(name, "primary");
        assert_eq!(db.url, "postgres://p/app");
    }

    #[test]
    fn test_merge_prefers_other() {
        let mut base = DatabasesConfig::new();
        base.add_database("primary", DatabaseConnectionConfig::new("mysql://old/app"));

        let mut other = DatabasesConfig::new();
        other.add_database("primary", DatabaseConnectionConfig::new("mysql://new/app"));
        other.add_database("cache", DatabaseConnectionConfig::new("sqlite::memory:"));

        base.merge(other);
        assert_eq!(base.len(), 2);
        assert_eq!(base.get("primary").unwrap().url, "mysql://new/app");
        assert_eq!(base.list_names(), vec!["cache", "primary"]);
    }

    #[test]
    fn test_builder() {
        let config = DatabaseConnectionConfigBuilder::new()
            .url("sqlite://./test.db")
            .max_connections(5)
            .min_connections(1)
            .is_default(true)
            .build()
            .unwrap();

        assert_eq!(config.url, "sqlite://./test.db");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.idle_timeout, 600);
        assert!(config.is_default);

        assert!(matches!(
            DatabaseConnectionConfigBuilder::new().build(),
            Err(QueryError::Config(_))
        ));
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_from_toml_str() {
        let config = DatabasesConfig::from_toml_str(
            r#"
            [primary]
            url = "postgres://localhost/app"
            max_connections = 20
            is_default = true

            [legacy]
            url = "mysql://localhost/legacy"
            "#,
        )
        .unwrap();

        assert_eq!(config.len(), 2);
        let primary = config.get("primary").unwrap();
        assert_eq!(primary.max_connections, 20);
        assert_eq!(primary.min_connections, 1);
        assert_eq!(config.get_default().unwrap().0, "primary");
        assert_eq!(
            config.get("legacy").unwrap().resolve_dialect().unwrap(),
            Dialect::MySql
        );
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_from_toml_str_rejects_unknown_scheme() {
        let err = DatabasesConfig::from_toml_str("[x]\nurl = \"redis://localhost\"\n").unwrap_err();
        assert!(matches!(err, QueryError::Config(_)));
        assert!(DatabasesConfig::from_toml_str("[x]\nmax_connections = 3\n").is_err());
    }
}
