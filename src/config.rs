//! Configuration handling for the MySQL MCP Server.
//!
//! This module provides configuration management via CLI arguments and environment variables.

use crate::error::{DbError, DbResult};
use clap::{Parser, ValueEnum};
use sqlx::mysql::MySqlConnectOptions;
use std::time::Duration;
use url::Url;

pub const DEFAULT_MYSQL_HOST: &str = "localhost";
pub const DEFAULT_MYSQL_PORT: u16 = 3306;
pub const DEFAULT_MYSQL_USER: &str = "root";

pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_MCP_ENDPOINT: &str = "/";

// Pool configuration defaults
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_MIN_CONNECTIONS: u32 = 0;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportMode {
    /// Standard input/output (for CLI integration)
    #[default]
    Stdio,
    /// HTTP with Server-Sent Events (for web clients)
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "mysql-mcp-server",
    about = "MCP server exposing MySQL table schemas and a read-only query tool",
    version,
    author
)]
pub struct Config {
    /// MySQL server host
    #[arg(long, default_value = DEFAULT_MYSQL_HOST, env = "MYSQL_HOST")]
    pub host: String,

    /// MySQL server port
    #[arg(long, default_value_t = DEFAULT_MYSQL_PORT, env = "MYSQL_PORT")]
    pub port: u16,

    /// MySQL user name
    #[arg(long, default_value = DEFAULT_MYSQL_USER, env = "MYSQL_USER")]
    pub user: String,

    /// MySQL password (empty for none)
    #[arg(long, default_value = "", env = "MYSQL_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Database to expose (required)
    #[arg(long, env = "MYSQL_DATABASE")]
    pub database: Option<String>,

    /// Maximum connections in the pool
    #[arg(long, default_value_t = DEFAULT_MAX_CONNECTIONS, env = "MYSQL_MAX_CONNECTIONS")]
    pub max_connections: u32,

    /// Minimum idle connections kept in the pool
    #[arg(long, default_value_t = DEFAULT_MIN_CONNECTIONS, env = "MYSQL_MIN_CONNECTIONS")]
    pub min_connections: u32,

    /// Seconds to wait for a free pooled connection
    #[arg(long, default_value_t = DEFAULT_ACQUIRE_TIMEOUT_SECS, env = "MYSQL_ACQUIRE_TIMEOUT")]
    pub acquire_timeout: u64,

    /// Seconds before an idle pooled connection is closed
    #[arg(long, default_value_t = DEFAULT_IDLE_TIMEOUT_SECS, env = "MYSQL_IDLE_TIMEOUT")]
    pub idle_timeout: u64,

    /// Transport mode (stdio or http)
    #[arg(
        short,
        long,
        value_enum,
        default_value = "stdio",
        env = "MCP_TRANSPORT"
    )]
    pub transport: TransportMode,

    /// HTTP host to bind to (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_HTTP_HOST,
        env = "MCP_HTTP_HOST"
    )]
    pub http_host: String,

    /// HTTP port to bind to (only used with http transport)
    #[arg(
        long,
        default_value_t = DEFAULT_HTTP_PORT,
        env = "MCP_HTTP_PORT"
    )]
    pub http_port: u16,

    /// MCP endpoint path (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_MCP_ENDPOINT,
        env = "MCP_ENDPOINT"
    )]
    pub mcp_endpoint: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MCP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MCP_JSON_LOGS")]
    pub json_logs: bool,
}

/// Connection pool settings derived from the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
}

impl Config {
    /// Parse configuration from command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            host: DEFAULT_MYSQL_HOST.to_string(),
            port: DEFAULT_MYSQL_PORT,
            user: DEFAULT_MYSQL_USER.to_string(),
            password: String::new(),
            database: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT_SECS,
            idle_timeout: DEFAULT_IDLE_TIMEOUT_SECS,
            transport: TransportMode::Stdio,
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            mcp_endpoint: DEFAULT_MCP_ENDPOINT.to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// Check everything that must hold before a pool is created.
    ///
    /// Returns the database name on success.
    pub fn validate(&self) -> DbResult<&str> {
        let database = self
            .database
            .as_deref()
            .map(str::trim)
            .filter(|db| !db.is_empty())
            .ok_or_else(|| {
                DbError::config("Environment variable MYSQL_DATABASE (or --database) is required")
            })?;

        if self.max_connections == 0 {
            return Err(DbError::config("max_connections must be greater than 0"));
        }
        if self.min_connections > self.max_connections {
            return Err(DbError::config(format!(
                "min_connections ({}) cannot exceed max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }

        Ok(database)
    }

    /// Pool tunables.
    pub fn pool_options(&self) -> PoolOptions {
        PoolOptions {
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            acquire_timeout: Duration::from_secs(self.acquire_timeout),
            idle_timeout: Duration::from_secs(self.idle_timeout),
        }
    }

    /// Driver connect options. Contains the password - never log.
    pub fn connect_options(&self) -> DbResult<MySqlConnectOptions> {
        let database = self.validate()?;
        let mut options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(database)
            .charset("utf8mb4");
        if !self.password.is_empty() {
            options = options.password(&self.password);
        }
        Ok(options)
    }

    /// Base URI that resource identifiers are resolved against.
    ///
    /// Format: `mysql://<host>:<port>/<database>/`. Credentials are never included.
    pub fn resource_base_url(&self) -> DbResult<Url> {
        let database = self.validate()?;
        let invalid_host =
            |reason: String| DbError::config(format!("Invalid host '{}': {}", self.host, reason));

        let mut url = Url::parse("mysql://localhost/")
            .map_err(|e| DbError::internal(format!("Invalid base URL: {e}")))?;
        url.set_host(Some(&self.host))
            .map_err(|e| invalid_host(e.to_string()))?;
        url.set_port(Some(self.port))
            .map_err(|()| invalid_host("port not accepted".to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid_host("URL cannot carry a path".to_string()))?
            .clear()
            .push(database)
            .push("");
        Ok(url)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_database(database: &str) -> Config {
        Config {
            database: Some(database.to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 3306);
        assert_eq!(config.user, "root");
        assert!(config.password.is_empty());
        assert!(config.database.is_none());
        assert_eq!(config.transport, TransportMode::Stdio);
    }

    #[test]
    fn test_cli_defaults_match_default_config() {
        let config = Config::try_parse_from(["mysql-mcp-server", "--database", "shop"]).unwrap();
        assert_eq!(config.host, DEFAULT_MYSQL_HOST);
        assert_eq!(config.port, DEFAULT_MYSQL_PORT);
        assert_eq!(config.user, DEFAULT_MYSQL_USER);
        assert_eq!(config.database.as_deref(), Some("shop"));
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
    }

    #[test]
    fn test_missing_database_is_rejected() {
        let err = Config::default().validate().unwrap_err();
        assert!(matches!(err, DbError::Config { .. }));
        assert!(err.to_string().contains("MYSQL_DATABASE"));
    }

    #[test]
    fn test_blank_database_is_rejected() {
        assert!(config_with_database("").validate().is_err());
        assert!(config_with_database("   ").validate().is_err());
    }

    #[test]
    fn test_validate_returns_database() {
        let config = config_with_database("inventory");
        assert_eq!(config.validate().unwrap(), "inventory");
    }

    #[test]
    fn test_pool_validation() {
        let config = Config {
            max_connections: 0,
            ..config_with_database("db")
        };
        assert!(config.validate().unwrap_err().to_string().contains("max_connections"));

        let config = Config {
            min_connections: 5,
            max_connections: 2,
            ..config_with_database("db")
        };
        assert!(config.validate().unwrap_err().to_string().contains("cannot exceed"));
    }

    #[test]
    fn test_pool_options() {
        let config = Config {
            acquire_timeout: 5,
            idle_timeout: 60,
            ..config_with_database("db")
        };
        let opts = config.pool_options();
        assert_eq!(opts.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(opts.acquire_timeout, Duration::from_secs(5));
        assert_eq!(opts.idle_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_resource_base_url_strips_credentials() {
        let config = Config {
            host: "db.internal".to_string(),
            port: 3307,
            user: "admin".to_string(),
            password: "s3cret".to_string(),
            ..config_with_database("sales")
        };
        let url = config.resource_base_url().unwrap();
        assert_eq!(url.as_str(), "mysql://db.internal:3307/sales/");
        assert!(url.username().is_empty());
        assert!(url.password().is_none());
        assert!(!url.as_str().contains("s3cret"));
    }

    #[test]
    fn test_resource_base_url_requires_database() {
        assert!(Config::default().resource_base_url().is_err());
    }
}
