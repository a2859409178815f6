//! Configuration handling for db-prune.
//!
//! This module provides configuration management via CLI arguments and environment variables.

use crate::db::ConnectOptions;
use crate::db::connector::{DEFAULT_ACQUIRE_TIMEOUT_SECS, DEFAULT_DOCUMENT_CONNECT_TIMEOUT_SECS};
use crate::error::{DbError, DbResult};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "db.json";
pub const STATEMENTS_FILE_NAME: &str = "queries.sql";

/// Configuration for db-prune.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "db-prune",
    about = "Runs batches of cleanup statements against SQL and MongoDB databases",
    version,
    author
)]
pub struct Config {
    /// Path to db.json, or to the directory containing it
    #[arg(value_name = "CONFIG_PATH", env = "PRUNE_CONFIG")]
    pub config_path: PathBuf,

    /// Path to queries.sql, or to the directory containing it
    #[arg(value_name = "STATEMENTS_PATH", env = "PRUNE_STATEMENTS")]
    pub statements_path: PathBuf,

    /// MongoDB connect timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_DOCUMENT_CONNECT_TIMEOUT_SECS,
        env = "PRUNE_CONNECT_TIMEOUT"
    )]
    pub connect_timeout: u64,

    /// How long SQL pools wait for a connection, in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_ACQUIRE_TIMEOUT_SECS,
        env = "PRUNE_ACQUIRE_TIMEOUT"
    )]
    pub acquire_timeout: u64,

    /// Trust the SQL Server certificate without validation
    #[arg(long, env = "PRUNE_MSSQL_TRUST_CERT")]
    pub mssql_trust_cert: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "PRUNE_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "PRUNE_JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// Parse configuration from command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Create a configuration for the given input paths with default options.
    pub fn with_paths(config_path: impl Into<PathBuf>, statements_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            statements_path: statements_path.into(),
            connect_timeout: DEFAULT_DOCUMENT_CONNECT_TIMEOUT_SECS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT_SECS,
            mssql_trust_cert: false,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// Resolve and check the `db.json` path.
    pub fn resolved_config_path(&self) -> DbResult<PathBuf> {
        resolve_input(&self.config_path, CONFIG_FILE_NAME)
    }

    /// Resolve and check the `queries.sql` path.
    pub fn resolved_statements_path(&self) -> DbResult<PathBuf> {
        resolve_input(&self.statements_path, STATEMENTS_FILE_NAME)
    }

    /// Get the connect timeout as a Duration.
    pub fn connect_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            document_connect_timeout: self.connect_timeout_duration(),
            acquire_timeout: Duration::from_secs(self.acquire_timeout),
            mssql_trust_cert: self.mssql_trust_cert,
        }
    }
}

/// Append `file_name` unless `path` already ends with it, then require the
/// result to exist.
fn resolve_input(path: &Path, file_name: &str) -> DbResult<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(DbError::config(
            format!("{} file was not provided", file_name),
            "",
        ));
    }

    let resolved = if path.to_string_lossy().ends_with(file_name) {
        path.to_path_buf()
    } else {
        path.join(file_name)
    };

    if !resolved.exists() {
        return Err(DbError::config(
            format!("{} file was not found", file_name),
            resolved.display().to_string(),
        ));
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_positional_paths() {
        let config = Config::try_parse_from(["db-prune", "conf", "stmts"]).unwrap();
        assert_eq!(config.config_path, PathBuf::from("conf"));
        assert_eq!(config.statements_path, PathBuf::from("stmts"));
        assert_eq!(config.connect_timeout, 10);
        assert_eq!(config.acquire_timeout, 30);
        assert!(!config.json_logs);
    }

    #[test]
    fn test_connect_options() {
        let config = Config {
            connect_timeout: 3,
            acquire_timeout: 5,
            mssql_trust_cert: true,
            ..Config::with_paths("a", "b")
        };
        let options = config.connect_options();
        assert_eq!(options.document_connect_timeout, Duration::from_secs(3));
        assert_eq!(options.acquire_timeout, Duration::from_secs(5));
        assert!(options.mssql_trust_cert);
    }

    #[test]
    fn test_resolve_directory_appends_file_name() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("db.json"), "{}").unwrap();
        std::fs::write(dir.path().join("queries.sql"), "").unwrap();

        let config = Config::with_paths(dir.path(), dir.path());
        assert_eq!(
            config.resolved_config_path().unwrap(),
            dir.path().join("db.json")
        );
        assert_eq!(
            config.resolved_statements_path().unwrap(),
            dir.path().join("queries.sql")
        );
    }

    #[test]
    fn test_resolve_full_file_path_is_kept() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("prod-db.json");
        std::fs::write(&file, "{}").unwrap();

        let config = Config::with_paths(&file, dir.path());
        assert_eq!(config.resolved_config_path().unwrap(), file);
    }

    #[test]
    fn test_resolve_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = Config::with_paths(dir.path(), dir.path());
        let err = config.resolved_statements_path().unwrap_err();
        assert!(err.to_string().contains("queries.sql file was not found"));
    }

    #[test]
    fn test_resolve_empty_path() {
        let config = Config::with_paths("", "x");
        let err = config.resolved_config_path().unwrap_err();
        assert!(err.to_string().contains("not provided"));
    }
}
