use std::time::Duration;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_DB_NAME: &str = "books_db";
pub const DEFAULT_DB_PORT: u16 = 3306;
pub const DEFAULT_BUCKET: &str = "xideralaws-curso-benjamin-2";
pub const DEFAULT_KEY: &str = "transformed/matched_books_final.csv";
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(10);

/// Table holding the matched Amazon/Goodreads rows.
pub const BOOKS_TABLE: &str = "matched_books";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },
}

// ---------------------------------------------------------------------------
// Relational connection target
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub table: String,
}

// ---------------------------------------------------------------------------
// Object storage location
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectStorageConfig {
    pub region: String,
    pub bucket: String,
    pub key: String,
}

impl Default for ObjectStorageConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            bucket: DEFAULT_BUCKET.to_string(),
            key: DEFAULT_KEY.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Startup configuration, built once and handed to the loader by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// `None` when any of host / user / password is missing: the relational
    /// reader is then left out of the fallback chain entirely.
    pub database: Option<DatabaseConfig>,
    pub object_storage: ObjectStorageConfig,
    /// Upper bound for each reader's network call.
    pub io_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            object_storage: ObjectStorageConfig::default(),
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }
}

impl Config {
    /// Read the process environment, after loading `.env` if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("Loaded environment overrides from {}", path.display());
        }
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let database = match (non_empty("DB_HOST"), non_empty("DB_USER"), non_empty("DB_PASS")) {
            (Some(host), Some(user), Some(password)) => Some(DatabaseConfig {
                host,
                port: parse_number(&lookup, "DB_PORT")?.unwrap_or(DEFAULT_DB_PORT),
                database: non_empty("DB_NAME").unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
                user,
                password,
                table: BOOKS_TABLE.to_string(),
            }),
            _ => None,
        };

        let object_storage = ObjectStorageConfig {
            region: non_empty("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            bucket: non_empty("S3_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            key: non_empty("S3_KEY").unwrap_or_else(|| DEFAULT_KEY.to_string()),
        };

        let io_timeout = parse_number::<u64, _>(&lookup, "BOOKS_IO_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_IO_TIMEOUT);

        Ok(Self {
            database,
            object_storage,
            io_timeout,
        })
    }
}

fn parse_number<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var).filter(|v| !v.trim().is_empty()) else {
        return Ok(None);
    };
    match raw.trim().parse::<T>() {
        Ok(n) if n > T::default() => Ok(Some(n)),
        _ => Err(ConfigError::InvalidNumber { var, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.database.is_none());
        assert_eq!(config.object_storage.key, DEFAULT_KEY);
    }

    #[test]
    fn database_requires_host_user_and_password() {
        let partial = Config::from_lookup(lookup(&[("DB_HOST", "db"), ("DB_USER", "reader")])).unwrap();
        assert!(partial.database.is_none());

        let blank_pass = Config::from_lookup(lookup(&[
            ("DB_HOST", "db"),
            ("DB_USER", "reader"),
            ("DB_PASS", "  "),
        ]))
        .unwrap();
        assert!(blank_pass.database.is_none());

        let full = Config::from_lookup(lookup(&[
            ("DB_HOST", "db"),
            ("DB_USER", "reader"),
            ("DB_PASS", "secret"),
        ]))
        .unwrap();
        let db = full.database.unwrap();
        assert_eq!(db.database, DEFAULT_DB_NAME);
        assert_eq!(db.port, DEFAULT_DB_PORT);
        assert_eq!(db.table, BOOKS_TABLE);
    }

    #[test]
    fn overrides_and_invalid_numbers() {
        let config = Config::from_lookup(lookup(&[
            ("AWS_REGION", "eu-west-1"),
            ("S3_BUCKET", "books"),
            ("S3_KEY", "exports/books.parquet"),
            ("BOOKS_IO_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();
        assert_eq!(config.object_storage.region, "eu-west-1");
        assert_eq!(config.object_storage.bucket, "books");
        assert_eq!(config.io_timeout, Duration::from_secs(3));

        let err = Config::from_lookup(lookup(&[("BOOKS_IO_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                var: "BOOKS_IO_TIMEOUT_SECS",
                value: "soon".to_string()
            }
        );
    }
}
