//! Source readers: each one fetches the raw book table from a single place.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use serde::Serialize;
use sqlx::mysql::{MySqlConnectOptions, MySqlDatabaseError, MySqlRow};
use sqlx::{Column, ConnectOptions, Row, TypeInfo};
use thiserror::Error;
use tokio::runtime::Runtime;

use super::loader::{decode_object, ObjectFormat};
use super::model::{BookDataset, CellValue, RawRow};
use crate::config::{DatabaseConfig, ObjectStorageConfig};

// MySQL server error numbers the relational reader reports specifically.
const ER_ACCESS_DENIED: u16 = 1045;
const ER_BAD_DB: u16 = 1049;
const ER_NO_SUCH_TABLE: u16 = 1146;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a single reader could not produce a dataset.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("database '{0}' not found")]
    UnknownDatabase(String),

    #[error("MySQL credentials rejected")]
    AccessDenied,

    #[error("table '{0}' does not exist")]
    MissingTable(String),

    #[error("MySQL error: {0}")]
    Database(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("object storage error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected data layout: {0}")]
    Format(String),

    #[error("source returned no rows")]
    EmptyResult,

    #[error("could not start I/O runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

impl SourceError {
    fn from_sqlx(err: sqlx::Error, db: &DatabaseConfig) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if let Some(mysql) = db_err.try_downcast_ref::<MySqlDatabaseError>() {
                match mysql.number() {
                    ER_ACCESS_DENIED => return SourceError::AccessDenied,
                    ER_BAD_DB => return SourceError::UnknownDatabase(db.database.clone()),
                    ER_NO_SUCH_TABLE => return SourceError::MissingTable(db.table.clone()),
                    _ => {}
                }
            }
        }
        SourceError::Database(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Provenance and cache keys
// ---------------------------------------------------------------------------

/// Which source produced the active dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    Relational,
    ObjectStorage,
    None,
}

impl Provenance {
    pub fn label(self) -> &'static str {
        match self {
            Provenance::Relational => "relational",
            Provenance::ObjectStorage => "object-storage",
            Provenance::None => "none",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fetch parameters identifying a source's result for memoization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceKey {
    Relational {
        host: String,
        port: u16,
        database: String,
        user: String,
        table: String,
    },
    ObjectStorage {
        bucket: String,
        key: String,
        region: String,
    },
}

// ---------------------------------------------------------------------------
// BookSource trait
// ---------------------------------------------------------------------------

/// A single place the book table can be read from.
pub trait BookSource {
    /// Label reported when this source wins the fallback chain.
    fn provenance(&self) -> Provenance;

    /// Parameters that fully determine this source's result.
    fn key(&self) -> SourceKey;

    /// Fetch the raw table. Errors are reader-local; the loader decides
    /// whether to fall through.
    fn fetch(&self) -> Result<BookDataset, SourceError>;
}

// ---------------------------------------------------------------------------
// Relational reader (MySQL)
// ---------------------------------------------------------------------------

pub struct RelationalSource {
    config: DatabaseConfig,
    timeout: Duration,
    runtime: Arc<Runtime>,
}

impl RelationalSource {
    pub fn new(config: DatabaseConfig, timeout: Duration, runtime: Arc<Runtime>) -> Self {
        Self {
            config,
            timeout,
            runtime,
        }
    }

    async fn read_table(&self) -> Result<BookDataset, sqlx::Error> {
        let options = MySqlConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .username(&self.config.user)
            .password(&self.config.password)
            .database(&self.config.database);

        let mut conn = options.connect().await?;
        let query = format!("SELECT * FROM `{}`", self.config.table.replace('`', "``"));
        let rows = sqlx::query(&query).fetch_all(&mut conn).await?;
        if let Err(e) = sqlx::Connection::close(conn).await {
            log::debug!("Closing MySQL connection failed: {e}");
        }

        let columns: Vec<String> = rows
            .first()
            .map(|r| r.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();
        let rows = rows.iter().map(mysql_row_to_raw).collect();
        Ok(BookDataset::from_rows(columns, rows))
    }
}

impl BookSource for RelationalSource {
    fn provenance(&self) -> Provenance {
        Provenance::Relational
    }

    fn key(&self) -> SourceKey {
        SourceKey::Relational {
            host: self.config.host.clone(),
            port: self.config.port,
            database: self.config.database.clone(),
            user: self.config.user.clone(),
            table: self.config.table.clone(),
        }
    }

    fn fetch(&self) -> Result<BookDataset, SourceError> {
        log::info!(
            "Reading table '{}' from MySQL at {}:{}",
            self.config.table,
            self.config.host,
            self.config.port
        );
        self.runtime.block_on(async {
            match tokio::time::timeout(self.timeout, self.read_table()).await {
                Ok(result) => result.map_err(|e| SourceError::from_sqlx(e, &self.config)),
                Err(_) => Err(SourceError::Timeout(self.timeout)),
            }
        })
    }
}

/// Convert one MySQL row by inspecting each column's declared type.
fn mysql_row_to_raw(row: &MySqlRow) -> RawRow {
    row.columns()
        .iter()
        .map(|col| {
            let idx = col.ordinal();
            let type_name = col.type_info().name().to_ascii_uppercase();
            let cell = match type_name.as_str() {
                "BOOLEAN" => row
                    .try_get::<Option<bool>, _>(idx)
                    .ok()
                    .flatten()
                    .map(CellValue::Bool),
                "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => row
                    .try_get::<Option<i64>, _>(idx)
                    .ok()
                    .flatten()
                    .map(CellValue::Integer),
                name if name.ends_with(" UNSIGNED") => row
                    .try_get::<Option<u64>, _>(idx)
                    .ok()
                    .flatten()
                    .map(|v| CellValue::Integer(v as i64)),
                "FLOAT" => row
                    .try_get::<Option<f32>, _>(idx)
                    .ok()
                    .flatten()
                    .map(|v| CellValue::Float(v as f64)),
                "DOUBLE" => row
                    .try_get::<Option<f64>, _>(idx)
                    .ok()
                    .flatten()
                    .map(CellValue::Float),
                // DECIMAL travels as text on the wire; parse it like a CSV cell.
                _ => row
                    .try_get_unchecked::<Option<String>, _>(idx)
                    .ok()
                    .flatten()
                    .map(|s| CellValue::from_text(&s)),
            };
            (col.name().to_string(), cell.unwrap_or(CellValue::Null))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Object-storage reader (S3)
// ---------------------------------------------------------------------------

pub struct ObjectStorageSource {
    config: ObjectStorageConfig,
    timeout: Duration,
    runtime: Arc<Runtime>,
}

impl ObjectStorageSource {
    pub fn new(config: ObjectStorageConfig, timeout: Duration, runtime: Arc<Runtime>) -> Self {
        Self {
            config,
            timeout,
            runtime,
        }
    }

    async fn read_object(&self) -> Result<bytes::Bytes, SourceError> {
        let store = AmazonS3Builder::from_env()
            .with_region(&self.config.region)
            .with_bucket_name(&self.config.bucket)
            .build()?;
        let path = ObjectPath::from(self.config.key.as_str());
        let body = store.get(&path).await?.bytes().await?;
        Ok(body)
    }
}

impl BookSource for ObjectStorageSource {
    fn provenance(&self) -> Provenance {
        Provenance::ObjectStorage
    }

    fn key(&self) -> SourceKey {
        SourceKey::ObjectStorage {
            bucket: self.config.bucket.clone(),
            key: self.config.key.clone(),
            region: self.config.region.clone(),
        }
    }

    fn fetch(&self) -> Result<BookDataset, SourceError> {
        log::info!(
            "Reading s3://{}/{} ({})",
            self.config.bucket,
            self.config.key,
            self.config.region
        );
        let body = self.runtime.block_on(async {
            tokio::time::timeout(self.timeout, self.read_object())
                .await
                .map_err(|_| SourceError::Timeout(self.timeout))?
        })?;
        log::debug!("Fetched {} bytes from object storage", body.len());
        decode_object(ObjectFormat::from_key(&self.config.key), body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provenance_labels() {
        assert_eq!(Provenance::Relational.to_string(), "relational");
        assert_eq!(Provenance::ObjectStorage.label(), "object-storage");
        assert_eq!(Provenance::None.label(), "none");
        assert_eq!(
            serde_json::to_string(&Provenance::ObjectStorage).unwrap(),
            "\"object-storage\""
        );
    }

    #[test]
    fn unreachable_database_is_a_reader_error() {
        let runtime = Arc::new(
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap(),
        );
        let source = RelationalSource::new(
            DatabaseConfig {
                host: "127.0.0.1".into(),
                port: 1,
                database: "books_db".into(),
                user: "reader".into(),
                password: "secret".into(),
                table: "matched_books".into(),
            },
            Duration::from_secs(2),
            runtime,
        );
        assert!(source.fetch().is_err());
    }
}
