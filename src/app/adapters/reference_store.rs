//! Reference data lookups
//!
//! The pipeline needs exactly two things from the reference store: the
//! stored format configuration for a file type, and the obstacle type
//! name/id pairs. [`PgReferenceStore`] reads them from the DOF schema;
//! [`FileReferenceStore`] reads the same payloads from local files so a
//! source file can be validated without a database.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::PgPool;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use super::database::quote_identifier;
use crate::{Error, Result};

/// A stored configuration row for one file type
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SettingsRecord {
    #[serde(default)]
    pub file_type: String,

    #[serde(default)]
    pub revision_date: Option<NaiveDate>,

    /// Semi-structured payload; validated by the format resolver
    pub settings: serde_json::Value,
}

/// External reference store contract
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    /// Stored configuration for a file-type tag, `None` if no row exists
    async fn format_settings(&self, file_type: &str) -> Result<Option<SettingsRecord>>;

    /// All (type name, type id) pairs of the obstacle type reference table
    async fn obstacle_types(&self) -> Result<Vec<(String, i16)>>;
}

// =============================================================================
// PostgreSQL
// =============================================================================

/// Reference store backed by the `dof_conf` and `obstacle_type` tables
#[derive(Debug, Clone)]
pub struct PgReferenceStore {
    pool: PgPool,
    schema: String,
}

impl PgReferenceStore {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        Self {
            pool,
            schema: schema.into(),
        }
    }
}

#[async_trait]
impl ReferenceStore for PgReferenceStore {
    async fn format_settings(&self, file_type: &str) -> Result<Option<SettingsRecord>> {
        let sql = format!(
            "SELECT revision_date, settings FROM {}.dof_conf WHERE file_type = $1",
            quote_identifier(&self.schema)?
        );
        debug!("Fetching format settings for '{}'", file_type);

        let row: Option<(Option<NaiveDate>, serde_json::Value)> = sqlx::query_as(&sql)
            .bind(file_type)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::database("Failed to fetch format settings", e))?;

        Ok(row.map(|(revision_date, settings)| SettingsRecord {
            file_type: file_type.to_string(),
            revision_date,
            settings,
        }))
    }

    async fn obstacle_types(&self) -> Result<Vec<(String, i16)>> {
        let sql = format!(
            "SELECT type, id FROM {}.obstacle_type",
            quote_identifier(&self.schema)?
        );

        let rows: Vec<(String, i16)> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::database("Failed to fetch obstacle types", e))?;

        info!("Fetched {} obstacle types", rows.len());
        Ok(rows)
    }
}

// =============================================================================
// Local files
// =============================================================================

#[derive(Debug, Deserialize)]
struct ObstacleTypeRow {
    id: i16,
    #[serde(rename = "type")]
    name: String,
}

/// Reference store backed by local files
///
/// Settings come from a JSON document keyed by file-type tag, each entry
/// shaped like a `dof_conf` row:
///
/// ```json
/// { "csv": { "revision_date": "2019-09-08", "settings": { "csv_table_map": {} } } }
/// ```
///
/// Obstacle types come from a semicolon-delimited file with `id;type` columns.
#[derive(Debug, Clone, Default)]
pub struct FileReferenceStore {
    settings: HashMap<String, SettingsRecord>,
    obstacle_types: Vec<(String, i16)>,
}

impl FileReferenceStore {
    /// Build a store from already-loaded records
    pub fn new(settings: Vec<SettingsRecord>, obstacle_types: Vec<(String, i16)>) -> Self {
        let settings = settings
            .into_iter()
            .map(|record| (record.file_type.clone(), record))
            .collect();
        Self {
            settings,
            obstacle_types,
        }
    }

    /// Load settings and obstacle types from files
    pub async fn from_files(settings_path: &Path, obstacle_types_path: &Path) -> Result<Self> {
        let settings = Self::read_settings(settings_path).await?;
        let obstacle_types = Self::read_obstacle_types(obstacle_types_path).await?;
        info!(
            "Loaded {} format settings and {} obstacle types from local files",
            settings.len(),
            obstacle_types.len()
        );
        Ok(Self::new(settings, obstacle_types))
    }

    async fn read_settings(path: &Path) -> Result<Vec<SettingsRecord>> {
        if !path.exists() {
            return Err(Error::file_not_found(path.display().to_string()));
        }
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::io(format!("Failed to read settings file {}", path.display()), e)
        })?;

        let by_type: HashMap<String, SettingsRecord> =
            serde_json::from_str(&content).map_err(|e| {
                Error::configuration(format!(
                    "Settings file {} is not a valid settings document: {}",
                    path.display(),
                    e
                ))
            })?;

        Ok(by_type
            .into_iter()
            .map(|(file_type, mut record)| {
                record.file_type = file_type;
                record
            })
            .collect())
    }

    async fn read_obstacle_types(path: &Path) -> Result<Vec<(String, i16)>> {
        if !path.exists() {
            return Err(Error::file_not_found(path.display().to_string()));
        }
        let file_name = path.display().to_string();
        let content = tokio::fs::read(path)
            .await
            .map_err(|e| Error::io(format!("Failed to read obstacle types {}", file_name), e))?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .trim(csv::Trim::All)
            .from_reader(content.as_slice());

        let mut types = Vec::new();
        for result in reader.deserialize::<ObstacleTypeRow>() {
            let row = result.map_err(|e| {
                Error::csv_parsing(&file_name, "Invalid obstacle type row", Some(e))
            })?;
            types.push((row.name, row.id));
        }
        Ok(types)
    }
}

#[async_trait]
impl ReferenceStore for FileReferenceStore {
    async fn format_settings(&self, file_type: &str) -> Result<Option<SettingsRecord>> {
        Ok(self.settings.get(file_type).cloned())
    }

    async fn obstacle_types(&self) -> Result<Vec<(String, i16)>> {
        Ok(self.obstacle_types.clone())
    }
}
