//! Staging load orchestration

use chrono::NaiveDate;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::StagingBackend;
use crate::app::adapters::database::TableName;
use crate::app::models::ObstacleRecord;
use crate::{Error, Result};

/// Steps of a staging load, named in load errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    /// Drop a staging table left behind by an earlier run
    ClearStaging,
    CreateStaging,
    WriteStaging,
    Copy,
    DropStaging,
}

impl LoadStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadStage::ClearStaging => "clear staging",
            LoadStage::CreateStaging => "create staging",
            LoadStage::WriteStaging => "write staging",
            LoadStage::Copy => "copy",
            LoadStage::DropStaging => "drop staging",
        }
    }

    fn fail(self, cause: Error) -> Error {
        Error::load(self.as_str(), cause.to_string())
    }
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a completed load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub target: TableName,
    pub staging: TableName,
    /// Rows written to the staging table
    pub staged: u64,
    /// Rows inserted into the target table
    pub loaded: u64,
}

/// Loads records into a target table through a per-run staging table
pub struct StagingLoader {
    backend: Arc<dyn StagingBackend>,
    target: TableName,
}

impl StagingLoader {
    pub fn new(backend: Arc<dyn StagingBackend>, target: TableName) -> Self {
        Self { backend, target }
    }

    pub fn target(&self) -> &TableName {
        &self.target
    }

    /// Load records, returning the number of rows inserted into the target
    ///
    /// Any staging table left by an earlier run is dropped first. Once the
    /// staging table has been created it is dropped on every exit path; when
    /// that drop fails after an earlier stage already failed, the earlier
    /// error is returned and the drop failure is logged.
    pub async fn load(&self, records: &[ObstacleRecord], valid_from: NaiveDate) -> Result<LoadReport> {
        let staging = self.target.staging();
        info!(
            "Loading {} records into {} via {}",
            records.len(),
            self.target,
            staging
        );

        self.backend
            .drop_table_if_exists(&staging)
            .await
            .map_err(|e| LoadStage::ClearStaging.fail(e))?;

        let outcome = self.stage_and_copy(&staging, records, valid_from).await;
        let cleanup = self.backend.drop_table_if_exists(&staging).await;

        match (outcome, cleanup) {
            (Ok((staged, loaded)), Ok(())) => {
                info!("Loaded {} rows into {}", loaded, self.target);
                Ok(LoadReport {
                    target: self.target.clone(),
                    staging,
                    staged,
                    loaded,
                })
            }
            (Ok(_), Err(drop_error)) => {
                error!("Failed to drop staging table {}: {}", staging, drop_error);
                Err(LoadStage::DropStaging.fail(drop_error))
            }
            (Err(load_error), Ok(())) => {
                error!("{}", load_error);
                Err(load_error)
            }
            (Err(load_error), Err(drop_error)) => {
                error!("{}", load_error);
                warn!(
                    "Staging table {} could not be dropped after failure: {}",
                    staging, drop_error
                );
                Err(load_error)
            }
        }
    }

    async fn stage_and_copy(
        &self,
        staging: &TableName,
        records: &[ObstacleRecord],
        valid_from: NaiveDate,
    ) -> Result<(u64, u64)> {
        self.backend
            .create_staging_table(staging)
            .await
            .map_err(|e| LoadStage::CreateStaging.fail(e))?;

        let staged = self
            .backend
            .write_staging(staging, records)
            .await
            .map_err(|e| LoadStage::WriteStaging.fail(e))?;
        info!("Staged {} rows in {}", staged, staging);

        let loaded = self
            .backend
            .copy_to_target(staging, &self.target, valid_from)
            .await
            .map_err(|e| LoadStage::Copy.fail(e))?;

        Ok((staged, loaded))
    }
}
