//! Staging-table load of obstacle records
//!
//! Records are written to a disposable staging table, copied into the
//! permanent obstacle table with a single statement, and the staging table
//! is dropped whether or not the copy succeeded.
//!
//! - [`loader`] - Stage orchestration and cleanup
//! - [`postgres`] - PostgreSQL/PostGIS backend

pub mod loader;
pub mod postgres;

#[cfg(test)]
pub mod tests;

pub use loader::{LoadReport, LoadStage, StagingLoader};
pub use postgres::PgStagingBackend;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::Result;
use crate::app::adapters::database::TableName;
use crate::app::models::ObstacleRecord;

/// Statements the staging loader issues, one at a time
#[async_trait]
pub trait StagingBackend: Send + Sync {
    /// Drop a table, succeeding when it does not exist
    async fn drop_table_if_exists(&self, table: &TableName) -> Result<()>;

    /// Create an empty staging table
    async fn create_staging_table(&self, staging: &TableName) -> Result<()>;

    /// Write records to the staging table outside any transaction
    async fn write_staging(&self, staging: &TableName, records: &[ObstacleRecord]) -> Result<u64>;

    /// Copy every staged row into the target in one statement
    async fn copy_to_target(
        &self,
        staging: &TableName,
        target: &TableName,
        valid_from: NaiveDate,
    ) -> Result<u64>;
}
