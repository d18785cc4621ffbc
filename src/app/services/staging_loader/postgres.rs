//! PostgreSQL/PostGIS staging backend
//!
//! Every statement runs directly on the pool, so each one commits on its
//! own. The staging write is chunked multi-row INSERTs; the copy into the
//! target is a single `INSERT ... SELECT`.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use super::StagingBackend;
use crate::app::adapters::database::TableName;
use crate::app::models::ObstacleRecord;
use crate::constants::{SRID_WGS84, STAGING_INSERT_CHUNK};
use crate::{Error, Result};

/// Attribute columns shared by the staging and target tables
const RECORD_COLUMNS: &str = "oas_code, obst_number, verif_status_code, type_id, \
    lighting_code, marking_code, hor_acc_code, vert_acc_code, city, quantity, \
    agl, amsl, faa_study_number, action, julian_date";

/// `DROP TABLE IF EXISTS` for a table
pub fn drop_table_sql(table: &TableName) -> String {
    format!("DROP TABLE IF EXISTS {}", table.qualified())
}

/// DDL of the staging table
///
/// Column types are unconstrained; length and key constraints are enforced
/// by the target table during the copy.
pub fn create_staging_sql(staging: &TableName) -> String {
    format!(
        "CREATE TABLE {} (\
            oas_code text NOT NULL, \
            obst_number text NOT NULL, \
            verif_status_code text NOT NULL, \
            type_id smallint NOT NULL, \
            lighting_code text NOT NULL, \
            marking_code text NOT NULL, \
            hor_acc_code smallint NOT NULL, \
            vert_acc_code text NOT NULL, \
            city text NOT NULL, \
            quantity smallint, \
            agl double precision NOT NULL, \
            amsl double precision, \
            faa_study_number text, \
            action text NOT NULL, \
            julian_date text, \
            geom geometry(Point, {}) NOT NULL\
        )",
        staging.qualified(),
        SRID_WGS84
    )
}

/// Copy of every staged row into the target; `$1` is the `valid_from` date
pub fn copy_sql(staging: &TableName, target: &TableName) -> String {
    format!(
        "INSERT INTO {target} ({columns}, valid_from, location) \
         SELECT {columns}, $1, ST_Force2D(geom)::geography FROM {staging}",
        target = target.qualified(),
        staging = staging.qualified(),
        columns = RECORD_COLUMNS,
    )
}

/// Staging backend on a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStagingBackend {
    pool: PgPool,
}

impl PgStagingBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn execute(&self, sql: &str, context: &str) -> Result<u64> {
        debug!("{}: {}", context, sql);
        let result = sqlx::query(sql)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::database(context, e))?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl StagingBackend for PgStagingBackend {
    async fn drop_table_if_exists(&self, table: &TableName) -> Result<()> {
        self.execute(&drop_table_sql(table), "Failed to drop table")
            .await
            .map(|_| ())
    }

    async fn create_staging_table(&self, staging: &TableName) -> Result<()> {
        self.execute(&create_staging_sql(staging), "Failed to create staging table")
            .await
            .map(|_| ())
    }

    async fn write_staging(&self, staging: &TableName, records: &[ObstacleRecord]) -> Result<u64> {
        let mut written = 0;

        for chunk in records.chunks(STAGING_INSERT_CHUNK) {
            let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
                "INSERT INTO {} ({}, geom) ",
                staging.qualified(),
                RECORD_COLUMNS
            ));

            query_builder.push_values(chunk, |mut b, record| {
                b.push_bind(&record.oas_code)
                    .push_bind(&record.obst_number)
                    .push_bind(&record.verif_status_code)
                    .push_bind(record.type_id)
                    .push_bind(&record.lighting_code)
                    .push_bind(&record.marking_code)
                    .push_bind(record.hor_acc_code)
                    .push_bind(record.vert_acc_code.to_string())
                    .push_bind(&record.city)
                    .push_bind(record.quantity)
                    .push_bind(record.agl)
                    .push_bind(record.amsl)
                    .push_bind(&record.faa_study_number)
                    .push_bind(&record.action)
                    .push_bind(&record.julian_date)
                    .push("ST_SetSRID(ST_MakePoint(")
                    .push_bind_unseparated(record.longitude)
                    .push_unseparated(", ")
                    .push_bind_unseparated(record.latitude)
                    .push_unseparated(format!("), {})", SRID_WGS84));
            });

            let result = query_builder
                .build()
                .execute(&self.pool)
                .await
                .map_err(|e| Error::database("Failed to write staging rows", e))?;
            written += result.rows_affected();
            debug!("Staged {} of {} rows", written, records.len());
        }

        Ok(written)
    }

    async fn copy_to_target(
        &self,
        staging: &TableName,
        target: &TableName,
        valid_from: NaiveDate,
    ) -> Result<u64> {
        let sql = copy_sql(staging, target);
        debug!("Copying staged rows: {}", sql);

        let result = sqlx::query(&sql)
            .bind(valid_from)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::database(format!("Failed to copy into {}", target), e))?;
        Ok(result.rows_affected())
    }
}
