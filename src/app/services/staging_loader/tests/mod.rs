//! Tests for the staging loader
//!
//! [`RecordingBackend`] keeps tables in memory, records every statement it
//! receives and can be told to fail a given stage.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::{LoadStage, StagingBackend};
use crate::app::adapters::database::TableName;
use crate::app::models::ObstacleRecord;
use crate::{Error, Result};


/// In-memory staging backend
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub calls: Mutex<Vec<String>>,
    pub tables: Mutex<HashMap<String, Vec<ObstacleRecord>>>,
    pub fail_on: Mutex<HashSet<&'static str>>,
}

impl RecordingBackend {
    pub fn failing(stages: &[LoadStage]) -> Self {
        let backend = Self::default();
        backend
            .fail_on
            .lock()
            .unwrap()
            .extend(stages.iter().map(LoadStage::as_str));
        backend
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn has_table(&self, table: &TableName) -> bool {
        self.tables.lock().unwrap().contains_key(&table.to_string())
    }

    pub fn rows_in(&self, table: &TableName) -> usize {
        self.tables
            .lock()
            .unwrap()
            .get(&table.to_string())
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn record(&self, call: String, stage: LoadStage) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.fail_on.lock().unwrap().contains(stage.as_str()) {
            return Err(Error::configuration(format!("injected failure at {}", stage)));
        }
        Ok(())
    }
}

#[async_trait]
impl StagingBackend for RecordingBackend {
    async fn drop_table_if_exists(&self, table: &TableName) -> Result<()> {
        let stage = if self.calls.lock().unwrap().is_empty() {
            LoadStage::ClearStaging
        } else {
            LoadStage::DropStaging
        };
        self.record(format!("drop {}", table), stage)?;
        self.tables.lock().unwrap().remove(&table.to_string());
        Ok(())
    }

    async fn create_staging_table(&self, staging: &TableName) -> Result<()> {
        self.record(format!("create {}", staging), LoadStage::CreateStaging)?;
        self.tables.lock().unwrap().insert(staging.to_string(), Vec::new());
        Ok(())
    }

    async fn write_staging(&self, staging: &TableName, records: &[ObstacleRecord]) -> Result<u64> {
        self.record(format!("write {} ({})", staging, records.len()), LoadStage::WriteStaging)?;
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(staging.to_string()).or_default();
        rows.extend_from_slice(records);
        Ok(records.len() as u64)
    }

    async fn copy_to_target(
        &self,
        staging: &TableName,
        target: &TableName,
        _valid_from: NaiveDate,
    ) -> Result<u64> {
        self.record(format!("copy {} -> {}", staging, target), LoadStage::Copy)?;
        let mut tables = self.tables.lock().unwrap();
        let staged = tables.get(&staging.to_string()).cloned().unwrap_or_default();
        tables.entry(target.to_string()).or_default().extend(staged.iter().cloned());
        Ok(staged.len() as u64)
    }
}

pub fn record(obst_number: &str) -> ObstacleRecord {
    ObstacleRecord {
        oas_code: "01".to_string(),
        obst_number: obst_number.to_string(),
        verif_status_code: "O".to_string(),
        type_id: 1,
        lighting_code: "R".to_string(),
        marking_code: "N".to_string(),
        hor_acc_code: 4,
        vert_acc_code: 'D',
        city: "MOBILE".to_string(),
        quantity: Some(1),
        agl: 254.0,
        amsl: Some(280.0),
        faa_study_number: None,
        action: "A".to_string(),
        julian_date: None,
        latitude: 30.6916667,
        longitude: -88.0433333,
    }
}

pub fn target() -> TableName {
    TableName::new("dof", "obstacle").unwrap()
}

pub fn valid_from() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 10, 6).unwrap()
}
