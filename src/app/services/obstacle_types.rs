//! Obstacle type name to id index
//!
//! Built once per run from the reference table and read-only afterwards.
//! [`TypeSurvey`] lists the type names a source file actually uses, for
//! seeding or checking the reference table.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info};

use crate::app::adapters::reference_store::ReferenceStore;
use crate::app::models::RawRow;
use crate::{Error, Result};

/// Obstacle type ids keyed by the type name used in the source files
#[derive(Debug, Clone, Default)]
pub struct ObstacleTypeIndex {
    ids: HashMap<String, i16>,
}

impl ObstacleTypeIndex {
    /// Build the index from (name, id) pairs
    ///
    /// Names are trimmed. The same name mapped to two different ids is a
    /// reference-data error.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, i16)>) -> Result<Self> {
        let mut ids = HashMap::new();
        for (name, id) in pairs {
            let name = name.trim().to_string();
            if let Some(existing) = ids.insert(name.clone(), id) {
                if existing != id {
                    return Err(Error::configuration(format!(
                        "Obstacle type '{}' has two ids ({} and {})",
                        name, existing, id
                    )));
                }
            }
        }
        debug!("Built obstacle type index with {} entries", ids.len());
        Ok(Self { ids })
    }

    /// Load the index from the reference store
    pub async fn load(store: &dyn ReferenceStore) -> Result<Self> {
        let index = Self::from_pairs(store.obstacle_types().await?)?;
        info!("Loaded {} obstacle types", index.len());
        Ok(index)
    }

    /// Id for a type name as it appears in the source file
    pub fn resolve(&self, name: &str) -> Option<i16> {
        self.ids.get(name.trim()).copied()
    }

    /// Distinct names from `names` that are absent from the index, sorted
    pub fn unknown<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        names
            .into_iter()
            .map(str::trim)
            .filter(|name| !self.ids.contains_key(*name))
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Distinct obstacle type names of a source file with their row counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeSurvey {
    pub counts: BTreeMap<String, usize>,
}

impl TypeSurvey {
    /// Count the trimmed, non-empty values of `column` across rows
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a RawRow>, column: &str) -> Self {
        let mut counts = BTreeMap::new();
        for name in rows.into_iter().filter_map(|row| row.get(column)) {
            let name = name.trim();
            if !name.is_empty() {
                *counts.entry(name.to_string()).or_insert(0) += 1;
            }
        }
        Self { counts }
    }

    /// Surveyed names missing from the index
    pub fn unknown(&self, index: &ObstacleTypeIndex) -> Vec<String> {
        index.unknown(self.counts.keys().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
