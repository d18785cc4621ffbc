//! Format configuration lookup

use std::sync::Arc;
use tracing::info;

use super::{FormatConfiguration, parse_settings};
use crate::app::adapters::reference_store::ReferenceStore;
use crate::app::models::FileType;
use crate::{Error, Result};

/// Resolves the stored format configuration for a file type
pub struct FormatResolver {
    store: Arc<dyn ReferenceStore>,
}

impl FormatResolver {
    pub fn new(store: Arc<dyn ReferenceStore>) -> Self {
        Self { store }
    }

    /// Fetch and validate the configuration for `file_type`
    ///
    /// Fails with [`Error::FormatNotFound`] when no record exists and with
    /// [`Error::Configuration`] when the stored payload is malformed.
    pub async fn resolve(&self, file_type: FileType) -> Result<FormatConfiguration> {
        let record = self
            .store
            .format_settings(file_type.tag())
            .await?
            .ok_or_else(|| Error::format_not_found(file_type.tag()))?;

        let config = parse_settings(file_type, record.revision_date, &record.settings)?;

        match config.revision_date {
            Some(date) => info!("Resolved '{}' format configuration (revision {})", file_type, date),
            None => info!("Resolved '{}' format configuration", file_type),
        }
        Ok(config)
    }
}
