//! Ingestion pipeline orchestration
//!
//! One run takes one source file through
//! `ReadSource → Rename&Decompose → ValidateCoordinates → Validate&Quarantine → Load`.
//! Fatal errors abort the run before anything is loaded; per-row failures are
//! collected and written to the quarantine file.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::app::adapters::database::TableName;
use crate::app::adapters::reference_store::ReferenceStore;
use crate::app::models::{FileType, QuarantineReason};
use crate::app::services::dof_reader::{DofReader, ReaderOptions};
use crate::app::services::format_config::{FormatConfiguration, FormatResolver};
use crate::app::services::obstacle_types::{ObstacleTypeIndex, TypeSurvey};
use crate::app::services::record_processor::{ProcessingStats, QuarantineWriter, RecordProcessor};
use crate::app::services::staging_loader::{StagingBackend, StagingLoader};
use crate::config::Config;
use crate::{Error, Result};

/// Run settings taken from the application config
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub reader: ReaderOptions,

    /// Directory for the quarantine file; `None` disables the file
    pub quarantine_dir: Option<PathBuf>,

    /// `valid_from` of loaded rows; the run date when unset
    pub valid_from: Option<NaiveDate>,
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            reader: ReaderOptions {
                delimiter: config.ingest.delimiter_byte()?,
                header_lines: config.ingest.header_lines,
            },
            quarantine_dir: config
                .ingest
                .write_quarantine
                .then(|| config.ingest.quarantine_dir.clone()),
            valid_from: config.ingest.valid_from,
        })
    }
}

/// End-of-run report
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub file: PathBuf,
    pub file_type: FileType,

    /// Revision of the format configuration used
    pub revision_date: Option<NaiveDate>,

    pub stats: ProcessingStats,

    /// Target table and rows loaded; `None` for validation-only runs
    pub loaded: Option<(TableName, u64)>,

    pub valid_from: Option<NaiveDate>,
    pub quarantine_file: Option<PathBuf>,
    pub started: DateTime<Utc>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn rows_read(&self) -> usize {
        self.stats.rows_read
    }

    pub fn accepted(&self) -> usize {
        self.stats.accepted
    }

    pub fn quarantined(&self) -> usize {
        self.stats.quarantined
    }

    pub fn by_reason(&self) -> &BTreeMap<QuarantineReason, usize> {
        &self.stats.by_reason
    }

    pub fn rows_loaded(&self) -> Option<u64> {
        self.loaded.as_ref().map(|(_, rows)| *rows)
    }
}

/// Orchestrates one DOF ingestion run
pub struct IngestionPipeline {
    store: Arc<dyn ReferenceStore>,
    resolver: FormatResolver,
    loader: Option<StagingLoader>,
    options: PipelineOptions,
}

impl IngestionPipeline {
    /// Pipeline that validates and quarantines but never loads
    pub fn new(store: Arc<dyn ReferenceStore>, options: PipelineOptions) -> Self {
        Self {
            resolver: FormatResolver::new(store.clone()),
            store,
            loader: None,
            options,
        }
    }

    /// Load accepted rows into `target` through `backend`
    pub fn with_loader(mut self, backend: Arc<dyn StagingBackend>, target: TableName) -> Self {
        self.loader = Some(StagingLoader::new(backend, target));
        self
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_some()
    }

    /// Resolve the format configuration for a source file
    async fn resolve_format(&self, path: &Path) -> Result<FormatConfiguration> {
        if !path.exists() {
            return Err(Error::file_not_found(path.display().to_string()));
        }
        let file_type = FileType::from_path(path)?;
        self.resolver.resolve(file_type).await
    }

    /// Run the pipeline for one source file
    pub async fn run(&self, path: &Path) -> Result<RunSummary> {
        let started = Utc::now();
        let timer = Instant::now();

        let format = self.resolve_format(path).await?;
        let file_type = format.file_type;
        let obstacle_types = ObstacleTypeIndex::load(self.store.as_ref()).await?;

        let read = DofReader::new(&format, self.options.reader)
            .read_file(path)
            .await?;
        let result = RecordProcessor::new(&format, &obstacle_types).process(read)?;

        let quarantine_file = match &self.options.quarantine_dir {
            Some(dir) => QuarantineWriter::new(dir)
                .write(&result.quarantined, file_type, started)
                .await?,
            None => {
                if result.has_quarantined() {
                    warn!(
                        "{} quarantined rows not written (quarantine file disabled)",
                        result.stats.quarantined
                    );
                }
                None
            }
        };

        let valid_from = self.options.valid_from.unwrap_or_else(|| started.date_naive());
        let loaded = match &self.loader {
            Some(loader) if result.records.is_empty() => {
                warn!("No accepted records; {} left unchanged", loader.target());
                Some((loader.target().clone(), 0))
            }
            Some(loader) => {
                let report = loader.load(&result.records, valid_from).await?;
                Some((report.target, report.loaded))
            }
            None => None,
        };

        let summary = RunSummary {
            file: path.to_path_buf(),
            file_type,
            revision_date: format.revision_date,
            stats: result.stats,
            valid_from: loaded.as_ref().map(|_| valid_from),
            loaded,
            quarantine_file,
            started,
            elapsed: timer.elapsed(),
        };
        info!(
            "Run complete for {}: {}",
            summary.file.display(),
            summary.stats.summary()
        );
        Ok(summary)
    }

    /// Distinct obstacle type names in a source file, with row counts
    ///
    /// Rows that cannot be extracted are skipped; nothing is quarantined.
    pub async fn survey_obstacle_types(&self, path: &Path) -> Result<TypeSurvey> {
        let format = self.resolve_format(path).await?;
        let read = DofReader::new(&format, self.options.reader)
            .read_file(path)
            .await?;

        let column = format.source_of(&format.roles.obstacle_type);
        let survey = TypeSurvey::from_rows(&read.rows, column);
        info!("Found {} distinct obstacle types in {}", survey.len(), path.display());
        Ok(survey)
    }

    /// Obstacle type index of the reference store
    pub async fn obstacle_types(&self) -> Result<ObstacleTypeIndex> {
        ObstacleTypeIndex::load(self.store.as_ref()).await
    }
}
