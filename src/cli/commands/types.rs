//! Types command implementation
//!
//! Lists the distinct obstacle type names of a DOF file with their row
//! counts and flags those missing from the reference table.

use colored::*;
use std::path::Path;
use tracing::{debug, info};

use super::shared::{apply_database_overrides, create_spinner, describe, reference_store};
use crate::app::services::obstacle_types::TypeSurvey;
use crate::cli::args::TypesArgs;
use crate::config::Config;
use crate::pipeline::{IngestionPipeline, PipelineOptions};
use crate::{Error, Result};

/// Types command runner
pub async fn run_types(mut config: Config, args: TypesArgs, quiet: bool) -> Result<TypeSurvey> {
    debug!("Types arguments: {:?}", args);

    apply_database_overrides(&mut config, &args.database);
    if let Some(delimiter) = args.delimiter {
        config.ingest.delimiter = delimiter;
    }
    config.validate()?;

    let store = reference_store(&config, &args.offline).await?;
    let pipeline = IngestionPipeline::new(store, PipelineOptions::from_config(&config)?);

    let spinner = create_spinner(&format!("Reading {}...", describe(&args.file)), quiet);
    let result = pipeline.survey_obstacle_types(&args.file).await;
    spinner.finish_and_clear();
    let survey = result?;

    let unknown = survey.unknown(&pipeline.obstacle_types().await?);

    match &args.output {
        Some(path) => write_survey(&survey, &unknown, path).await?,
        None => print_survey(&survey, &unknown),
    }
    Ok(survey)
}

fn print_survey(survey: &TypeSurvey, unknown: &[String]) {
    println!("\n{}", "Obstacle Types".bright_green().bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for (name, count) in &survey.counts {
        if unknown.contains(name) {
            println!(
                "   • {:<20} {:>7}  {}",
                name.bright_yellow(),
                count,
                "(not in reference table)".bright_red()
            );
        } else {
            println!("   • {:<20} {:>7}", name, count);
        }
    }
    println!(
        "\n   {} types, {} unknown",
        survey.len().to_string().bright_white().bold(),
        unknown.len().to_string().bright_white().bold()
    );
    println!();
}

/// Write `type,count,known` rows to a CSV file
pub async fn write_survey(survey: &TypeSurvey, unknown: &[String], path: &Path) -> Result<()> {
    let file_name = path.display().to_string();
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(["type", "count", "known"])
        .map_err(|e| Error::csv_parsing(&file_name, "Failed to write header", Some(e)))?;
    for (name, count) in &survey.counts {
        let count = count.to_string();
        let known = (!unknown.contains(name)).to_string();
        writer
            .write_record([name.as_str(), count.as_str(), known.as_str()])
            .map_err(|e| Error::csv_parsing(&file_name, "Failed to write row", Some(e)))?;
    }
    let content = writer
        .into_inner()
        .map_err(|e| Error::io(format!("Failed to encode {}", file_name), e.into_error()))?;

    tokio::fs::write(path, content)
        .await
        .map_err(|e| Error::io(format!("Failed to write {}", file_name), e))?;

    info!("Wrote {} obstacle types to {}", survey.len(), file_name);
    Ok(())
}
