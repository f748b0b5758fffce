//! Full pipeline run.

use std::path::Path;

use anyhow::Result;
use sitebuild_pipeline::{Pipeline, SystemRunner};

use super::load_pipeline_config;

/// Run the pipeline. Any fatal step failure is returned as an error.
pub async fn run(config_path: &Path) -> Result<()> {
    let config = load_pipeline_config(config_path)?;

    tracing::info!("===================================");
    tracing::info!("sitebuild - build pipeline");
    tracing::info!("===================================");

    let report = Pipeline::new(config, SystemRunner).run().await?;

    tracing::debug!(
        "Completed {} steps with {} warnings in {:?}",
        report.completed.len(),
        report.warnings.len(),
        report.duration
    );

    Ok(())
}
