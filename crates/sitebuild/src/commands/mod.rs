//! CLI subcommands.

use std::path::Path;

use anyhow::Result;
use sitebuild_pipeline::{load_config, PipelineConfig};

pub mod init;
pub mod plan;
pub mod run;

/// Load `sitebuild.toml` (or defaults) rooted at the current directory.
fn load_pipeline_config(path: &Path) -> Result<PipelineConfig> {
    let file = load_config(path)?;
    Ok(file.into_pipeline_config(".")?)
}
