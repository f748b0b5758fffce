//! Print the step plan without running it.

use std::path::Path;

use anyhow::Result;
use sitebuild_pipeline::{plan, Step, StepAction};

use super::load_pipeline_config;

/// Run the plan command.
pub fn run(config_path: &Path) -> Result<()> {
    let config = load_pipeline_config(config_path)?;
    let steps = plan(&config);

    for (index, step) in steps.iter().enumerate() {
        tracing::info!("{}", step.banner(index + 1, steps.len()));
        tracing::info!("    {}", describe(step));
    }

    Ok(())
}

fn describe(step: &Step) -> String {
    match &step.action {
        StepAction::Command(command) => format!("$ {}", command),
        StepAction::Clean { dir } => format!("recreate {}", dir.display()),
        StepAction::CopyAsset { source, dest_dir } => {
            format!("copy {} -> {} (optional)", source.display(), dest_dir.display())
        }
        StepAction::Verify { artifact } => format!("require {}", artifact.display()),
    }
}
