//! The fixed step plan.

use std::fmt;
use std::path::PathBuf;

use crate::command::ExternalCommand;
use crate::config::PipelineConfig;

/// Identifies one stage of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Install,
    Clean,
    Build,
    CopyAsset,
    Verify,
    Preview,
}

impl StepKind {
    /// All stages in execution order.
    pub const ALL: [StepKind; 6] = [
        StepKind::Install,
        StepKind::Clean,
        StepKind::Build,
        StepKind::CopyAsset,
        StepKind::Verify,
        StepKind::Preview,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StepKind::Install => "install",
            StepKind::Clean => "clean",
            StepKind::Build => "build",
            StepKind::CopyAsset => "copy-asset",
            StepKind::Verify => "verify",
            StepKind::Preview => "preview",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a step does when executed.
#[derive(Debug, Clone, PartialEq)]
pub enum StepAction {
    /// Delegate to an external command
    Command(ExternalCommand),

    /// Delete `dir` if present, then recreate it empty
    Clean { dir: PathBuf },

    /// Copy `source` into `dest_dir` if it exists
    CopyAsset { source: PathBuf, dest_dir: PathBuf },

    /// Require `artifact` to exist
    Verify { artifact: PathBuf },
}

/// A single stage of the plan.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub kind: StepKind,
    pub description: String,
    pub action: StepAction,
}

impl Step {
    /// Progress banner, e.g. `[3/6] Running build`.
    pub fn banner(&self, position: usize, total: usize) -> String {
        format!("[{}/{}] {}", position, total, self.description)
    }
}

/// Build the ordered plan for `config`.
pub fn plan(config: &PipelineConfig) -> Vec<Step> {
    let output_dir = config.output_path();
    let asset_name = config
        .asset
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| config.asset.display().to_string());

    StepKind::ALL
        .iter()
        .map(|&kind| {
            let (description, action) = match kind {
                StepKind::Install => (
                    "Installing dependencies".to_string(),
                    StepAction::Command(config.install.clone()),
                ),
                StepKind::Clean => (
                    format!("Cleaning {}", config.output_dir.display()),
                    StepAction::Clean {
                        dir: output_dir.clone(),
                    },
                ),
                StepKind::Build => (
                    "Running build".to_string(),
                    StepAction::Command(config.build.clone()),
                ),
                StepKind::CopyAsset => (
                    format!("Copying {}", asset_name),
                    StepAction::CopyAsset {
                        source: config.asset_path(),
                        dest_dir: output_dir.clone(),
                    },
                ),
                StepKind::Verify => (
                    "Verifying build".to_string(),
                    StepAction::Verify {
                        artifact: config.artifact_path(),
                    },
                ),
                StepKind::Preview => (
                    "Starting build preview".to_string(),
                    StepAction::Command(config.preview.clone()),
                ),
            };

            Step {
                kind,
                description,
                action,
            }
        })
        .collect()
}
