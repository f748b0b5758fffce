//! Sequential build pipeline for front-end projects.
//!
//! Installs dependencies, rebuilds the output directory, copies an optional
//! static asset, checks that the build produced its entry point and then hands
//! the terminal over to the preview server. Every command is awaited before the
//! next step starts and the first failure ends the run.

pub mod actions;
pub mod command;
pub mod config;
pub mod pipeline;
pub mod step;

pub use command::{CommandRunner, CommandStatus, ExternalCommand, SystemRunner};
pub use config::{load_config, ConfigError, ConfigFile, PipelineConfig, CONFIG_FILE_NAME};
pub use pipeline::{Pipeline, PipelineError, PipelineWarning, RunReport};
pub use step::{plan, Step, StepAction, StepKind};
