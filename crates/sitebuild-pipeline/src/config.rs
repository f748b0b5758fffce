//! Pipeline configuration and the optional `sitebuild.toml` file.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::command::ExternalCommand;

/// Name of the config file looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "sitebuild.toml";

/// Resolved configuration for a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Project root; commands run here and relative paths resolve against it
    pub root: PathBuf,

    /// Output directory, recreated on every run
    pub output_dir: PathBuf,

    /// Optional static asset copied into the output directory
    pub asset: PathBuf,

    /// File that must exist in the output directory after the build
    pub artifact: PathBuf,

    /// Dependency install command
    pub install: ExternalCommand,

    /// Build command
    pub build: ExternalCommand,

    /// Long-running preview server command
    pub preview: ExternalCommand,

    /// URL announced before the preview server starts
    pub preview_url: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            output_dir: PathBuf::from(default_output_dir()),
            asset: PathBuf::from(default_asset()),
            artifact: PathBuf::from(default_artifact()),
            install: ExternalCommand::npm(["install"]),
            build: ExternalCommand::npm(["run", "build"]),
            preview: ExternalCommand::npm(["run", "preview"]),
            preview_url: default_preview_url(),
        }
    }
}

impl PipelineConfig {
    /// Default configuration rooted at `root`.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Output directory resolved against the root.
    pub fn output_path(&self) -> PathBuf {
        self.root.join(&self.output_dir)
    }

    /// Asset source resolved against the root.
    pub fn asset_path(&self) -> PathBuf {
        self.root.join(&self.asset)
    }

    /// Expected artifact resolved against the output directory.
    pub fn artifact_path(&self) -> PathBuf {
        self.output_path().join(&self.artifact)
    }
}

/// Configuration file structure (sitebuild.toml).
#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct ConfigFile {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct PathsConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_asset")]
    pub asset: String,
    /// Relative to `output_dir`
    #[serde(default = "default_artifact")]
    pub artifact: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            asset: default_asset(),
            artifact: default_artifact(),
        }
    }
}

/// Command overrides as argv lists. Unset entries keep the npm defaults.
#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct CommandsConfig {
    pub install: Option<Vec<String>>,
    pub build: Option<Vec<String>>,
    pub preview: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct PreviewConfig {
    #[serde(default = "default_preview_url")]
    pub url: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            url: default_preview_url(),
        }
    }
}

fn default_output_dir() -> String {
    "dist".to_string()
}
fn default_asset() -> String {
    "public/favicon.ico".to_string()
}
fn default_artifact() -> String {
    "index.html".to_string()
}
fn default_preview_url() -> String {
    "http://localhost:5000".to_string()
}

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {message}")]
    ReadError { path: String, message: String },

    #[error("Failed to parse {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Command `{0}` must not be empty")]
    EmptyCommand(&'static str),

    #[error("Invalid output_dir `{0}`: must be a subdirectory of the project root")]
    InvalidOutputDir(String),
}

impl ConfigFile {
    /// Parse a config file from TOML source.
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Resolve into a runnable configuration rooted at `root`.
    pub fn into_pipeline_config(self, root: impl Into<PathBuf>) -> Result<PipelineConfig, ConfigError> {
        let defaults = PipelineConfig::for_root(root);
        let output_dir = resolve_output_dir(self.paths.output_dir)?;

        Ok(PipelineConfig {
            output_dir,
            asset: PathBuf::from(self.paths.asset),
            artifact: PathBuf::from(self.paths.artifact),
            install: resolve_command("install", self.commands.install, defaults.install.clone())?,
            build: resolve_command("build", self.commands.build, defaults.build.clone())?,
            preview: resolve_command("preview", self.commands.preview, defaults.preview.clone())?,
            preview_url: self.preview.url,
            ..defaults
        })
    }
}

fn resolve_command(
    name: &'static str,
    argv: Option<Vec<String>>,
    default: ExternalCommand,
) -> Result<ExternalCommand, ConfigError> {
    match argv {
        Some(argv) => ExternalCommand::from_argv(&argv).ok_or(ConfigError::EmptyCommand(name)),
        None => Ok(default),
    }
}

/// The clean step deletes this directory, so it must name something strictly
/// below the root.
fn resolve_output_dir(output_dir: String) -> Result<PathBuf, ConfigError> {
    let path = PathBuf::from(&output_dir);
    let mut has_normal = false;

    for component in path.components() {
        match component {
            Component::Normal(_) => has_normal = true,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ConfigError::InvalidOutputDir(output_dir));
            }
        }
    }

    if !has_normal || path.is_absolute() {
        return Err(ConfigError::InvalidOutputDir(output_dir));
    }
    Ok(path)
}

/// Load configuration from `path` if it exists.
/// Returns an error if the config file exists but is malformed or unreadable.
pub fn load_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    if let Err(e) = fs::metadata(path) {
        if e.kind() == io::ErrorKind::NotFound {
            tracing::debug!("No {} found, using defaults", path.display());
            return Ok(ConfigFile::default());
        }
        return Err(ConfigError::ReadError {
            path: path.display().to_string(),
            message: e.to_string(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let config = ConfigFile::from_toml_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    tracing::info!("Loaded config from {}", path.display());
    Ok(config)
}
