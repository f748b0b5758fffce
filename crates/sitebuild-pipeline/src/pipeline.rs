//! Sequential pipeline runner.

use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::actions::{clean_output_dir, copy_asset, count_files, verify_artifact};
use crate::command::{CommandRunner, CommandStatus, ExternalCommand};
use crate::config::PipelineConfig;
use crate::step::{plan, Step, StepAction, StepKind};

/// Errors that stop the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{step} step failed: `{command}` finished with {status}")]
    CommandFailed {
        step: StepKind,
        command: String,
        status: CommandStatus,
    },

    #[error("{step} step failed: could not start `{command}`")]
    Spawn {
        step: StepKind,
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{step} step failed: filesystem error at {}", path.display())]
    Filesystem {
        step: StepKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Build failed, {} was not generated", path.display())]
    MissingArtifact { path: PathBuf },
}

impl PipelineError {
    /// The step that failed.
    pub fn step(&self) -> StepKind {
        match self {
            PipelineError::CommandFailed { step, .. }
            | PipelineError::Spawn { step, .. }
            | PipelineError::Filesystem { step, .. } => *step,
            PipelineError::MissingArtifact { .. } => StepKind::Verify,
        }
    }
}

/// Non-fatal conditions reported during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineWarning {
    MissingAsset { path: PathBuf },
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineWarning::MissingAsset { path } => {
                write!(f, "Asset not found: {}", path.display())
            }
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Steps that finished, in order
    pub completed: Vec<StepKind>,

    /// Advisory warnings raised along the way
    pub warnings: Vec<PipelineWarning>,

    /// Total run time
    pub duration: Duration,
}

/// Runs the install, clean, build, copy, verify and preview steps in order.
pub struct Pipeline<R> {
    config: PipelineConfig,
    runner: R,
}

impl<R: CommandRunner> Pipeline<R> {
    /// Create a new pipeline.
    pub fn new(config: PipelineConfig, runner: R) -> Self {
        Self { config, runner }
    }

    /// The ordered step plan.
    pub fn steps(&self) -> Vec<Step> {
        plan(&self.config)
    }

    /// Execute every step, stopping at the first fatal failure.
    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        let start = Instant::now();
        let steps = self.steps();
        let total = steps.len();
        let mut report = RunReport::default();

        for (index, step) in steps.iter().enumerate() {
            tracing::info!("{}...", step.banner(index + 1, total));

            if let Some(warning) = self.execute(step).await? {
                tracing::warn!("{}", warning);
                report.warnings.push(warning);
            }
            report.completed.push(step.kind);
        }

        report.duration = start.elapsed();
        tracing::info!("Build completed successfully");

        Ok(report)
    }

    async fn execute(&self, step: &Step) -> Result<Option<PipelineWarning>, PipelineError> {
        match &step.action {
            StepAction::Command(command) => {
                if step.kind == StepKind::Preview {
                    tracing::info!("Press Ctrl+C to stop the preview server");
                    tracing::info!("Open: {}", self.config.preview_url);
                }
                self.run_command(step.kind, command).await?;
                Ok(None)
            }
            StepAction::Clean { dir } => {
                clean_output_dir(dir)
                    .await
                    .map_err(|source| PipelineError::Filesystem {
                        step: step.kind,
                        path: dir.clone(),
                        source,
                    })?;
                Ok(None)
            }
            StepAction::CopyAsset { source, dest_dir } => {
                let copied = copy_asset(source, dest_dir).await.map_err(|e| {
                    PipelineError::Filesystem {
                        step: step.kind,
                        path: source.clone(),
                        source: e,
                    }
                })?;

                match copied {
                    Some(dest) => {
                        tracing::debug!("Copied {} to {}", source.display(), dest.display());
                        Ok(None)
                    }
                    None => Ok(Some(PipelineWarning::MissingAsset {
                        path: source.clone(),
                    })),
                }
            }
            StepAction::Verify { artifact } => {
                let present = verify_artifact(artifact).await.map_err(|source| {
                    PipelineError::Filesystem {
                        step: step.kind,
                        path: artifact.clone(),
                        source,
                    }
                })?;

                if !present {
                    return Err(PipelineError::MissingArtifact {
                        path: artifact.clone(),
                    });
                }

                let output_dir = self.config.output_path();
                tracing::info!(
                    "Found {} files in {}",
                    count_files(&output_dir),
                    output_dir.display()
                );
                Ok(None)
            }
        }
    }

    async fn run_command(&self, kind: StepKind, command: &ExternalCommand) -> Result<(), PipelineError> {
        let status = self
            .runner
            .run(command, &self.config.root)
            .await
            .map_err(|source| PipelineError::Spawn {
                step: kind,
                command: command.to_string(),
                source,
            })?;

        if !status.success() {
            return Err(PipelineError::CommandFailed {
                step: kind,
                command: command.to_string(),
                status,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use std::io;
    use std::path::Path;
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    /// Scripted behaviour for one command line.
    enum Script {
        Exit(i32),
        /// Write files relative to the working directory, then exit 0
        Write(Vec<(&'static str, &'static str)>),
        SpawnError,
    }

    /// Runner that records invocations and follows a script instead of
    /// spawning processes. Unscripted commands exit 0.
    #[derive(Default)]
    struct ScriptedRunner {
        scripts: HashMap<String, Script>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        fn on(mut self, command: &str, script: Script) -> Self {
            self.scripts.insert(command.to_string(), script);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CommandRunner for &ScriptedRunner {
        async fn run(&self, command: &ExternalCommand, cwd: &Path) -> io::Result<CommandStatus> {
            let line = command.to_string();
            self.calls.lock().unwrap().push(line.clone());

            match self.scripts.get(&line) {
                None => Ok(CommandStatus::exited(0)),
                Some(Script::Exit(code)) => Ok(CommandStatus::exited(*code)),
                Some(Script::Write(files)) => {
                    for (path, content) in files {
                        let path = cwd.join(path);
                        if let Some(parent) = path.parent() {
                            fs::create_dir_all(parent)?;
                        }
                        fs::write(path, content)?;
                    }
                    Ok(CommandStatus::exited(0))
                }
                Some(Script::SpawnError) => Err(io::Error::new(io::ErrorKind::NotFound, "not found")),
            }
        }
    }

    fn test_config(root: &Path) -> PipelineConfig {
        PipelineConfig {
            install: ExternalCommand::new("pkg", ["install"]),
            build: ExternalCommand::new("pkg", ["build"]),
            preview: ExternalCommand::new("pkg", ["preview"]),
            ..PipelineConfig::for_root(root)
        }
    }

    fn build_writes_index() -> Script {
        Script::Write(vec![
            ("dist/index.html", "<html></html>"),
            ("dist/assets/app.js", "console.log(1)"),
        ])
    }

    fn files_under(dir: &Path) -> Vec<String> {
        let mut files: Vec<String> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                e.path()
                    .strip_prefix(dir)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        files.sort();
        files
    }

    #[tokio::test]
    async fn install_failure_stops_before_build() {
        let temp = tempdir().unwrap();
        let runner = ScriptedRunner::default().on("pkg install", Script::Exit(1));

        let err = Pipeline::new(test_config(temp.path()), &runner)
            .run()
            .await
            .unwrap_err();

        assert_eq!(err.step(), StepKind::Install);
        assert!(matches!(
            err,
            PipelineError::CommandFailed { status, .. } if status == CommandStatus::exited(1)
        ));
        assert_eq!(runner.calls(), vec!["pkg install"]);
        assert!(!temp.path().join("dist").exists());
    }

    #[tokio::test]
    async fn build_failure_stops_before_verify() {
        let temp = tempdir().unwrap();
        let runner = ScriptedRunner::default().on("pkg build", Script::Exit(2));

        let err = Pipeline::new(test_config(temp.path()), &runner)
            .run()
            .await
            .unwrap_err();

        assert_eq!(err.step(), StepKind::Build);
        assert_eq!(runner.calls(), vec!["pkg install", "pkg build"]);
    }

    #[tokio::test]
    async fn clean_discards_previous_output() {
        let temp = tempdir().unwrap();
        let dist = temp.path().join("dist");
        fs::create_dir_all(dist.join("stale")).unwrap();
        fs::write(dist.join("stale/old.js"), "old").unwrap();
        fs::write(dist.join("leftover.txt"), "old").unwrap();

        let runner = ScriptedRunner::default().on("pkg build", build_writes_index());

        Pipeline::new(test_config(temp.path()), &runner)
            .run()
            .await
            .unwrap();

        assert_eq!(files_under(&dist), vec!["assets/app.js", "index.html"]);
    }

    #[tokio::test]
    async fn missing_asset_warns_and_continues() {
        let temp = tempdir().unwrap();
        let runner = ScriptedRunner::default().on("pkg build", build_writes_index());

        let report = Pipeline::new(test_config(temp.path()), &runner)
            .run()
            .await
            .unwrap();

        assert_eq!(report.completed, StepKind::ALL.to_vec());
        assert_eq!(
            report.warnings,
            vec![PipelineWarning::MissingAsset {
                path: temp.path().join("public/favicon.ico")
            }]
        );
        assert_eq!(runner.calls(), vec!["pkg install", "pkg build", "pkg preview"]);
    }

    #[tokio::test]
    async fn missing_artifact_skips_preview() {
        let temp = tempdir().unwrap();
        let runner = ScriptedRunner::default()
            .on("pkg build", Script::Write(vec![("dist/other.html", "")]));

        let err = Pipeline::new(test_config(temp.path()), &runner)
            .run()
            .await
            .unwrap_err();

        assert!(matches!(
            &err,
            PipelineError::MissingArtifact { path } if *path == temp.path().join("dist/index.html")
        ));
        assert_eq!(runner.calls(), vec!["pkg install", "pkg build"]);
    }

    #[tokio::test]
    async fn full_run_copies_asset_and_previews() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("public")).unwrap();
        fs::write(temp.path().join("public/favicon.ico"), "icon").unwrap();

        let runner = ScriptedRunner::default().on("pkg build", build_writes_index());

        let started = Instant::now();
        let report = Pipeline::new(test_config(temp.path()), &runner)
            .run()
            .await
            .unwrap();

        assert!(report.duration <= started.elapsed());
        assert!(report.warnings.is_empty());
        assert_eq!(report.completed, StepKind::ALL.to_vec());
        assert_eq!(
            files_under(&temp.path().join("dist")),
            vec!["assets/app.js", "favicon.ico", "index.html"]
        );
        assert_eq!(runner.calls(), vec!["pkg install", "pkg build", "pkg preview"]);
    }

    #[tokio::test]
    async fn preview_failure_is_fatal() {
        let temp = tempdir().unwrap();
        let runner = ScriptedRunner::default()
            .on("pkg build", build_writes_index())
            .on("pkg preview", Script::Exit(130));

        let err = Pipeline::new(test_config(temp.path()), &runner)
            .run()
            .await
            .unwrap_err();

        assert_eq!(err.step(), StepKind::Preview);
    }

    #[tokio::test]
    async fn spawn_failure_is_fatal() {
        let temp = tempdir().unwrap();
        let runner = ScriptedRunner::default().on("pkg install", Script::SpawnError);

        let err = Pipeline::new(test_config(temp.path()), &runner)
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Spawn { step: StepKind::Install, .. }));
        assert_eq!(
            err.to_string(),
            "install step failed: could not start `pkg install`"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_real_processes_end_to_end() {
        use crate::command::SystemRunner;

        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("public")).unwrap();
        fs::write(temp.path().join("public/favicon.ico"), "icon").unwrap();

        let config = PipelineConfig {
            install: ExternalCommand::new("sh", ["-c", "touch installed"]),
            build: ExternalCommand::new(
                "sh",
                ["-c", "mkdir -p dist/assets && echo '<html>' > dist/index.html && echo x > dist/assets/app.js"],
            ),
            preview: ExternalCommand::new("sh", ["-c", "exit 0"]),
            ..PipelineConfig::for_root(temp.path())
        };

        let report = Pipeline::new(config, SystemRunner).run().await.unwrap();

        assert_eq!(report.completed.len(), 6);
        assert!(temp.path().join("installed").exists());
        assert_eq!(
            files_under(&temp.path().join("dist")),
            vec!["assets/app.js", "favicon.ico", "index.html"]
        );
    }
}
