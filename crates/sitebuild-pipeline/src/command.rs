//! External commands and the runner seam used to execute them.

use std::fmt;
use std::io;
use std::path::Path;
use std::process::ExitStatus;

/// A program plus its arguments, executed directly without a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    /// Program to execute (looked up on PATH)
    pub program: String,

    /// Arguments passed to the program
    pub args: Vec<String>,
}

impl ExternalCommand {
    /// Create a command from a program and its arguments.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a command from an argv-style list. Returns `None` for an empty list.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        if program.trim().is_empty() {
            return None;
        }
        Some(Self::new(program.clone(), args.iter().cloned()))
    }

    /// A package-manager invocation, e.g. `npm run build`.
    pub fn npm<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        // npm ships as a batch shim on Windows
        let program = if cfg!(windows) { "npm.cmd" } else { "npm" };
        Self::new(program, args)
    }
}

impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Exit status of a finished external command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    /// Exit code, or `None` if the process was terminated by a signal
    pub code: Option<i32>,
}

impl CommandStatus {
    /// Status of a process that exited with `code`.
    pub fn exited(code: i32) -> Self {
        Self { code: Some(code) }
    }

    /// Status of a process that was killed by a signal.
    pub fn terminated() -> Self {
        Self { code: None }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<ExitStatus> for CommandStatus {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {}", code),
            None => f.write_str("termination by signal"),
        }
    }
}

/// Executes external commands on behalf of the pipeline.
///
/// Implementations must not return until the command has finished.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run `command` in `cwd` and wait for it to exit.
    ///
    /// An `Err` means the command could not be started at all.
    async fn run(&self, command: &ExternalCommand, cwd: &Path) -> io::Result<CommandStatus>;
}

/// Runs commands as real child processes with inherited stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    async fn run(&self, command: &ExternalCommand, cwd: &Path) -> io::Result<CommandStatus> {
        tracing::debug!("Spawning `{}` in {}", command, cwd.display());

        let status = tokio::process::Command::new(&command.program)
            .args(&command.args)
            .current_dir(cwd)
            .status()
            .await?;

        Ok(status.into())
    }
}
