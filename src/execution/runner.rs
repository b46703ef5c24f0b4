//! External process runner - spawns stage commands and waits for them

use crate::core::CommandSpec;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Error types for runner operations
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed while waiting for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// How a child process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitReport {
    /// Exit code, `None` when the child was terminated by a signal
    pub code: Option<i32>,
}

impl ExitReport {
    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Trait for running external commands - allows for different implementations
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion and report how it exited
    async fn run(&self, command: &CommandSpec) -> Result<ExitReport, RunnerError>;
}

/// Runner that spawns real child processes with inherited stdio
#[derive(Debug, Clone, Default)]
pub struct SubprocessRunner;

impl SubprocessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SubprocessRunner {
    /// Spawn the command and block until it exits.
    ///
    /// The child shares the terminal, so its output and any interactive
    /// prompts reach the operator directly.
    ///
    /// # Errors
    /// Returns `RunnerError` if:
    /// - The program cannot be spawned
    /// - Waiting on the child fails
    /// - The command outlives its timeout (the child is killed)
    async fn run(&self, command: &CommandSpec) -> Result<ExitReport, RunnerError> {
        debug!("Spawning {}", command);

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .envs(command.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        let status = match command.timeout {
            Some(limit) => match timeout(limit, child.wait()).await {
                Ok(status) => status,
                Err(_) => {
                    warn!("{} exceeded {:?}, killing it", command.program, limit);
                    if let Err(e) = child.kill().await {
                        warn!("Failed to kill {}: {}", command.program, e);
                    }
                    return Err(RunnerError::Timeout(limit));
                }
            },
            None => child.wait().await,
        }
        .map_err(|source| RunnerError::Wait {
            program: command.program.clone(),
            source,
        })?;

        let report = ExitReport {
            code: status.code(),
        };
        debug!("{} exited with {:?}", command.program, report.code);

        Ok(report)
    }
}
