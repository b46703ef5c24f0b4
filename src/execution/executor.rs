//! Stage executor - runs the action of an individual stage

use crate::{
    core::{SequenceContext, Stage, StageAction},
    execution::runner::{CommandRunner, RunnerError},
};
use tracing::{debug, error, info};

/// Result of executing a stage action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    /// Action completed successfully
    Success {
        /// Child exit code for command actions
        exit_code: Option<i32>,
        /// Lines to show the operator
        messages: Vec<String>,
    },
    /// Action failed; the sequence must halt
    Failed {
        error: String,
        exit_code: Option<i32>,
    },
}

/// Executes a single stage's action
pub struct StageExecutor<R> {
    runner: R,
}

impl<R: CommandRunner> StageExecutor<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Execute a stage and return the result
    pub async fn execute(&self, stage: &Stage, context: &SequenceContext) -> ExecutionResult {
        info!("Executing stage: {}", stage.id);

        match stage.render_action(&context.variables) {
            StageAction::Command(spec) => {
                info!("Running: {}", spec);
                match self.runner.run(&spec).await {
                    Ok(report) if report.success() => ExecutionResult::Success {
                        exit_code: report.code,
                        messages: Vec::new(),
                    },
                    Ok(report) => {
                        let error = match report.code {
                            Some(code) => format!("{} exited with code {}", spec.program, code),
                            None => format!("{} was terminated by a signal", spec.program),
                        };
                        error!("Stage {} failed: {}", stage.id, error);
                        ExecutionResult::Failed {
                            error,
                            exit_code: report.code,
                        }
                    }
                    Err(e) => {
                        error!("Stage {} failed: {}", stage.id, e);
                        let exit_code = match e {
                            RunnerError::Spawn { .. } => Some(127),
                            RunnerError::Timeout(_) | RunnerError::Wait { .. } => None,
                        };
                        ExecutionResult::Failed {
                            error: e.to_string(),
                            exit_code,
                        }
                    }
                }
            }
            StageAction::EnsureDirs(paths) => {
                let mut messages = Vec::with_capacity(paths.len());
                for path in &paths {
                    let existed = std::path::Path::new(path).is_dir();
                    if let Err(e) = std::fs::create_dir_all(path) {
                        error!("Stage {} could not create {}: {}", stage.id, path, e);
                        return ExecutionResult::Failed {
                            error: format!("failed to create directory {}: {}", path, e),
                            exit_code: None,
                        };
                    }
                    if existed {
                        debug!("Directory {} already exists", path);
                        messages.push(format!("{} (exists)", path));
                    } else {
                        messages.push(format!("{} (created)", path));
                    }
                }
                ExecutionResult::Success {
                    exit_code: None,
                    messages,
                }
            }
            StageAction::Message(lines) => ExecutionResult::Success {
                exit_code: None,
                messages: lines,
            },
        }
    }
}
