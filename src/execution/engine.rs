//! Main execution engine - drives a sequence from first stage to halt

use crate::{
    core::{EnvironmentProbe, Pipeline, RunOutcome, StageState},
    execution::{
        checker::PreconditionChecker,
        confirm::Confirmer,
        executor::{ExecutionResult, StageExecutor},
        runner::CommandRunner,
    },
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Events that can occur during sequence execution
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionEvent {
    SequenceStarted {
        execution_id: Uuid,
        pipeline_name: String,
        total_stages: usize,
    },
    StageStarted {
        stage_id: String,
        name: String,
        index: usize,
        total: usize,
    },
    StageSkipped {
        stage_id: String,
        reason: String,
    },
    PreconditionUnmet {
        stage_id: String,
        condition: String,
        remediation: String,
    },
    StageDeclined {
        stage_id: String,
    },
    StageMessage {
        stage_id: String,
        lines: Vec<String>,
    },
    StageCompleted {
        stage_id: String,
    },
    StageFailed {
        stage_id: String,
        error: String,
    },
    SequenceHalted {
        execution_id: Uuid,
        outcome: RunOutcome,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Sequencer: runs stages strictly in declared order and halts on the
/// first unmet precondition, declined confirmation or failed action
pub struct ExecutionEngine<R> {
    executor: StageExecutor<R>,
    checker: PreconditionChecker,
    confirmer: Arc<dyn Confirmer>,
    event_handlers: Vec<EventHandler>,
}

impl<R: CommandRunner> ExecutionEngine<R> {
    pub fn new(
        runner: R,
        confirmer: Arc<dyn Confirmer>,
        probe: Arc<dyn EnvironmentProbe>,
    ) -> Self {
        Self {
            executor: StageExecutor::new(runner),
            checker: PreconditionChecker::new(probe),
            confirmer,
            event_handlers: Vec::new(),
        }
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    /// Emit an event to all handlers
    fn emit_event(&self, event: ExecutionEvent) {
        for handler in &self.event_handlers {
            handler(event.clone());
        }
    }

    /// Execute the entire sequence
    pub async fn execute(&self, pipeline: &mut Pipeline) -> RunOutcome {
        let execution_id = pipeline.state.execution_id;
        let total = pipeline.stages.len();

        info!("Starting sequence: {} ({})", pipeline.name, execution_id);
        pipeline.state.start(total);
        self.emit_event(ExecutionEvent::SequenceStarted {
            execution_id,
            pipeline_name: pipeline.name.clone(),
            total_stages: total,
        });

        let mut outcome = RunOutcome::Completed;
        for index in 0..total {
            pipeline.state.enter(index);
            if let Some(halt) = self.execute_stage(pipeline, index).await {
                outcome = halt;
                break;
            }
            pipeline.state.advance();
        }

        match &outcome {
            RunOutcome::Completed | RunOutcome::Declined { .. } => {
                info!("Sequence {} finished: {:?}", pipeline.name, outcome.status())
            }
            _ => warn!("Sequence {} halted: {:?}", pipeline.name, outcome),
        }

        pipeline.state.halt(outcome.clone());
        self.emit_event(ExecutionEvent::SequenceHalted {
            execution_id,
            outcome: outcome.clone(),
        });

        outcome
    }

    /// Run one stage; `Some` means the sequence halts here
    async fn execute_stage(&self, pipeline: &mut Pipeline, index: usize) -> Option<RunOutcome> {
        let stage = pipeline.stages[index].clone();
        let variables = &pipeline.context.variables;

        self.emit_event(ExecutionEvent::StageStarted {
            stage_id: stage.id.clone(),
            name: stage.name.clone(),
            index,
            total: pipeline.stages.len(),
        });

        if let Some(skip_when) = stage.render_skip_when(variables) {
            if self.checker.is_satisfied(&skip_when) {
                let reason = format!("already done: {}", skip_when);
                info!("Skipping stage {} ({})", stage.id, reason);
                pipeline.stages[index].state = StageState::Skipped {
                    reason: reason.clone(),
                };
                self.emit_event(ExecutionEvent::StageSkipped {
                    stage_id: stage.id.clone(),
                    reason,
                });
                return None;
            }
        }

        let preconditions = stage.render_preconditions(variables);
        if let Some(unmet) = self.checker.first_unmet(&preconditions) {
            let condition = unmet.condition.to_string();
            let remediation = unmet.remediation_text();
            warn!("Stage {} blocked: {} does not hold", stage.id, condition);

            pipeline.stages[index].state = StageState::Blocked {
                reason: condition.clone(),
            };
            self.emit_event(ExecutionEvent::PreconditionUnmet {
                stage_id: stage.id.clone(),
                condition: condition.clone(),
                remediation: remediation.clone(),
            });
            return Some(RunOutcome::PreconditionUnmet {
                stage: stage.id,
                condition,
                remediation,
            });
        }

        if stage.confirm {
            let prompt = stage.confirmation_prompt(variables);
            match self.confirmer.confirm(&prompt) {
                Ok(true) => {}
                Ok(false) => {
                    info!("Operator declined stage {}", stage.id);
                    pipeline.stages[index].state = StageState::Declined;
                    self.emit_event(ExecutionEvent::StageDeclined {
                        stage_id: stage.id.clone(),
                    });
                    return Some(RunOutcome::Declined { stage: stage.id });
                }
                Err(e) => {
                    error!("Confirmation for stage {} failed: {}", stage.id, e);
                    pipeline.stages[index].state = StageState::Blocked {
                        reason: e.to_string(),
                    };
                    return Some(RunOutcome::Aborted {
                        stage: stage.id,
                        error: e.to_string(),
                    });
                }
            }
        }

        let started_at = Utc::now();
        pipeline.stages[index].state = StageState::Running { started_at };

        match self.executor.execute(&stage, &pipeline.context).await {
            ExecutionResult::Success {
                exit_code,
                messages,
            } => {
                pipeline.stages[index].state = StageState::Completed {
                    exit_code,
                    started_at,
                    completed_at: Utc::now(),
                };
                if !messages.is_empty() {
                    self.emit_event(ExecutionEvent::StageMessage {
                        stage_id: stage.id.clone(),
                        lines: messages,
                    });
                }
                self.emit_event(ExecutionEvent::StageCompleted {
                    stage_id: stage.id.clone(),
                });
                None
            }
            ExecutionResult::Failed { error, exit_code } => {
                pipeline.stages[index].state = StageState::Failed {
                    error: error.clone(),
                    exit_code,
                    started_at,
                    failed_at: Utc::now(),
                };
                self.emit_event(ExecutionEvent::StageFailed {
                    stage_id: stage.id.clone(),
                    error: error.clone(),
                });
                Some(RunOutcome::ChildFailed {
                    stage: stage.id,
                    exit_code,
                    error,
                })
            }
        }
    }
}
