//! Execution state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Overall sequence status, as recorded in history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Sequence has not started
    Pending,
    /// Sequence is currently running
    Running,
    /// Every stage completed or was skipped as unnecessary
    Completed,
    /// Operator declined a stage; graceful stop
    Declined,
    /// A precondition did not hold or a child failed
    Failed,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Declined => "declined",
            ExecutionStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ExecutionStatus::Pending),
            "running" => Some(ExecutionStatus::Running),
            "completed" => Some(ExecutionStatus::Completed),
            "declined" => Some(ExecutionStatus::Declined),
            "failed" => Some(ExecutionStatus::Failed),
            _ => None,
        }
    }
}

/// State of a single stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageState {
    /// Stage has not been reached
    Pending,
    /// Stage is currently running
    Running { started_at: DateTime<Utc> },
    /// Stage action finished successfully
    Completed {
        exit_code: Option<i32>,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    },
    /// Stage was unnecessary (its skip condition already held)
    Skipped { reason: String },
    /// Operator declined the stage
    Declined,
    /// A precondition did not hold; the action never ran
    Blocked { reason: String },
    /// Stage action failed
    Failed {
        error: String,
        exit_code: Option<i32>,
        started_at: DateTime<Utc>,
        failed_at: DateTime<Utc>,
    },
}

/// Why a sequence halted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// Every stage completed or was skipped as unnecessary
    Completed,
    /// Operator declined a confirmation
    Declined { stage: String },
    /// A precondition did not hold
    PreconditionUnmet {
        stage: String,
        condition: String,
        remediation: String,
    },
    /// An action failed (non-zero exit, spawn error, timeout, io)
    ChildFailed {
        stage: String,
        exit_code: Option<i32>,
        error: String,
    },
    /// Operator input could not be read
    Aborted { stage: String, error: String },
}

impl RunOutcome {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Completed | RunOutcome::Declined { .. } => 0,
            RunOutcome::PreconditionUnmet { .. }
            | RunOutcome::ChildFailed { .. }
            | RunOutcome::Aborted { .. } => 1,
        }
    }

    pub fn is_error(&self) -> bool {
        self.exit_code() != 0
    }

    pub fn status(&self) -> ExecutionStatus {
        match self {
            RunOutcome::Completed => ExecutionStatus::Completed,
            RunOutcome::Declined { .. } => ExecutionStatus::Declined,
            RunOutcome::PreconditionUnmet { .. }
            | RunOutcome::ChildFailed { .. }
            | RunOutcome::Aborted { .. } => ExecutionStatus::Failed,
        }
    }

    /// Stage the sequence halted at, if it stopped early
    pub fn halted_at(&self) -> Option<&str> {
        match self {
            RunOutcome::Completed => None,
            RunOutcome::Declined { stage }
            | RunOutcome::PreconditionUnmet { stage, .. }
            | RunOutcome::ChildFailed { stage, .. }
            | RunOutcome::Aborted { stage, .. } => Some(stage),
        }
    }
}

/// Sequencer state machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequenceState {
    NotStarted,
    /// Index into the stage list
    RunningStage(usize),
    Halted(RunOutcome),
}

impl SequenceState {
    pub fn is_halted(&self) -> bool {
        matches!(self, SequenceState::Halted(_))
    }
}

/// Overall sequence state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    /// Unique run ID
    pub execution_id: Uuid,

    /// Current position in the state machine
    pub sequence: SequenceState,

    /// When execution started
    pub started_at: Option<DateTime<Utc>>,

    /// When execution halted
    pub completed_at: Option<DateTime<Utc>>,

    /// Total number of stages
    pub total_stages: usize,

    /// Number of stages that completed or were skipped as unnecessary
    pub completed_stages: usize,
}

impl PipelineState {
    /// Create a new state
    pub fn new() -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            sequence: SequenceState::NotStarted,
            started_at: None,
            completed_at: None,
            total_stages: 0,
            completed_stages: 0,
        }
    }

    /// Mark the sequence as started
    pub fn start(&mut self, total_stages: usize) {
        self.started_at = Some(Utc::now());
        self.total_stages = total_stages;
    }

    /// Enter a stage
    pub fn enter(&mut self, index: usize) {
        self.sequence = SequenceState::RunningStage(index);
    }

    /// Record a stage that let the sequence proceed
    pub fn advance(&mut self) {
        self.completed_stages += 1;
    }

    /// Move to a terminal state
    pub fn halt(&mut self, outcome: RunOutcome) {
        self.sequence = SequenceState::Halted(outcome);
        self.completed_at = Some(Utc::now());
    }

    /// Outcome if the sequence has halted
    pub fn outcome(&self) -> Option<&RunOutcome> {
        match &self.sequence {
            SequenceState::Halted(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// History status for the current state
    pub fn status(&self) -> ExecutionStatus {
        match &self.sequence {
            SequenceState::NotStarted => ExecutionStatus::Pending,
            SequenceState::RunningStage(_) => ExecutionStatus::Running,
            SequenceState::Halted(outcome) => outcome.status(),
        }
    }

    /// Calculate progress percentage (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        if self.total_stages == 0 {
            return 0.0;
        }
        self.completed_stages as f64 / self.total_stages as f64
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}
