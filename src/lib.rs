//! guided-setup - operator-confirmed setup sequences for external tooling

pub mod cli;
pub mod core;
pub mod execution;
pub mod persistence;

// Re-export commonly used types
pub use core::{Pipeline, RunOutcome, Stage, StageState, SequenceContext, ExecutionStatus};
pub use core::{EnvironmentProbe, Precondition, SystemEnvironment};
pub use execution::{ExecutionEngine, ExecutionEvent, CommandRunner, Confirmer, SubprocessRunner};
