//! Sequence execution: precondition checks, confirmation, child processes

pub mod checker;
pub mod confirm;
pub mod engine;
pub mod executor;
pub mod runner;

pub use checker::PreconditionChecker;
pub use confirm::{AssumeYes, ConfirmError, Confirmer, ConsoleConfirmer};
pub use engine::{EventHandler, ExecutionEngine, ExecutionEvent};
pub use executor::{ExecutionResult, StageExecutor};
pub use runner::{CommandRunner, ExitReport, RunnerError, SubprocessRunner};
