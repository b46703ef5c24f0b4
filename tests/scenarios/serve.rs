//! Test: environment preparation and server launch

use crate::helpers::*;
use guided_setup::core::builtin::load_builtin;
use guided_setup::core::context::platform_variables;
use guided_setup::core::{Pipeline, RunOutcome, StageState};

fn serve() -> Pipeline {
    load_builtin("serve").unwrap().to_pipeline()
}

fn venv_python() -> String {
    let platform = platform_variables();
    format!("{}/python{}", platform["venv_bin"], platform["exe_suffix"])
}

/// Fresh checkout: venv and install run, missing config halts
#[tokio::test]
async fn test_fresh_checkout_without_config() {
    let result = run_sequence(
        serve(),
        FakeRunner::new(),
        ScriptedConfirmer::default(),
        FakeEnvironment::new().with_binary("python3"),
    )
    .await;

    assert_eq!(result.exit_code(), 1);
    assert_eq!(result.commands.len(), 2);
    assert_eq!(result.commands[0], "python3 -m venv venv");
    assert!(result.commands[1].ends_with("-m pip install -r requirements.txt"));
    assert!(matches!(
        result.outcome,
        RunOutcome::PreconditionUnmet { ref stage, ref remediation, .. }
            if stage == "config" && remediation.contains("settings.example.yaml")
    ));
    assert_stage_pending(&result, "dirs");
    assert!(result.prompts.is_empty());
}

/// Existing venv with the dependency installed skips both setup stages
#[tokio::test]
async fn test_prepared_environment_skips_setup() {
    let environment = FakeEnvironment::new()
        .with_path("venv")
        .with_module(&venv_python(), "uvicorn");

    let result = run_sequence(serve(), FakeRunner::new(), ScriptedConfirmer::default(), environment).await;

    assert!(result.commands.is_empty(), "ran: {:?}", result.commands);
    assert!(matches!(result.stage_state("venv"), StageState::Skipped { .. }));
    assert!(matches!(result.stage_state("install"), StageState::Skipped { .. }));
    assert!(matches!(result.stage_state("config"), StageState::Blocked { .. }));
}

/// Skip conditions are checked before preconditions
#[tokio::test]
async fn test_skipped_stage_ignores_its_preconditions() {
    // python3 is not on PATH, but the venv already exists
    let environment = FakeEnvironment::new().with_path("venv");

    let result = run_sequence(serve(), FakeRunner::new(), ScriptedConfirmer::default(), environment).await;

    assert!(matches!(result.stage_state("venv"), StageState::Skipped { .. }));
    assert!(matches!(result.stage_state("install"), StageState::Completed { .. }));
}

/// Without python on PATH the venv stage blocks
#[tokio::test]
async fn test_missing_interpreter_blocks_venv() {
    let result = run_sequence(serve(), FakeRunner::new(), ScriptedConfirmer::default(), FakeEnvironment::new()).await;

    assert_eq!(result.exit_code(), 1);
    assert!(result.commands.is_empty());
    assert!(matches!(
        result.outcome,
        RunOutcome::PreconditionUnmet { ref stage, ref condition, .. }
            if stage == "venv" && condition.contains("python3")
    ));
}

/// A failed install never reaches the server launch
#[tokio::test]
async fn test_install_failure_halts() {
    let result = run_sequence(
        serve(),
        FakeRunner::new().exit_with("pip install", 1),
        ScriptedConfirmer::default(),
        FakeEnvironment::new().with_binary("python3"),
    )
    .await;

    assert_eq!(result.exit_code(), 1);
    assert!(matches!(result.outcome, RunOutcome::ChildFailed { ref stage, .. } if stage == "install"));
    assert_not_run(&result, "--config");
}
