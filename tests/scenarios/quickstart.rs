//! Test: the quickstart wizard end to end against fakes

use crate::helpers::*;
use guided_setup::core::builtin::load_builtin;
use guided_setup::core::{Pipeline, RunOutcome, StageState};
use guided_setup::execution::ExecutionEvent;

fn quickstart() -> Pipeline {
    load_builtin("quickstart").unwrap().to_pipeline()
}

fn ready_environment() -> FakeEnvironment {
    FakeEnvironment::new().with_var("GITHUB_TOKEN")
}

/// A missing token halts before anything runs and prints remediation
#[tokio::test]
async fn test_missing_token_halts_with_remediation() {
    let result = run_sequence(
        quickstart(),
        FakeRunner::new(),
        ScriptedConfirmer::always_yes(),
        FakeEnvironment::new(),
    )
    .await;

    assert_eq!(result.exit_code(), 1);
    assert!(result.commands.is_empty(), "ran: {:?}", result.commands);
    assert!(result.prompts.is_empty());

    let RunOutcome::PreconditionUnmet {
        stage, remediation, ..
    } = &result.outcome
    else {
        panic!("expected unmet precondition, got {:?}", result.outcome);
    };
    assert_eq!(stage, "token");
    assert!(remediation.contains("export GITHUB_TOKEN="));

    // Remediation is reported before the sequence halts
    let unmet = result
        .events
        .iter()
        .position(|e| matches!(e, ExecutionEvent::PreconditionUnmet { .. }))
        .expect("precondition event");
    let halted = result
        .events
        .iter()
        .position(|e| matches!(e, ExecutionEvent::SequenceHalted { .. }))
        .expect("halt event");
    assert!(unmet < halted);

    assert!(matches!(result.stage_state("token"), StageState::Blocked { .. }));
    assert_stage_pending(&result, "scrape");
}

/// Failing verification stops the wizard before scraping
#[tokio::test]
async fn test_verification_failure_stops_before_scrape() {
    let result = run_sequence(
        quickstart(),
        FakeRunner::new().exit_with("verify_setup.py", 1),
        ScriptedConfirmer::always_yes(),
        ready_environment(),
    )
    .await;

    assert_eq!(result.exit_code(), 1);
    assert_eq!(result.commands, vec!["python3 scripts/verify_setup.py"]);
    assert!(result.prompts.is_empty());
    assert!(matches!(
        result.outcome,
        RunOutcome::ChildFailed { ref stage, exit_code: Some(1), .. } if stage == "verify"
    ));
    assert_not_run(&result, "scraper");
}

/// Declining the scrape ends the run cleanly with nothing else run
#[tokio::test]
async fn test_declining_scrape_exits_cleanly() {
    let result = run_sequence(
        quickstart(),
        FakeRunner::new(),
        ScriptedConfirmer::answering(&[false]),
        ready_environment(),
    )
    .await;

    assert_eq!(result.exit_code(), 0);
    assert_eq!(
        result.outcome,
        RunOutcome::Declined {
            stage: "scrape".to_string()
        }
    );
    assert_eq!(result.prompts.len(), 1);
    assert!(result.prompts[0].contains("scraping"));
    assert_not_run(&result, "scraper");
    assert_not_run(&result, "blend_parser");
    assert_not_run(&result, "dataset.builder");
    assert!(matches!(result.stage_state("scrape"), StageState::Declined));
    assert_stage_pending(&result, "parse");
}

/// Accepting scrape and declining parse runs exactly one tool
#[tokio::test]
async fn test_decline_midway() {
    let result = run_sequence(
        quickstart(),
        FakeRunner::new(),
        ScriptedConfirmer::answering(&[true, false]),
        ready_environment(),
    )
    .await;

    assert_eq!(result.exit_code(), 0);
    assert_eq!(
        result.commands,
        vec![
            "python3 scripts/verify_setup.py",
            "python3 -m scraper.github_scraper",
        ]
    );
    assert_eq!(result.prompts.len(), 2);
    assert_eq!(result.completed_stages(), vec!["token", "verify", "scrape"]);
}

/// Accepting everything runs every tool in order and prints next steps
#[tokio::test]
async fn test_full_run() {
    let result = run_sequence(
        quickstart(),
        FakeRunner::new(),
        ScriptedConfirmer::always_yes(),
        ready_environment(),
    )
    .await;

    assert_eq!(result.outcome, RunOutcome::Completed);
    assert_eq!(result.exit_code(), 0);
    assert_eq!(
        result.commands,
        vec![
            "python3 scripts/verify_setup.py",
            "python3 -m scraper.github_scraper",
            "python3 -m parser.blend_parser",
            "python3 -m dataset.builder",
        ]
    );
    assert_eq!(result.prompts.len(), 3);

    let messages = result.messages().join("\n");
    assert!(messages.contains("GITHUB_TOKEN is set"));
    assert!(messages.contains("AI_PROVIDER"));
    assert!(messages.contains("python3 -m training.orchestrator"));
    assert!(result.pipeline.is_complete());
}

/// A failing scraper stops parse and build from running
#[tokio::test]
async fn test_scraper_failure_halts_later_stages() {
    let result = run_sequence(
        quickstart(),
        FakeRunner::new().exit_with("scraper", 2),
        ScriptedConfirmer::always_yes(),
        ready_environment(),
    )
    .await;

    assert_eq!(result.exit_code(), 1);
    assert_eq!(result.prompts.len(), 1);
    assert_not_run(&result, "blend_parser");
    assert!(matches!(
        result.stage_state("scrape"),
        StageState::Failed { exit_code: Some(2), .. }
    ));
}
