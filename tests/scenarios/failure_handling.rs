//! Test: failing actions halt the sequence

use crate::helpers::*;
use guided_setup::core::{RunOutcome, StageState};
use guided_setup::execution::ExecutionEvent;

const YAML: &str = r#"
name: "Chain"
stages:
  - id: "first"
    name: "First"
    action:
      command:
        program: "tool"
        args: ["first"]
  - id: "second"
    name: "Second"
    action:
      command:
        program: "tool"
        args: ["second"]
  - id: "third"
    name: "Third"
    action:
      command:
        program: "tool"
        args: ["third"]
"#;

/// A non-zero exit halts the chain at that stage
#[tokio::test]
async fn test_child_failure_halts_later_stages() {
    let result = run_sequence(
        pipeline_from_yaml(YAML),
        FakeRunner::new().exit_with("second", 4),
        ScriptedConfirmer::default(),
        FakeEnvironment::new(),
    )
    .await;

    assert_eq!(result.exit_code(), 1);
    assert_eq!(result.commands, vec!["tool first", "tool second"]);
    assert!(matches!(
        result.outcome,
        RunOutcome::ChildFailed { ref stage, exit_code: Some(4), ref error }
            if stage == "second" && error.contains("exited with code 4")
    ));
    assert_stage_pending(&result, "third");
    assert_eq!(result.pipeline.state.completed_stages, 1);
    assert!(result
        .events
        .iter()
        .any(|e| matches!(e, ExecutionEvent::StageFailed { stage_id, .. } if stage_id == "second")));
}

/// A program that cannot be started is a failure, not a crash
#[tokio::test]
async fn test_missing_program_fails_stage() {
    let result = run_sequence(
        pipeline_from_yaml(YAML),
        FakeRunner::new().missing_program("tool"),
        ScriptedConfirmer::default(),
        FakeEnvironment::new(),
    )
    .await;

    assert_eq!(result.exit_code(), 1);
    assert_eq!(result.commands.len(), 1);
    let StageState::Failed { error, exit_code, .. } = result.stage_state("first") else {
        panic!("first should have failed: {:?}", result.stage_state("first"));
    };
    assert!(error.contains("failed to start 'tool'"));
    assert_eq!(*exit_code, Some(127));
}

/// Directory creation is idempotent across runs
#[tokio::test]
async fn test_ensure_dirs_twice() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().display().to_string();

    let yaml = r#"
name: "Dirs"
variables:
  root: "."
stages:
  - id: "dirs"
    name: "Create output directories"
    action:
      ensure_dirs:
        - "{{ root }}/data/raw"
        - "{{ root }}/data/parsed"
"#;
    let config = guided_setup::core::config::PipelineConfig::from_yaml(yaml).unwrap();
    let vars = overrides(&[("root", root.as_str())]);

    let first = run_sequence(
        config.to_pipeline_with_overrides(&vars),
        FakeRunner::new(),
        ScriptedConfirmer::default(),
        FakeEnvironment::new(),
    )
    .await;
    assert_eq!(first.outcome, RunOutcome::Completed);
    assert!(first.messages().iter().all(|m| m.ends_with("(created)")));
    assert!(tmp.path().join("data/raw").is_dir());
    assert!(tmp.path().join("data/parsed").is_dir());

    let second = run_sequence(
        config.to_pipeline_with_overrides(&vars),
        FakeRunner::new(),
        ScriptedConfirmer::default(),
        FakeEnvironment::new(),
    )
    .await;
    assert_eq!(second.outcome, RunOutcome::Completed);
    assert_eq!(second.messages().len(), 2);
    assert!(second.messages().iter().all(|m| m.ends_with("(exists)")));
}

/// A path blocked by a regular file fails the stage
#[tokio::test]
async fn test_ensure_dirs_blocked_by_file() {
    let tmp = tempfile::tempdir().unwrap();
    let blocker = tmp.path().join("data");
    std::fs::write(&blocker, "not a directory").unwrap();

    let yaml = format!(
        r#"
name: "Dirs"
stages:
  - id: "dirs"
    name: "Create output directories"
    action:
      ensure_dirs: ['{}/raw']
"#,
        blocker.display()
    );

    let result = run_sequence(
        pipeline_from_yaml(&yaml),
        FakeRunner::new(),
        ScriptedConfirmer::default(),
        FakeEnvironment::new(),
    )
    .await;

    assert_eq!(result.exit_code(), 1);
    assert!(matches!(result.outcome, RunOutcome::ChildFailed { exit_code: None, .. }));
}
