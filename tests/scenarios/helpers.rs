//! Test utility functions for guided-setup

use async_trait::async_trait;
use guided_setup::core::config::PipelineConfig;
use guided_setup::core::{CommandSpec, EnvironmentProbe, Pipeline, RunOutcome, StageState};
use guided_setup::execution::{
    ConfirmError, Confirmer, CommandRunner, ExecutionEngine, ExecutionEvent, ExitReport,
    RunnerError,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

/// Runner that records every command instead of spawning it
///
/// Commands exit 0 unless their rendered command line contains a
/// fragment registered with [`FakeRunner::exit_with`].
#[derive(Clone, Default)]
pub struct FakeRunner {
    scripted: Arc<Vec<(String, i32)>>,
    missing: Arc<HashSet<String>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exit with `code` when the command line contains `fragment`
    pub fn exit_with(mut self, fragment: &str, code: i32) -> Self {
        Arc::make_mut(&mut self.scripted).push((fragment.to_string(), code));
        self
    }

    /// Fail to spawn `program`, as if it were not installed
    pub fn missing_program(mut self, program: &str) -> Self {
        Arc::make_mut(&mut self.missing).insert(program.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, command: &CommandSpec) -> Result<ExitReport, RunnerError> {
        let line = command.to_string();
        self.calls.lock().unwrap().push(line.clone());

        if self.missing.contains(&command.program) {
            return Err(RunnerError::Spawn {
                program: command.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
            });
        }

        let code = self
            .scripted
            .iter()
            .find(|(fragment, _)| line.contains(fragment.as_str()))
            .map(|(_, code)| *code)
            .unwrap_or(0);
        Ok(ExitReport::from_code(code))
    }
}

/// Confirmer that answers from a script and records every prompt
///
/// Once the script is exhausted every further prompt is declined.
#[derive(Clone, Default)]
pub struct ScriptedConfirmer {
    answers: Arc<Mutex<VecDeque<bool>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedConfirmer {
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: Arc::new(Mutex::new(answers.iter().copied().collect())),
            prompts: Arc::default(),
        }
    }

    pub fn always_yes() -> Self {
        Self::answering(&[true; 32])
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Confirmer for ScriptedConfirmer {
    fn confirm(&self, prompt: &str) -> Result<bool, ConfirmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.answers.lock().unwrap().pop_front().unwrap_or(false))
    }
}

/// In-memory environment: nothing is set, exists or is installed
/// unless added
#[derive(Clone, Default)]
pub struct FakeEnvironment {
    vars: HashSet<String>,
    paths: HashSet<String>,
    modules: HashSet<(String, String)>,
    binaries: HashSet<String>,
}

impl FakeEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, name: &str) -> Self {
        self.vars.insert(name.to_string());
        self
    }

    pub fn with_path(mut self, path: &str) -> Self {
        self.paths.insert(path.to_string());
        self
    }

    pub fn with_module(mut self, interpreter: &str, module: &str) -> Self {
        self.modules
            .insert((interpreter.to_string(), module.to_string()));
        self
    }

    pub fn with_binary(mut self, name: &str) -> Self {
        self.binaries.insert(name.to_string());
        self
    }
}

impl EnvironmentProbe for FakeEnvironment {
    fn var_is_set(&self, name: &str) -> bool {
        self.vars.contains(name)
    }

    fn path_exists(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    fn module_importable(&self, interpreter: &str, module: &str) -> bool {
        self.modules
            .contains(&(interpreter.to_string(), module.to_string()))
    }

    fn binary_on_path(&self, name: &str) -> bool {
        self.binaries.contains(name)
    }
}

/// Everything observable about one sequence run
#[derive(Debug, Clone)]
pub struct SequenceTestResult {
    pub outcome: RunOutcome,
    pub pipeline: Pipeline,
    pub events: Vec<ExecutionEvent>,
    pub commands: Vec<String>,
    pub prompts: Vec<String>,
}

impl SequenceTestResult {
    pub fn exit_code(&self) -> i32 {
        self.outcome.exit_code()
    }

    /// Get the state of a specific stage
    pub fn stage_state(&self, stage_id: &str) -> &StageState {
        &self
            .pipeline
            .stage(stage_id)
            .unwrap_or_else(|| panic!("Stage '{}' not found", stage_id))
            .state
    }

    /// Stage ids whose action actually ran to success
    pub fn completed_stages(&self) -> Vec<String> {
        self.pipeline
            .stages
            .iter()
            .filter(|s| matches!(s.state, StageState::Completed { .. }))
            .map(|s| s.id.clone())
            .collect()
    }

    /// Lines printed by message and directory stages
    pub fn messages(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ExecutionEvent::StageMessage { lines, .. } => Some(lines.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }
}

/// Parse a sequence from YAML string
pub fn pipeline_from_yaml(yaml: &str) -> Pipeline {
    let config = PipelineConfig::from_yaml(yaml)
        .unwrap_or_else(|e| panic!("Failed to parse sequence YAML: {:#}", e));
    config.to_pipeline()
}

/// Run a sequence against fakes and collect what happened
pub async fn run_sequence(
    mut pipeline: Pipeline,
    runner: FakeRunner,
    confirmer: ScriptedConfirmer,
    environment: FakeEnvironment,
) -> SequenceTestResult {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();

    let mut engine = ExecutionEngine::new(
        runner.clone(),
        Arc::new(confirmer.clone()),
        Arc::new(environment),
    );
    engine.add_event_handler(move |event| sink.lock().unwrap().push(event));

    let outcome = engine.execute(&mut pipeline).await;
    let events = events.lock().unwrap().clone();

    SequenceTestResult {
        outcome,
        pipeline,
        events,
        commands: runner.calls(),
        prompts: confirmer.prompts(),
    }
}

/// Overrides map from `key=value` pairs
pub fn overrides(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Assert no command containing `fragment` was run
pub fn assert_not_run(result: &SequenceTestResult, fragment: &str) {
    assert!(
        !result.commands.iter().any(|c| c.contains(fragment)),
        "Expected no command containing '{}', ran: {:#?}",
        fragment,
        result.commands
    );
}

/// Assert a stage ended in the given state kind
pub fn assert_stage_pending(result: &SequenceTestResult, stage_id: &str) {
    assert!(
        matches!(result.stage_state(stage_id), StageState::Pending),
        "Stage '{}' should not have been reached, but was: {:?}",
        stage_id,
        result.stage_state(stage_id)
    );
}
