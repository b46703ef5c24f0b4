//! Stage domain model

use crate::core::{
    config::{ActionConfig, StageConfig},
    context::render_template,
    precondition::{Precondition, PreconditionConfig},
    state::StageState,
};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// A single stage in a sequence
#[derive(Debug, Clone)]
pub struct Stage {
    /// Unique stage identifier
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Gates checked in order before the action
    pub preconditions: Vec<PreconditionConfig>,

    /// Condition that makes the stage unnecessary
    pub skip_when: Option<Precondition>,

    /// Whether the operator must confirm
    pub confirm: bool,

    /// Confirmation prompt template
    pub prompt: Option<String>,

    /// Action template
    pub action: ActionConfig,

    /// Timeout in seconds for command actions
    pub timeout_secs: Option<u64>,

    /// Runtime state (not serialized)
    pub state: StageState,
}

/// Fully rendered external command, ready to spawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Rendered stage action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageAction {
    Command(CommandSpec),
    EnsureDirs(Vec<String>),
    Message(Vec<String>),
}

impl Stage {
    /// Create a stage from a stage config
    pub fn from_config(config: &StageConfig, default_timeout_secs: Option<u64>) -> Self {
        Stage {
            id: config.id.clone(),
            name: config.name.clone(),
            description: config.description.clone(),
            preconditions: config.preconditions.clone(),
            skip_when: config.skip_when.clone(),
            confirm: config.confirm,
            prompt: config.prompt.clone(),
            action: config.action.clone(),
            timeout_secs: config.timeout_secs.or(default_timeout_secs),
            state: StageState::Pending,
        }
    }

    /// Prompt shown to the operator
    pub fn confirmation_prompt(&self, variables: &HashMap<String, String>) -> String {
        match &self.prompt {
            Some(prompt) => render_template(prompt, variables),
            None => format!("Run {}?", self.name),
        }
    }

    /// Render the action with variable substitution
    pub fn render_action(&self, variables: &HashMap<String, String>) -> StageAction {
        let render = |s: &String| render_template(s, variables);

        match &self.action {
            ActionConfig::Command(command) => {
                let mut env: Vec<(String, String)> = command
                    .env
                    .iter()
                    .map(|(k, v)| (k.clone(), render(v)))
                    .collect();
                env.sort();

                StageAction::Command(CommandSpec {
                    program: render(&command.program),
                    args: command.args.iter().map(render).collect(),
                    env,
                    timeout: self.timeout_secs.map(Duration::from_secs),
                })
            }
            ActionConfig::EnsureDirs(paths) => {
                StageAction::EnsureDirs(paths.iter().map(render).collect())
            }
            ActionConfig::Message(lines) => StageAction::Message(lines.iter().map(render).collect()),
        }
    }

    /// Preconditions with placeholders resolved
    pub fn render_preconditions(
        &self,
        variables: &HashMap<String, String>,
    ) -> Vec<PreconditionConfig> {
        self.preconditions
            .iter()
            .map(|p| PreconditionConfig {
                condition: p.condition.render(variables),
                remediation: p.remediation.as_ref().map(|r| render_template(r, variables)),
            })
            .collect()
    }

    /// Skip condition with placeholders resolved
    pub fn render_skip_when(&self, variables: &HashMap<String, String>) -> Option<Precondition> {
        self.skip_when.as_ref().map(|p| p.render(variables))
    }
}
