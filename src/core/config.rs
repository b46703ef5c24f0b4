//! Sequence configuration from YAML

use crate::core::{
    context::{platform_variables, referenced_variables},
    precondition::{Precondition, PreconditionConfig},
    Pipeline,
};
use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::OnceLock;

/// Top-level sequence configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Sequence name
    pub name: String,

    /// Optional description shown by `list` and `validate`
    #[serde(default)]
    pub description: Option<String>,

    /// Variables available to every stage
    #[serde(default)]
    pub variables: HashMap<String, String>,

    /// Stages, executed in declared order
    pub stages: Vec<StageConfig>,

    /// Default timeout for command stages (in seconds, none = wait forever)
    #[serde(default)]
    pub default_timeout_secs: Option<u64>,
}

/// Stage configuration as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    /// Unique stage identifier
    pub id: String,

    /// Human-readable stage name
    pub name: String,

    /// Optional stage description
    #[serde(default)]
    pub description: Option<String>,

    /// Conditions that must all hold before the action runs
    #[serde(default)]
    pub preconditions: Vec<PreconditionConfig>,

    /// When this already holds the stage is unnecessary and is skipped
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub skip_when: Option<Precondition>,

    /// Ask the operator before running
    #[serde(default)]
    pub confirm: bool,

    /// Confirmation prompt (defaults to "Run <name>?")
    #[serde(default)]
    pub prompt: Option<String>,

    /// What the stage does
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub action: ActionConfig,

    /// Timeout for this stage (overrides the sequence default)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Stage action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionConfig {
    /// Spawn an external process and wait for it
    Command(CommandConfig),
    /// Create directories if absent
    EnsureDirs(Vec<String>),
    /// Print guidance lines
    Message(Vec<String>),
}

/// External command invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Program to execute (name on PATH or path)
    pub program: String,

    /// Arguments passed verbatim after rendering
    #[serde(default)]
    pub args: Vec<String>,

    /// Extra environment variables for the child
    #[serde(default)]
    pub env: HashMap<String, String>,
}

fn stage_id_regex() -> &'static Regex {
    static STAGE_ID: OnceLock<Regex> = OnceLock::new();
    STAGE_ID.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$").expect("stage id regex is valid"))
}

fn variable_name_regex() -> &'static Regex {
    static VARIABLE_NAME: OnceLock<Regex> = OnceLock::new();
    VARIABLE_NAME
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("variable name regex is valid"))
}

impl PipelineConfig {
    /// Load sequence configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load from a YAML file, accepting variables supplied as overrides
    pub fn from_file_with_overrides<P: AsRef<Path>>(
        path: P,
        overrides: &HashMap<String, String>,
    ) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&content)?;
        config.validate_with_overrides(overrides)?;
        Ok(config)
    }

    /// Parse sequence configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the sequence configuration
    pub fn validate(&self) -> Result<()> {
        self.validate_with_overrides(&HashMap::new())
    }

    /// Validate, treating `overrides` as additionally defined variables
    pub fn validate_with_overrides(&self, overrides: &HashMap<String, String>) -> Result<()> {
        if self.name.trim().is_empty() {
            anyhow::bail!("Sequence name must not be empty");
        }

        if self.stages.is_empty() {
            anyhow::bail!("Sequence '{}' declares no stages", self.name);
        }

        let name_pattern = variable_name_regex();
        for key in self.variables.keys().chain(overrides.keys()) {
            if !name_pattern.is_match(key) {
                anyhow::bail!("Invalid variable name: '{}'", key);
            }
        }

        // Check that all stage IDs are unique and well-formed
        let id_pattern = stage_id_regex();
        let mut seen_ids = HashSet::new();
        for stage in &self.stages {
            if !id_pattern.is_match(&stage.id) {
                anyhow::bail!(
                    "Invalid stage ID '{}': use lowercase letters, digits, '-' and '_'",
                    stage.id
                );
            }
            if !seen_ids.insert(&stage.id) {
                anyhow::bail!("Duplicate stage ID: {}", stage.id);
            }
        }

        let known: HashSet<String> = platform_variables()
            .into_keys()
            .chain(self.variables.keys().cloned())
            .chain(overrides.keys().cloned())
            .collect();

        for stage in &self.stages {
            match &stage.action {
                ActionConfig::Command(command) => {
                    if command.program.trim().is_empty() {
                        anyhow::bail!("Stage '{}' has an empty command program", stage.id);
                    }
                    for key in command.env.keys() {
                        if !name_pattern.is_match(key) {
                            anyhow::bail!(
                                "Stage '{}' sets invalid environment variable name '{}'",
                                stage.id,
                                key
                            );
                        }
                    }
                }
                ActionConfig::EnsureDirs(paths) => {
                    if paths.is_empty() {
                        anyhow::bail!("Stage '{}' ensure_dirs lists no directories", stage.id);
                    }
                }
                ActionConfig::Message(_) => {}
            }

            for template in stage.templates() {
                for var in referenced_variables(template) {
                    if !known.contains(&var) {
                        anyhow::bail!(
                            "Stage '{}' references undefined variable '{}'",
                            stage.id,
                            var
                        );
                    }
                }
            }
        }

        Ok(())
    }

    /// Convert config to a Pipeline domain model
    pub fn to_pipeline(&self) -> Pipeline {
        Pipeline::from_config(self, &HashMap::new())
    }

    /// Convert config to a Pipeline, applying operator variable overrides
    pub fn to_pipeline_with_overrides(&self, overrides: &HashMap<String, String>) -> Pipeline {
        Pipeline::from_config(self, overrides)
    }
}

impl StageConfig {
    /// Every string in this stage that may contain `{{ var }}` placeholders
    pub fn templates(&self) -> Vec<&str> {
        let mut templates: Vec<&str> = Vec::new();

        if let Some(prompt) = &self.prompt {
            templates.push(prompt);
        }
        for precondition in &self.preconditions {
            templates.extend(precondition.condition.templates());
            if let Some(remediation) = &precondition.remediation {
                templates.push(remediation);
            }
        }
        if let Some(skip_when) = &self.skip_when {
            templates.extend(skip_when.templates());
        }

        match &self.action {
            ActionConfig::Command(command) => {
                templates.push(&command.program);
                templates.extend(command.args.iter().map(String::as_str));
                templates.extend(command.env.values().map(String::as_str));
            }
            ActionConfig::EnsureDirs(paths) => {
                templates.extend(paths.iter().map(String::as_str));
            }
            ActionConfig::Message(lines) => {
                templates.extend(lines.iter().map(String::as_str));
            }
        }

        templates
    }
}
