//! Precondition model and environment probing

use crate::core::context::render_template;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// A boolean fact about the environment that must hold before a stage runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precondition {
    /// Environment variable is set and non-empty
    EnvVar(String),
    /// File or directory exists
    FileExists(String),
    /// `<interpreter> -c "import <module>"` succeeds
    Importable { interpreter: String, module: String },
    /// Executable is resolvable on PATH
    Binary(String),
}

impl Precondition {
    /// Substitute `{{ var }}` placeholders in every string field
    pub fn render(&self, variables: &HashMap<String, String>) -> Self {
        match self {
            Precondition::EnvVar(name) => Precondition::EnvVar(render_template(name, variables)),
            Precondition::FileExists(path) => {
                Precondition::FileExists(render_template(path, variables))
            }
            Precondition::Importable { interpreter, module } => Precondition::Importable {
                interpreter: render_template(interpreter, variables),
                module: render_template(module, variables),
            },
            Precondition::Binary(name) => Precondition::Binary(render_template(name, variables)),
        }
    }

    /// All template strings carried by this precondition
    pub fn templates(&self) -> Vec<&str> {
        match self {
            Precondition::EnvVar(s) | Precondition::FileExists(s) | Precondition::Binary(s) => {
                vec![s.as_str()]
            }
            Precondition::Importable { interpreter, module } => {
                vec![interpreter.as_str(), module.as_str()]
            }
        }
    }

    /// Default guidance when the configuration supplies none
    pub fn default_remediation(&self) -> String {
        match self {
            Precondition::EnvVar(name) => format!("Set the {} environment variable", name),
            Precondition::FileExists(path) => format!("Create {}", path),
            Precondition::Importable { interpreter, module } => {
                format!("Install {} for {}", module, interpreter)
            }
            Precondition::Binary(name) => format!("Install {} and make sure it is on PATH", name),
        }
    }
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precondition::EnvVar(name) => write!(f, "environment variable {} is set", name),
            Precondition::FileExists(path) => write!(f, "{} exists", path),
            Precondition::Importable { interpreter, module } => {
                write!(f, "{} can import {}", interpreter, module)
            }
            Precondition::Binary(name) => write!(f, "{} is on PATH", name),
        }
    }
}

/// A precondition together with the text shown when it does not hold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreconditionConfig {
    #[serde(flatten)]
    pub condition: Precondition,

    /// Guidance printed to the operator when the condition is unmet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl PreconditionConfig {
    pub fn new(condition: Precondition) -> Self {
        Self {
            condition,
            remediation: None,
        }
    }

    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = Some(remediation.into());
        self
    }

    /// Remediation text, falling back to a generic hint
    pub fn remediation_text(&self) -> String {
        self.remediation
            .clone()
            .unwrap_or_else(|| self.condition.default_remediation())
    }
}

/// Read-only view of the operating environment
///
/// Injected into the checker so tests can answer without touching real
/// environment variables, files or interpreters.
pub trait EnvironmentProbe: Send + Sync {
    fn var_is_set(&self, name: &str) -> bool;

    fn path_exists(&self, path: &str) -> bool;

    fn module_importable(&self, interpreter: &str, module: &str) -> bool;

    fn binary_on_path(&self, name: &str) -> bool;
}

/// Probe backed by the real process environment and filesystem
#[derive(Debug, Clone, Default)]
pub struct SystemEnvironment;

impl SystemEnvironment {
    pub fn new() -> Self {
        Self
    }
}

impl EnvironmentProbe for SystemEnvironment {
    fn var_is_set(&self, name: &str) -> bool {
        std::env::var_os(name).is_some_and(|value| !value.is_empty())
    }

    fn path_exists(&self, path: &str) -> bool {
        Path::new(path).exists()
    }

    fn module_importable(&self, interpreter: &str, module: &str) -> bool {
        let status = Command::new(interpreter)
            .arg("-c")
            .arg(format!("import {}", module))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) => status.success(),
            Err(e) => {
                debug!("Could not run {} to probe {}: {}", interpreter, module, e);
                false
            }
        }
    }

    fn binary_on_path(&self, name: &str) -> bool {
        let candidate = Path::new(name);
        if candidate.components().count() > 1 {
            return candidate.is_file();
        }

        let Some(paths) = std::env::var_os("PATH") else {
            return false;
        };

        std::env::split_paths(&paths)
            .any(|dir| executable_candidates(&dir, name, cfg!(windows)).iter().any(|p| p.is_file()))
    }
}

/// Files that would satisfy a PATH lookup of `name` inside `dir`
fn executable_candidates(dir: &Path, name: &str, windows: bool) -> Vec<PathBuf> {
    let mut candidates = vec![dir.join(name)];
    if windows && !name.to_ascii_lowercase().ends_with(".exe") {
        candidates.push(dir.join(format!("{}.exe", name)));
    }
    candidates
}
