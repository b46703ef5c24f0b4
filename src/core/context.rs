//! Sequence context - variables and template rendering

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Matches `{{ name }}` placeholders, whitespace inside the braces optional
fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder regex is valid")
    })
}

/// Render a template, replacing `{{ name }}` with the matching variable.
///
/// Unknown placeholders are left untouched; configuration validation rejects
/// them before a sequence ever runs.
pub fn render_template(template: &str, variables: &HashMap<String, String>) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            variables
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Names of all variables referenced by a template, in order of appearance
pub fn referenced_variables(template: &str) -> Vec<String> {
    placeholder_regex()
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Execution context for a sequence run
///
/// Holds the resolved variables: platform defaults first, then the
/// sequence's own variables, then operator overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SequenceContext {
    /// Resolved variables available to every stage
    pub variables: HashMap<String, String>,
}

impl SequenceContext {
    /// Create a context seeded with platform variables
    pub fn new() -> Self {
        Self {
            variables: platform_variables(),
        }
    }

    /// Set a variable
    pub fn set_variable(&mut self, key: String, value: String) {
        self.variables.insert(key, value);
    }

    /// Get a variable
    pub fn get_variable(&self, key: &str) -> Option<&String> {
        self.variables.get(key)
    }
}

/// Variables that differ between Unix and Windows hosts
pub fn platform_variables() -> HashMap<String, String> {
    let mut vars = HashMap::new();
    if cfg!(windows) {
        vars.insert("venv_bin".to_string(), "venv/Scripts".to_string());
        vars.insert("exe_suffix".to_string(), ".exe".to_string());
    } else {
        vars.insert("venv_bin".to_string(), "venv/bin".to_string());
        vars.insert("exe_suffix".to_string(), String::new());
    }
    vars
}
