//! Built-in sequences shipped with the binary

use crate::core::config::PipelineConfig;
use anyhow::{Context, Result};
use std::collections::HashMap;

/// Interactive data-preparation wizard
pub const QUICKSTART_YAML: &str = r#"
name: "quickstart"
description: "Verify the environment, then scrape, parse and build the dataset"

variables:
  python: "python3"
  token_var: "GITHUB_TOKEN"
  verify_script: "scripts/verify_setup.py"
  scraper_module: "scraper.github_scraper"
  parser_module: "parser.blend_parser"
  builder_module: "dataset.builder"

stages:
  - id: "token"
    name: "Check access token"
    preconditions:
      - env_var: "{{ token_var }}"
        remediation: |
          The scraper needs a personal access token.
            1. Create one at https://github.com/settings/tokens (public_repo scope)
            2. export {{ token_var }}=<your token>
            3. Re-run: guided-setup run quickstart
    action:
      message:
        - "{{ token_var }} is set"

  - id: "verify"
    name: "Verify setup"
    action:
      command:
        program: "{{ python }}"
        args: ["{{ verify_script }}"]

  - id: "scrape"
    name: "Scrape .blend files"
    confirm: true
    prompt: "Start scraping source repositories? This can take a while."
    action:
      command:
        program: "{{ python }}"
        args: ["-m", "{{ scraper_module }}"]

  - id: "parse"
    name: "Parse scraped files"
    confirm: true
    prompt: "Parse the scraped .blend files?"
    action:
      command:
        program: "{{ python }}"
        args: ["-m", "{{ parser_module }}"]

  - id: "build"
    name: "Build training dataset"
    confirm: true
    prompt: "Build the training dataset from parsed files?"
    action:
      command:
        program: "{{ python }}"
        args: ["-m", "{{ builder_module }}"]

  - id: "next-steps"
    name: "Next steps"
    action:
      message:
        - "Dataset ready. Next steps:"
        - "  1. Format for training:    {{ python }} -m dataset.formatter"
        - "  2. Choose an AI provider:  export AI_PROVIDER=openai|anthropic"
        - "                             export AI_MODEL=<model name>"
        - "  3. Provide an API key:     export OPENAI_API_KEY=... or ANTHROPIC_API_KEY=..."
        - "  4. Start training:         {{ python }} -m training.orchestrator"
        - "  5. Check quality metrics:  {{ python }} -m evaluation.metrics"
        - "  6. Deploy the model:       {{ python }} -m deployment.deploy"
"#;

/// Environment preparation and server launch
pub const SERVE_YAML: &str = r#"
name: "serve"
description: "Prepare the virtual environment and launch the web server"

variables:
  python: "python3"
  dependency: "uvicorn"
  config_file: "config/settings.yaml"
  server: "dataset-server"

stages:
  - id: "venv"
    name: "Create virtual environment"
    skip_when:
      file_exists: "venv"
    preconditions:
      - binary: "{{ python }}"
        remediation: "Install Python 3 and make sure '{{ python }}' is on PATH"
    action:
      command:
        program: "{{ python }}"
        args: ["-m", "venv", "venv"]

  - id: "install"
    name: "Install dependencies"
    skip_when:
      importable:
        interpreter: "{{ venv_bin }}/python{{ exe_suffix }}"
        module: "{{ dependency }}"
    action:
      command:
        program: "{{ venv_bin }}/python{{ exe_suffix }}"
        args: ["-m", "pip", "install", "-r", "requirements.txt"]

  - id: "config"
    name: "Verify configuration"
    preconditions:
      - file_exists: "{{ config_file }}"
        remediation: |
          Configuration file {{ config_file }} not found.
          Copy config/settings.example.yaml to {{ config_file }} and edit it.
    action:
      message:
        - "Using configuration {{ config_file }}"

  - id: "dirs"
    name: "Create output directories"
    action:
      ensure_dirs:
        - "data/raw"
        - "data/parsed"
        - "data/datasets"

  - id: "launch"
    name: "Launch server"
    preconditions:
      - file_exists: "{{ venv_bin }}/{{ server }}{{ exe_suffix }}"
        remediation: "Install the server into the virtual environment: {{ venv_bin }}/pip install -e ."
    action:
      command:
        program: "{{ venv_bin }}/{{ server }}{{ exe_suffix }}"
        args: ["--config", "{{ config_file }}"]
"#;

/// Built-in sequence names with their YAML source
pub const BUILTINS: &[(&str, &str)] = &[("quickstart", QUICKSTART_YAML), ("serve", SERVE_YAML)];

/// Names of all built-in sequences
pub fn builtin_names() -> Vec<&'static str> {
    BUILTINS.iter().map(|(name, _)| *name).collect()
}

/// Load a built-in sequence by name
pub fn load_builtin(name: &str) -> Result<PipelineConfig> {
    let (_, yaml) = BUILTINS
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .with_context(|| {
            format!(
                "Unknown built-in sequence '{}' (available: {})",
                name,
                builtin_names().join(", ")
            )
        })?;

    PipelineConfig::from_yaml(yaml)
        .with_context(|| format!("Built-in sequence '{}' is invalid", name))
}

/// Load a built-in sequence and check operator overrides against it
pub fn load_builtin_with_overrides(
    name: &str,
    overrides: &HashMap<String, String>,
) -> Result<PipelineConfig> {
    let config = load_builtin(name)?;
    config.validate_with_overrides(overrides)?;
    Ok(config)
}
