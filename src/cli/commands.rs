//! CLI command definitions

use clap::Args;

/// Run a sequence
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Built-in sequence name (quickstart, serve)
    #[arg(conflicts_with = "file", required_unless_present = "file")]
    pub name: Option<String>,

    /// Path to a sequence YAML file
    #[arg(short, long)]
    pub file: Option<String>,

    /// Variable overrides (key=value)
    #[arg(long = "var", value_parser = parse_key_value)]
    pub variable: Vec<(String, String)>,

    /// Answer yes to every confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Don't save the run to history
    #[arg(long)]
    pub no_history: bool,
}

/// Validate a sequence configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Built-in sequence name
    #[arg(conflicts_with = "file", required_unless_present = "file")]
    pub name: Option<String>,

    /// Path to a sequence YAML file
    #[arg(short, long)]
    pub file: Option<String>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// List built-in sequences
#[derive(Debug, Args, Clone)]
pub struct ListCommand {
    /// Show each stage
    #[arg(long)]
    pub stages: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show run history
#[derive(Debug, Args, Clone)]
pub struct HistoryCommand {
    /// Sequence name to filter by
    #[arg(short, long)]
    pub pipeline: Option<String>,

    /// Number of recent runs to show
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Show a specific run
    #[arg(long)]
    pub run_id: Option<String>,
}

/// Where a sequence definition comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceSource {
    Builtin(String),
    File(String),
}

impl RunCommand {
    pub fn source(&self) -> SequenceSource {
        source_of(&self.name, &self.file)
    }
}

impl ValidateCommand {
    pub fn source(&self) -> SequenceSource {
        source_of(&self.name, &self.file)
    }
}

fn source_of(name: &Option<String>, file: &Option<String>) -> SequenceSource {
    match (file, name) {
        (Some(file), _) => SequenceSource::File(file.clone()),
        (None, Some(name)) => SequenceSource::Builtin(name.clone()),
        // clap enforces one of the two; fall back to the wizard
        (None, None) => SequenceSource::Builtin("quickstart".to_string()),
    }
}

/// Parse key=value pairs
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let parts: Vec<&str> = s.splitn(2, '=').collect();
    if parts.len() != 2 || parts[0].is_empty() {
        return Err(format!("Invalid key=value pair: {}", s));
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}
