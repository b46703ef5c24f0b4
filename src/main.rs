use anyhow::{Context, Result};
use guided_setup::cli::commands::{
    HistoryCommand, ListCommand, RunCommand, SequenceSource, ValidateCommand,
};
use guided_setup::cli::output::*;
use guided_setup::cli::{Cli, Command};
use guided_setup::core::builtin::{builtin_names, load_builtin, load_builtin_with_overrides};
use guided_setup::core::config::{ActionConfig, PipelineConfig};
use guided_setup::core::SystemEnvironment;
use guided_setup::execution::{AssumeYes, Confirmer, ConsoleConfirmer, ExecutionEngine, SubprocessRunner};
use guided_setup::persistence::{create_summary, PersistenceBackend, RunSummary};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    let exit_code = match &cli.command {
        Command::Run(cmd) => run_sequence(cmd).await?,
        Command::Validate(cmd) => validate_sequence(cmd)?,
        Command::List(cmd) => list_sequences(cmd)?,
        Command::History(cmd) => show_history(cmd).await?,
    };

    if exit_code != 0 {
        std::process::exit(exit_code);
    }

    Ok(())
}

fn load_config(source: &SequenceSource, overrides: &HashMap<String, String>) -> Result<PipelineConfig> {
    match source {
        SequenceSource::Builtin(name) => load_builtin_with_overrides(name, overrides),
        SequenceSource::File(path) => PipelineConfig::from_file_with_overrides(path, overrides)
            .with_context(|| format!("Failed to load sequence from {}", path)),
    }
}

async fn open_history() -> Result<Arc<dyn PersistenceBackend>> {
    #[cfg(feature = "sqlite")]
    {
        Ok(Arc::new(guided_setup::persistence::SqliteRunStore::with_default_path().await?))
    }
    #[cfg(not(feature = "sqlite"))]
    {
        Ok(Arc::new(guided_setup::persistence::InMemoryPersistence::new()))
    }
}

async fn run_sequence(cmd: &RunCommand) -> Result<i32> {
    let overrides: HashMap<String, String> = cmd.variable.iter().cloned().collect();
    let config = load_config(&cmd.source(), &overrides)?;

    println!("{}Loaded sequence: {}", INFO, style(&config.name).bold());
    if let Some(description) = &config.description {
        println!("  {}", style(description).dim());
    }

    for (key, value) in &cmd.variable {
        println!(
            "{}Variable override: {} = {}",
            INFO,
            style(key).cyan(),
            style(value).dim()
        );
    }

    let mut pipeline = config.to_pipeline_with_overrides(&overrides);

    let confirmer: Arc<dyn Confirmer> = if cmd.yes {
        Arc::new(AssumeYes)
    } else {
        Arc::new(ConsoleConfirmer::new())
    };

    let mut engine = ExecutionEngine::new(
        SubprocessRunner::new(),
        confirmer,
        Arc::new(SystemEnvironment::new()),
    );
    engine.add_event_handler(|event| println!("{}", format_execution_event(&event)));

    println!("{}", style(separator()).dim());
    let outcome = engine.execute(&mut pipeline).await;
    println!("{}", style(separator()).dim());

    // History is best effort; it never changes the exit code
    if !cmd.no_history {
        let summary = create_summary(&pipeline);
        match open_history().await {
            Ok(store) => match store.save_run(&summary).await {
                Ok(()) => println!(
                    "{}Run saved to history (ID: {})",
                    INFO,
                    style(&summary.execution_id.to_string()[..8]).dim()
                ),
                Err(e) => warn!("Could not save run history: {:#}", e),
            },
            Err(e) => warn!("Could not open run history: {:#}", e),
        }
    }

    Ok(outcome.exit_code())
}

fn validate_sequence(cmd: &ValidateCommand) -> Result<i32> {
    println!("{}Validating sequence...", INFO);

    match load_config(&cmd.source(), &HashMap::new()) {
        Ok(config) => {
            println!("{}Sequence configuration is valid!", CHECK);
            println!("  Name: {}", style(&config.name).bold());
            println!("  Stages: {}", style(config.stages.len()).cyan());
            println!("  Variables: {}", style(config.variables.len()).cyan());

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(0)
        }
        Err(e) => {
            println!("{}Validation failed:", CROSS);
            println!("  {}", style(format!("{:#}", e)).red());
            Ok(1)
        }
    }
}

fn describe_action(action: &ActionConfig) -> String {
    match action {
        ActionConfig::Command(command) => {
            let mut line = command.program.clone();
            for arg in &command.args {
                line.push(' ');
                line.push_str(arg);
            }
            line
        }
        ActionConfig::EnsureDirs(paths) => format!("create {}", paths.join(", ")),
        ActionConfig::Message(_) => "print guidance".to_string(),
    }
}

fn list_sequences(cmd: &ListCommand) -> Result<i32> {
    let configs = builtin_names()
        .into_iter()
        .map(load_builtin)
        .collect::<Result<Vec<_>>>()?;

    if cmd.json {
        let data: Vec<_> = configs
            .iter()
            .map(|config| {
                serde_json::json!({
                    "name": config.name,
                    "description": config.description,
                    "stages": config.stages.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "sequences": data }))?);
        return Ok(0);
    }

    println!("{}Built-in sequences:", INFO);
    for config in &configs {
        println!(
            "  {} ({} stages){}",
            style(&config.name).bold(),
            style(config.stages.len()).cyan(),
            config
                .description
                .as_ref()
                .map(|d| format!(" - {}", style(d).dim()))
                .unwrap_or_default()
        );

        if cmd.stages {
            for (i, stage) in config.stages.iter().enumerate() {
                let confirm = if stage.confirm { " [confirm]" } else { "" };
                println!(
                    "    {}. {}{}: {}",
                    i + 1,
                    style(&stage.id).cyan(),
                    style(confirm).yellow(),
                    style(describe_action(&stage.action)).dim()
                );
            }
        }
    }

    Ok(0)
}

async fn show_history(cmd: &HistoryCommand) -> Result<i32> {
    let store = open_history().await?;

    // If a specific run ID is requested
    if let Some(run_id) = &cmd.run_id {
        let run_id = uuid::Uuid::parse_str(run_id).context("Invalid run ID format")?;
        match store.load_run(run_id).await? {
            Some(summary) => print_run_details(&summary, cmd.json)?,
            None => println!("{}Run not found", WARN),
        }
        return Ok(0);
    }

    let runs: Vec<RunSummary> = if let Some(pipeline_name) = &cmd.pipeline {
        store.list_runs(pipeline_name).await?
    } else {
        let mut all = Vec::new();
        for pipeline in store.list_pipelines().await? {
            all.extend(store.list_runs(&pipeline).await?);
        }
        all.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        all
    };
    let runs: Vec<RunSummary> = runs.into_iter().take(cmd.limit).collect();

    if cmd.json {
        let data = serde_json::json!({ "runs": runs });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(0);
    }

    if runs.is_empty() {
        println!("{}No runs found", INFO);
        return Ok(0);
    }

    println!("{}Run history (showing latest {}):", INFO, cmd.limit);
    for summary in &runs {
        println!("  {}", format_run_summary(summary));
    }

    Ok(0)
}

fn print_run_details(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("{}Run Details", INFO);
    println!("  ID: {}", style(summary.execution_id).cyan());
    println!("  Sequence: {}", style(&summary.pipeline_name).bold());
    println!("  Status: {}", format_status(summary.status));
    if let Some(stage) = &summary.halted_at {
        println!("  Halted at: {}", style(stage).cyan());
    }
    println!("  Started: {}", style(summary.started_at.to_rfc3339()).dim());
    if let Some(completed) = summary.completed_at {
        println!("  Completed: {}", style(completed.to_rfc3339()).dim());
        if let Ok(duration) = completed.signed_duration_since(summary.started_at).to_std() {
            println!("  Duration: {}", style(format_duration(duration)).dim());
        }
    }
    println!(
        "  Progress: {} ({}/{})",
        style(format!("{:.0}%", summary.progress() * 100.0)).cyan(),
        summary.completed_stages,
        summary.total_stages
    );

    Ok(())
}

fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
