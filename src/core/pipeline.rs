//! Pipeline domain model: an ordered, named list of stages

use crate::core::{
    config::PipelineConfig,
    context::SequenceContext,
    stage::Stage,
    state::PipelineState,
};
use std::collections::HashMap;

/// A sequence definition plus its runtime state
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Sequence name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Resolved variables (platform, file, overrides)
    pub context: SequenceContext,

    /// Stages in declared order
    pub stages: Vec<Stage>,

    /// Execution state
    pub state: PipelineState,
}

impl Pipeline {
    /// Create a pipeline from configuration
    pub fn from_config(config: &PipelineConfig, overrides: &HashMap<String, String>) -> Self {
        let mut context = SequenceContext::new();
        context.variables.extend(config.variables.clone());
        context.variables.extend(overrides.clone());

        let stages = config
            .stages
            .iter()
            .map(|stage_config| Stage::from_config(stage_config, config.default_timeout_secs))
            .collect();

        Pipeline {
            name: config.name.clone(),
            description: config.description.clone(),
            context,
            stages,
            state: PipelineState::new(),
        }
    }

    /// Get a stage by ID
    pub fn stage(&self, id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }

    /// Declared execution order
    pub fn execution_order(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.id.as_str()).collect()
    }

    /// Check if the sequence has halted
    pub fn is_complete(&self) -> bool {
        self.state.sequence.is_halted()
    }
}
