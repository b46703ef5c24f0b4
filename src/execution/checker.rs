//! Precondition checker - evaluates gates against an environment probe

use crate::core::{EnvironmentProbe, Precondition, PreconditionConfig};
use std::sync::Arc;
use tracing::debug;

/// Evaluates preconditions without side effects of its own
#[derive(Clone)]
pub struct PreconditionChecker {
    probe: Arc<dyn EnvironmentProbe>,
}

impl PreconditionChecker {
    pub fn new(probe: Arc<dyn EnvironmentProbe>) -> Self {
        Self { probe }
    }

    /// Check a single condition
    pub fn is_satisfied(&self, condition: &Precondition) -> bool {
        let satisfied = match condition {
            Precondition::EnvVar(name) => self.probe.var_is_set(name),
            Precondition::FileExists(path) => self.probe.path_exists(path),
            Precondition::Importable { interpreter, module } => {
                self.probe.module_importable(interpreter, module)
            }
            Precondition::Binary(name) => self.probe.binary_on_path(name),
        };
        debug!("Precondition '{}': {}", condition, satisfied);
        satisfied
    }

    /// First condition that does not hold, checked in declared order
    pub fn first_unmet<'a>(
        &self,
        preconditions: &'a [PreconditionConfig],
    ) -> Option<&'a PreconditionConfig> {
        preconditions
            .iter()
            .find(|p| !self.is_satisfied(&p.condition))
    }
}
