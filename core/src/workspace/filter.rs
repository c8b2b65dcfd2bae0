use glob::Pattern;

use crate::error::WorkspaceError;
use crate::executor::types::Unit;

/// Name-based selection of the units a run covers.
///
/// Dependencies on units that get filtered out are left in place; the batcher
/// treats them as external.
#[derive(Debug, Clone, Default)]
pub struct UnitFilter {
    scope: Vec<Pattern>,
    ignore: Vec<Pattern>,
    include_private: bool,
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>, WorkspaceError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| WorkspaceError::Pattern {
                pattern: p.clone(),
                message: e.to_string(),
            })
        })
        .collect()
}

impl UnitFilter {
    pub fn new(
        scope: &[String],
        ignore: &[String],
        include_private: bool,
    ) -> Result<Self, WorkspaceError> {
        Ok(Self {
            scope: compile(scope)?,
            ignore: compile(ignore)?,
            include_private,
        })
    }

    /// Keeps every unit.
    pub fn all() -> Self {
        Self {
            include_private: true,
            ..Self::default()
        }
    }

    pub fn matches(&self, unit: &Unit) -> bool {
        let in_scope = self.scope.is_empty() || self.scope.iter().any(|p| p.matches(&unit.name));
        let ignored = self.ignore.iter().any(|p| p.matches(&unit.name));
        in_scope && !ignored && (self.include_private || !unit.private)
    }

    pub fn apply(&self, units: &[Unit]) -> Vec<Unit> {
        units.iter().filter(|u| self.matches(u)).cloned().collect()
    }
}
