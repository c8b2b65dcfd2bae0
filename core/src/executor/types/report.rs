use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::error::ExecutorError;

use super::outcome::{UnitFailure, UnitOutcome, UnitRecord};
use super::request::RunMode;

/// Aggregate of every unit outcome of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub mode: RunMode,

    /// Batch sequence that was executed (empty in parallel mode)
    pub batches: Vec<Vec<String>>,

    /// Cycles that were broken to produce `batches`
    pub broken_cycles: Vec<Vec<String>>,

    /// Unit records in the order they settled
    pub records: Vec<UnitRecord>,

    pub duration_ms: u64,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.records.iter().all(UnitRecord::is_success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &UnitFailure> {
        self.records.iter().filter_map(UnitRecord::failure)
    }

    /// First failure to settle; the representative error of the run.
    pub fn first_failure(&self) -> Option<&UnitFailure> {
        self.failures().next()
    }

    pub fn record(&self, unit: &str) -> Option<&UnitRecord> {
        self.records.iter().find(|r| r.unit == unit)
    }

    pub fn succeeded(&self) -> usize {
        self.records.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    pub fn not_attempted(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, UnitOutcome::NotAttempted))
            .count()
    }

    /// Escalate a failing run to [`ExecutorError::AggregateFailure`].
    pub fn into_verdict(self) -> Result<RunReport, ExecutorError> {
        let Some(first) = self.first_failure().cloned() else {
            return Ok(self);
        };

        Err(ExecutorError::AggregateFailure {
            first,
            failed: self.failed(),
            report: Box::new(self),
        })
    }
}

/// Settle-ordered outcome sink shared by concurrently running units.
#[derive(Debug, Clone, Default)]
pub struct OutcomeLog {
    inner: Arc<Mutex<Vec<UnitRecord>>>,
}

impl OutcomeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, record: UnitRecord) {
        let mut guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(record);
    }

    pub fn len(&self) -> usize {
        match self.inner.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, unit: &str) -> bool {
        let guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.iter().any(|r| r.unit == unit)
    }

    pub fn into_records(self) -> Vec<UnitRecord> {
        let mut guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::take(&mut *guard)
    }
}
