use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::Semaphore;

use super::graph::BatchPlan;
use super::types::{OutcomeLog, RunMode, RunReport, Unit, UnitRecord};

/// Batch boundary notifications.
pub trait BatchObserver: Send + Sync {
    fn batch_started(&self, _batch_id: usize, _units: &[Unit]) {}
    fn batch_finished(&self, _batch_id: usize) {}
}

pub struct NoopObserver;

impl BatchObserver for NoopObserver {}

/// Set once a rejected failure is observed; never cleared.
#[derive(Debug, Clone, Default)]
pub struct HaltFlag(Arc<AtomicBool>);

impl HaltFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Execute a batch plan, one batch at a time
///
/// # Arguments
///
/// * `plan` - Batches in dependency order
/// * `concurrency` - Maximum units in flight inside a batch (0 = unbounded)
/// * `observer` - Batch boundary callbacks
/// * `action` - Runs one unit (`batch_id`, unit) and reports its record
///
/// Batch N+1 starts only once every unit of batch N has settled. After a
/// rejected failure nothing new is launched; units already in flight are
/// awaited and everything else is recorded as not attempted.
pub async fn run_batches<F, Fut>(
    plan: &BatchPlan,
    concurrency: usize,
    observer: &dyn BatchObserver,
    action: F,
) -> RunReport
where
    F: Fn(usize, Unit) -> Fut + Clone,
    Fut: Future<Output = UnitRecord>,
{
    let start = Instant::now();
    let log = OutcomeLog::new();
    let halt = HaltFlag::new();

    for (batch_id, units) in plan.batches.iter().enumerate() {
        if halt.is_set() {
            tracing::debug!(batch_id, units = units.len(), "skipping batch after failure");
            for unit in units {
                log.push(UnitRecord::not_attempted(unit));
            }
            continue;
        }

        observer.batch_started(batch_id, units);
        execute_batch_bounded(batch_id, units, concurrency, &halt, &log, action.clone()).await;
        observer.batch_finished(batch_id);
    }

    RunReport {
        mode: RunMode::Batched,
        batches: plan.names(),
        broken_cycles: plan.broken_cycles.clone(),
        records: log.into_records(),
        duration_ms: start.elapsed().as_millis() as u64,
    }
}

/// Execute a single batch with at most `concurrency` units in flight
///
/// Returns when every unit of the batch has a record in `log`.
pub async fn execute_batch_bounded<F, Fut>(
    batch_id: usize,
    units: &[Unit],
    concurrency: usize,
    halt: &HaltFlag,
    log: &OutcomeLog,
    action: F,
) where
    F: Fn(usize, Unit) -> Fut + Clone,
    Fut: Future<Output = UnitRecord>,
{
    let sem = Arc::new(Semaphore::new(effective_limit(concurrency, units.len())));
    let mut futs = FuturesUnordered::new();

    for unit in units {
        let unit = unit.clone();
        let sem = sem.clone();
        let halt = halt.clone();
        let action = action.clone();

        futs.push(async move {
            let Ok(_permit) = sem.acquire_owned().await else {
                return UnitRecord::not_attempted(&unit);
            };

            if halt.is_set() {
                return UnitRecord::not_attempted(&unit);
            }

            // The permit is held until the record is produced, so a waiter
            // admitted after a failure always observes the halt.
            let record = action(batch_id, unit).await;
            if record.halts_run() {
                halt.set();
            }
            record
        });
    }

    while let Some(record) = futs.next().await {
        log.push(record);
    }
}

/// Semaphore size for a batch: 0 means one permit per unit.
fn effective_limit(concurrency: usize, batch_len: usize) -> usize {
    let limit = if concurrency == 0 {
        batch_len
    } else {
        concurrency.min(batch_len)
    };
    limit.max(1)
}
