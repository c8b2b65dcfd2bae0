use std::future::Future;
use std::time::Instant;

use super::types::{ExitDetail, OutcomeLog, RunMode, RunReport, Unit, UnitFailure, UnitRecord};

/// Launch every unit at once, ignoring dependency order
///
/// There is no concurrency cap and no fail-fast: by the time a failure is
/// known every unit is already running. The run fails if any unit failed.
pub async fn run_all_parallel<F, Fut>(units: &[Unit], action: F) -> RunReport
where
    F: Fn(usize, Unit) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = UnitRecord> + Send + 'static,
{
    let start = Instant::now();
    let log = OutcomeLog::new();

    let handles: Vec<_> = units
        .iter()
        .map(|unit| {
            let action = action.clone();
            let log = log.clone();
            let unit = unit.clone();
            let name = unit.name.clone();
            let handle = tokio::spawn(async move {
                let record = action(0, unit).await;
                log.push(record);
            });
            (name, handle)
        })
        .collect();

    tracing::debug!(units = handles.len(), "launched all units");

    for (name, handle) in handles {
        if let Err(err) = handle.await {
            tracing::error!(unit = %name, error = %err, "unit task aborted");
            log.push(UnitRecord::failed(
                UnitFailure {
                    unit: name,
                    command: String::new(),
                    detail: ExitDetail::Internal(err.to_string()),
                    rejected: false,
                },
                0,
            ));
        }
    }

    RunReport {
        mode: RunMode::Parallel,
        batches: Vec::new(),
        broken_cycles: Vec::new(),
        records: log.into_records(),
        duration_ms: start.elapsed().as_millis() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Barrier;

    fn unit(name: &str, deps: &[&str]) -> Unit {
        Unit::new(name, format!("/ws/{name}")).with_dependencies(deps.iter().copied())
    }

    #[tokio::test]
    async fn launches_without_waiting_for_dependencies() {
        // Every action blocks until all of them have started; ordering by
        // dependency would deadlock and hit the timeout.
        let units = vec![unit("app", &["lib"]), unit("lib", &["core"]), unit("core", &[])];
        let barrier = Arc::new(Barrier::new(units.len()));

        let run = run_all_parallel(&units, {
            let barrier = barrier.clone();
            move |_, u: Unit| {
                let barrier = barrier.clone();
                async move {
                    barrier.wait().await;
                    UnitRecord::succeeded(&u, 0)
                }
            }
        });

        let report = tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("units were not launched together");

        assert!(report.is_success());
        assert_eq!(report.records.len(), 3);
        assert_eq!(report.mode, RunMode::Parallel);
    }

    #[tokio::test]
    async fn one_failure_fails_the_run_but_all_units_finish() {
        let units = vec![unit("a", &[]), unit("b", &[]), unit("c", &[])];

        let report = run_all_parallel(&units, |_, u: Unit| async move {
            if u.name == "b" {
                UnitRecord::failed(
                    UnitFailure {
                        unit: u.name.clone(),
                        command: "lint".into(),
                        detail: ExitDetail::Code(4),
                        rejected: true,
                    },
                    0,
                )
            } else {
                tokio::time::sleep(Duration::from_millis(10)).await;
                UnitRecord::succeeded(&u, 10)
            }
        })
        .await;

        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.not_attempted(), 0);
        assert_eq!(report.first_failure().unwrap().detail, ExitDetail::Code(4));
    }

    #[tokio::test]
    async fn panicking_unit_is_recorded_as_failure() {
        let units = vec![unit("ok", &[]), unit("boom", &[])];

        let report = run_all_parallel(&units, |_, u: Unit| async move {
            if u.name == "boom" {
                panic!("unit exploded");
            }
            UnitRecord::succeeded(&u, 0)
        })
        .await;

        let failure = report.record("boom").and_then(|r| r.failure()).unwrap();
        assert!(matches!(failure.detail, ExitDetail::Internal(_)));
        assert!(report.record("ok").unwrap().is_success());
    }
}
