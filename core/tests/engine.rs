mod common;

use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use wsrun_core::api::{
    ExecRequest, ExecutorError, ExitDetail, RenderEvent, RunMode, UnitOutcome, PACKAGE_NAME_VAR,
    ROOT_PATH_VAR,
};

use common::{engine, engine_with_renderer, unit, MockAdapter, RecordingRenderer};

fn request(command: &[&str]) -> ExecRequest {
    ExecRequest {
        command: command.iter().map(|s| s.to_string()).collect(),
        concurrency: 4,
        ..ExecRequest::default()
    }
}

#[tokio::test]
async fn dependencies_finish_before_dependents_start() {
    let adapter = Arc::new(MockAdapter::new().with_delay(Duration::from_millis(5)));
    let units = vec![
        unit("app", &["ui", "api"]),
        unit("ui", &["core"]),
        unit("api", &["core"]),
        unit("core", &[]),
    ];

    let report = engine(adapter.clone())
        .execute(Path::new("/ws"), &units, &request(&["build"]))
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(
        report.batches,
        vec![vec!["core"], vec!["ui", "api"], vec!["app"]]
    );

    for u in &units {
        let start = adapter.position(&format!("start:{}", u.name)).unwrap();
        for dep in &u.dependencies {
            let dep_end = adapter.position(&format!("end:{dep}")).unwrap();
            assert!(dep_end < start, "{dep} must finish before {} starts", u.name);
        }
    }
}

#[tokio::test]
async fn every_unit_gets_its_name_and_the_root_injected() {
    let adapter = Arc::new(MockAdapter::new());
    let units = vec![unit("a", &[]), unit("b", &["a"])];

    engine(adapter.clone())
        .execute(Path::new("/ws"), &units, &request(&["env"]))
        .await
        .unwrap();

    let calls = adapter.calls();
    assert_eq!(calls.len(), 2);
    for call in calls {
        assert_eq!(
            call.envs.get(OsStr::new(PACKAGE_NAME_VAR)),
            Some(&OsString::from(call.unit.clone()))
        );
        assert_eq!(
            call.envs.get(OsStr::new(ROOT_PATH_VAR)),
            Some(&OsString::from("/ws"))
        );
        assert_eq!(call.envs.get(OsStr::new("PATH")), Some(&OsString::from("/usr/bin")));
        assert_eq!(call.cwd, Path::new("/ws/packages").join(&call.unit));
        assert_eq!(call.program, "env");
    }
}

#[tokio::test]
async fn missing_command_is_rejected_before_anything_runs() {
    let adapter = Arc::new(MockAdapter::new());
    let err = engine(adapter.clone())
        .execute(Path::new("/ws"), &[unit("a", &[])], &request(&[]))
        .await
        .unwrap_err();

    assert!(matches!(err, ExecutorError::Configuration(_)));
    assert_eq!(err.exit_code(), 11);
    assert!(adapter.calls().is_empty());
}

#[tokio::test]
async fn cycles_are_rejected_before_anything_runs() {
    let adapter = Arc::new(MockAdapter::new());
    let units = vec![unit("free", &[]), unit("a", &["b"]), unit("b", &["a"])];
    let req = ExecRequest {
        reject_cycles: true,
        ..request(&["build"])
    };

    let err = engine(adapter.clone())
        .execute(Path::new("/ws"), &units, &req)
        .await
        .unwrap_err();

    match &err {
        ExecutorError::CyclicDependency { cycle } => {
            assert!(cycle.contains('a') && cycle.contains('b'), "{cycle}")
        }
        other => panic!("expected cycle error, got {other:?}"),
    }
    assert_eq!(err.exit_code(), 13);
    assert!(adapter.calls().is_empty());
}

#[tokio::test]
async fn tolerated_cycles_still_run_every_unit() {
    let adapter = Arc::new(MockAdapter::new());
    let units = vec![
        unit("base", &[]),
        unit("a", &["b", "base"]),
        unit("b", &["a"]),
    ];

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        engine(adapter.clone()).execute(Path::new("/ws"), &units, &request(&["build"])),
    )
    .await
    .expect("cyclic workspace must not hang")
    .unwrap();

    assert!(report.is_success());
    assert_eq!(report.records.len(), 3);
    assert_eq!(report.batches, vec![vec!["base"], vec!["a", "b"]]);
    assert_eq!(report.broken_cycles.len(), 1);
}

#[tokio::test]
async fn bail_skips_later_batches_and_escalates() {
    let adapter = Arc::new(MockAdapter::new().failing("core", ExitDetail::Code(3)));
    let units = vec![
        unit("core", &[]),
        unit("other", &[]),
        unit("app", &["core"]),
    ];

    let report = engine(adapter.clone())
        .execute(Path::new("/ws"), &units, &request(&["test"]))
        .await
        .unwrap();

    assert!(!adapter.started().contains(&"app".to_string()));
    assert_eq!(report.record("app").unwrap().outcome, UnitOutcome::NotAttempted);
    assert!(adapter.calls().iter().all(|c| c.reject));

    let err = report.into_verdict().unwrap_err();
    match &err {
        ExecutorError::AggregateFailure { first, failed, .. } => {
            assert_eq!(first.unit, "core");
            assert_eq!(first.detail, ExitDetail::Code(3));
            assert!(first.rejected);
            assert_eq!(*failed, 1);
        }
        other => panic!("expected aggregate failure, got {other:?}"),
    }
    assert_eq!(err.exit_code(), 3);
}

#[tokio::test]
async fn no_bail_runs_everything_and_counts_failures() {
    let adapter = Arc::new(
        MockAdapter::new()
            .failing("core", ExitDetail::Code(1))
            .failing("app", ExitDetail::Signal(9)),
    );
    let units = vec![
        unit("core", &[]),
        unit("app", &["core"]),
        unit("docs", &["app"]),
    ];
    let req = ExecRequest {
        bail: false,
        ..request(&["lint"])
    };

    let report = engine(adapter.clone())
        .execute(Path::new("/ws"), &units, &req)
        .await
        .unwrap();

    assert_eq!(adapter.started(), vec!["core", "app", "docs"]);
    assert_eq!(report.failed(), 2);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.not_attempted(), 0);
    assert!(report.failures().all(|f| !f.rejected));

    match report.into_verdict() {
        Err(ExecutorError::AggregateFailure { first, failed, .. }) => {
            assert_eq!(first.unit, "core");
            assert_eq!(failed, 2);
        }
        other => panic!("expected aggregate failure, got {other:?}"),
    }
}

#[tokio::test]
async fn parallel_mode_ignores_order_and_streams() {
    let adapter = Arc::new(MockAdapter::new().with_delay(Duration::from_millis(5)));
    let units = vec![unit("a", &["b"]), unit("b", &["a"]), unit("c", &["a"])];
    let req = ExecRequest {
        parallel: true,
        reject_cycles: true,
        ..request(&["dev"])
    };

    let report = engine(adapter.clone())
        .execute(Path::new("/ws"), &units, &req)
        .await
        .unwrap();

    assert_eq!(report.mode, RunMode::Parallel);
    assert!(report.batches.is_empty());
    assert_eq!(report.records.len(), 3);
    assert!(adapter.calls().iter().all(|c| c.stream));
    assert!(report.records.iter().all(|r| r.stdout.is_empty()));
}

#[tokio::test]
async fn buffered_output_lands_in_the_record() {
    let adapter = Arc::new(MockAdapter::new());
    let report = engine(adapter)
        .execute(Path::new("/ws"), &[unit("a", &[])], &request(&["echo"]))
        .await
        .unwrap();

    assert_eq!(report.record("a").unwrap().stdout, "output of a\n");
}

#[tokio::test]
async fn without_sorting_everything_is_one_batch() {
    let adapter = Arc::new(MockAdapter::new());
    let units = vec![unit("app", &["core"]), unit("core", &[])];
    let req = ExecRequest {
        sort: false,
        ..request(&["build"])
    };

    let report = engine(adapter)
        .execute(Path::new("/ws"), &units, &req)
        .await
        .unwrap();

    assert_eq!(report.batches, vec![vec!["app", "core"]]);
}

#[tokio::test]
async fn empty_selection_is_a_successful_noop() {
    let adapter = Arc::new(MockAdapter::new());
    let report = engine(adapter.clone())
        .execute(Path::new("/ws"), &[], &request(&["build"]))
        .await
        .unwrap();

    assert!(report.is_success());
    assert!(report.records.is_empty());
    assert!(adapter.calls().is_empty());
}

#[tokio::test]
async fn renderer_sees_the_full_lifecycle() {
    let adapter = Arc::new(MockAdapter::new());
    let renderer = Arc::new(RecordingRenderer::default());
    let units = vec![unit("a", &[]), unit("b", &["a"])];
    let req = ExecRequest {
        concurrency: 1,
        ..request(&["build"])
    };

    engine_with_renderer(adapter, renderer.clone())
        .execute(Path::new("/ws"), &units, &req)
        .await
        .unwrap();

    assert_eq!(
        renderer.kinds(),
        vec![
            "run_start",
            "plan",
            "batch_start:0",
            "unit_start:a",
            "unit_end:a",
            "batch_end:0",
            "batch_start:1",
            "unit_start:b",
            "unit_end:b",
            "batch_end:1",
            "run_end",
        ]
    );

    let events = renderer.events();
    let run_ids: Vec<&str> = events
        .iter()
        .map(|ev| match ev {
            RenderEvent::RunStart { run_id, .. }
            | RenderEvent::Plan { run_id, .. }
            | RenderEvent::BatchStart { run_id, .. }
            | RenderEvent::UnitStart { run_id, .. }
            | RenderEvent::UnitEnd { run_id, .. }
            | RenderEvent::BatchEnd { run_id, .. }
            | RenderEvent::RunEnd { run_id, .. } => run_id.as_str(),
        })
        .collect();
    assert!(run_ids.windows(2).all(|w| w[0] == w[1]));
}
