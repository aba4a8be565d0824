use qbench_core::backend::fake::{FakeBackend, FakeScript};
use qbench_core::backend::QueryBackend;
use qbench_core::engine::runner::{run_benchmark, RunTargets};
use qbench_core::errors::HarnessError;
use qbench_core::model::{Catalog, DefinitionState, QueryDefinition, SubmitOptions};
use qbench_core::report::Delimiter;
use qbench_core::runlog::RunLog;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn catalog(sqls: &[&str]) -> Catalog {
    Catalog {
        version: 1,
        name: "props".into(),
        location: None,
        queries: sqls
            .iter()
            .enumerate()
            .map(|(i, sql)| QueryDefinition::new(format!("q{}", i + 1), *sql))
            .collect(),
    }
}

struct Paths {
    _dir: TempDir,
    summary: PathBuf,
    log: PathBuf,
}

fn paths() -> Paths {
    let dir = TempDir::new().unwrap();
    Paths {
        summary: dir.path().join("bench_summary.csv"),
        log: dir.path().join("bench_run.log"),
        _dir: dir,
    }
}

async fn run(
    backend: Arc<dyn QueryBackend>,
    cat: &Catalog,
    p: &Paths,
) -> Result<qbench_core::model::RunArtifacts, HarnessError> {
    let log = RunLog::create(&p.log)?;
    run_benchmark(
        backend,
        cat,
        SubmitOptions::default(),
        log,
        RunTargets {
            summary: &p.summary,
            delimiter: Delimiter::Comma,
        },
    )
    .await
}

fn lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}

#[tokio::test]
async fn test_all_succeed_gives_header_plus_n_rows_in_order() {
    let p = paths();
    let cat = catalog(&["SELECT 1", "SELECT 2", "SELECT 3"]);
    let a = run(Arc::new(FakeBackend::new()), &cat, &p).await.unwrap();

    assert_eq!(a.completed(), 3);
    let rows = lines(&p.summary);
    assert_eq!(rows.len(), 4);
    assert_eq!(
        rows[0],
        "Query_Name,Job_ID,Duration_ms,Bytes_Processed,Slot_Milliseconds"
    );
    let names: Vec<&str> = rows[1..]
        .iter()
        .map(|r| r.split(',').next().unwrap())
        .collect();
    assert_eq!(names, vec!["q1", "q2", "q3"]);
}

#[tokio::test]
async fn test_k_failures_drop_k_rows_and_log_failure_markers() {
    let p = paths();
    let backend = FakeBackend::new()
        .script("bad1", FakeScript::SubmitError("Syntax error: Unexpected keyword".into()))
        .script("bad2", FakeScript::WaitError("Access Denied: Table".into()))
        .script("bad3", FakeScript::NoJobId("".into()));
    let cat = catalog(&["SELECT 1", "bad1", "bad2", "SELECT 4", "bad3"]);
    let a = run(Arc::new(backend), &cat, &p).await.unwrap();

    assert_eq!(a.completed(), 2);
    assert_eq!(a.failed(), 3);
    assert_eq!(lines(&p.summary).len(), 3);

    let log = std::fs::read_to_string(&p.log).unwrap();
    assert_eq!(log.matches("[FAILURE]").count(), 3);
    assert_eq!(log.matches("[SUCCESS]").count(), 2);
    assert!(log.contains("Access Denied: Table"));
    assert!(log.contains("Syntax error"));
}

#[tokio::test]
async fn test_missing_job_id_does_not_block_later_definitions() {
    let p = paths();
    let backend = Arc::new(FakeBackend::new().script(
        "first",
        FakeScript::NoJobId("Waiting on nothing... done".into()),
    ));
    let cat = catalog(&["first", "SELECT 2"]);
    let a = run(backend.clone(), &cat, &p).await.unwrap();

    assert_eq!(a.outcomes[0].state, DefinitionState::SubmissionFailed);
    assert_eq!(a.outcomes[1].state, DefinitionState::Completed);
    let rows = lines(&p.summary);
    assert_eq!(rows.len(), 2);
    assert!(rows[1].starts_with("q2,"));

    // The failed definition never reached wait.
    let calls = backend.calls();
    assert_eq!(calls.iter().filter(|c| c.starts_with("wait:")).count(), 1);

    let log = std::fs::read_to_string(&p.log).unwrap();
    assert!(log.contains("[FAILURE] q1"));
    assert!(log.contains("Waiting on nothing... done"));
}

#[tokio::test]
async fn test_duration_floors_elapsed_milliseconds() {
    let p = paths();
    let backend = FakeBackend::new().script(
        "timed",
        FakeScript::Succeed {
            start_ms: 1000.7,
            end_ms: 2500.2,
            bytes: 4096,
            slot_ms: 321,
        },
    );
    let cat = catalog(&["timed"]);
    let a = run(Arc::new(backend), &cat, &p).await.unwrap();

    let stats = a.outcomes[0].stats.clone().unwrap();
    assert_eq!(stats.duration_ms, Some(1499));
    assert_eq!(lines(&p.summary)[1], "q1,fake_job_1,1499,4096,321");
}

#[tokio::test]
async fn test_preflight_failure_writes_only_fatal_line() {
    let p = paths();
    let backend = FakeBackend::new().failing_preflight("bq: command not found");
    let cat = catalog(&["SELECT 1"]);
    let err = run(Arc::new(backend), &cat, &p).await.unwrap_err();

    assert!(matches!(err, HarnessError::Preflight(_)));
    let log = lines(&p.log);
    assert_eq!(log.len(), 1);
    assert!(log[0].contains("[FATAL]"));
    assert!(!p.summary.exists());
}

#[tokio::test]
async fn test_second_run_overwrites_artifacts() {
    let p = paths();
    let cat = catalog(&["SELECT 1", "SELECT 2", "SELECT 3"]);
    run(Arc::new(FakeBackend::new()), &cat, &p).await.unwrap();
    assert_eq!(lines(&p.summary).len(), 4);

    let cat = catalog(&["SELECT 1"]);
    run(Arc::new(FakeBackend::new()), &cat, &p).await.unwrap();
    assert_eq!(lines(&p.summary).len(), 2);
    let log = std::fs::read_to_string(&p.log).unwrap();
    assert_eq!(log.matches("run start").count(), 1);
}

#[tokio::test]
async fn test_unparseable_stats_keep_row_with_empty_cells() {
    let p = paths();
    let backend = FakeBackend::new().script("odd", FakeScript::RawStats("<html>502</html>".into()));
    let cat = catalog(&["odd", "SELECT 2"]);
    let a = run(Arc::new(backend), &cat, &p).await.unwrap();

    assert!(a.outcomes[0].stats_missing);
    let rows = lines(&p.summary);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1], "q1,fake_job_1,,,");
    let log = std::fs::read_to_string(&p.log).unwrap();
    assert!(log.contains("stats gap"));
}

#[tokio::test]
async fn test_submissions_request_uncached_runs_in_location() {
    let p = paths();
    let backend = Arc::new(FakeBackend::new());
    let cat = catalog(&["SELECT 1"]);
    let log = RunLog::create(&p.log).unwrap();
    let opts = SubmitOptions {
        location: "EU".into(),
        ..Default::default()
    };
    assert!(!opts.use_cache);
    run_benchmark(
        backend,
        &cat,
        opts,
        log,
        RunTargets {
            summary: &p.summary,
            delimiter: Delimiter::Tab,
        },
    )
    .await
    .unwrap();

    let content = std::fs::read_to_string(&p.log).unwrap();
    assert!(content.contains("fake query --location=EU"));
    assert!(lines(&p.summary)[0].contains('\t'));
}

#[tokio::test]
async fn test_unrepresentable_timestamps_do_not_abort_the_run() {
    let p = paths();
    let backend = FakeBackend::new().script(
        "huge",
        FakeScript::RawStats(
            r#"{"statistics":{"startTime":"-1e19","endTime":"1e19","totalBytesProcessed":"7","query":{"totalSlotMs":"3"}}}"#
                .into(),
        ),
    );
    let cat = catalog(&["huge", "SELECT 2"]);
    let a = run(Arc::new(backend), &cat, &p).await.unwrap();

    assert_eq!(a.completed(), 2);
    assert!(a.outcomes[0].stats_missing);
    let rows = lines(&p.summary);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1], "q1,fake_job_1,,7,3");
    assert!(rows[2].starts_with("q2,fake_job_2,"));
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_unwritable_summary_is_fatal_and_logged() {
    let p = paths();
    let log = RunLog::create(&p.log).unwrap();
    let cat = catalog(&["SELECT 1"]);
    let err = run_benchmark(
        Arc::new(FakeBackend::new()),
        &cat,
        SubmitOptions::default(),
        log,
        RunTargets {
            summary: Path::new("/dev/full"),
            delimiter: Delimiter::Comma,
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, HarnessError::Io { .. }));
    let log = lines(&p.log);
    assert_eq!(log.len(), 1);
    assert!(log[0].contains("[FATAL]"));
    assert!(log[0].contains("/dev/full"));
}
