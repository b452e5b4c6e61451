use iobench::config::{Benchmark, Drive, Sweep};
use iobench::process::{ProcessPool, WorkerJob};
use iobench::{generate, load, BenchConfig, BenchError, Executor, Strategy, ThreadPool};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;
use std::time::Duration;
use tabular::Frame;

const MAKE_FILES: &str = env!("CARGO_BIN_EXE_make-files");
const CONCAT_CSVS: &str = env!("CARGO_BIN_EXE_concat-csvs");

fn executor(program: &str) -> Executor {
    Executor::new(ThreadPool::new(4), ProcessPool::new(program, 3))
}

fn small_config(root: &Path) -> BenchConfig {
    BenchConfig {
        iterations: 1,
        drives: vec![Drive::new("scratch", root)],
        generate: Sweep {
            file_counts: vec![4],
            row_counts: vec![10],
        },
        load: Sweep {
            file_counts: vec![2, 5],
            row_counts: vec![8],
        },
        results_dir: root.join("results"),
        ..BenchConfig::default()
    }
}

#[test]
fn test_multi_process_generate() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("out");
    let exec = executor(MAKE_FILES);

    let frame = generate::generate(Strategy::MultiProcess, &exec, &dir, 10, 15, 26).unwrap();

    let paths = load::list_csvs(&dir).unwrap();
    assert_eq!(paths.len(), 10);

    let reference = generate::write_task(0, root.path(), &frame).unwrap();
    let expected = fs::read(reference).unwrap();
    for p in &paths {
        assert_eq!(fs::read(p).unwrap(), expected, "{}", p.display());
    }
}

#[test]
fn test_multi_process_load_matches_single_threaded() {
    let root = tempfile::tempdir().unwrap();
    let exec = executor(CONCAT_CSVS);
    generate::generate(Strategy::SingleThreaded, &exec, root.path(), 7, 12, 5).unwrap();
    let paths = load::list_csvs(root.path()).unwrap();

    let single = load::load_all(Strategy::SingleThreaded, &exec, &paths).unwrap();
    let multi = load::load_all(Strategy::MultiProcess, &exec, &paths).unwrap();
    assert_eq!(multi.row_count(), 84);
    assert_eq!(multi, single);
}

#[test]
fn test_worker_failure_surfaces() {
    let pool = ProcessPool::new(MAKE_FILES, 1);
    let jobs = vec![
        WorkerJob::Load { paths: Vec::new() },
        WorkerJob::Load {
            paths: vec![PathBuf::from("/definitely/not/here.csv")],
        },
    ];
    match pool.run(&jobs) {
        Err(BenchError::Worker { worker, .. }) => assert_eq!(worker, 1),
        other => panic!("expected worker failure, got {:?}", other),
    }
}

#[test]
fn test_worker_failure_stops_other_workers() {
    let root = tempfile::tempdir().unwrap();
    let out = root.path().join("out");
    fs::create_dir(&out).unwrap();

    // Worker 0 fails at once while worker 1 has thousands of files to write
    let frame = Frame::random(300, 26, &mut StdRng::seed_from_u64(3));
    let jobs = vec![
        WorkerJob::Load {
            paths: vec![root.path().join("missing.csv")],
        },
        WorkerJob::Write {
            dir: out.clone(),
            indices: (0..3000).collect(),
            frame,
        },
    ];
    let pool = ProcessPool::new(MAKE_FILES, 2);
    match pool.run(&jobs) {
        Err(BenchError::Worker { worker, .. }) => assert_eq!(worker, 0),
        other => panic!("expected worker failure, got {:?}", other),
    }

    let written = fs::read_dir(&out).unwrap().count();
    thread::sleep(Duration::from_secs(2));
    assert_eq!(fs::read_dir(&out).unwrap().count(), written);
    assert!(written < 3000);
}

#[test]
fn test_load_benchmark_all_strategies() {
    let root = tempfile::tempdir().unwrap();
    let config = small_config(root.path());
    let exec = executor(CONCAT_CSVS);

    let records = load::benchmark(&config, &exec).unwrap();
    // 1 drive x 1 row count x 2 file counts x 4 strategies
    assert_eq!(records.len(), 8);
    assert!(records.iter().all(|r| r.file_kb > 0.0 && r.row_count == 8));
    assert_eq!(records[0].file_count, 2);
    assert_eq!(records[4].file_count, 5);
    assert_eq!(records[3].function, "multi_process");
}

#[test]
fn test_make_files_binary() {
    let root = tempfile::tempdir().unwrap();
    let results = root.path().join("results");

    let status = Command::new(MAKE_FILES)
        .arg("--drive")
        .arg(format!("scratch={}", root.path().display()))
        .args(["-n", "1", "--file-counts", "3", "--row-counts", "4"])
        .arg("--results-dir")
        .arg(&results)
        .status()
        .unwrap();
    assert!(status.success());

    let files: Vec<_> = fs::read_dir(&results).unwrap().collect();
    assert_eq!(files.len(), 1);
    let text = fs::read_to_string(files[0].as_ref().unwrap().path()).unwrap();
    // header + one row per strategy
    assert_eq!(text.lines().count(), 5);
    assert!(text.starts_with("Function,Path,FileCount,RowCount,RunTime,DriveType"));
}

#[test]
fn test_config_sweep_selection() {
    let root = tempfile::tempdir().unwrap();
    let config = small_config(root.path());
    assert_eq!(config.sweep(Benchmark::Generate).file_counts, vec![4]);
    assert_eq!(config.sweep(Benchmark::Load).max_file_count(), 5);
}
