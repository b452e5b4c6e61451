//! Load/concatenate benchmark
//!
//! Reads many CSV files into frames, tags each row with its source file and
//! concatenates the result, using the selected execution strategy.

use crate::config::Benchmark;
use crate::generate::generate;
use crate::pool::{Executor, Strategy};
use crate::process::{chunk, ProcessPool, WorkerJob, WorkerReply};
use crate::report::LoadRecord;
use crate::timing::time_iterations;
use crate::{BenchConfig, Result};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use tabular::{concat, Frame, Value};

/// Column holding each row's source file path
pub const SOURCE_COLUMN: &str = "fpath";

/// `.csv` files (any case) directly inside `dir`, sorted by name
pub fn list_csvs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase().ends_with(".csv"))
            .unwrap_or(false);
        if is_csv && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

pub fn load_task(path: &Path) -> Result<Frame> {
    let frame = Frame::read_csv(path)?;
    Ok(frame.with_column(SOURCE_COLUMN, Value::Text(path.display().to_string())))
}

/// Load every file in `paths` and concatenate them in input order
pub fn load_all(strategy: Strategy, exec: &Executor, paths: &[PathBuf]) -> Result<Frame> {
    let frames = match strategy {
        Strategy::SingleThreaded => paths
            .iter()
            .map(|p| load_task(p))
            .collect::<Result<Vec<_>>>()?,
        Strategy::MultiThreaded | Strategy::OneThreadPerFile => exec
            .thread_pool(strategy == Strategy::OneThreadPerFile, paths.len())
            .map(paths, |p| load_task(p))?,
        Strategy::MultiProcess => {
            let jobs: Vec<WorkerJob> = chunk(paths, exec.processes.workers())
                .into_iter()
                .map(|paths| WorkerJob::Load { paths })
                .collect();
            collect_loaded(&exec.processes, exec.processes.run(&jobs)?)?
        }
    };

    debug!("{} loaded {} frames", strategy, frames.len());
    Ok(concat(frames))
}

/// Frames from `Loaded` replies in worker order; any other reply is an error
fn collect_loaded(pool: &ProcessPool, replies: Vec<WorkerReply>) -> Result<Vec<Frame>> {
    let mut frames = Vec::new();
    for (worker, reply) in replies.into_iter().enumerate() {
        match reply {
            WorkerReply::Loaded { frames: loaded } => frames.extend(loaded),
            other => return Err(pool.failure(worker, format!("unexpected reply {:?}", other))),
        }
    }
    Ok(frames)
}

/// Size of `path` in KB
pub fn file_kb(path: &Path) -> Result<f64> {
    Ok(fs::metadata(path)?.len() as f64 / 1024.0)
}

/// For each drive and row count, build one dataset, then sweep file counts and strategies
pub fn benchmark(config: &BenchConfig, exec: &Executor) -> Result<Vec<LoadRecord>> {
    let sweep = config.sweep(Benchmark::Load);
    let dataset_files = sweep.max_file_count();
    let mut records = Vec::new();

    for drive in &config.drives {
        for &row_count in &sweep.row_counts {
            fs::create_dir_all(&drive.root)?;
            let tmp = tempfile::Builder::new()
                .prefix("concat-csvs-")
                .tempdir_in(&drive.root)?;

            generate(
                Strategy::MultiProcess,
                exec,
                tmp.path(),
                dataset_files,
                row_count,
                config.column_count,
            )?;
            let paths = list_csvs(tmp.path())?;
            let kb = match paths.first() {
                Some(first) => file_kb(first)?,
                None => 0.0,
            };

            for &file_count in &sweep.file_counts {
                let subset = &paths[..file_count.min(paths.len())];
                for &strategy in &config.strategies {
                    let timing = time_iterations(config.iterations, || {
                        load_all(strategy, exec, subset).map(|_| ())
                    })?;

                    info!(
                        "Run time {:6.2} s for {} reading {} files ({:.2} KB) from {}.",
                        timing.total_secs(),
                        strategy,
                        file_count,
                        kb,
                        tmp.path().display()
                    );

                    records.push(LoadRecord {
                        function: strategy.to_string(),
                        path: tmp.path().display().to_string(),
                        file_count,
                        row_count,
                        file_kb: kb,
                        run_time: timing.total_secs(),
                        avg_run_time: timing.mean_secs(),
                        drive_type: drive.label.clone(),
                        iter_count: config.iterations,
                    });
                }
            }
        }
    }

    Ok(records)
}
