//! File generation benchmark
//!
//! Builds one random frame and writes it to `file_count` CSV files in a
//! directory, using the selected execution strategy.

use crate::config::Benchmark;
use crate::pool::{Executor, Strategy};
use crate::process::{chunk, WorkerJob, WorkerReply};
use crate::report::GenerateRecord;
use crate::timing::time_iterations;
use crate::{BenchConfig, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use tabular::{CsvOptions, Frame};

pub fn file_name(i: usize) -> String {
    format!("data-{:05}.csv", i)
}

/// Write `frame`, with its row index, as file number `i` in `dir`
pub fn write_task(i: usize, dir: &Path, frame: &Frame) -> Result<PathBuf> {
    let path = dir.join(file_name(i));
    frame.write_csv(&path, CsvOptions { index: true })?;
    Ok(path)
}

/// Create `dir` and fill it with `file_count` copies of a fresh random frame
pub fn generate(
    strategy: Strategy,
    exec: &Executor,
    dir: &Path,
    file_count: usize,
    row_count: usize,
    column_count: usize,
) -> Result<Frame> {
    fs::create_dir_all(dir)?;
    let frame = Frame::random(row_count, column_count, &mut rand::thread_rng());
    let indices: Vec<usize> = (0..file_count).collect();

    match strategy {
        Strategy::SingleThreaded => {
            for &i in &indices {
                write_task(i, dir, &frame)?;
            }
        }
        Strategy::MultiThreaded | Strategy::OneThreadPerFile => {
            exec.thread_pool(strategy == Strategy::OneThreadPerFile, file_count)
                .map(&indices, |&i| write_task(i, dir, &frame))?;
        }
        Strategy::MultiProcess => {
            let jobs: Vec<WorkerJob> = chunk(&indices, exec.processes.workers())
                .into_iter()
                .map(|indices| WorkerJob::Write {
                    dir: dir.to_path_buf(),
                    indices,
                    frame: frame.clone(),
                })
                .collect();
            for (worker, reply) in exec.processes.run(&jobs)?.into_iter().enumerate() {
                if !matches!(reply, WorkerReply::Written { .. }) {
                    return Err(exec.processes.failure(worker, format!("unexpected reply {:?}", reply)));
                }
            }
        }
    }

    Ok(frame)
}

/// Sweep file counts, row counts, drives and strategies
pub fn benchmark(config: &BenchConfig, exec: &Executor) -> Result<Vec<GenerateRecord>> {
    let sweep = config.sweep(Benchmark::Generate);
    let mut records = Vec::new();

    for &file_count in &sweep.file_counts {
        for &row_count in &sweep.row_counts {
            for drive in &config.drives {
                for &strategy in &config.strategies {
                    fs::create_dir_all(&drive.root)?;
                    let tmp = tempfile::Builder::new()
                        .prefix("make-files-")
                        .tempdir_in(&drive.root)?;

                    let timing = time_iterations(config.iterations, || {
                        generate(strategy, exec, tmp.path(), file_count, row_count, config.column_count)
                            .map(|_| ())
                    })?;

                    info!(
                        "Run time {:6.2} s for {} creating {} files ({} rows) in {}.",
                        timing.total_secs(),
                        strategy,
                        file_count,
                        row_count,
                        tmp.path().display()
                    );

                    records.push(GenerateRecord {
                        function: strategy.to_string(),
                        path: tmp.path().display().to_string(),
                        file_count,
                        row_count,
                        run_time: timing.total_secs(),
                        drive_type: drive.label.clone(),
                        iter_count: config.iterations,
                    });
                }
            }
        }
    }

    Ok(records)
}
