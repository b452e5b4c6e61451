//! Tabular I/O Concurrency Benchmarks
//!
//! Times file generation and load/concatenate workloads under single-threaded,
//! thread-pool, thread-per-file and process-pool execution.

use std::path::PathBuf;
use thiserror::Error;

pub mod cli;
pub mod config;
pub mod generate;
pub mod load;
pub mod pool;
pub mod process;
pub mod report;
pub mod timing;

pub use config::{BenchConfig, Drive, Sweep};
pub use pool::{Executor, Strategy, ThreadPool};
pub use process::ProcessPool;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Tabular(#[from] tabular::TabularError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Thread pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("Worker {worker} ({program}) failed: {message}")]
    Worker {
        worker: usize,
        program: PathBuf,
        message: String,
    },

    #[error("Invalid config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BenchError>;
