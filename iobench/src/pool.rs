//! Execution strategies and worker pools
//!
//! Each strategy maps a list of independent tasks to results in submission
//! order. Thread strategies run closures on a bounded rayon pool; the process
//! strategy ships serialized jobs to child processes (see `process`).

use crate::process::ProcessPool;
use crate::{BenchConfig, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Concurrency strategy under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    SingleThreaded,
    MultiThreaded,
    OneThreadPerFile,
    MultiProcess,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::SingleThreaded,
        Strategy::MultiThreaded,
        Strategy::OneThreadPerFile,
        Strategy::MultiProcess,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::SingleThreaded => "single_threaded",
            Strategy::MultiThreaded => "multi_threaded",
            Strategy::OneThreadPerFile => "one_thread_per_file",
            Strategy::MultiProcess => "multi_process",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        let wanted = s.trim().replace('-', "_").to_ascii_lowercase();
        Strategy::ALL
            .into_iter()
            .find(|st| st.name() == wanted)
            .ok_or_else(|| format!("unknown strategy {:?}", s))
    }
}

/// Bounded thread pool
#[derive(Debug, Clone, Copy)]
pub struct ThreadPool {
    workers: usize,
}

impl ThreadPool {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// min(32, cpus + 4)
    pub fn default_workers() -> usize {
        (num_cpus::get() + 4).min(32)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `f` over `items`; results keep input order, first error wins
    pub fn map<T, R, F>(&self, items: &[T], f: F) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> Result<R> + Sync + Send,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("iobench-worker-{}", i))
            .build()?;
        pool.install(|| items.par_iter().map(&f).collect())
    }
}

/// Pools shared by every benchmark run
#[derive(Debug, Clone)]
pub struct Executor {
    pub threads: ThreadPool,
    pub processes: ProcessPool,
}

impl Executor {
    pub fn new(threads: ThreadPool, processes: ProcessPool) -> Self {
        Self { threads, processes }
    }

    /// Pools sized from `config`, spawning workers from the running executable
    pub fn from_config(config: &BenchConfig) -> Result<Self> {
        let threads = ThreadPool::new(config.threads.unwrap_or_else(ThreadPool::default_workers));
        let processes = ProcessPool::current(config.processes.unwrap_or_else(num_cpus::get))?;
        Ok(Self::new(threads, processes))
    }

    /// Shared pool, or one thread per task when `per_task` is set
    pub fn thread_pool(&self, per_task: bool, task_count: usize) -> ThreadPool {
        if per_task {
            ThreadPool::new(task_count)
        } else {
            self.threads
        }
    }
}
