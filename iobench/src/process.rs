//! Process pool
//!
//! Runs jobs in child processes of a benchmark binary started with
//! `--worker`. Protocol: one JSON `WorkerJob` on the child's stdin, one JSON
//! `WorkerReply` on its stdout. Logs go to stderr.

use crate::{generate, load, BenchError, Result};
use serde::{Deserialize, Serialize};
use std::io::{self, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Output, Stdio};
use tabular::Frame;

/// First argument that turns a benchmark binary into a pool worker
pub const WORKER_FLAG: &str = "--worker";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkerJob {
    /// Write `frame` as `data-{i:05}.csv` under `dir` for each index
    Write {
        dir: PathBuf,
        indices: Vec<usize>,
        frame: Frame,
    },
    /// Load each CSV, tagged with its path
    Load { paths: Vec<PathBuf> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkerReply {
    Written { count: usize },
    Loaded { frames: Vec<Frame> },
    Failed { message: String },
}

/// Run one job in the current process
pub fn execute(job: &WorkerJob) -> WorkerReply {
    let outcome = match job {
        WorkerJob::Write { dir, indices, frame } => indices
            .iter()
            .map(|&i| generate::write_task(i, dir, frame))
            .collect::<Result<Vec<_>>>()
            .map(|written| WorkerReply::Written {
                count: written.len(),
            }),
        WorkerJob::Load { paths } => paths
            .iter()
            .map(|p| load::load_task(p))
            .collect::<Result<Vec<_>>>()
            .map(|frames| WorkerReply::Loaded { frames }),
    };
    outcome.unwrap_or_else(|e| WorkerReply::Failed {
        message: e.to_string(),
    })
}

/// Worker loop body: read a job from `input`, write the reply to `output`
pub fn serve<R: Read, W: Write>(input: R, mut output: W) -> Result<()> {
    let job: WorkerJob = serde_json::from_reader(BufReader::new(input))?;
    let reply = execute(&job);
    serde_json::to_writer(&mut output, &reply)?;
    output.flush()?;
    Ok(())
}

/// Serve a job on stdin/stdout if this process was started as a worker.
///
/// Returns `true` when the process acted as a worker and should exit.
pub fn maybe_serve() -> Result<bool> {
    if std::env::args().nth(1).as_deref() != Some(WORKER_FLAG) {
        return Ok(false);
    }
    let stdout = io::stdout();
    serve(io::stdin().lock(), stdout.lock())?;
    Ok(true)
}

/// Split `items` into at most `parts` contiguous, non-empty chunks
pub fn chunk<T: Clone>(items: &[T], parts: usize) -> Vec<Vec<T>> {
    if items.is_empty() {
        return Vec::new();
    }
    let size = items.len().div_ceil(parts.max(1));
    items.chunks(size).map(<[T]>::to_vec).collect()
}

/// Pool of worker processes
#[derive(Debug, Clone)]
pub struct ProcessPool {
    program: PathBuf,
    workers: usize,
}

impl ProcessPool {
    pub fn new(program: impl Into<PathBuf>, workers: usize) -> Self {
        Self {
            program: program.into(),
            workers: workers.max(1),
        }
    }

    /// Workers re-run the current executable
    pub fn current(workers: usize) -> Result<Self> {
        Ok(Self::new(std::env::current_exe()?, workers))
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run every job in its own child process; replies keep job order.
    ///
    /// All children are started before any reply is read. On the first
    /// failure every child not yet collected is killed and reaped.
    pub fn run(&self, jobs: &[WorkerJob]) -> Result<Vec<WorkerReply>> {
        let mut children = Vec::with_capacity(jobs.len());
        for job in jobs {
            children.push(self.spawn(job)?);
        }

        let mut replies = Vec::with_capacity(children.len());
        for (worker, guard) in children.into_iter().enumerate() {
            let output = guard.wait_with_output()?;
            if !output.status.success() {
                return Err(self.failure(worker, format!("exited with {}", output.status)));
            }
            replies.push(self.accept(worker, serde_json::from_slice(&output.stdout)?)?);
        }
        Ok(replies)
    }

    fn spawn(&self, job: &WorkerJob) -> Result<WorkerGuard> {
        let child = Command::new(&self.program)
            .arg(WORKER_FLAG)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;
        let mut guard = WorkerGuard(Some(child));

        if let Some(mut stdin) = guard.0.as_mut().and_then(|c| c.stdin.take()) {
            serde_json::to_writer(&mut stdin, job)?;
            stdin.flush()?;
        }
        Ok(guard)
    }

    fn accept(&self, worker: usize, reply: WorkerReply) -> Result<WorkerReply> {
        match reply {
            WorkerReply::Failed { message } => Err(self.failure(worker, message)),
            reply => Ok(reply),
        }
    }

    /// Error for worker number `worker` of this pool
    pub fn failure(&self, worker: usize, message: String) -> BenchError {
        BenchError::Worker {
            worker,
            program: self.program.clone(),
            message,
        }
    }
}

/// Child process that is killed and reaped unless its output was collected
struct WorkerGuard(Option<Child>);

impl WorkerGuard {
    fn wait_with_output(mut self) -> io::Result<Output> {
        match self.0.take() {
            Some(child) => child.wait_with_output(),
            None => Err(io::Error::new(io::ErrorKind::Other, "worker already collected")),
        }
    }
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        if let Some(child) = self.0.as_mut() {
            // Already exited is fine
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_chunk() {
        let items: Vec<usize> = (0..10).collect();
        assert_eq!(chunk(&items, 3), vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7], vec![8, 9]]);
        assert_eq!(chunk(&items, 20).len(), 10);
        assert_eq!(chunk(&items, 0), vec![items.clone()]);
        assert!(chunk::<usize>(&[], 4).is_empty());
    }

    #[test]
    fn test_serve_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let frame = Frame::random(5, 3, &mut StdRng::seed_from_u64(2));

        let job = WorkerJob::Write {
            dir: dir.path().to_path_buf(),
            indices: vec![0, 1, 2],
            frame,
        };
        let mut out = Vec::new();
        serve(serde_json::to_vec(&job).unwrap().as_slice(), &mut out).unwrap();
        assert!(matches!(
            serde_json::from_slice::<WorkerReply>(&out).unwrap(),
            WorkerReply::Written { count: 3 }
        ));

        let paths = load::list_csvs(dir.path()).unwrap();
        assert_eq!(paths.len(), 3);

        let job = WorkerJob::Load { paths };
        let mut out = Vec::new();
        serve(serde_json::to_vec(&job).unwrap().as_slice(), &mut out).unwrap();
        match serde_json::from_slice::<WorkerReply>(&out).unwrap() {
            WorkerReply::Loaded { frames } => {
                assert_eq!(frames.len(), 3);
                assert!(frames.iter().all(|f| f.row_count() == 5));
            }
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[test]
    fn test_execute_reports_failure() {
        let job = WorkerJob::Load {
            paths: vec![PathBuf::from("/definitely/not/here.csv")],
        };
        assert!(matches!(execute(&job), WorkerReply::Failed { .. }));
    }

    #[test]
    fn test_missing_program() {
        let pool = ProcessPool::new("/definitely/not/a/binary", 2);
        let job = WorkerJob::Load { paths: Vec::new() };
        assert!(matches!(pool.run(&[job]), Err(BenchError::Io(_))));
    }
}
