//! Size-Targeted Row Search
//!
//! Finds the smallest number of random rows whose serialized form reaches a
//! target size. The search doubles a row count until the target is bracketed,
//! then bisects the bracket down to adjacent row counts.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use tabular::{FileFormat, Frame, TabularError};
use tempfile::TempDir;
use thiserror::Error;

/// Rough serialized bytes per numeric cell, used to seed the search
pub const BYTES_PER_CELL_ESTIMATE: f64 = 25.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidTarget {
    #[error("target size must be a positive, finite number of KB (got {0})")]
    Size(f64),

    #[error("column count must be at least 1")]
    NoColumns,
}

#[derive(Debug, Error)]
pub enum SearchError<E> {
    #[error("Invalid target: {0}")]
    InvalidTarget(#[from] InvalidTarget),

    #[error("Probe at {rows} rows failed: {source}")]
    Oracle {
        rows: u64,
        #[source]
        source: E,
    },

    #[error("Row count overflowed past {rows} rows before reaching the target")]
    Unbounded { rows: u64 },
}

/// What to search for
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeTarget {
    target_kb: f64,
    column_count: usize,
    format: FileFormat,
}

impl SizeTarget {
    pub fn new(target_kb: f64, column_count: usize, format: FileFormat) -> Result<Self, InvalidTarget> {
        if !target_kb.is_finite() || target_kb <= 0.0 {
            return Err(InvalidTarget::Size(target_kb));
        }
        if column_count < 1 {
            return Err(InvalidTarget::NoColumns);
        }
        Ok(Self {
            target_kb,
            column_count,
            format,
        })
    }

    pub fn target_kb(&self) -> f64 {
        self.target_kb
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    /// Seed row count, never zero so that doubling makes progress
    pub fn initial_estimate(&self) -> u64 {
        let guess = (BYTES_PER_CELL_ESTIMATE * self.target_kb / self.column_count as f64).floor();
        (guess as u64).max(1)
    }
}

/// Measures the serialized size (KB) of `row_count` rows.
///
/// Implementations are expected to be non-decreasing in `row_count`. The
/// search does not check this; a non-monotonic oracle still yields a row count
/// meeting the target, just not necessarily the smallest one.
pub trait SizeOracle {
    type Error;

    fn measure(&mut self, row_count: u64) -> Result<f64, Self::Error>;
}

impl<F, E> SizeOracle for F
where
    F: FnMut(u64) -> Result<f64, E>,
{
    type Error = E;

    fn measure(&mut self, row_count: u64) -> Result<f64, E> {
        self(row_count)
    }
}

/// Smallest probed row count whose measured size meets `target`.
///
/// When the very first doubling already meets the target, the lower bracket
/// is the unmeasured seed, so the answer can sit above the true minimum.
pub fn find_min_rows<O>(target: &SizeTarget, oracle: &mut O) -> Result<u64, SearchError<O::Error>>
where
    O: SizeOracle + ?Sized,
{
    let goal = target.target_kb();
    let mut probes = 0usize;
    let mut probe = |rows: u64| {
        probes += 1;
        oracle
            .measure(rows)
            .map_err(|source| SearchError::Oracle { rows, source })
    };

    // Bracket
    let mut rows = target.initial_estimate();
    loop {
        rows = match rows.checked_mul(2) {
            Some(next) => next,
            None => return Err(SearchError::Unbounded { rows }),
        };
        let kb = probe(rows)?;
        debug!("bracket: {} rows -> {:.2} KB (target {:.2} KB)", rows, kb, goal);
        if kb >= goal {
            break;
        }
    }

    // Bisect
    let mut upper = rows;
    let mut lower = rows / 2;
    while upper - lower > 1 {
        let mid = lower + (upper - lower) / 2;
        let kb = probe(mid)?;
        if kb < goal {
            lower = mid;
        } else {
            upper = mid;
        }
        debug!("bisect: {} rows -> {:.2} KB, bracket [{}, {}]", mid, kb, lower, upper);
    }

    debug!("{:.2} KB needs {} rows ({} probes)", goal, upper, probes);
    Ok(upper)
}

/// Oracle that writes random frames to a scratch file and stats it
pub struct FileOracle<R = StdRng> {
    column_count: usize,
    format: FileFormat,
    rng: R,
    scratch: Option<(TempDir, PathBuf)>,
}

impl FileOracle<StdRng> {
    pub fn new(column_count: usize, format: FileFormat) -> Self {
        Self::with_rng(column_count, format, StdRng::from_entropy())
    }
}

impl<R: Rng> FileOracle<R> {
    pub fn with_rng(column_count: usize, format: FileFormat, rng: R) -> Self {
        Self {
            column_count,
            format,
            rng,
            scratch: None,
        }
    }

    fn scratch_path(&mut self) -> std::io::Result<PathBuf> {
        if let Some((_, path)) = &self.scratch {
            return Ok(path.clone());
        }
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(format!("probe.{}", self.format.extension()));
        self.scratch = Some((dir, path.clone()));
        Ok(path)
    }
}

impl<R: Rng> SizeOracle for FileOracle<R> {
    type Error = TabularError;

    fn measure(&mut self, row_count: u64) -> Result<f64, TabularError> {
        let path = self.scratch_path()?;
        let frame = Frame::random(row_count as usize, self.column_count, &mut self.rng);
        tabular::serialized_kb(&frame, self.format, &path)
    }
}

/// Rows of random data needed for a file of at least `target_kb` KB
pub fn rows_for_size(
    target_kb: f64,
    column_count: usize,
    format: FileFormat,
) -> Result<u64, SearchError<TabularError>> {
    let target = SizeTarget::new(target_kb, column_count, format)?;
    let mut oracle = FileOracle::new(column_count, format);
    find_min_rows(&target, &mut oracle)
}
