//! Repeated wall-clock timing

use crate::Result;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    pub total: Duration,
    pub iterations: usize,
}

impl Timing {
    pub fn total_secs(&self) -> f64 {
        self.total.as_secs_f64()
    }

    pub fn mean_secs(&self) -> f64 {
        if self.iterations == 0 {
            return 0.0;
        }
        self.total_secs() / self.iterations as f64
    }
}

/// Run `f` `iterations` times back to back and time the whole loop.
///
/// Stops at the first error.
pub fn time_iterations<F>(iterations: usize, mut f: F) -> Result<Timing>
where
    F: FnMut() -> Result<()>,
{
    let start = Instant::now();
    for _ in 0..iterations {
        f()?;
    }
    Ok(Timing {
        total: start.elapsed(),
        iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BenchError;

    #[test]
    fn test_runs_every_iteration() {
        let mut calls = 0;
        let timing = time_iterations(4, || {
            calls += 1;
            std::thread::sleep(Duration::from_millis(2));
            Ok(())
        })
        .unwrap();

        assert_eq!(calls, 4);
        assert_eq!(timing.iterations, 4);
        assert!(timing.total >= Duration::from_millis(8));
        assert!((timing.mean_secs() * 4.0 - timing.total_secs()).abs() < 1e-9);
    }

    #[test]
    fn test_stops_on_error() {
        let mut calls = 0;
        let result = time_iterations(5, || {
            calls += 1;
            if calls == 2 {
                Err(BenchError::Config("boom".into()))
            } else {
                Ok(())
            }
        });
        assert!(result.is_err());
        assert_eq!(calls, 2);
    }
}
