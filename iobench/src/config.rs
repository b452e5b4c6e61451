//! Benchmark configuration
//!
//! Every knob the drivers use lives here and is passed in explicitly.
//! Loaded from JSON (missing keys take defaults), then overridden by CLI flags.

use crate::pool::Strategy;
use crate::{BenchError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Repetitions per timed measurement
pub const DEFAULT_ITERATIONS: usize = 10;

/// Columns A..Z
pub const DEFAULT_COLUMN_COUNT: usize = 26;

/// Storage location under test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drive {
    /// Reported as `DriveType` in results
    pub label: String,
    /// Scratch directories are created inside this path
    pub root: PathBuf,
}

impl Drive {
    pub fn new(label: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            root: root.into(),
        }
    }
}

impl std::str::FromStr for Drive {
    type Err = String;

    /// `LABEL=PATH`
    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s.split_once('=') {
            Some((label, root)) if !label.is_empty() && !root.is_empty() => {
                Ok(Drive::new(label, root))
            }
            _ => Err(format!("expected LABEL=PATH, got {:?}", s)),
        }
    }
}

/// File and row counts swept by one benchmark
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sweep {
    pub file_counts: Vec<usize>,
    pub row_counts: Vec<usize>,
}

impl Sweep {
    pub fn max_file_count(&self) -> usize {
        self.file_counts.iter().copied().max().unwrap_or(0)
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.file_counts.is_empty() || self.row_counts.is_empty() {
            return Err(BenchError::Config(format!("{} sweep has no file or row counts", name)));
        }
        if self.file_counts.contains(&0) {
            return Err(BenchError::Config(format!("{} sweep has a zero file count", name)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Benchmark {
    Generate,
    Load,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub iterations: usize,
    pub column_count: usize,
    pub drives: Vec<Drive>,
    pub results_dir: PathBuf,
    pub generate: Sweep,
    pub load: Sweep,
    pub strategies: Vec<Strategy>,
    /// Thread pool size for `multi_threaded`; defaults to min(32, cpus + 4)
    pub threads: Option<usize>,
    /// Process pool size for `multi_process`; defaults to the CPU count
    pub processes: Option<usize>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            column_count: DEFAULT_COLUMN_COUNT,
            drives: vec![Drive::new("default", std::env::temp_dir())],
            results_dir: PathBuf::from(".temp"),
            generate: Sweep {
                file_counts: vec![1000, 100, 10, 2],
                row_counts: vec![10000, 2500, 250],
            },
            load: Sweep {
                file_counts: vec![2, 10, 100],
                row_counts: vec![200, 2000, 20000, 40000],
            },
            strategies: Strategy::ALL.to_vec(),
            threads: None,
            processes: None,
        }
    }
}

impl BenchConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    pub fn sweep(&self, bench: Benchmark) -> &Sweep {
        match bench {
            Benchmark::Generate => &self.generate,
            Benchmark::Load => &self.load,
        }
    }

    pub fn sweep_mut(&mut self, bench: Benchmark) -> &mut Sweep {
        match bench {
            Benchmark::Generate => &mut self.generate,
            Benchmark::Load => &mut self.load,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(BenchError::Config("iterations must be at least 1".into()));
        }
        if self.column_count == 0 {
            return Err(BenchError::Config("column_count must be at least 1".into()));
        }
        if self.drives.is_empty() {
            return Err(BenchError::Config("no drives configured".into()));
        }
        if self.strategies.is_empty() {
            return Err(BenchError::Config("no strategies selected".into()));
        }
        if self.threads == Some(0) || self.processes == Some(0) {
            return Err(BenchError::Config("pool sizes must be at least 1".into()));
        }
        self.generate.validate("generate")?;
        self.load.validate("load")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = BenchConfig::default();
        config.validate().unwrap();
        assert_eq!(config.iterations, 10);
        assert_eq!(config.strategies.len(), 4);
        assert_eq!(config.load.max_file_count(), 100);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.json");
        std::fs::write(
            &path,
            r#"{
                "iterations": 3,
                "drives": [{"label": "SSD", "root": "/mnt/ssd"}],
                "strategies": ["single_threaded", "multi_process"]
            }"#,
        )
        .unwrap();

        let config = BenchConfig::load(&path).unwrap();
        assert_eq!(config.iterations, 3);
        assert_eq!(config.drives, vec![Drive::new("SSD", "/mnt/ssd")]);
        assert_eq!(config.strategies, vec![Strategy::SingleThreaded, Strategy::MultiProcess]);
        assert_eq!(config.generate, BenchConfig::default().generate);
    }

    #[test]
    fn test_validate_rejects() {
        let mut config = BenchConfig::default();
        config.iterations = 0;
        assert!(matches!(config.validate(), Err(BenchError::Config(_))));

        let mut config = BenchConfig::default();
        config.load.file_counts = vec![2, 0];
        assert!(matches!(config.validate(), Err(BenchError::Config(_))));

        let mut config = BenchConfig::default();
        config.sweep_mut(Benchmark::Generate).row_counts.clear();
        assert!(matches!(config.validate(), Err(BenchError::Config(_))));

        let mut config = BenchConfig::default();
        config.threads = Some(0);
        assert!(matches!(config.validate(), Err(BenchError::Config(_))));
    }

    #[test]
    fn test_drive_parse() {
        let drive: Drive = "M.2 SSD=/mnt/nvme".parse().unwrap();
        assert_eq!(drive, Drive::new("M.2 SSD", "/mnt/nvme"));
        assert!("no-equals".parse::<Drive>().is_err());
        assert!("=/tmp".parse::<Drive>().is_err());
    }
}
