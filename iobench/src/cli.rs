//! Command-line flags shared by the benchmark binaries

use crate::config::{BenchConfig, Benchmark, Drive};
use crate::pool::Strategy;
use crate::Result;
use clap::{ArgAction, Args};
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct BenchArgs {
    /// JSON config file; flags below override its values
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Timed repetitions per measurement
    #[arg(short = 'n', long = "iterations")]
    pub iterations: Option<usize>,

    /// Drive to benchmark as LABEL=PATH (repeatable)
    #[arg(short = 'd', long = "drive")]
    pub drives: Vec<Drive>,

    /// Strategy to run (repeatable): single_threaded, multi_threaded, one_thread_per_file, multi_process
    #[arg(short = 's', long = "strategy")]
    pub strategies: Vec<Strategy>,

    /// Comma separated file counts
    #[arg(long = "file-counts", value_delimiter = ',')]
    pub file_counts: Vec<usize>,

    /// Comma separated row counts
    #[arg(long = "row-counts", value_delimiter = ',')]
    pub row_counts: Vec<usize>,

    /// Directory receiving the results CSV
    #[arg(long = "results-dir")]
    pub results_dir: Option<PathBuf>,

    /// Verbosity - use more than one v for greater detail
    #[arg(short = 'v', action = ArgAction::Count)]
    pub verbose: u8,
}

impl BenchArgs {
    /// Config file (or defaults) with flag overrides applied, validated
    pub fn resolve(&self, bench: Benchmark) -> Result<BenchConfig> {
        let mut config = match &self.config {
            Some(path) => BenchConfig::load(path)?,
            None => BenchConfig::default(),
        };

        if let Some(n) = self.iterations {
            config.iterations = n;
        }
        if !self.drives.is_empty() {
            config.drives = self.drives.clone();
        }
        if !self.strategies.is_empty() {
            config.strategies = self.strategies.clone();
        }
        if let Some(dir) = &self.results_dir {
            config.results_dir = dir.clone();
        }
        let sweep = config.sweep_mut(bench);
        if !self.file_counts.is_empty() {
            sweep.file_counts = self.file_counts.clone();
        }
        if !self.row_counts.is_empty() {
            sweep.row_counts = self.row_counts.clone();
        }

        config.validate()?;
        Ok(config)
    }

    /// `info` by default, `debug` with -v, `trace` with -vv; RUST_LOG wins
    pub fn init_logging(&self) {
        let level = match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        bench: BenchArgs,
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = TestCli::parse_from([
            "make-files",
            "-n",
            "3",
            "--drive",
            "SSD=/mnt/ssd",
            "--drive",
            "HDD=/mnt/hdd",
            "--strategy",
            "multi_process",
            "--file-counts",
            "5,1",
        ]);
        let config = cli.bench.resolve(Benchmark::Load).unwrap();

        assert_eq!(config.iterations, 3);
        assert_eq!(config.drives.len(), 2);
        assert_eq!(config.drives[1], Drive::new("HDD", "/mnt/hdd"));
        assert_eq!(config.strategies, vec![Strategy::MultiProcess]);
        assert_eq!(config.load.file_counts, vec![5, 1]);
        assert_eq!(config.generate, BenchConfig::default().generate);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let cli = TestCli::parse_from(["make-files", "--iterations", "0"]);
        assert!(cli.bench.resolve(Benchmark::Generate).is_err());

        assert!(TestCli::try_parse_from(["make-files", "--strategy", "gpu"]).is_err());
        assert!(TestCli::try_parse_from(["make-files", "--drive", "nowhere"]).is_err());
    }
}
