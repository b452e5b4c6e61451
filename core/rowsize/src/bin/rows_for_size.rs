//! Row count calibration
//!
//! Prints how many rows of random data are needed to reach each target file size.

use clap::{ArgAction, Parser};
use std::error::Error;
use tabular::FileFormat;

#[derive(Parser, Debug)]
#[command(author, about = "Finds the row count needed for a file of at least SIZE KB", name = "rows-for-size")]
struct Cli {
    /// Target file sizes in KB
    #[arg(default_values_t = [100.0, 1024.0, 10.0 * 1024.0])]
    sizes: Vec<f64>,

    /// Number of random columns per row
    #[arg(short = 'c', long = "columns", default_value_t = 26)]
    columns: usize,

    /// Output format: csv, or excel/xl/xls/xlsx
    #[arg(short = 'f', long = "format", default_value = "csv", value_parser = parse_format)]
    format: FileFormat,

    /// Verbosity - use more than one v for greater detail
    #[arg(short = 'v', action = ArgAction::Count)]
    verbose: u8,
}

fn parse_format(s: &str) -> Result<FileFormat, String> {
    s.parse().map_err(|e: tabular::TabularError| e.to_string())
}

fn main() {
    if let Err(err) = _main() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn _main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    for size in &cli.sizes {
        let rows = rowsize::rows_for_size(*size, cli.columns, cli.format)?;
        println!("{} {}", size, rows);
    }

    Ok(())
}
