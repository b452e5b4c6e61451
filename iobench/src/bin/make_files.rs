//! File generation benchmark runner
//!
//! Times writing random CSV files under each strategy, drive and sweep point.

use clap::Parser;
use iobench::cli::BenchArgs;
use iobench::config::Benchmark;
use iobench::{generate, process, report, Executor};
use std::error::Error;

#[derive(Parser, Debug)]
#[command(author, about = "Times creating many random CSV files", name = "make-files")]
struct Cli {
    #[command(flatten)]
    bench: BenchArgs,
}

fn main() {
    if let Err(err) = _main() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn _main() -> Result<(), Box<dyn Error>> {
    if process::maybe_serve()? {
        return Ok(());
    }

    let cli = Cli::parse();
    cli.bench.init_logging();
    let config = cli.bench.resolve(Benchmark::Generate)?;
    let exec = Executor::from_config(&config)?;

    let records = generate::benchmark(&config, &exec)?;

    println!("{}", report::render_table(&records));
    let path = report::write_results(&config.results_dir, "make_files", &records)?;
    println!("\nResults: {}", path.display());
    Ok(())
}
