//! Load/concatenate benchmark runner
//!
//! Times loading and concatenating CSV files under each strategy, drive and sweep point.

use clap::Parser;
use iobench::cli::BenchArgs;
use iobench::config::Benchmark;
use iobench::{load, process, report, Executor};
use std::error::Error;

#[derive(Parser, Debug)]
#[command(author, about = "Times loading and concatenating many CSV files", name = "concat-csvs")]
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
    let config = cli.bench.resolve(Benchmark::Load)?;
    let exec = Executor::from_config(&config)?;

    let records = load::benchmark(&config, &exec)?;

    println!("{}", report::render_table(&records));
    let path = report::write_results(&config.results_dir, "concat_csvs", &records)?;
    println!("\nResults: {}", path.display());
    Ok(())
}
