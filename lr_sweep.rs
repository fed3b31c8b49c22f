use lr_finder::config::{load_config, RunConfig};
use lr_finder::mlp::MlpUnit;
use lr_finder::{RateFinder, ResultTrace, Result};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

// Learning rate sweep over a synthetic classification task.
// Usage: lr_sweep [config.json] [output.json]
const DEFAULT_OUTPUT: &str = "logs/lr_sweep.json";

/// Reads the run configuration named by the first CLI argument, or the
/// defaults when no path is given.
fn config_from_args(args: &[String]) -> Result<RunConfig> {
    match args.get(1) {
        Some(path) => load_config(path),
        None => {
            let config = RunConfig::default();
            config.validate()?;
            Ok(config)
        }
    }
}

fn output_from_args(args: &[String]) -> PathBuf {
    args.get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT))
}

/// Builds the unit, runs one sweep and writes the trace as JSON plus a TSV
/// sibling for plotting.
fn run(config: &RunConfig, output: &Path) -> Result<ResultTrace> {
    let mut unit = MlpUnit::from_config(&config.training)?;
    let trace = RateFinder::new(&mut unit, config.search.clone()).find()?;

    trace.write_json(output)?;
    let tsv = output.with_extension("tsv");
    trace.write_tsv(&tsv)?;

    tracing::info!(
        json = %output.display(),
        tsv = %tsv.display(),
        points = trace.len(),
        "Wrote sweep trace"
    );
    Ok(trace)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config = config_from_args(&args).unwrap_or_else(|err| {
        eprintln!("Could not load configuration: {}", err);
        process::exit(1);
    });
    let output = output_from_args(&args);

    let start = Instant::now();
    let trace = run(&config, &output).unwrap_or_else(|err| {
        eprintln!("Learning rate sweep failed: {}", err);
        process::exit(1);
    });

    if let (Some(first), Some(last)) = (trace.points().first(), trace.last()) {
        println!("\n=== Sweep Summary ===");
        println!("Optimizer: {}", config.training.optimizer);
        println!("Iterations: {}", trace.len());
        println!(
            "Learning rate range: {:e} -> {:e}",
            first.learning_rate, last.learning_rate
        );
        println!("Final loss: {}", last.loss);
        println!("Sweep time: {:.2} seconds", start.elapsed().as_secs_f64());
        println!("=====================");
    }
}
