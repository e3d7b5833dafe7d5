//! Evaluate relaxation times of a configuration grid
//!
//! cargo run --release -- --config run.toml --output relaxation.csv
use anyhow::{Context, Result};
use clap::Parser;
use flowrelax::output::write_tensor_csv;
use flowrelax::RunConfig;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "flowrelax")]
#[command(about = "Relaxation times of simulated velocity profiles")]
struct Cli {
    /// Run configuration (toml)
    #[arg(long, default_value = "run.toml")]
    config: PathBuf,

    /// Override directory holding the profile dumps
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Override convergence tolerance
    #[arg(long)]
    tolerance: Option<f64>,

    /// Evaluate cells on all cores
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Csv file for the result tensor
    #[arg(long, default_value = "relaxation.csv")]
    output: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let Cli {
        config: path,
        data_dir,
        tolerance,
        parallel,
        output,
    } = Cli::parse();
    let config = RunConfig::read(&path)
        .with_context(|| format!("failed to load {}", path.display()))?
        .with_overrides(data_dir, tolerance, parallel)
        .context("invalid configuration")?;

    let runner = config.runner()?;
    let source = config.source();
    info!("reading profiles from {}", config.data_dir.display());
    let tensor = if config.parallel {
        runner.run_parallel(&source)
    } else {
        runner.run(&source)
    };

    let failed = tensor.diagnostics().len();
    if failed > 0 {
        info!("{} of {} cells missing or malformed", failed, runner.axes().len());
    }
    write_tensor_csv(&output, &tensor)
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!(" ==> {}", output.display());
    Ok(())
}
