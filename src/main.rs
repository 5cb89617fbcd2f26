//! Runs the direct, im2col and patch2vec engines on one fixed convolution and
//! prints their timings and their mean absolute error against the direct engine.
//!
//! Log verbosity follows `RUST_LOG` (default `warn`); the worker pool size
//! follows `RAYON_NUM_THREADS`.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use patch2vec::benchmark::{print_report, run_benchmark, BenchConfig, DEFAULT_TOLERANCE};
use tracing::warn;

fn setup_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    setup_logging();

    let config = BenchConfig::default();
    let result = run_benchmark(&config).context("convolution benchmark failed")?;
    print_report(&result);

    if let Err(err) = result.check(DEFAULT_TOLERANCE) {
        warn!("{err}");
    }

    print!("Press Enter to continue . . . ");
    io::stdout().flush().context("failed to flush stdout")?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(())
}
