//! gopher: command-line entry point.

#![allow(clippy::print_stdout)]

use clap::Parser;
use gopher_client::cli::{Cli, execute};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays parseable with `--format json`.
    let default_filter = if cli.verbose {
        "warn,gopher_client=debug"
    } else {
        "warn,gopher_client=info"
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    let output = execute(&cli)?;
    print!("{output}");
    Ok(())
}
