use anyhow::Result;
use chrono::Local;
use clap::Parser;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::pipeline;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    info!("cb-update {} starting", env!("CARGO_PKG_VERSION"));
    let summary = pipeline::run(&cli, Local::now().naive_local())?;
    info!(
        output = %summary.output.display(),
        bytes = summary.bytes,
        auctions = summary.auctions_used,
        skipped = summary.auctions_skipped,
        instruments = summary.instruments,
        partitions = summary.partitions,
        "done"
    );
    Ok(())
}

/// Stderr logging, `RUST_LOG` overrides the default `info` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
