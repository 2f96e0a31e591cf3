//! Benchmark harness executable for vecbench.

use anyhow::Result;
use clap::Parser;
use vecbench_harness::cli::{run_cli, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    run_cli(cli)
}
