//! Command implementations

mod ingest;
mod inspect;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::Result;

/// Execute a CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);

    match cli.command {
        Commands::Ingest(args) => ingest::execute(args, &output, cli.config.as_deref()),
        Commands::Inspect(args) => inspect::execute(args, &output),
    }
}
