//! podfic-import CLI: fill a new-work form from an existing archive work.
//!
//! Fetches the source work, renders the user's templates, and writes the
//! resulting form edits so they can be replayed into the archive's page.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
