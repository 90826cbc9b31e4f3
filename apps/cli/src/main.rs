//! mimegen CLI — builds the file extension → MIME type table.
//!
//! Reconciles the mailcap `mime.types` file with the IANA media types
//! registry and writes the result as static artifacts.

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
