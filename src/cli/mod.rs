//! GlbPak CLI - command-line interface for glTF container conversion

pub mod commands;

use clap::Parser;
use commands::Commands;

#[derive(Parser)]
#[command(name = "glbpak")]
#[command(version, about = "GlbPak: pack and unpack glTF binary containers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Run the GlbPak CLI
pub fn run_cli() -> anyhow::Result<()> {
    // Setup logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    cli.command.execute()?;

    Ok(())
}
