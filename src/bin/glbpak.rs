//! GlbPak command-line binary

fn main() -> anyhow::Result<()> {
    glbpak::cli::run_cli()
}
