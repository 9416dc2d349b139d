//! CLI subcommands

mod pack;
mod unpack;

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Pack a .gltf document and its external resources into a single .glb
    Pack {
        /// Input .gltf file
        input: PathBuf,

        /// Output .glb file (defaults to the input name with a .glb extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Unpack a .glb container into a .gltf document plus resource files
    Unpack {
        /// Input .glb file
        input: PathBuf,

        /// Output directory (defaults to the input name without its extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write images embedded in the binary chunk out as standalone files
        #[arg(long)]
        unpack_images: bool,
    },
}

impl Commands {
    pub fn execute(self) -> anyhow::Result<()> {
        match self {
            Commands::Pack { input, output } => pack::execute(&input, output.as_deref()),
            Commands::Unpack {
                input,
                output,
                unpack_images,
            } => unpack::execute(&input, output.as_deref(), unpack_images),
        }
    }
}
