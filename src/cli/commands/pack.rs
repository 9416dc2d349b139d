//! `pack` subcommand
//!
//! Stages the container into a temporary file next to the destination and
//! renames it into place on success, so a failed pack never leaves a partial
//! output file behind.

use anyhow::Context;
use std::fs;
use std::path::Path;

pub fn execute(input: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let output = match output {
        Some(path) => path.to_path_buf(),
        None => input.with_extension("glb"),
    };

    let parent = output
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let staging = tempfile::Builder::new()
        .prefix(".glbpak-")
        .suffix(".glb")
        .tempfile_in(parent)
        .context("creating temporary output file")?;

    crate::packer::pack(input, staging.path())
        .with_context(|| format!("packing {}", input.display()))?;

    staging
        .persist(&output)
        .with_context(|| format!("moving output into {}", output.display()))?;

    println!("Packed {} -> {}", input.display(), output.display());
    Ok(())
}
