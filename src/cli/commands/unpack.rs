//! `unpack` subcommand
//!
//! Stages extraction into a temporary directory next to the destination and
//! moves the results into place on success, so a failed unpack never leaves
//! partial output behind.

use anyhow::Context;
use std::fs;
use std::path::Path;

pub fn execute(input: &Path, output: Option<&Path>, unpack_images: bool) -> anyhow::Result<()> {
    let output = match output {
        Some(path) => path.to_path_buf(),
        None => input.with_extension(""),
    };

    let parent = output
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let staging = tempfile::Builder::new()
        .prefix(".glbpak-")
        .tempdir_in(parent)
        .context("creating staging directory")?;

    crate::unpacker::unpack(input, staging.path(), unpack_images)
        .with_context(|| format!("unpacking {}", input.display()))?;

    fs::create_dir_all(&output)?;
    for entry in fs::read_dir(staging.path())? {
        let entry = entry?;
        let destination = output.join(entry.file_name());
        fs::rename(entry.path(), &destination)
            .with_context(|| format!("moving {} into place", destination.display()))?;
    }

    println!("Unpacked {} -> {}", input.display(), output.display());
    Ok(())
}
