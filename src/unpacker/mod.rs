//! Container to loose-form extraction
//!
//! Splits a GLB container back into a pretty-printed `.gltf` document plus
//! standalone resource files. Embedded images can either stay inside a
//! consolidated `.bin` or be written out individually, compacting the
//! remaining buffer data and renumbering every index-based reference.

use serde_json::Value;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::document::ValueExt;
use crate::error::{Error, Result};
use crate::glb::{self, read_chunks};
use crate::mime;
use crate::utils::uri;

/// Unpack a container file into a loose `.gltf` document plus extracted
/// resource files in `output_dir`.
///
/// With `unpack_images` set, images embedded in the container's binary chunk
/// are written out as standalone files and the remaining buffer data is
/// compacted into a fresh `.bin`; without it the binary chunk's declared
/// range is copied verbatim.
///
/// # Errors
///
/// Returns the codec's errors for a malformed header or misordered chunks,
/// [`Error::UnsupportedMimeType`] when an embedded image cannot be named,
/// and [`Error::Io`] / [`Error::Json`] for underlying failures. Nothing
/// written to `output_dir` before a failure should be treated as valid;
/// callers wanting all-or-nothing behavior should stage into a temporary
/// directory and move into place on success.
pub fn unpack<P: AsRef<Path>>(input_path: P, output_dir: P, unpack_images: bool) -> Result<()> {
    let input_path = input_path.as_ref();
    let unpacker = Unpacker {
        input_dir: input_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf(),
        input_stem: input_path
            .file_stem()
            .and_then(OsStr::to_str)
            .unwrap_or("asset")
            .to_string(),
        output_dir: output_dir.as_ref().to_path_buf(),
        unpack_images,
    };
    unpacker.run(input_path)
}

struct Unpacker {
    input_dir: PathBuf,
    input_stem: String,
    output_dir: PathBuf,
    unpack_images: bool,
}

impl Unpacker {
    fn run(&self, input_path: &Path) -> Result<()> {
        info!(input = %input_path.display(), output = %self.output_dir.display(), "unpacking");

        let file = File::open(input_path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let chunks = read_chunks(&mut reader, file_len)?;
        let mut root: Value = serde_json::from_slice(&chunks.json)?;

        self.extract_images(&mut root, &mut reader, chunks.bin_offset)?;
        self.extract_buffers(&mut root, &mut reader, chunks.bin_offset)?;

        fs::create_dir_all(&self.output_dir)?;
        let document_path = self.output_dir.join(format!("{}.gltf", self.input_stem));
        let mut writer = BufWriter::new(File::create(document_path)?);
        serde_json::to_writer_pretty(&mut writer, &root)?;
        writer.flush()?;
        Ok(())
    }

    /// Rewrite image entries: externally referenced files are copied beside
    /// the document; embedded ones are optionally written out as standalone
    /// files, with their bufferViews queued for removal.
    fn extract_images<R: Read + Seek>(
        &self,
        root: &mut Value,
        reader: &mut R,
        bin_offset: Option<u64>,
    ) -> Result<()> {
        let image_count = root.get_array("images").map_or(0, Vec::len);
        let mut removed_views = Vec::new();

        for index in 0..image_count {
            let image_uri = root
                .get_array("images")
                .and_then(|images| images.get(index))
                .and_then(|image| image.get_str("uri"))
                .map(str::to_owned);

            if let Some(image_uri) = image_uri {
                if uri::is_relative(&image_uri) {
                    let file_name = format!(
                        "{}_image{}{}",
                        self.input_stem,
                        index,
                        extension_of(&image_uri)
                    );
                    let source = self.input_dir.join(uri::percent_decode(&image_uri).as_ref());
                    self.copy_external(&source, &file_name)?;
                    if let Some(image) = root
                        .get_array_mut("images")
                        .and_then(|images| images.get_mut(index))
                    {
                        image.insert("uri", Value::from(file_name));
                    }
                }
                continue;
            }

            if !self.unpack_images {
                continue;
            }
            let Some(bin_offset) = bin_offset else { continue };

            if let Some(view_index) = self.extract_embedded_image(root, reader, bin_offset, index)? {
                removed_views.push(view_index);
            }
        }

        compact_buffer_views(root, &removed_views);
        Ok(())
    }

    /// Write one embedded image (a bufferView on the container blob) out to
    /// its own file, returning the index of the now-unused bufferView.
    fn extract_embedded_image<R: Read + Seek>(
        &self,
        root: &mut Value,
        reader: &mut R,
        bin_offset: u64,
        index: usize,
    ) -> Result<Option<usize>> {
        let Some(image) = root.get_array("images").and_then(|images| images.get(index)) else {
            return Ok(None);
        };

        let view_index = image.get_int_or("bufferView", -1);
        if view_index < 0 {
            return Ok(None);
        }
        let view_index = view_index as usize;

        let Some(view) = root
            .get_array("bufferViews")
            .and_then(|views| views.get(view_index))
        else {
            return Ok(None);
        };
        if view.get_int_or("buffer", -1) != 0 {
            return Ok(None);
        }

        let byte_offset = view.get_int_or("byteOffset", 0).max(0) as u64;
        let byte_length = view.get_int_or("byteLength", -1);
        if byte_length < 0 {
            return Ok(None);
        }

        let mime_type = image.get_str("mimeType").unwrap_or_default().to_owned();
        let Some(extension) = mime::to_file_extension(&mime_type) else {
            return Err(Error::UnsupportedMimeType { mime_type });
        };

        let file_name = format!("{}_image{}{}", self.input_stem, index, extension);
        debug!(file = %file_name, byte_offset, byte_length, "extracting embedded image");

        fs::create_dir_all(&self.output_dir)?;
        let mut writer = BufWriter::new(File::create(self.output_dir.join(&file_name))?);
        copy_range(
            reader,
            bin_offset + byte_offset,
            byte_length as u64,
            &mut writer,
        )?;
        writer.flush()?;

        if let Some(image) = root
            .get_array_mut("images")
            .and_then(|images| images.get_mut(index))
        {
            image.remove_key("bufferView");
            image.remove_key("mimeType");
            image.insert("uri", Value::from(file_name));
        }

        Ok(Some(view_index))
    }

    /// Copy external buffers beside the document, then resolve the container
    /// blob (buffer 0) into a `.bin` file or compact it away.
    fn extract_buffers<R: Read + Seek>(
        &self,
        root: &mut Value,
        reader: &mut R,
        bin_offset: Option<u64>,
    ) -> Result<()> {
        let buffer_count = root.get_array("buffers").map_or(0, Vec::len);
        if buffer_count == 0 {
            return Ok(());
        }

        for index in 0..buffer_count {
            let buffer_uri = root
                .get_array("buffers")
                .and_then(|buffers| buffers.get(index))
                .and_then(|buffer| buffer.get_str("uri"))
                .map(str::to_owned);
            let Some(buffer_uri) = buffer_uri else { continue };
            if !uri::is_relative(&buffer_uri) {
                continue;
            }

            let file_name = format!("{}{}.bin", self.input_stem, index);
            let source = self.input_dir.join(uri::percent_decode(&buffer_uri).as_ref());
            self.copy_external(&source, &file_name)?;
            if let Some(buffer) = root
                .get_array_mut("buffers")
                .and_then(|buffers| buffers.get_mut(index))
            {
                buffer.insert("uri", Value::from(file_name));
            }
        }

        self.extract_blob(root, reader, bin_offset)
    }

    /// Handle buffer 0 when it is the container blob (no `uri`): write it
    /// out as a `.bin` file while at least one bufferView still references
    /// it, or remove it and renumber the remaining buffer references.
    fn extract_blob<R: Read + Seek>(
        &self,
        root: &mut Value,
        reader: &mut R,
        bin_offset: Option<u64>,
    ) -> Result<()> {
        let is_blob = root
            .get_array("buffers")
            .and_then(|buffers| buffers.first())
            .is_some_and(|buffer| buffer.get_str("uri").is_none());
        if !is_blob {
            return Ok(());
        }

        let referenced = root.get_array("bufferViews").is_some_and(|views| {
            views.iter().any(|view| view.get_int_or("buffer", -1) == 0)
        });

        if referenced {
            // Views pointing at a blob the container never shipped are left
            // untouched.
            let Some(bin_offset) = bin_offset else {
                return Ok(());
            };
            self.write_blob(root, reader, bin_offset)
        } else {
            if let Some(buffers) = root.get_array_mut("buffers") {
                buffers.remove(0);
                if buffers.is_empty() {
                    root.remove_key("buffers");
                }
            }
            if let Some(views) = root.get_array_mut("bufferViews") {
                for view in views.iter_mut() {
                    let buffer_index = view.get_int_or("buffer", -1);
                    if buffer_index > 0 {
                        view.insert("buffer", Value::from(buffer_index - 1));
                    }
                }
            }
            Ok(())
        }
    }

    /// Write the blob's contents to `{stem}.bin` and point buffer 0 at it.
    fn write_blob<R: Read + Seek>(
        &self,
        root: &mut Value,
        reader: &mut R,
        bin_offset: u64,
    ) -> Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        let file_name = format!("{}.bin", self.input_stem);
        let mut writer = BufWriter::new(File::create(self.output_dir.join(&file_name))?);

        if self.unpack_images {
            // Rebuild the blob from the surviving views only: each referenced
            // range is copied re-aligned and its view retargeted, squeezing
            // out the holes left by extracted images.
            let view_count = root.get_array("bufferViews").map_or(0, Vec::len);
            for index in 0..view_count {
                let range = root
                    .get_array("bufferViews")
                    .and_then(|views| views.get(index))
                    .and_then(|view| {
                        if view.get_int_or("buffer", -1) != 0 {
                            return None;
                        }
                        let byte_offset = view.get_int_or("byteOffset", 0).max(0) as u64;
                        let byte_length = view.get_int_or("byteLength", 0).max(0) as u64;
                        Some((byte_offset, byte_length))
                    });
                let Some((byte_offset, byte_length)) = range else {
                    continue;
                };

                let new_offset = glb::pad_to_alignment(&mut writer, 0)?;
                copy_range(reader, bin_offset + byte_offset, byte_length, &mut writer)?;
                if let Some(view) = root
                    .get_array_mut("bufferViews")
                    .and_then(|views| views.get_mut(index))
                {
                    view.set_int("byteOffset", new_offset as i64, 0);
                }
            }

            let total = writer.stream_position()?;
            if let Some(buffer) = root
                .get_array_mut("buffers")
                .and_then(|buffers| buffers.get_mut(0))
            {
                buffer.insert("byteLength", Value::from(total));
            }
        } else {
            let declared = root
                .get_array("buffers")
                .and_then(|buffers| buffers.first())
                .map_or(0, |buffer| buffer.get_int_or("byteLength", 0).max(0)) as u64;
            copy_range(reader, bin_offset, declared, &mut writer)?;
        }

        writer.flush()?;
        if let Some(buffer) = root
            .get_array_mut("buffers")
            .and_then(|buffers| buffers.get_mut(0))
        {
            buffer.insert("uri", Value::from(file_name));
        }
        Ok(())
    }

    /// Copy an externally referenced source file into the output directory.
    /// A missing source is logged and skipped; the reference is still
    /// rewritten so the emitted document stays self-consistent.
    fn copy_external(&self, source: &Path, file_name: &str) -> Result<()> {
        if source.is_file() {
            fs::create_dir_all(&self.output_dir)?;
            fs::copy(source, self.output_dir.join(file_name))?;
        } else {
            warn!(source = %source.display(), "referenced file not found, skipping copy");
        }
        Ok(())
    }
}

/// Drop the bufferViews consumed by extracted images, renumber the
/// survivors, and retarget accessor references through an explicit old-index
/// to new-index map. An emptied array is removed outright.
fn compact_buffer_views(root: &mut Value, removed: &[usize]) {
    if removed.is_empty() {
        return;
    }

    let Some(views) = root.get_array("bufferViews") else {
        return;
    };

    let mut index_map = HashMap::new();
    let mut new_index = 0usize;
    for index in 0..views.len() {
        if !removed.contains(&index) {
            if index != new_index {
                index_map.insert(index, new_index);
            }
            new_index += 1;
        }
    }

    if new_index == 0 {
        root.remove_key("bufferViews");
    } else if let Some(views) = root.get_array_mut("bufferViews") {
        let mut descending = removed.to_vec();
        descending.sort_unstable_by(|a, b| b.cmp(a));
        descending.dedup();
        for index in descending {
            views.remove(index);
        }
    }

    if index_map.is_empty() {
        return;
    }
    if let Some(accessors) = root.get_array_mut("accessors") {
        for accessor in accessors.iter_mut() {
            let view_index = accessor.get_int_or("bufferView", -1);
            if view_index >= 0 {
                if let Some(&mapped) = index_map.get(&(view_index as usize)) {
                    accessor.insert("bufferView", Value::from(mapped as u64));
                }
            }
        }
    }
}

/// Stream `length` bytes starting at `offset` of `reader` into `writer`.
fn copy_range<R: Read + Seek, W: Write>(
    reader: &mut R,
    offset: u64,
    length: u64,
    writer: &mut W,
) -> Result<()> {
    reader.seek(SeekFrom::Start(offset))?;
    let copied = io::copy(&mut reader.by_ref().take(length), writer)?;
    if copied != length {
        return Err(Error::UnexpectedEof);
    }
    Ok(())
}

/// File extension of a URI path, dot included, or empty when absent.
fn extension_of(uri_path: &str) -> String {
    Path::new(uri_path)
        .extension()
        .and_then(OsStr::to_str)
        .map(|extension| format!(".{extension}"))
        .unwrap_or_default()
}
