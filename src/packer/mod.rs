//! Loose-form to container packing
//!
//! Merges every externally referenced buffer and image into a single binary
//! blob and rewrites the document's index-based cross-references to point
//! into it, then emits the result as a GLB container. Data URIs and remote
//! references stay untouched.

use indexmap::IndexMap;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::document::{self, ValueExt};
use crate::error::{Error, Result};
use crate::glb::{self, CHUNK_BIN, CHUNK_JSON, GlbWriter};
use crate::mime;
use crate::utils::uri;

/// Nested location of the IES light profile array.
const LIGHTS_PATH: [&str; 3] = ["extensions", "EXT_lights_ies", "lights"];

/// One source file with an assigned region inside the output blob.
struct SourceFile {
    file: File,
    byte_offset: u64,
    byte_length: u64,
}

/// Region allocator for the output blob, deduplicated by resolved source
/// path: two references to the same file share one region.
///
/// Insertion order doubles as blob write order, so assigned offsets stay
/// valid when the BIN chunk is emitted.
#[derive(Default)]
struct BlobAllocator {
    files: IndexMap<PathBuf, SourceFile>,
    cursor: u64,
}

impl BlobAllocator {
    /// Allocate a 4-byte-aligned region for `path`, or return the existing
    /// region when the same file was already added through another reference.
    fn add_file(&mut self, path: &Path) -> Result<(u64, u64)> {
        if let Some(source) = self.files.get(path) {
            return Ok((source.byte_offset, source.byte_length));
        }

        let file = File::open(path).map_err(|_| Error::UnresolvableSource {
            path: path.to_path_buf(),
        })?;
        let metadata = file.metadata()?;
        if !metadata.is_file() {
            return Err(Error::UnresolvableSource {
                path: path.to_path_buf(),
            });
        }

        let byte_offset = glb::align4(self.cursor);
        let byte_length = metadata.len();
        debug!(path = %path.display(), byte_offset, byte_length, "allocated blob region");
        self.cursor = byte_offset + byte_length;
        self.files.insert(
            path.to_path_buf(),
            SourceFile {
                file,
                byte_offset,
                byte_length,
            },
        );
        Ok((byte_offset, byte_length))
    }

    fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Pack a loose `.gltf` document and its external resources into a single
/// container file.
///
/// # Errors
///
/// Returns [`Error::UnresolvableSource`] when a buffer, image or light URI
/// points at a local file that cannot be opened, and [`Error::Io`] /
/// [`Error::Json`] for underlying read, write or parse failures. On error no
/// usable output is produced; callers wanting all-or-nothing behavior should
/// write to a temporary path and rename on success.
pub fn pack<P: AsRef<Path>>(input_path: P, output_path: P) -> Result<()> {
    let input_path = input_path.as_ref();
    let output_path = output_path.as_ref();
    let base_dir = input_path.parent().unwrap_or_else(|| Path::new("."));

    info!(input = %input_path.display(), output = %output_path.display(), "packing");

    let mut root: Value = serde_json::from_reader(BufReader::new(File::open(input_path)?))?;
    let mut allocator = BlobAllocator::default();

    merge_buffers(&mut root, base_dir, &mut allocator)?;
    embed_entries(&mut root, &["images"], base_dir, &mut allocator)?;
    embed_entries(&mut root, &LIGHTS_PATH, base_dir, &mut allocator)?;

    if !allocator.is_empty() {
        insert_blob_buffer(&mut root, allocator.cursor);
    }

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_container(&root, &allocator, File::create(output_path)?)
}

/// Fold every buffer with a resolvable local file into the blob.
///
/// Regions are allocated in document order; the removal and renumbering pass
/// then runs in reverse index order so dropping an entry never disturbs the
/// indices still to be visited.
fn merge_buffers(root: &mut Value, base_dir: &Path, allocator: &mut BlobAllocator) -> Result<()> {
    let Some(buffers) = root.get_array("buffers") else {
        return Ok(());
    };

    let sources: Vec<(usize, PathBuf)> = buffers
        .iter()
        .enumerate()
        .filter_map(|(index, buffer)| {
            buffer
                .get_str("uri")
                .and_then(|u| uri::resolve_local(u, base_dir))
                .map(|path| (index, path))
        })
        .collect();

    let mut merged = Vec::with_capacity(sources.len());
    for (index, path) in sources {
        let (byte_offset, _) = allocator.add_file(&path)?;
        merged.push((index, byte_offset));
    }

    for (index, base_offset) in merged.into_iter().rev() {
        if let Some(views) = root.get_array_mut("bufferViews") {
            for view in views.iter_mut() {
                let buffer_index = view.get_int_or("buffer", -1);
                if buffer_index == index as i64 {
                    // The view now addresses the blob directly; its buffer
                    // reference is reassigned once the blob buffer exists.
                    view.remove_key("buffer");
                    let byte_offset = base_offset as i64 + view.get_int_or("byteOffset", 0);
                    view.set_int("byteOffset", byte_offset, 0);
                } else if buffer_index > index as i64 {
                    view.insert("buffer", Value::from(buffer_index - 1));
                }
            }
        }

        if let Some(buffers) = root.get_array_mut("buffers") {
            buffers.remove(index);
        }
    }

    Ok(())
}

/// Embed every entry of the array at `path` (images, IES lights) that
/// references a local file, giving each a freshly appended bufferView.
fn embed_entries(
    root: &mut Value,
    path: &[&str],
    base_dir: &Path,
    allocator: &mut BlobAllocator,
) -> Result<()> {
    let count = document::array_at(root, path).map_or(0, Vec::len);

    for index in 0..count {
        let source = document::array_at(root, path)
            .and_then(|entries| entries.get(index))
            .and_then(|entry| entry.get_str("uri"))
            .and_then(|u| uri::resolve_local(u, base_dir));
        let Some(source) = source else { continue };

        let (byte_offset, byte_length) = allocator.add_file(&source)?;
        let mime_type = mime::from_file_extension(source.extension().and_then(|e| e.to_str()));

        let Some(views) = document::ensure_array(root, "bufferViews") else {
            continue;
        };
        let view_index = views.len();
        let mut view = Value::Object(serde_json::Map::new());
        view.set_int("byteOffset", byte_offset as i64, 0);
        view.insert("byteLength", Value::from(byte_length));
        views.push(view);

        if let Some(entry) =
            document::array_at_mut(root, path).and_then(|entries| entries.get_mut(index))
        {
            entry.remove_key("uri");
            entry.insert("bufferView", Value::from(view_index as u64));
            entry.insert("mimeType", Value::from(mime_type));
        }
    }

    Ok(())
}

/// Insert the consolidated blob as buffer 0 and shift every bufferView's
/// buffer reference up by one. Views left without a `buffer` key by the
/// merge pass count as -1 and land on the new blob.
fn insert_blob_buffer(root: &mut Value, byte_length: u64) {
    if let Some(views) = root.get_array_mut("bufferViews") {
        for view in views.iter_mut() {
            let buffer_index = view.get_int_or("buffer", -1);
            view.insert("buffer", Value::from(buffer_index + 1));
        }
    }

    if let Some(buffers) = document::ensure_array(root, "buffers") {
        let mut blob = Value::Object(serde_json::Map::new());
        blob.insert("byteLength", Value::from(byte_length));
        buffers.insert(0, blob);
    }
}

/// Emit the container: the JSON chunk, then a BIN chunk streaming every
/// allocated source file at its assigned offset.
fn write_container<W: Write + Seek>(
    root: &Value,
    allocator: &BlobAllocator,
    writer: W,
) -> Result<()> {
    let mut container = GlbWriter::new(BufWriter::new(writer))?;

    container.write_chunk(CHUNK_JSON, b' ', |w| {
        serde_json::to_writer(&mut *w, root)?;
        Ok(())
    })?;

    if !allocator.is_empty() {
        container.write_chunk(CHUNK_BIN, 0, |w| {
            for source in allocator.files.values() {
                glb::pad_to_alignment(w, 0)?;
                let mut region = (&source.file).take(source.byte_length);
                let copied = io::copy(&mut region, w)?;
                if copied != source.byte_length {
                    return Err(Error::UnexpectedEof);
                }
            }
            Ok(())
        })?;
    }

    container.finish()?;
    Ok(())
}
