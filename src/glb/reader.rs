//! Container reading: header validation and chunk location

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Read, Seek, SeekFrom};

use super::{CHUNK_BIN, CHUNK_HEADER_SIZE, CHUNK_JSON, GLB_MAGIC, GLB_VERSION, HEADER_SIZE};
use crate::error::{Error, Result};

/// The chunks located inside a container file.
#[derive(Debug)]
pub struct GlbChunks {
    /// The raw JSON chunk payload (padding included).
    pub json: Vec<u8>,
    /// Absolute byte offset of the BIN chunk payload, if the chunk is present.
    pub bin_offset: Option<u64>,
}

/// Read the container header and locate the JSON and BIN chunks.
///
/// `file_len` must be the actual length of the underlying file; the header's
/// total-length field is validated against it. Chunks of unknown type are
/// skipped by their declared length.
///
/// # Errors
///
/// Returns [`Error::InvalidGlbMagic`], [`Error::UnsupportedGlbVersion`] or
/// [`Error::GlbLengthMismatch`] for a malformed header,
/// [`Error::MissingJsonChunk`] if the first chunk is not JSON, and
/// [`Error::UnexpectedJsonChunk`] if a second JSON chunk appears.
pub fn read_chunks<R: Read + Seek>(reader: &mut R, file_len: u64) -> Result<GlbChunks> {
    let magic = reader.read_u32::<LittleEndian>()?;
    if magic != GLB_MAGIC {
        return Err(Error::InvalidGlbMagic(magic));
    }

    let version = reader.read_u32::<LittleEndian>()?;
    if version != GLB_VERSION {
        return Err(Error::UnsupportedGlbVersion { version });
    }

    let total_length = reader.read_u32::<LittleEndian>()?;
    if u64::from(total_length) != file_len {
        return Err(Error::GlbLengthMismatch {
            header: total_length,
            actual: file_len,
        });
    }

    let chunk_length = reader.read_u32::<LittleEndian>()?;
    let chunk_type = reader.read_u32::<LittleEndian>()?;
    if chunk_type != CHUNK_JSON {
        return Err(Error::MissingJsonChunk);
    }
    if HEADER_SIZE + CHUNK_HEADER_SIZE + u64::from(chunk_length) > file_len {
        return Err(Error::UnexpectedEof);
    }

    let mut json = vec![0u8; chunk_length as usize];
    reader.read_exact(&mut json)?;

    let bin_offset = find_bin_chunk(reader, file_len)?;

    Ok(GlbChunks { json, bin_offset })
}

/// Scan the remaining chunks for a BIN chunk.
fn find_bin_chunk<R: Read + Seek>(reader: &mut R, file_len: u64) -> Result<Option<u64>> {
    let mut position = reader.stream_position()?;
    while position < file_len {
        let chunk_length = reader.read_u32::<LittleEndian>()?;
        let chunk_type = reader.read_u32::<LittleEndian>()?;
        match chunk_type {
            CHUNK_JSON => return Err(Error::UnexpectedJsonChunk),
            CHUNK_BIN => return Ok(Some(reader.stream_position()?)),
            _ => {
                // Unrecognized chunk type: skip its declared payload.
                position = reader.seek(SeekFrom::Current(i64::from(chunk_length)))?;
            }
        }
    }
    Ok(None)
}
