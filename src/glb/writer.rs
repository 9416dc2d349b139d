//! Container writing with reserve-then-backpatch length fields

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{Seek, SeekFrom, Write};

use super::{CHUNK_HEADER_SIZE, GLB_MAGIC, GLB_VERSION, align4};
use crate::error::Result;

/// Byte offset of the header's total-length field.
const TOTAL_LENGTH_OFFSET: u64 = 8;

/// Writes a container front to back, reserving each length field as a zero
/// placeholder and patching it once the true size is known.
pub struct GlbWriter<W: Write + Seek> {
    writer: W,
}

impl<W: Write + Seek> GlbWriter<W> {
    /// Write the 12-byte header. The total length is patched by [`finish`].
    ///
    /// [`finish`]: GlbWriter::finish
    pub fn new(mut writer: W) -> Result<Self> {
        writer.write_u32::<LittleEndian>(GLB_MAGIC)?;
        writer.write_u32::<LittleEndian>(GLB_VERSION)?;
        writer.write_u32::<LittleEndian>(0)?; // total length
        Ok(Self { writer })
    }

    /// Write one chunk: a header with a placeholder length, the payload
    /// produced by `content`, then `pad` bytes up to a 4-byte boundary.
    /// The chunk length (padding included, header excluded) is patched
    /// afterwards.
    pub fn write_chunk<F>(&mut self, chunk_type: u32, pad: u8, content: F) -> Result<()>
    where
        F: FnOnce(&mut W) -> Result<()>,
    {
        let chunk_start = self.writer.stream_position()?;
        self.writer.write_u32::<LittleEndian>(0)?; // chunk length
        self.writer.write_u32::<LittleEndian>(chunk_type)?;

        content(&mut self.writer)?;

        pad_to_alignment(&mut self.writer, pad)?;
        let end = self.writer.stream_position()?;
        let chunk_length = end - chunk_start - CHUNK_HEADER_SIZE;

        self.writer.seek(SeekFrom::Start(chunk_start))?;
        self.writer.write_u32::<LittleEndian>(chunk_length as u32)?;
        self.writer.seek(SeekFrom::Start(end))?;
        Ok(())
    }

    /// Patch the header's total length with the final file size and return
    /// the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        let total = self.writer.seek(SeekFrom::End(0))?;
        self.writer.seek(SeekFrom::Start(TOTAL_LENGTH_OFFSET))?;
        self.writer.write_u32::<LittleEndian>(total as u32)?;
        self.writer.seek(SeekFrom::Start(total))?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Pad `writer` with `pad` bytes up to the next 4-byte boundary and return
/// the aligned position.
pub fn pad_to_alignment<W: Write + Seek>(writer: &mut W, pad: u8) -> Result<u64> {
    let position = writer.stream_position()?;
    let aligned = align4(position);
    for _ in position..aligned {
        writer.write_all(&[pad])?;
    }
    Ok(aligned)
}
