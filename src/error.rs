//! Error types for `GlbPak`

use std::path::PathBuf;

use thiserror::Error;

/// The error type for `GlbPak` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected end of file.
    #[error("unexpected end of file")]
    UnexpectedEof,

    // ==================== Container Errors ====================
    /// The file is not a valid binary container (missing glTF magic).
    #[error("invalid GLB magic: expected glTF, found {0:#010x}")]
    InvalidGlbMagic(u32),

    /// The container version is not supported.
    #[error("unsupported GLB version: {version} (supported: 2)")]
    UnsupportedGlbVersion {
        /// The version number found in the header.
        version: u32,
    },

    /// The header's total length does not match the actual file size.
    #[error("GLB length mismatch: header says {header} bytes, file is {actual}")]
    GlbLengthMismatch {
        /// The total length recorded in the header.
        header: u32,
        /// The actual file length.
        actual: u64,
    },

    /// The first chunk of the container is not a JSON chunk.
    #[error("first GLB chunk must be JSON")]
    MissingJsonChunk,

    /// A second JSON chunk appeared while scanning for the BIN chunk.
    #[error("unexpected second JSON chunk")]
    UnexpectedJsonChunk,

    // ==================== Resource Errors ====================
    /// A buffer or image URI does not resolve to a readable local file.
    #[error("unresolvable source file: {path}")]
    UnresolvableSource {
        /// The resolved path that could not be opened.
        path: PathBuf,
    },

    /// An embedded image carries a MIME type outside the known table.
    #[error("unsupported MIME type: {mime_type:?}")]
    UnsupportedMimeType {
        /// The MIME type found on the image entry (empty if absent).
        mime_type: String,
    },

    // ==================== Parsing Errors ====================
    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for `GlbPak` operations.
pub type Result<T> = std::result::Result<T, Error>;
