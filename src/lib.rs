//! # GlbPak
//!
//! A pure-Rust library for converting glTF assets between their two on-disk
//! forms:
//!
//! - **Loose form** (`.gltf`) - a JSON document plus separately stored binary
//!   buffers and images, referenced by relative/file/data URIs
//! - **Container form** (`.glb`) - a single binary file holding the JSON
//!   chunk and an optional consolidated binary chunk
//!
//! ## Quick Start
//!
//! ```no_run
//! // Pack a .gltf document and everything it references into one .glb
//! glbpak::packer::pack("model.gltf", "model.glb")?;
//!
//! // Extract it again, writing embedded images back out as standalone files
//! glbpak::unpacker::unpack("model.glb", "model/", true)?;
//! # Ok::<(), glbpak::Error>(())
//! ```
//!
//! Packing merges every externally referenced buffer and image (including
//! `EXT_lights_ies` light profiles) into a single binary blob, rewriting the
//! document's index-based cross-references to point into it. Unpacking
//! reverses the process: embedded resources become loose files and the
//! document is emitted as pretty-printed JSON. Data URIs are never relocated
//! in either direction.
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `glbpak` command-line binary

pub mod document;
pub mod error;
pub mod glb;
pub mod mime;
pub mod packer;
pub mod unpacker;
pub mod utils;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::glb::{GlbChunks, GlbWriter, read_chunks};
    pub use crate::packer::pack;
    pub use crate::unpacker::unpack;
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
