//! Utility functions

pub mod uri;

pub use uri::{is_data_uri, is_relative, resolve_local};
