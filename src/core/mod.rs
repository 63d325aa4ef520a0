//! Core library modules for tiles-dl
//!
//! This module contains the internal implementation details of the tiles-dl library.

pub mod catalog;
pub mod downloader;
pub mod error;
pub mod extract;
pub mod harvester;
pub mod options;
pub mod pool;
pub mod source;
pub mod stream;
pub mod task;

// Re-export main types for internal use
pub use harvester::Harvester;
pub use source::{resolve_base_directory, SourceConfig};
