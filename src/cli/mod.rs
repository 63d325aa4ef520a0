//! CLI-specific utilities for tiles-dl
//!
//! This module contains code specific to the command-line interface,
//! separate from the core library functionality.

pub mod logging;
pub mod progress;

pub use progress::ProgressManager;
