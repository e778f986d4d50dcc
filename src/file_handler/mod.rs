//! File handler module for nbview
//!
//! Handles all file system operations including:
//! - Reading files with encoding detection
//! - Atomic save operations for data safety
//! - Notebook discovery in directory trees

pub mod io;
pub mod scanner;

pub use io::*;
pub use scanner::*;
