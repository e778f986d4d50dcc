//! Directory scanner for notebook discovery
//!
//! Walks a directory tree and collects notebook files, honoring:
//! - Configurable depth limits
//! - Hidden file handling
//! - Ignored directory patterns

use crate::error::{FileError, FileResult};
use crate::utils::path::is_notebook;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Configuration for directory scanning
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Maximum directory depth to scan (0 = root only)
    pub max_depth: usize,

    /// Whether to include hidden files (starting with .)
    pub show_hidden: bool,

    /// Maximum number of notebooks to return
    pub max_entries: usize,

    /// Directories to always ignore
    pub ignored_dirs: HashSet<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::from_ignored(&crate::config::FileConfig::default().ignored_directories)
    }
}

impl ScanConfig {
    /// Build a scan configuration from the configured ignore list
    pub fn from_ignored(ignored: &[String]) -> Self {
        Self {
            max_depth: 10,
            show_hidden: false,
            max_entries: 10_000,
            ignored_dirs: ignored.iter().cloned().collect(),
        }
    }

    /// Set whether to include hidden files
    pub fn with_hidden(mut self, show: bool) -> Self {
        self.show_hidden = show;
        self
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Result of a notebook scan
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Notebook paths, sorted
    pub notebooks: Vec<PathBuf>,

    /// Whether the scan was truncated due to max_entries
    pub truncated: bool,

    /// Number of directories scanned
    pub dirs_scanned: usize,
}

/// Find notebooks under `root`
pub fn find_notebooks(root: impl AsRef<Path>, config: &ScanConfig) -> FileResult<ScanResult> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(FileError::DirectoryNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut result = ScanResult::default();

    let walker = WalkDir::new(root)
        .max_depth(config.max_depth + 1)
        .follow_links(false)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()));

    for entry in walker
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || should_include(e, config))
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) if e.depth() == 0 => {
                return Err(FileError::DirectoryScanError {
                    path: root.to_path_buf(),
                    source: e,
                });
            }
            Err(e) => {
                log::debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if entry.file_type().is_dir() {
            result.dirs_scanned += 1;
            continue;
        }

        if !is_notebook(entry.path()) {
            continue;
        }

        if result.notebooks.len() >= config.max_entries {
            result.truncated = true;
            break;
        }
        result.notebooks.push(entry.into_path());
    }

    Ok(result)
}

/// Check if an entry should be visited during traversal
fn should_include(entry: &DirEntry, config: &ScanConfig) -> bool {
    let Some(name) = entry.file_name().to_str() else {
        return true;
    };
    if entry.file_type().is_dir() && config.ignored_dirs.contains(name) {
        return false;
    }
    config.show_hidden || !name.starts_with('.')
}
