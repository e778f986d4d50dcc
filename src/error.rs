//! Error types for nbview
//!
//! This module defines all custom error types used throughout the crate.
//! Error types are organized by category so that every failure can be turned
//! into a visible, localized message at the nearest operation boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Main application error type encompassing all error categories
#[derive(Error, Debug)]
pub enum AppError {
    /// File I/O related errors
    #[error(transparent)]
    FileIO(#[from] FileError),

    /// Notebook parse/serialize errors
    #[error(transparent)]
    Notebook(#[from] NotebookError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Edit-save errors
    #[error(transparent)]
    Save(#[from] SaveError),

    /// Embedded notebook errors
    #[error(transparent)]
    Embed(#[from] EmbedError),
}

/// File I/O related errors
#[derive(Error, Debug)]
pub enum FileError {
    /// File not found at specified path
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// File is too large
    #[error("File too large: {path} ({size} bytes, max {max_size} bytes)")]
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    /// Error reading file
    #[error("Could not read file: {path}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error writing file
    #[error("Could not save file: {path}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error renaming temp file to target
    #[error("Could not complete file save (rename failed): {path}")]
    RenameError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Content could only be decoded by substituting invalid characters
    #[error("File is not valid text: {path}")]
    InvalidEncoding { path: PathBuf },

    /// Directory does not exist
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Error scanning directory
    #[error("Could not read directory: {path}")]
    DirectoryScanError {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Notebook document errors
#[derive(Error, Debug)]
pub enum NotebookError {
    /// Content is not a valid notebook document
    #[error("Failed to parse notebook: {0}")]
    Parse(#[source] serde_json::Error),

    /// The notebook could not be turned back into JSON
    #[error("Failed to serialize notebook: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Content is not valid UTF-8
    #[error("Notebook is not valid UTF-8 text")]
    Encoding,
}

/// Rendering errors that are surfaced inline rather than propagated
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// No recognized image payload was found for an image-like output
    #[error("Image data not available")]
    ImageDataMissing,

    /// Image payload could not be decoded
    #[error("Failed to load image: {0}")]
    ImageDecode(String),
}

/// Errors raised while saving an edited cell
#[derive(Error, Debug)]
pub enum SaveError {
    /// No edit session is open for the cell
    #[error("Cell is not being edited")]
    NoSession,

    /// The cell no longer exists in the stored notebook
    #[error("Cell {index} no longer exists in the notebook")]
    CellMissing { index: usize },

    /// Re-reading the stored notebook failed
    #[error("Could not re-read notebook before saving")]
    Read(#[source] FileError),

    /// The stored notebook is no longer valid
    #[error("Stored notebook could not be parsed")]
    Parse(#[source] NotebookError),

    /// The patched notebook could not be serialized
    #[error("Could not serialize notebook")]
    Serialize(#[source] NotebookError),

    /// Writing the notebook failed
    #[error("Could not write notebook")]
    Write(#[source] FileError),
}

/// Errors for a single embedded notebook reference
#[derive(Error, Debug)]
pub enum EmbedError {
    /// Embedded file could not be loaded
    #[error("Could not load embedded notebook {path}")]
    Load {
        path: PathBuf,
        #[source]
        source: FileError,
    },

    /// Embedded file is not a valid notebook
    #[error("Could not parse embedded notebook {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: NotebookError,
    },
}

/// Configuration related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error loading configuration file
    #[error("Could not load configuration: {0}")]
    LoadError(String),

    /// Error parsing configuration
    #[error("Invalid configuration format: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    /// Configuration directory error
    #[error("Could not access configuration directory")]
    DirectoryError,
}

/// Result type alias for operations that can fail with AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for file operations
pub type FileResult<T> = Result<T, FileError>;

/// Result type alias for notebook operations
pub type NotebookResult<T> = Result<T, NotebookError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

impl FileError {
    /// Create a user-friendly error message suitable for inline display
    pub fn user_message(&self) -> String {
        match self {
            FileError::NotFound(_) => {
                "The file could not be found. It may have been moved or deleted.".to_string()
            }
            FileError::FileTooLarge { max_size, .. } => {
                format!(
                    "This file is too large to open. Maximum file size is {} bytes.",
                    max_size
                )
            }
            FileError::InvalidEncoding { .. } => {
                "The file contains invalid characters and was not opened to avoid damaging it."
                    .to_string()
            }
            FileError::WriteError { .. } | FileError::RenameError { .. } => {
                "Could not save the file. Check disk space and permissions.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl SaveError {
    /// Message shown in the transient error notice
    pub fn user_message(&self) -> String {
        match self {
            SaveError::Read(err) | SaveError::Write(err) => {
                format!("Failed to save cell: {}", err.user_message())
            }
            SaveError::Parse(err) | SaveError::Serialize(err) => {
                format!("Failed to save cell: {}", err)
            }
            _ => format!("Failed to save cell: {}", self),
        }
    }
}
