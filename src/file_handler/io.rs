//! File I/O operations with encoding detection and atomic writes
//!
//! Provides safe file reading and writing with:
//! - UTF-8 (with or without BOM) and UTF-16 encoding detection
//! - Atomic writes so a failed save never leaves a partial notebook behind
//! - File size limits

use crate::error::{FileError, FileResult};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Detected encoding of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileEncoding {
    /// UTF-8 without BOM
    #[default]
    Utf8,
    /// UTF-8 with BOM
    Utf8Bom,
    /// UTF-16 Little Endian with BOM
    Utf16Le,
    /// UTF-16 Big Endian with BOM
    Utf16Be,
    /// Unknown/binary (lossy UTF-8 conversion used)
    Unknown,
}

/// Result of reading a file
#[derive(Debug, Clone)]
pub struct FileReadResult {
    /// The file content as a string
    pub content: String,
    /// Detected encoding
    pub encoding: FileEncoding,
    /// Original file size in bytes
    pub size_bytes: u64,
    /// Whether lossy conversion was used
    pub lossy: bool,
}

/// Detect file encoding from raw bytes
pub fn detect_encoding(bytes: &[u8]) -> FileEncoding {
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return FileEncoding::Utf8Bom;
    }
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return FileEncoding::Utf16Le;
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        return FileEncoding::Utf16Be;
    }

    if std::str::from_utf8(bytes).is_ok() {
        FileEncoding::Utf8
    } else {
        FileEncoding::Unknown
    }
}

/// Decode bytes to string based on detected encoding
pub fn decode_content(bytes: &[u8], encoding: FileEncoding) -> (String, bool) {
    match encoding {
        FileEncoding::Utf8 => decode_utf8(bytes),
        FileEncoding::Utf8Bom => decode_utf8(&bytes[3..]),
        FileEncoding::Utf16Le => decode_utf16(&bytes[2..], u16::from_le_bytes),
        FileEncoding::Utf16Be => decode_utf16(&bytes[2..], u16::from_be_bytes),
        FileEncoding::Unknown => (String::from_utf8_lossy(bytes).into_owned(), true),
    }
}

fn decode_utf8(bytes: &[u8]) -> (String, bool) {
    match std::str::from_utf8(bytes) {
        Ok(s) => (s.to_string(), false),
        Err(_) => (String::from_utf8_lossy(bytes).into_owned(), true),
    }
}

fn decode_utf16(bytes: &[u8], to_u16: fn([u8; 2]) -> u16) -> (String, bool) {
    let mut lossy = false;
    let units = bytes.chunks_exact(2).map(|chunk| to_u16([chunk[0], chunk[1]]));

    let result: String = char::decode_utf16(units)
        .map(|r| {
            r.unwrap_or_else(|_| {
                lossy = true;
                '\u{FFFD}'
            })
        })
        .collect();

    (result, lossy)
}

fn check_size(path: &Path, size_bytes: u64, max_size: u64) -> FileResult<()> {
    if size_bytes > max_size {
        return Err(FileError::FileTooLarge {
            path: path.to_path_buf(),
            size: size_bytes,
            max_size,
        });
    }
    Ok(())
}

/// Read a file with encoding detection
pub async fn read_file(path: impl AsRef<Path>, max_size: u64) -> FileResult<FileReadResult> {
    let path = path.as_ref();

    let metadata = tokio::fs::metadata(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => FileError::NotFound(path.to_path_buf()),
        _ => FileError::ReadError {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let size_bytes = metadata.len();
    check_size(path, size_bytes, max_size)?;

    let bytes = tokio::fs::read(path).await.map_err(|e| FileError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let encoding = detect_encoding(&bytes);
    let (content, lossy) = decode_content(&bytes, encoding);
    if lossy {
        log::warn!("Lossy decode of {} ({:?})", path.display(), encoding);
    }

    Ok(FileReadResult {
        content,
        encoding,
        size_bytes,
        lossy,
    })
}

/// Temporary sibling path used while writing `path` atomically
fn temp_path_for(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new("."));
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "notebook".to_string());

    let timestamp = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);

    parent.join(format!(".{}.{}.tmp", filename, timestamp))
}

/// Write content to a file using atomic write
///
/// The file is either fully written or unchanged.
pub async fn write_file_atomic(path: impl AsRef<Path>, content: &str) -> FileResult<()> {
    let path = path.as_ref();
    let temp_path = temp_path_for(path);

    let write_result = async {
        let mut file = tokio::fs::File::create(&temp_path).await?;
        tokio::io::AsyncWriteExt::write_all(&mut file, content.as_bytes()).await?;
        tokio::io::AsyncWriteExt::flush(&mut file).await?;
        file.sync_all().await?;
        Ok::<(), std::io::Error>(())
    }
    .await;

    if let Err(e) = write_result {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(FileError::WriteError {
            path: path.to_path_buf(),
            source: e,
        });
    }

    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(FileError::RenameError {
            path: path.to_path_buf(),
            source: e,
        });
    }

    Ok(())
}
