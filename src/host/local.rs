//! File system host
//!
//! Runs views outside any editor: documents live on disk, markdown is
//! rendered with pulldown-cmark, and notices and navigations are logged and
//! recorded so callers (and tests) can inspect them.

use super::{markdown, Host, Notice, NoticeKind};
use crate::config::MAX_FILE_SIZE;
use crate::dom::Node;
use crate::error::{FileError, FileResult};
use crate::file_handler::{read_file, write_file_atomic};
use crate::utils::path::{is_external_link, resolve_link};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Where a link click led
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Another document in the same tree
    Internal(PathBuf),
    /// A URL handed to the system
    External(String),
}

/// Host backed by the local file system
pub struct LocalHost {
    max_file_size: u64,
    notices: Mutex<Vec<Notice>>,
    navigations: Mutex<Vec<Navigation>>,
}

impl LocalHost {
    pub fn new() -> Self {
        Self::with_max_file_size(MAX_FILE_SIZE)
    }

    pub fn with_max_file_size(max_file_size: u64) -> Self {
        Self {
            max_file_size,
            notices: Mutex::new(Vec::new()),
            navigations: Mutex::new(Vec::new()),
        }
    }

    /// Notices shown so far
    pub fn notices(&self) -> Vec<Notice> {
        match self.notices.lock() {
            Ok(notices) => notices.clone(),
            Err(_) => Vec::new(),
        }
    }

    /// Navigations requested so far
    pub fn navigations(&self) -> Vec<Navigation> {
        match self.navigations.lock() {
            Ok(navigations) => navigations.clone(),
            Err(_) => Vec::new(),
        }
    }
}

impl Default for LocalHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for LocalHost {
    async fn read_text(&self, path: &Path) -> FileResult<String> {
        let result = read_file(path, self.max_file_size).await?;
        if result.lossy {
            return Err(FileError::InvalidEncoding {
                path: path.to_path_buf(),
            });
        }
        Ok(result.content)
    }

    async fn write_text(&self, path: &Path, content: &str) -> FileResult<()> {
        write_file_atomic(path, content).await
    }

    async fn render_markdown(&self, markdown: &str, _source_path: &Path) -> Vec<Node> {
        markdown::render_markdown(markdown)
    }

    fn open_link(&self, target: &str, source_path: &Path) {
        let navigation = if is_external_link(target) {
            Navigation::External(target.to_string())
        } else {
            Navigation::Internal(resolve_link(source_path, target))
        };
        log::info!("Opening link {:?}", navigation);
        if let Ok(mut navigations) = self.navigations.lock() {
            navigations.push(navigation);
        }
    }

    fn notify(&self, notice: Notice) {
        match notice.kind {
            NoticeKind::Success => log::info!("{}", notice.message),
            NoticeKind::Error => log::error!("{}", notice.message),
        }
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}
