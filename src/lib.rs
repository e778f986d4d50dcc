//! nbview - A Jupyter notebook viewer with in-place cell editing
//!
//! Renders `.ipynb` documents into a view tree, lets single cells be edited
//! and saved back to the file, expands notebook embeds in markdown documents
//! and exports rendered views as standalone HTML.

pub mod config;
pub mod dom;
pub mod embed;
pub mod error;
pub mod export;
pub mod file_handler;
pub mod host;
pub mod notebook;
pub mod plugin;
pub mod render;
pub mod utils;
pub mod view;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use host::{Host, LocalHost};
pub use notebook::{Cell, CellId, CellKind, Notebook, Output};
pub use plugin::NotebookPlugin;
pub use view::NotebookView;
