//! Rendering of notebook content into the view tree
//!
//! - Cell rendering with gutter, highlighting and collapsible outputs
//! - Output dispatch by kind and MIME type
//! - HTML sanitization of output payloads
//! - Image location and decoding
//! - The view-scoped stylesheet

pub mod cell;
pub mod highlight;
pub mod image;
pub mod output;
pub mod sanitize;
pub mod styles;

pub use cell::{set_outputs_collapsed, CellContext, CellMode, CellRenderer};
pub use image::{decode_image, ImageFormat, ImageSearch, ImageSource, KeyPathSource, LocatedImage};
pub use output::{
    complete_image_load, complete_image_loads, render_output, ImageLoad, RenderContext,
};
pub use sanitize::sanitize_html;
pub use styles::stylesheet;
