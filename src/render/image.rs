//! Image payload location and decoding
//!
//! Rich outputs normally carry images under `image/png` or `image/jpeg`, but
//! some plotting tools leave only a textual repr such as
//! `<Figure size 640x480 with 1 Axes>` and stash the bytes elsewhere. This
//! module provides:
//! - The `ImageSource` capability and an ordered `ImageSearch`
//! - The image-handle heuristic over plain-text payloads
//! - Format sniffing and base64 decoding for load completion

use crate::error::RenderError;
use crate::notebook::{value_text, Output, MIME_JPEG, MIME_PNG};
use base64::Engine;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Supported image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
    Svg,
}

impl ImageFormat {
    /// MIME type for the format
    pub fn mime(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Svg => "image/svg+xml",
        }
    }

    /// Detect format from magic bytes
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(ImageFormat::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }

        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(ImageFormat::Gif);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && data.len() >= 12 && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::Webp);
        }

        let start = String::from_utf8_lossy(&data[..data.len().min(256)]);
        if start.contains("<svg") || start.trim_start().starts_with("<?xml") {
            return Some(ImageFormat::Svg);
        }

        None
    }
}

/// An image payload found in an output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedImage {
    /// MIME type to use in the data URL
    pub mime: &'static str,
    /// Base64 payload with whitespace removed
    pub base64: String,
}

impl LocatedImage {
    /// `data:` URL for an `img` element
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.base64)
    }
}

/// A place where an output may keep image bytes
pub trait ImageSource: Send + Sync {
    /// Return the image payload if this source holds one
    fn locate(&self, output: &Output) -> Option<LocatedImage>;
}

/// Which map of the output a key path starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMap {
    Data,
    Metadata,
}

/// Image stored at a key path inside `data` or `metadata`
#[derive(Debug, Clone)]
pub struct KeyPathSource {
    root: OutputMap,
    path: &'static [&'static str],
    mime: &'static str,
}

impl KeyPathSource {
    pub const fn new(root: OutputMap, path: &'static [&'static str], mime: &'static str) -> Self {
        Self { root, path, mime }
    }
}

impl ImageSource for KeyPathSource {
    fn locate(&self, output: &Output) -> Option<LocatedImage> {
        let (first, rest) = self.path.split_first()?;
        let mut value = match self.root {
            OutputMap::Data => output.data_value(first)?,
            OutputMap::Metadata => output.metadata_value(first)?,
        };
        for key in rest {
            value = value.get(key)?;
        }
        let base64 = payload_text(value)?;
        Some(LocatedImage {
            mime: self.mime,
            base64,
        })
    }
}

/// Text of a payload value: a string, a list of strings, or `{"data": ...}`
fn payload_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Object(map) => map.get("data").and_then(value_text)?,
        other => value_text(other)?,
    };
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    (!compact.is_empty()).then_some(compact)
}

/// Ordered list of image sources; the first match wins
pub struct ImageSearch {
    sources: Vec<Box<dyn ImageSource>>,
}

impl ImageSearch {
    /// Search with no sources
    pub fn empty() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Append a source with the lowest priority so far
    pub fn with_source(mut self, source: impl ImageSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// First image found across the sources
    pub fn locate(&self, output: &Output) -> Result<LocatedImage, RenderError> {
        self.sources
            .iter()
            .find_map(|source| source.locate(output))
            .ok_or(RenderError::ImageDataMissing)
    }
}

impl Default for ImageSearch {
    /// Locations observed in the wild, most specific first
    fn default() -> Self {
        use OutputMap::{Data, Metadata};

        Self::empty()
            .with_source(KeyPathSource::new(Data, &[MIME_PNG], MIME_PNG))
            .with_source(KeyPathSource::new(Data, &[MIME_JPEG], MIME_JPEG))
            .with_source(KeyPathSource::new(Metadata, &[MIME_PNG], MIME_PNG))
            .with_source(KeyPathSource::new(Metadata, &[MIME_JPEG], MIME_JPEG))
            .with_source(KeyPathSource::new(Data, &["image/jpg"], MIME_JPEG))
            .with_source(KeyPathSource::new(Data, &["image/x-png"], MIME_PNG))
            .with_source(KeyPathSource::new(Data, &["image/png;base64"], MIME_PNG))
            .with_source(KeyPathSource::new(Metadata, &["image", "data"], MIME_PNG))
            .with_source(KeyPathSource::new(Metadata, &["image", MIME_PNG], MIME_PNG))
            .with_source(KeyPathSource::new(Data, &["raw"], MIME_PNG))
            .with_source(KeyPathSource::new(Metadata, &["raw"], MIME_PNG))
    }
}

/// Whether a plain-text repr stands in for an image object
pub fn looks_like_image_handle(text: &str) -> bool {
    static HANDLE: OnceLock<Regex> = OnceLock::new();
    let re = HANDLE.get_or_init(|| {
        Regex::new(
            r"<(?:PIL\.[\w.]*Image[\w.]*|Figure size [^>]*|IPython\.core\.display\.Image object|matplotlib\.[\w.]*(?:Image|Figure)[^>]*)",
        )
        .expect("valid image handle pattern")
    });
    re.is_match(text)
}

/// Decode a base64 payload and check that it holds a known image format
pub fn decode_image(base64: &str) -> Result<(Vec<u8>, ImageFormat), RenderError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(base64)
        .map_err(|e| RenderError::ImageDecode(e.to_string()))?;
    let format = ImageFormat::from_bytes(&bytes)
        .ok_or_else(|| RenderError::ImageDecode("unrecognized image format".to_string()))?;
    Ok((bytes, format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn output(data: Value, metadata: Value) -> Output {
        let mut out = Output::new("display_data");
        out.data = data.as_object().cloned();
        out.metadata = metadata.as_object().cloned();
        out
    }

    #[test]
    fn test_image_format_detection() {
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00];
        assert_eq!(ImageFormat::from_bytes(&png), Some(ImageFormat::Png));
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];
        assert_eq!(ImageFormat::from_bytes(&jpeg), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_bytes(b"GIF89a\x00\x00"), Some(ImageFormat::Gif));
        assert_eq!(ImageFormat::from_bytes(b"<svg xmlns='x'/>"), Some(ImageFormat::Svg));
        assert_eq!(ImageFormat::from_bytes(&[0, 0, 0]), None);
    }

    #[test]
    fn test_handle_heuristic() {
        assert!(looks_like_image_handle("<Figure size 640x480 with 1 Axes>"));
        assert!(looks_like_image_handle(
            "<PIL.PngImagePlugin.PngImageFile image mode=RGBA size=10x10>"
        ));
        assert!(looks_like_image_handle("<IPython.core.display.Image object>"));
        assert!(!looks_like_image_handle("42"));
        assert!(!looks_like_image_handle("<b>figure</b>"));
    }

    #[test]
    fn test_metadata_nested_png() {
        let out = output(
            json!({"text/plain": "<Figure size 640x480 with 1 Axes>"}),
            json!({"image/png": "AAAA"}),
        );
        let found = ImageSearch::default().locate(&out).unwrap();
        assert_eq!(found.base64, "AAAA");
        assert_eq!(found.data_url(), "data:image/png;base64,AAAA");
    }

    #[test]
    fn test_metadata_object_with_data() {
        let out = output(json!({}), json!({"image/png": {"data": ["AA", "\nAA"]}}));
        assert_eq!(ImageSearch::default().locate(&out).unwrap().base64, "AAAA");
    }

    #[test]
    fn test_priority_order() {
        let out = output(
            json!({"raw": "RAW", "image/jpeg": "JPG"}),
            json!({"image/png": "META"}),
        );
        let found = ImageSearch::default().locate(&out).unwrap();
        assert_eq!(found.base64, "JPG");
        assert_eq!(found.mime, MIME_JPEG);
    }

    #[test]
    fn test_empty_values_are_skipped() {
        let out = output(json!({"image/png": "  "}), json!({"raw": "BBBB"}));
        assert_eq!(ImageSearch::default().locate(&out).unwrap().base64, "BBBB");
    }

    #[test]
    fn test_nothing_found() {
        let out = output(json!({"text/plain": "<Figure size 1x1>"}), json!({}));
        assert_eq!(
            ImageSearch::default().locate(&out),
            Err(RenderError::ImageDataMissing)
        );
    }

    #[test]
    fn test_custom_source() {
        struct Fixed;
        impl ImageSource for Fixed {
            fn locate(&self, _output: &Output) -> Option<LocatedImage> {
                Some(LocatedImage {
                    mime: MIME_PNG,
                    base64: "FIXED".to_string(),
                })
            }
        }
        let search = ImageSearch::empty().with_source(Fixed);
        assert_eq!(search.locate(&Output::new("x")).unwrap().base64, "FIXED");
    }

    #[test]
    fn test_decode_image() {
        // 8-byte PNG signature
        assert_eq!(decode_image("iVBORw0KGgo=").unwrap().1, ImageFormat::Png);
        assert!(decode_image("AAAA").is_err());
        assert!(decode_image("not base64!").is_err());
    }
}
