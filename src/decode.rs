//! Resource Decoding - Background Images and Fonts
//!
//! The loader only sees these traits, so tests can swap in fakes.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use thiserror::Error;

/// Point size every decoded font is opened at; the renderer scales from it.
pub const FONT_BASE_SIZE: u16 = 10;

#[derive(Debug, Error)]
#[error("Cannot decode {kind} {}: {reason}", .path.display())]
pub struct DecodeError {
    pub kind: ResourceKind,
    pub path: PathBuf,
    pub reason: String,
}

impl DecodeError {
    pub fn image(path: &Path, reason: impl ToString) -> Self {
        Self {
            kind: ResourceKind::Image,
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn font(path: &Path, reason: impl ToString) -> Self {
        Self {
            kind: ResourceKind::Font,
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Image,
    Font,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Image => f.write_str("image"),
            ResourceKind::Font => f.write_str("font"),
        }
    }
}

/// A decoded font file. The raw bytes are kept for the renderer to shape with.
#[derive(Debug, Clone)]
pub struct FontFace {
    pub path: PathBuf,
    pub data: Arc<Vec<u8>>,
    pub family: Option<String>,
    pub units_per_em: u16,
    pub glyph_count: u16,
    pub base_size: u16,
}

pub trait ImageDecoder {
    fn decode_image(&self, path: &Path) -> Result<DynamicImage, DecodeError>;
}

pub trait FontDecoder {
    fn decode_font(&self, path: &Path) -> Result<FontFace, DecodeError>;
}

/// Decodes any container the `image` crate recognises by content.
#[derive(Debug, Default, Clone, Copy)]
pub struct RasterImageDecoder;

impl ImageDecoder for RasterImageDecoder {
    fn decode_image(&self, path: &Path) -> Result<DynamicImage, DecodeError> {
        let img = image::ImageReader::open(path)
            .map_err(|e| DecodeError::image(path, e))?
            .with_guessed_format()
            .map_err(|e| DecodeError::image(path, e))?
            .decode()
            .map_err(|e| DecodeError::image(path, e))?;
        log::debug!(
            "Decoded background {} ({}x{})",
            path.display(),
            img.width(),
            img.height()
        );
        Ok(img)
    }
}

/// TrueType / OpenType decoder backed by `ttf-parser`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrueTypeFontDecoder;

impl FontDecoder for TrueTypeFontDecoder {
    fn decode_font(&self, path: &Path) -> Result<FontFace, DecodeError> {
        let data = fs::read(path).map_err(|e| DecodeError::font(path, e))?;
        let (family, units_per_em, glyph_count) = {
            let face = ttf_parser::Face::parse(&data, 0).map_err(|e| DecodeError::font(path, e))?;
            let family = face
                .names()
                .into_iter()
                .find(|n| n.name_id == ttf_parser::name_id::FAMILY)
                .and_then(|n| n.to_string());
            (family, face.units_per_em(), face.number_of_glyphs())
        };
        log::debug!(
            "Decoded font {} (family {:?}, {} glyphs)",
            path.display(),
            family,
            glyph_count
        );
        Ok(FontFace {
            path: path.to_path_buf(),
            data: Arc::new(data),
            family,
            units_per_em,
            glyph_count,
            base_size: FONT_BASE_SIZE,
        })
    }
}
