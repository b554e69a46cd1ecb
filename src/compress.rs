//! Client-side image compression before upload
//!
//! The browser original re-encoded every photo through a canvas before
//! submitting it. Here the same step is a service behind a trait so the
//! workflow can be tested without decoding real images; `JpegCompressor`
//! is the concrete implementation on top of the `image` crate.

use crate::error::ClientError;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Target constraints for re-encoding
///
/// The bounding box and quality factor varied across revisions of the
/// original (800px/0.6 vs 1200px/0.8), so they are configuration, not
/// constants. Defaults match the values the original shipped with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompressionOptions {
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality factor in 0.0..=1.0
    pub quality: f32,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            max_width: 800,
            max_height: 800,
            quality: 0.6,
        }
    }
}

impl CompressionOptions {
    /// Quality factor mapped to the encoder's 1..=100 scale
    pub fn jpeg_quality(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

/// Scale dimensions to fit a bounding box, keeping the aspect ratio.
/// Images already inside the box are left untouched.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let ratio = (width as f32 / max_width as f32).max(height as f32 / max_height as f32);

    if ratio > 1.0 {
        let new_width = (width as f32 / ratio) as u32;
        let new_height = (height as f32 / ratio) as u32;
        (new_width.max(1), new_height.max(1))
    } else {
        (width, height)
    }
}

/// External compression capability
///
/// Implementations run on the blocking pool; one call per candidate file.
pub trait ImageCompressor: Send + Sync {
    fn compress(
        &self,
        file_name: &str,
        bytes: &[u8],
        options: &CompressionOptions,
    ) -> Result<Vec<u8>, ClientError>;
}

/// Resizes into the configured bounding box and re-encodes as JPEG
pub struct JpegCompressor;

impl ImageCompressor for JpegCompressor {
    fn compress(
        &self,
        file_name: &str,
        bytes: &[u8],
        options: &CompressionOptions,
    ) -> Result<Vec<u8>, ClientError> {
        let img = image::load_from_memory(bytes).map_err(|e| {
            ClientError::Compression(format!("Failed to load image {}: {}", file_name, e))
        })?;

        let (width, height) = (img.width(), img.height());
        let (new_width, new_height) =
            fit_within(width, height, options.max_width, options.max_height);

        let img = if (new_width, new_height) != (width, height) {
            log::debug!(
                "Resizing {} from {}x{} to {}x{}",
                file_name,
                width,
                height,
                new_width,
                new_height
            );
            img.resize_exact(new_width, new_height, FilterType::Lanczos3)
        } else {
            img
        };

        let mut buffer = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut buffer, options.jpeg_quality());
        img.write_with_encoder(encoder).map_err(|e| {
            ClientError::Compression(format!("Failed to encode {}: {}", file_name, e))
        })?;

        Ok(buffer.into_inner())
    }
}
