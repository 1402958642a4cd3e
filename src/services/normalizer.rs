//! Image preprocessing for the classifier.
//!
//! Raw upload bytes are decoded, flattened to RGB, resized to the model's
//! input size with a bicubic (Catmull-Rom) filter and scaled to `[0, 1]`.

use image::imageops::{self, FilterType};
use serde::ser::{Serialize, SerializeSeq, Serializer};

pub const TARGET_WIDTH: u32 = 224;
pub const TARGET_HEIGHT: u32 = 224;
pub const CHANNELS: usize = 3;

/// Resampling filter used for every resize.
pub const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

/// A `224 x 224 x 3` RGB tensor, row-major, values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedImage {
    data: Vec<f32>,
}

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Decode and normalize raw image bytes.
pub fn normalize(bytes: &[u8]) -> Result<NormalizedImage, NormalizeError> {
    let rgb = image::load_from_memory(bytes)?.to_rgb8();
    let resized = imageops::resize(&rgb, TARGET_WIDTH, TARGET_HEIGHT, RESIZE_FILTER);

    let data = resized
        .into_raw()
        .into_iter()
        .map(|channel| f32::from(channel) / 255.0)
        .collect();

    Ok(NormalizedImage { data })
}

impl NormalizedImage {
    /// `(height, width, channels)`
    pub fn shape(&self) -> (usize, usize, usize) {
        (TARGET_HEIGHT as usize, TARGET_WIDTH as usize, CHANNELS)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// RGB values of the pixel at `(row, col)`.
    pub fn pixel(&self, row: usize, col: usize) -> Option<[f32; 3]> {
        if row >= TARGET_HEIGHT as usize || col >= TARGET_WIDTH as usize {
            return None;
        }
        let start = (row * TARGET_WIDTH as usize + col) * CHANNELS;
        Some([self.data[start], self.data[start + 1], self.data[start + 2]])
    }
}

/// Serializes as nested `[row][col][channel]` arrays.
impl Serialize for NormalizedImage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let row_len = TARGET_WIDTH as usize * CHANNELS;
        let mut rows = serializer.serialize_seq(Some(TARGET_HEIGHT as usize))?;
        for row in self.data.chunks_exact(row_len) {
            let pixels: Vec<&[f32]> = row.chunks_exact(CHANNELS).collect();
            rows.serialize_element(&pixels)?;
        }
        rows.end()
    }
}
