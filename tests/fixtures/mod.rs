//! Test images generated in memory

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// A solid-color image and the label the mock endpoint assigns to it.
#[derive(Debug, Clone)]
pub struct ColorFixture {
    pub name: &'static str,
    pub rgb: [u8; 3],
    pub expected_label: &'static str,
}

/// The mock endpoint scores the dominant channel of the center pixel, so
/// red, green and blue map to the first three labels.
pub const COLOR_FIXTURES: &[ColorFixture] = &[
    ColorFixture {
        name: "red",
        rgb: [230, 20, 20],
        expected_label: "Angus",
    },
    ColorFixture {
        name: "green",
        rgb: [20, 230, 20],
        expected_label: "Belted Galloway",
    },
    ColorFixture {
        name: "blue",
        rgb: [20, 20, 230],
        expected_label: "Charolais",
    },
];

fn encode(img: RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), format)
        .expect("encode fixture image");
    buf
}

pub fn solid_jpeg(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    encode(RgbImage::from_pixel(width, height, Rgb(rgb)), ImageFormat::Jpeg)
}

pub fn solid_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    encode(RgbImage::from_pixel(width, height, Rgb(rgb)), ImageFormat::Png)
}

pub fn garbage_bytes() -> Vec<u8> {
    b"GIF89a but not really, just some truncated junk".to_vec()
}
