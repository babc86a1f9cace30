//! Still-frame encoding for the vision model.
//!
//! Frames are downscaled to at most 1024px on the longest edge and sent as JPEG.

use std::io::Cursor;

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use image::{imageops::FilterType, DynamicImage, ImageFormat};

pub const MAX_FRAME_DIMENSION: u32 = 1024;

const FRAME_MEDIA_TYPE: &str = "image/jpeg";

/// A JPEG-encoded still captured from the camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl EncodedFrame {
    pub fn media_type(&self) -> &'static str {
        FRAME_MEDIA_TYPE
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameCapture {
    Ready(EncodedFrame),
    /// No acquired stream, or the stream has not produced a sized frame yet.
    NotReady,
}

pub fn encode_frame(img: &DynamicImage) -> Result<EncodedFrame> {
    if img.width() == 0 || img.height() == 0 {
        bail!("frame has no dimensions");
    }

    let resized = resize_if_needed(img, MAX_FRAME_DIMENSION);
    // The JPEG encoder rejects alpha channels.
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

    let mut buffer = Cursor::new(Vec::new());
    rgb.write_to(&mut buffer, ImageFormat::Jpeg)
        .context("failed to encode frame as JPEG")?;

    Ok(EncodedFrame {
        bytes: buffer.into_inner(),
        width: rgb.width(),
        height: rgb.height(),
    })
}

fn resize_if_needed(img: &DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = (img.width(), img.height());
    if width <= max_dimension && height <= max_dimension {
        return img.clone();
    }

    let scale = max_dimension as f32 / width.max(height) as f32;
    let new_width = ((width as f32 * scale) as u32).max(1);
    let new_height = ((height as f32 * scale) as u32).max(1);
    img.resize(new_width, new_height, FilterType::Triangle)
}
