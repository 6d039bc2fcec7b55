use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::DynamicImage;
use thiserror::Error;

/// Longer image dimension after the pre-storage resize.
pub const MAX_PICTURE_DIMENSION: u32 = 300;

#[derive(Debug, Error)]
pub enum PictureError {
    #[error("empty picture data")]
    Empty,
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Text form of a contact picture as stored in the `picture` column:
/// the raster bounded to 300px on its longer side, re-encoded as PNG,
/// then base64.
pub fn encode_picture(bytes: &[u8]) -> Result<String, PictureError> {
    if bytes.is_empty() {
        return Err(PictureError::Empty);
    }
    let img = image::load_from_memory(bytes)?;
    let img = if img.width().max(img.height()) > MAX_PICTURE_DIMENSION {
        img.thumbnail(MAX_PICTURE_DIMENSION, MAX_PICTURE_DIMENSION)
    } else {
        img
    };
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)?;
    Ok(STANDARD.encode(out.into_inner()))
}

pub fn decode_picture(encoded: &str) -> Result<DynamicImage, PictureError> {
    if encoded.is_empty() {
        return Err(PictureError::Empty);
    }
    let bytes = STANDARD.decode(encoded.as_bytes())?;
    Ok(image::load_from_memory(&bytes)?)
}
