//! Decoding of base64 image payloads into RGB buffers.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, RgbImage};
use thiserror::Error;

/// Largest decoded payload accepted (20 MiB).
pub const MAX_IMAGE_SIZE: usize = 20 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image data is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("invalid base64 encoding: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("unsupported image format")]
    UnsupportedFormat,

    #[error("failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("image data is empty")]
    EmptyData,

    #[error("failed to read image file: {0}")]
    Io(#[from] std::io::Error),
}

/// A request-scoped image: the original bytes plus the RGB pixel buffer.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    bytes: Vec<u8>,
    rgb: RgbImage,
    format: ImageFormat,
}

impl DecodedImage {
    /// Raw encoded bytes as they arrived (PNG, JPEG, ...).
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    pub fn height(&self) -> u32 {
        self.rgb.height()
    }
}

/// Decodes a base64 payload, optionally prefixed with a `data:` URL header.
/// Whitespace inside the payload is ignored.
pub fn decode_base64_image(encoded: &str) -> Result<DecodedImage, ImageError> {
    // `base64` wraps its output at 76 columns by default
    let payload: String = strip_data_url(encoded.trim())
        .split_ascii_whitespace()
        .collect();
    if payload.is_empty() {
        return Err(ImageError::EmptyData);
    }

    let bytes = STANDARD.decode(&payload)?;
    decode_image_bytes(bytes)
}

/// Decodes raw image bytes.
pub fn decode_image_bytes(bytes: Vec<u8>) -> Result<DecodedImage, ImageError> {
    if bytes.len() > MAX_IMAGE_SIZE {
        return Err(ImageError::TooLarge(bytes.len(), MAX_IMAGE_SIZE));
    }
    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }

    let format = detect_format(&bytes)?;
    let rgb = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?
        .to_rgb8();

    Ok(DecodedImage { bytes, rgb, format })
}

/// Reads an image file and returns it base64-encoded.
pub fn encode_image_file(path: &Path) -> Result<String, ImageError> {
    let bytes = std::fs::read(path)?;
    Ok(STANDARD.encode(bytes))
}

fn strip_data_url(input: &str) -> &str {
    if input.starts_with("data:") {
        if let Some(idx) = input.find(";base64,") {
            return &input[idx + ";base64,".len()..];
        }
    }
    input
}

/// Detect image format from magic bytes
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    if bytes.len() < 4 {
        return Err(ImageError::UnsupportedFormat);
    }

    match bytes {
        [0x89, 0x50, 0x4E, 0x47, ..] => Ok(ImageFormat::Png),
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Ok(ImageFormat::WebP),
        [0x47, 0x49, 0x46, 0x38, x, ..] if *x == 0x37 || *x == 0x39 => Ok(ImageFormat::Gif),
        [0x42, 0x4D, ..] => Ok(ImageFormat::Bmp),
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => Ok(ImageFormat::Tiff),
        _ => Err(ImageError::UnsupportedFormat),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    // 1x1 red PNG
    pub(crate) const TINY_PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    const TINY_GIF_BASE64: &str = "R0lGODlhAQABAIAAAP///wAAACH5BAEAAAAALAAAAAABAAEAAAICRAEAOw==";

    #[test]
    fn test_decode_png() {
        let image = decode_base64_image(TINY_PNG_BASE64).unwrap();
        assert_eq!(image.width(), 1);
        assert_eq!(image.height(), 1);
        assert_eq!(image.format(), ImageFormat::Png);
        assert_eq!(image.mime_type(), "image/png");
        assert_eq!(&image.bytes()[..4], &[0x89, 0x50, 0x4E, 0x47]);
    }

    #[test]
    fn test_decode_gif_converts_to_rgb() {
        let image = decode_base64_image(TINY_GIF_BASE64).unwrap();
        assert_eq!(image.format(), ImageFormat::Gif);
        assert_eq!(image.rgb().as_raw().len(), 3);
    }

    #[test]
    fn test_decode_data_url_and_whitespace() {
        let input = format!("  data:image/png;base64,{}\n", TINY_PNG_BASE64);
        assert!(decode_base64_image(&input).is_ok());
    }

    #[test]
    fn test_decode_line_wrapped_payload() {
        let (head, tail) = TINY_PNG_BASE64.split_at(76);
        let wrapped = format!("{}\n{}\r\n", head, tail);
        let image = decode_base64_image(&wrapped).unwrap();
        assert_eq!(image.format(), ImageFormat::Png);

        let data_url = format!("data:image/png;base64,{}\n{}", head, tail);
        assert!(decode_base64_image(&data_url).is_ok());
    }

    #[test]
    fn test_invalid_base64() {
        let err = decode_base64_image("not-valid-base64!!!").unwrap_err();
        assert!(matches!(err, ImageError::InvalidBase64(_)));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(decode_base64_image("").unwrap_err(), ImageError::EmptyData));
        assert!(matches!(decode_base64_image("   ").unwrap_err(), ImageError::EmptyData));
    }

    #[test]
    fn test_unsupported_format() {
        let encoded = STANDARD.encode([0x00, 0x01, 0x02, 0x03, 0x04, 0x05]);
        let err = decode_base64_image(&encoded).unwrap_err();
        assert!(matches!(err, ImageError::UnsupportedFormat));
    }

    #[test]
    fn test_corrupted_png() {
        let encoded = STANDARD.encode([0x89, 0x50, 0x4E, 0x47, 0x00, 0x00, 0x00, 0x00]);
        let err = decode_base64_image(&encoded).unwrap_err();
        assert!(matches!(err, ImageError::DecodeFailed(_)));
    }

    #[test]
    fn test_too_large() {
        let err = decode_image_bytes(vec![0u8; MAX_IMAGE_SIZE + 1]).unwrap_err();
        assert!(matches!(err, ImageError::TooLarge(_, _)));
    }

    #[test]
    fn test_detect_format_headers() {
        assert_eq!(detect_format(&[0xFF, 0xD8, 0xFF, 0xE0]).unwrap(), ImageFormat::Jpeg);
        assert_eq!(detect_format(&[0x42, 0x4D, 0x00, 0x00]).unwrap(), ImageFormat::Bmp);
        assert_eq!(
            detect_format(&[0x52, 0x49, 0x46, 0x46, 0, 0, 0, 0, 0x57, 0x45, 0x42, 0x50]).unwrap(),
            ImageFormat::WebP
        );
        assert!(detect_format(&[0x00, 0x00]).is_err());
    }

    #[test]
    fn test_encode_image_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        std::fs::write(&path, STANDARD.decode(TINY_PNG_BASE64).unwrap()).unwrap();
        let encoded = encode_image_file(&path).unwrap();
        assert_eq!(encoded, TINY_PNG_BASE64);
    }
}
