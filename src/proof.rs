//! Payment-proof image preparation.
//!
//! Cashiers photograph transfer receipts on whatever phone they have, so
//! the raw upload can be a 12 MP image. Before it rides inside a JSON
//! payload it is downscaled, JPEG-compressed against a size ceiling, and
//! wrapped in a data URI the backend stores verbatim.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::imageops::FilterType;
use tracing::{debug, warn};

use crate::error::PosError;

/// Longest edge after downscaling. Receipts stay readable well below this.
const MAX_EDGE: u32 = 1280;

/// Ceiling for the encoded JPEG, before base64 expansion.
const MAX_ENCODED_BYTES: usize = 1024 * 1024;

/// JPEG qualities tried in order until the ceiling is met.
const QUALITY_LADDER: &[u8] = &[80, 70, 60, 50, 40];

/// Compresses raw image bytes into a `data:image/jpeg;base64,` URI.
///
/// The image is downscaled so its longest edge is at most 1280 px (never
/// upscaled), then JPEG-encoded at descending quality until the result
/// fits under 1 MiB. The ceiling is best-effort: when even the lowest
/// quality exceeds it, the smallest attempt is kept and a warning logged
/// rather than losing the proof.
pub fn prepare_payment_proof(bytes: &[u8]) -> Result<String, PosError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| PosError::Media(format!("Payment proof is not a readable image: {e}")))?;
    let rgb = decoded.to_rgb8();
    let (src_w, src_h) = rgb.dimensions();
    if src_w == 0 || src_h == 0 {
        return Err(PosError::Media(
            "Payment proof image has invalid dimensions".to_string(),
        ));
    }

    let resized = if src_w.max(src_h) > MAX_EDGE {
        let scale = MAX_EDGE as f32 / src_w.max(src_h) as f32;
        let target_w = ((src_w as f32 * scale).round() as u32).max(1);
        let target_h = ((src_h as f32 * scale).round() as u32).max(1);
        image::imageops::resize(&rgb, target_w, target_h, FilterType::Triangle)
    } else {
        rgb
    };

    let mut encoded = Vec::new();
    for (attempt, &quality) in QUALITY_LADDER.iter().enumerate() {
        encoded = encode_jpeg(&resized, quality)?;
        if encoded.len() <= MAX_ENCODED_BYTES {
            debug!(
                quality,
                bytes = encoded.len(),
                attempts = attempt + 1,
                "payment proof compressed"
            );
            return Ok(to_data_url(&encoded));
        }
    }

    warn!(
        bytes = encoded.len(),
        ceiling = MAX_ENCODED_BYTES,
        "payment proof exceeds size ceiling even at lowest quality; keeping it"
    );
    Ok(to_data_url(&encoded))
}

fn encode_jpeg(
    img: &image::ImageBuffer<image::Rgb<u8>, Vec<u8>>,
    quality: u8,
) -> Result<Vec<u8>, PosError> {
    let mut buf = Vec::new();
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(std::io::Cursor::new(&mut buf), quality);
    encoder
        .encode_image(img)
        .map_err(|e| PosError::Media(format!("Payment proof could not be encoded: {e}")))?;
    Ok(buf)
}

fn to_data_url(jpeg: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", BASE64.encode(jpeg))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::ImageBuffer::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128u8])
        });
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .expect("encode test png");
        buf
    }

    fn decode_data_url(data_url: &str) -> image::DynamicImage {
        let payload = data_url
            .strip_prefix("data:image/jpeg;base64,")
            .expect("jpeg data url prefix");
        let bytes = BASE64.decode(payload).expect("valid base64");
        image::load_from_memory(&bytes).expect("valid jpeg payload")
    }

    #[test]
    fn small_images_are_not_upscaled() {
        let out = prepare_payment_proof(&png_bytes(100, 50)).expect("prepare");
        let img = decode_data_url(&out);
        assert_eq!(img.width(), 100);
        assert_eq!(img.height(), 50);
    }

    #[test]
    fn long_edge_is_capped_preserving_aspect() {
        let out = prepare_payment_proof(&png_bytes(2560, 1280)).expect("prepare");
        let img = decode_data_url(&out);
        assert_eq!(img.width(), 1280);
        assert_eq!(img.height(), 640);
    }

    #[test]
    fn portrait_images_cap_on_height() {
        let out = prepare_payment_proof(&png_bytes(1000, 3000)).expect("prepare");
        let img = decode_data_url(&out);
        assert_eq!(img.height(), 1280);
        assert_eq!(img.width(), 427);
    }

    #[test]
    fn output_is_a_jpeg_data_url_under_the_ceiling() {
        let out = prepare_payment_proof(&png_bytes(1920, 1080)).expect("prepare");
        assert!(out.starts_with("data:image/jpeg;base64,"));
        let payload = out.trim_start_matches("data:image/jpeg;base64,");
        let jpeg = BASE64.decode(payload).expect("valid base64");
        assert!(jpeg.len() <= MAX_ENCODED_BYTES);
    }

    #[test]
    fn unreadable_bytes_are_a_media_error() {
        let err = prepare_payment_proof(b"definitely not an image").expect_err("must fail");
        assert!(matches!(err, PosError::Media(_)));
    }
}
