//! Image encoding: `DynamicImage` → base64 JPEG wrapped in an [`ImagePart`].
//!
//! The model receives the page inline as base64 with an `image/jpeg` MIME
//! tag. pdfium hands back RGBA bitmaps and the JPEG encoder has no alpha
//! channel, so the image is flattened to RGB first.

use crate::output::ImagePart;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use tracing::debug;

/// Encode a rasterised page as a base64 JPEG.
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<ImagePart, image::ImageError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut buf = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))?;

    let b64 = STANDARD.encode(&buf);
    debug!(
        "Encoded {}x{} page → {} bytes JPEG, {} bytes base64",
        rgb.width(),
        rgb.height(),
        buf.len(),
        b64.len()
    );

    Ok(ImagePart::jpeg(b64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, ImageFormat, Rgba, RgbaImage};

    #[test]
    fn encodes_rgba_page_as_decodable_jpeg() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 24, Rgba([255, 0, 0, 255])));
        let part = encode_jpeg(&img, 90).expect("encode should succeed");
        assert_eq!(part.mime_type, "image/jpeg");

        let bytes = STANDARD.decode(&part.data).expect("valid base64");
        assert_eq!(&bytes[..2], &[0xFF, 0xD8], "JPEG SOI marker");

        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg)
            .expect("valid JPEG");
        assert_eq!(decoded.dimensions(), (40, 24));
    }

    #[test]
    fn lower_quality_is_not_larger() {
        // Noisy content so quality actually matters.
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_fn(64, 64, |x, y| {
            image::Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x ^ y) * 5 % 256) as u8])
        }));
        let high = encode_jpeg(&img, 95).unwrap();
        let low = encode_jpeg(&img, 20).unwrap();
        assert!(low.data.len() <= high.data.len());
    }
}
