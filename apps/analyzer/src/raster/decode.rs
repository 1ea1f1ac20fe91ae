use image::ImageFormat;
use tracing::warn;

use crate::raster::{AnalysisError, PixelBuffer, SourceFormat};

/// Decodes PNG/JPEG bytes using the declared format.
///
/// Bytes that do not match the declared format are a decode failure, not a sniffing fallback.
pub fn decode_image(bytes: &[u8], format: SourceFormat) -> Result<PixelBuffer, AnalysisError> {
    let image_format = match format {
        SourceFormat::Png => ImageFormat::Png,
        SourceFormat::Jpeg => ImageFormat::Jpeg,
        SourceFormat::Pdf => {
            return Err(AnalysisError::UnsupportedFormat(
                "PDF input must go through the page renderer".to_string(),
            ))
        }
    };

    let decoded = image::load_from_memory_with_format(bytes, image_format).map_err(|e| {
        warn!(?format, "Image decode failed: {e}");
        AnalysisError::DecodeFailure(format!("could not decode {format:?} image: {e}"))
    })?;

    Ok(PixelBuffer::from(decoded.to_rgba8()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Rgba;
    use image::{DynamicImage, RgbaImage};
    use std::io::Cursor;

    fn encode(img: RgbaImage, format: ImageFormat) -> Vec<u8> {
        let mut out = Vec::new();
        let dynamic = match format {
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(img).to_rgb8()),
            _ => DynamicImage::ImageRgba8(img),
        };
        dynamic.write_to(&mut Cursor::new(&mut out), format).unwrap();
        out
    }

    #[test]
    fn test_decode_png_preserves_pixels() {
        let img = RgbaImage::from_fn(5, 4, |x, _| {
            if x == 0 {
                image::Rgba([0, 0, 0, 255])
            } else {
                image::Rgba([255, 255, 255, 128])
            }
        });
        let buf = decode_image(&encode(img, ImageFormat::Png), SourceFormat::Png).unwrap();
        assert_eq!((buf.width(), buf.height()), (5, 4));
        assert_eq!(buf.get(0, 3), Rgba::opaque(0, 0, 0));
        assert_eq!(buf.get(4, 0), Rgba::new(255, 255, 255, 128));
    }

    #[test]
    fn test_decode_jpeg_is_opaque() {
        let img = RgbaImage::from_pixel(16, 16, image::Rgba([200, 200, 200, 255]));
        let buf = decode_image(&encode(img, ImageFormat::Jpeg), SourceFormat::Jpeg).unwrap();
        assert_eq!((buf.width(), buf.height()), (16, 16));
        assert!(buf.pixels().all(|p| p.a == 255));
    }

    #[test]
    fn test_decode_garbage_is_decode_failure() {
        let result = decode_image(b"definitely not a png", SourceFormat::Png);
        assert!(matches!(result, Err(AnalysisError::DecodeFailure(_))));
    }

    #[test]
    fn test_decode_png_declared_as_jpeg_fails() {
        let img = RgbaImage::from_pixel(2, 2, image::Rgba([1, 2, 3, 255]));
        let result = decode_image(&encode(img, ImageFormat::Png), SourceFormat::Jpeg);
        assert!(matches!(result, Err(AnalysisError::DecodeFailure(_))));
    }

    #[test]
    fn test_decode_rejects_pdf_format() {
        assert!(matches!(
            decode_image(b"%PDF-1.5", SourceFormat::Pdf),
            Err(AnalysisError::UnsupportedFormat(_))
        ));
    }
}
