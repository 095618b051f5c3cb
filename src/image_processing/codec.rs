use fast_image_resize::{images::Image, PixelType, ResizeOptions, Resizer};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, Rgba};
use std::io::Cursor;

use crate::error::CodecError;

/// Largest output accepted by [`FastResizeCodec`], in pixels (about 100 MP).
pub const MAX_OUTPUT_PIXELS: u64 = 100_000_000;

/// Turns encoded image bytes into encoded image bytes of the requested size.
///
/// Implementations are synchronous; the executor runs them on a blocking
/// worker so a slow decode never stalls message intake.
pub trait ImageCodec: Send + Sync {
    fn resize(&self, bytes: &[u8], width: u32, height: u32) -> Result<Vec<u8>, CodecError>;
}

/// Default codec: decodes with `image`, resamples with `fast_image_resize`
/// and re-encodes in the source format. Output is exactly `width`×`height`;
/// aspect ratio is not preserved.
#[derive(Debug, Default, Clone)]
pub struct FastResizeCodec;

impl ImageCodec for FastResizeCodec {
    fn resize(&self, bytes: &[u8], width: u32, height: u32) -> Result<Vec<u8>, CodecError> {
        let pixels = u64::from(width) * u64::from(height);
        if pixels > MAX_OUTPUT_PIXELS {
            return Err(CodecError::Resize(format!(
                "{}x{} exceeds the {} pixel output limit",
                width, height, MAX_OUTPUT_PIXELS
            )));
        }

        let format = image::guess_format(bytes).map_err(CodecError::UnknownFormat)?;
        let img = image::load_from_memory_with_format(bytes, format).map_err(CodecError::Decode)?;

        let resized = if format == ImageFormat::Jpeg || !img.color().has_alpha() {
            DynamicImage::ImageRgb8(resize_rgb(&img, width, height)?)
        } else {
            DynamicImage::ImageRgba8(resize_rgba(&img, width, height)?)
        };

        let mut output = Cursor::new(Vec::new());
        resized
            .write_to(&mut output, format)
            .map_err(CodecError::Encode)?;
        Ok(output.into_inner())
    }
}

fn resize_rgb(
    img: &DynamicImage,
    width: u32,
    height: u32,
) -> Result<ImageBuffer<Rgb<u8>, Vec<u8>>, CodecError> {
    let src = img.to_rgb8();
    if src.dimensions() == (width, height) {
        return Ok(src);
    }
    let (src_width, src_height) = src.dimensions();
    let pixels = resize_pixels(src.into_raw(), src_width, src_height, width, height, PixelType::U8x3)?;
    ImageBuffer::from_raw(width, height, pixels)
        .ok_or_else(|| CodecError::Resize("resized buffer has unexpected length".to_string()))
}

fn resize_rgba(
    img: &DynamicImage,
    width: u32,
    height: u32,
) -> Result<ImageBuffer<Rgba<u8>, Vec<u8>>, CodecError> {
    let src = img.to_rgba8();
    if src.dimensions() == (width, height) {
        return Ok(src);
    }
    let (src_width, src_height) = src.dimensions();
    let pixels = resize_pixels(src.into_raw(), src_width, src_height, width, height, PixelType::U8x4)?;
    ImageBuffer::from_raw(width, height, pixels)
        .ok_or_else(|| CodecError::Resize("resized buffer has unexpected length".to_string()))
}

/// Resample a packed pixel buffer with the default (Lanczos3 convolution)
/// filter.
fn resize_pixels(
    src_pixels: Vec<u8>,
    src_width: u32,
    src_height: u32,
    width: u32,
    height: u32,
    pixel_type: PixelType,
) -> Result<Vec<u8>, CodecError> {
    if src_width == 0 || src_height == 0 {
        return Err(CodecError::Resize("source image is empty".to_string()));
    }
    if width == 0 || height == 0 {
        return Err(CodecError::Resize("target dimensions must be non-zero".to_string()));
    }

    let src_image = Image::from_vec_u8(src_width, src_height, src_pixels, pixel_type)
        .map_err(|e| CodecError::Resize(e.to_string()))?;
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(pixel_type.size()))
        .ok_or_else(|| CodecError::Resize(format!("{}x{} output buffer is too large", width, height)))?;
    let mut dst_image = Image::new(width, height, pixel_type);

    let mut resizer = Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, Some(&ResizeOptions::default()))
        .map_err(|e| CodecError::Resize(e.to_string()))?;

    Ok(dst_image.buffer().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn create_test_image(width: u32, height: u32) -> RgbImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_png_resized_to_exact_dimensions() {
        let bytes = encode(DynamicImage::ImageRgb8(create_test_image(80, 60)), ImageFormat::Png);
        let resized = FastResizeCodec.resize(&bytes, 40, 30).unwrap();

        assert_eq!(image::guess_format(&resized).unwrap(), ImageFormat::Png);
        let decoded = image::load_from_memory(&resized).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 30));
    }

    #[test]
    fn test_aspect_ratio_is_not_preserved() {
        let bytes = encode(DynamicImage::ImageRgb8(create_test_image(100, 100)), ImageFormat::Png);
        let resized = FastResizeCodec.resize(&bytes, 120, 20).unwrap();
        let decoded = image::load_from_memory(&resized).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (120, 20));
    }

    #[test]
    fn test_jpeg_stays_jpeg() {
        let bytes = encode(DynamicImage::ImageRgb8(create_test_image(64, 48)), ImageFormat::Jpeg);
        let resized = FastResizeCodec.resize(&bytes, 32, 24).unwrap();

        assert_eq!(image::guess_format(&resized).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&resized).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 24));
    }

    #[test]
    fn test_gif_stays_gif() {
        let rgba = ImageBuffer::from_fn(40, 30, |x, y| Rgba([(x * 6) as u8, (y * 8) as u8, 90, 255]));
        let bytes = encode(DynamicImage::ImageRgba8(rgba), ImageFormat::Gif);
        let resized = FastResizeCodec.resize(&bytes, 20, 15).unwrap();

        assert_eq!(image::guess_format(&resized).unwrap(), ImageFormat::Gif);
        let decoded = image::load_from_memory(&resized).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (20, 15));
    }

    #[test]
    fn test_alpha_channel_survives() {
        let rgba = ImageBuffer::from_fn(20, 20, |x, _| Rgba([255, 0, 0, if x < 10 { 0 } else { 255 }]));
        let bytes = encode(DynamicImage::ImageRgba8(rgba), ImageFormat::Png);
        let resized = FastResizeCodec.resize(&bytes, 10, 10).unwrap();
        let decoded = image::load_from_memory(&resized).unwrap();
        assert!(decoded.color().has_alpha());
    }

    #[test]
    fn test_garbage_is_rejected() {
        let err = FastResizeCodec.resize(b"definitely not an image", 10, 10).unwrap_err();
        assert!(matches!(err, CodecError::UnknownFormat(_)));
    }

    #[test]
    fn test_zero_target_is_rejected() {
        let bytes = encode(DynamicImage::ImageRgb8(create_test_image(10, 10)), ImageFormat::Png);
        assert!(matches!(
            FastResizeCodec.resize(&bytes, 0, 10),
            Err(CodecError::Resize(_))
        ));
    }

    #[test]
    fn test_oversized_target_is_rejected() {
        let bytes = encode(DynamicImage::ImageRgb8(create_test_image(10, 10)), ImageFormat::Png);
        for (width, height) in [(u32::MAX, u32::MAX), (20_000, 20_000), (u32::MAX, 1)] {
            assert!(matches!(
                FastResizeCodec.resize(&bytes, width, height),
                Err(CodecError::Resize(_))
            ));
        }
    }
}
