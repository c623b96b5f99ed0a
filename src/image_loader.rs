// Image loading module
// Decodes animation frames and converts them to the shm canvas pixel layout

use crate::error::AssetError;
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// A decoded frame ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Premultiplied BGRA pixel data (4 bytes per pixel)
    pub bgra_data: Vec<u8>,
}

impl Frame {
    /// A fully transparent frame
    #[cfg(test)]
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bgra_data: vec![0u8; (width * height * 4) as usize],
        }
    }
}

/// Load a frame from disk, scaled to exactly `width` x `height`
pub fn load_frame(path: &Path, width: u32, height: u32) -> Result<Frame, AssetError> {
    let data = fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let img = load_from_bytes(&data).map_err(|source| AssetError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let img = if img.width() != width || img.height() != height {
        img.resize_exact(width, height, image::imageops::FilterType::Lanczos3)
    } else {
        img
    };

    Ok(frame_from_rgba(img.to_rgba8()))
}

/// Convert an RGBA image into a premultiplied BGRA frame
pub fn frame_from_rgba(rgba: RgbaImage) -> Frame {
    let (width, height) = rgba.dimensions();

    // Wayland Argb8888 is BGRA in little-endian memory with premultiplied alpha
    let mut bgra_data = rgba.into_raw();
    for pixel in bgra_data.chunks_exact_mut(4) {
        pixel.swap(0, 2);
        let a = pixel[3] as u32;
        if a < 255 {
            pixel[0] = (pixel[0] as u32 * a / 255) as u8;
            pixel[1] = (pixel[1] as u32 * a / 255) as u8;
            pixel[2] = (pixel[2] as u32 * a / 255) as u8;
        }
    }

    Frame {
        width,
        height,
        bgra_data,
    }
}

/// Load an image from raw bytes, auto-detecting the format
fn load_from_bytes(data: &[u8]) -> Result<DynamicImage, image::ImageError> {
    let format = image::guess_format(data)?;
    image::load(Cursor::new(data), format)
}

/// Get the frame image format from a file extension
pub fn format_from_extension(ext: &str) -> Option<ImageFormat> {
    match ext.to_lowercase().as_str() {
        "png" => Some(ImageFormat::Png),
        "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
        "gif" => Some(ImageFormat::Gif),
        _ => None,
    }
}

/// Whether a path has one of the accepted frame extensions
pub fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(format_from_extension)
        .is_some()
}

/// Pink ellipse shown when no animation could be loaded
pub fn placeholder_frame(width: u32, height: u32) -> Frame {
    let mut img = RgbaImage::new(width, height);
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let rx = (width as f32 / 2.0 - 10.0).max(1.0);
    let ry = (height as f32 / 2.0 - 10.0).max(1.0);

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let dx = (x as f32 + 0.5 - cx) / rx;
        let dy = (y as f32 + 0.5 - cy) / ry;
        let d = dx * dx + dy * dy;
        if d <= 1.0 {
            // Thin hot-pink outline around a light pink body
            *pixel = if d > 0.96 {
                image::Rgba([255, 105, 180, 255])
            } else {
                image::Rgba([255, 182, 193, 200])
            };
        }
    }

    frame_from_rgba(img)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(path: &Path, width: u32, height: u32) {
        let img = RgbaImage::from_pixel(width, height, image::Rgba([200, 100, 50, 255]));
        img.save(path).unwrap();
    }

    #[test]
    fn test_load_frame_scales_to_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("000.png");
        write_png(&path, 8, 4);

        let frame = load_frame(&path, 16, 10).unwrap();
        assert_eq!(frame.width, 16);
        assert_eq!(frame.height, 10);
        assert_eq!(frame.bgra_data.len(), 16 * 10 * 4);
    }

    #[test]
    fn test_load_frame_swaps_to_bgra() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        write_png(&path, 2, 2);

        let frame = load_frame(&path, 2, 2).unwrap();
        assert_eq!(&frame.bgra_data[0..4], &[50, 100, 200, 255]);
    }

    #[test]
    fn test_corrupt_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        fs::write(&path, b"definitely not a png").unwrap();

        let err = load_frame(&path, 4, 4).unwrap_err();
        assert!(matches!(err, AssetError::Decode { .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_frame(&dir.path().join("nope.png"), 4, 4).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    #[test]
    fn test_frame_extensions() {
        assert!(is_frame_file(Path::new("a/001.png")));
        assert!(is_frame_file(Path::new("a/001.JPG")));
        assert!(is_frame_file(Path::new("a/001.jpeg")));
        assert!(is_frame_file(Path::new("a/001.gif")));
        assert!(!is_frame_file(Path::new("a/001.webp")));
        assert!(!is_frame_file(Path::new("a/notes")));
    }

    #[test]
    fn test_premultiplied_alpha() {
        let img = RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 0]));
        let frame = frame_from_rgba(img);
        assert_eq!(frame.bgra_data, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_placeholder_has_transparent_corners() {
        let frame = placeholder_frame(40, 50);
        assert_eq!(frame.bgra_data[3], 0);
        let center = ((25 * 40 + 20) * 4) as usize;
        assert!(frame.bgra_data[center + 3] > 0);
    }
}
