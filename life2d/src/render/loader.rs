use anyhow::{anyhow, Result};
use image::RgbaImage;

/// Decode an encoded image (PNG) into RGBA pixels.
pub fn load_image_from_bytes(bytes: &[u8]) -> Result<RgbaImage> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| anyhow!("Failed to decode image: {}", e))?;
    Ok(decoded.to_rgba8())
}

/// Read and decode an image file.
pub fn load_image_from_file(path: &str) -> Result<RgbaImage> {
    let bytes = std::fs::read(path).map_err(|e| anyhow!("Failed to read image {}: {}", path, e))?;
    load_image_from_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgba};
    use std::io::Cursor;

    #[test]
    fn decodes_png_bytes() {
        let src = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]));
        let mut encoded = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(src)
            .write_to(&mut encoded, ImageOutputFormat::Png)
            .unwrap();

        let img = load_image_from_bytes(encoded.get_ref()).unwrap();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(*img.get_pixel(2, 1), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(load_image_from_bytes(b"not an image").is_err());
    }
}
