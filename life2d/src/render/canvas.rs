use glam::DVec2;
use image::{Rgba, RgbaImage};

use super::surface::{Color, DrawOptions, Surface};
use crate::math::Vector2;

/// A text draw the canvas could not rasterize itself.
#[derive(Clone, Debug, PartialEq)]
pub struct TextCommand {
    pub text: String,
    pub position: Vector2,
    pub size: f64,
    pub color: Color,
}

/// CPU surface backed by an `RgbaImage`.
///
/// Images are blitted with nearest-neighbour sampling through the inverse of
/// the draw transform. There is no glyph rasterizer: text draws are kept in
/// order so the host can composite them with whatever font stack it has.
pub struct Canvas {
    pixels: RgbaImage,
    text: Vec<TextCommand>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
            text: Vec::new(),
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        (x < self.pixels.width() && y < self.pixels.height()).then(|| *self.pixels.get_pixel(x, y))
    }

    /// Text draws issued since the last `fill`.
    pub fn text_commands(&self) -> &[TextCommand] {
        &self.text
    }

    fn blend(&mut self, x: u32, y: u32, src: Color, opacity: f64) {
        let alpha = (src[3] as f64 / 255.0) * opacity.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let dst = self.pixels.get_pixel_mut(x, y);
        let mix = |s: u8, d: u8| (s as f64 * alpha + d as f64 * (1.0 - alpha)).round() as u8;
        let out_alpha = alpha + (dst[3] as f64 / 255.0) * (1.0 - alpha);
        *dst = Rgba([
            mix(src[0], dst[0]),
            mix(src[1], dst[1]),
            mix(src[2], dst[2]),
            (out_alpha * 255.0).round() as u8,
        ]);
    }
}

impl Surface for Canvas {
    fn size(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    fn fill(&mut self, color: Color) {
        for p in self.pixels.pixels_mut() {
            *p = color;
        }
        self.text.clear();
    }

    fn draw_image(&mut self, image: &RgbaImage, options: &DrawOptions) {
        let (iw, ih) = image.dimensions();
        if iw == 0 || ih == 0 || options.opacity <= 0.0 {
            return;
        }
        if options.transform.matrix2.determinant().abs() < f64::EPSILON {
            return;
        }

        // Destination bounding box of the transformed image rectangle.
        let corners = [
            DVec2::new(0.0, 0.0),
            DVec2::new(iw as f64, 0.0),
            DVec2::new(0.0, ih as f64),
            DVec2::new(iw as f64, ih as f64),
        ]
        .map(|c| options.transform.transform_point2(c));
        let (min, max) = corners
            .iter()
            .fold((corners[0], corners[0]), |(lo, hi), c| (lo.min(*c), hi.max(*c)));

        let (cw, ch) = self.pixels.dimensions();
        let x0 = min.x.floor().max(0.0) as u32;
        let y0 = min.y.floor().max(0.0) as u32;
        let x1 = (max.x.ceil().max(0.0) as u32).min(cw);
        let y1 = (max.y.ceil().max(0.0) as u32).min(ch);

        let inverse = options.transform.inverse();
        for y in y0..y1 {
            for x in x0..x1 {
                let src = inverse.transform_point2(DVec2::new(x as f64 + 0.5, y as f64 + 0.5));
                if src.x < 0.0 || src.y < 0.0 || src.x >= iw as f64 || src.y >= ih as f64 {
                    continue;
                }
                let texel = *image.get_pixel(src.x as u32, src.y as u32);
                self.blend(x, y, texel, options.opacity);
            }
        }
    }

    fn draw_text(&mut self, text: &str, position: Vector2, size: f64, color: Color) {
        self.text.push(TextCommand {
            text: text.to_string(),
            position,
            size,
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::surface::{BLACK, WHITE};

    #[test]
    fn translated_blit_lands_at_offset() {
        let mut canvas = Canvas::new(10, 10);
        canvas.fill(BLACK);
        let red = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
        canvas.draw_image(&red, &DrawOptions::translated(3.0, 4.0));

        assert_eq!(canvas.pixel(3, 4), Some(Rgba([255, 0, 0, 255])));
        assert_eq!(canvas.pixel(4, 5), Some(Rgba([255, 0, 0, 255])));
        assert_eq!(canvas.pixel(2, 4), Some(BLACK));
        assert_eq!(canvas.pixel(5, 4), Some(BLACK));
    }

    #[test]
    fn opacity_blends_with_background() {
        let mut canvas = Canvas::new(1, 1);
        canvas.fill(BLACK);
        let white = RgbaImage::from_pixel(1, 1, WHITE);
        canvas.draw_image(
            &white,
            &DrawOptions {
                opacity: 0.5,
                ..DrawOptions::default()
            },
        );
        let p = canvas.pixel(0, 0).unwrap();
        assert!((127..=128).contains(&p[0]));
    }

    #[test]
    fn fill_clears_pending_text() {
        let mut canvas = Canvas::new(4, 4);
        canvas.draw_text("score", Vector2::new(1.0, 1.0), 12.0, WHITE);
        assert_eq!(canvas.text_commands().len(), 1);
        canvas.fill(BLACK);
        assert!(canvas.text_commands().is_empty());
    }

    #[test]
    fn off_canvas_draws_are_clipped() {
        let mut canvas = Canvas::new(4, 4);
        canvas.fill(BLACK);
        let img = RgbaImage::from_pixel(3, 3, WHITE);
        canvas.draw_image(&img, &DrawOptions::translated(-10.0, -10.0));
        canvas.draw_image(&img, &DrawOptions::translated(2.0, 2.0));
        assert_eq!(canvas.pixel(3, 3), Some(WHITE));
        assert_eq!(canvas.pixel(0, 0), Some(BLACK));
    }
}
