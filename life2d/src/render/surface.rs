use glam::DAffine2;
use image::{Rgba, RgbaImage};

use crate::math::Vector2;

/// RGBA color, 8 bits per channel.
pub type Color = Rgba<u8>;

pub const BLACK: Color = Rgba([0, 0, 0, 255]);
pub const WHITE: Color = Rgba([255, 255, 255, 255]);

/// Placement of one image draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawOptions {
    /// Maps image pixel coordinates to surface pixel coordinates.
    pub transform: DAffine2,
    /// Multiplier applied to the image alpha, 0.0..=1.0.
    pub opacity: f64,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            transform: DAffine2::IDENTITY,
            opacity: 1.0,
        }
    }
}

impl DrawOptions {
    pub fn translated(x: f64, y: f64) -> Self {
        Self {
            transform: DAffine2::from_translation(glam::DVec2::new(x, y)),
            opacity: 1.0,
        }
    }
}

/// Anything shapes and level render hooks can draw onto.
pub trait Surface {
    /// Surface size in pixels.
    fn size(&self) -> (u32, u32);

    /// Replace every pixel with `color`.
    fn fill(&mut self, color: Color);

    /// Draw `image` through `options.transform`, scaling its alpha by
    /// `options.opacity`.
    fn draw_image(&mut self, image: &RgbaImage, options: &DrawOptions);

    /// Draw a line of text with its top-left corner at `position`.
    fn draw_text(&mut self, text: &str, position: Vector2, size: f64, color: Color);
}
