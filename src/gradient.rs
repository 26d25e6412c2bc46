//! Linear colour gradients for backdrops and filled areas.
//!
//! Colours are interpolated in `f64` and truncated per channel.

use crate::draw::{blend_pixel, Bounds};
use image::{Rgba, RgbaImage};

/// Direction along which a gradient interpolates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// `t = (x + y) / (width + height)`
    Diagonal,
    /// `t = x / width`
    Horizontal,
    /// `t = y / height`
    Vertical,
}

/// Two-colour linear gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gradient {
    pub from: Rgba<u8>,
    pub to: Rgba<u8>,
    pub axis: Axis,
}

impl Gradient {
    pub const fn new(from: Rgba<u8>, to: Rgba<u8>, axis: Axis) -> Self {
        Self { from, to, axis }
    }

    pub const fn diagonal(from: Rgba<u8>, to: Rgba<u8>) -> Self {
        Self::new(from, to, Axis::Diagonal)
    }

    /// Interpolation factor for `(x, y)` in a `width` x `height` area, clamped
    /// to `[0, 1]`.
    pub fn factor(&self, x: u32, y: u32, width: u32, height: u32) -> f64 {
        let (num, den) = match self.axis {
            Axis::Diagonal => (x as f64 + y as f64, width as f64 + height as f64),
            Axis::Horizontal => (x as f64, width as f64),
            Axis::Vertical => (y as f64, height as f64),
        };
        if den <= 0.0 {
            return 0.0;
        }
        (num / den).clamp(0.0, 1.0)
    }

    /// Colour at `(x, y)`. Channels are truncated toward zero after
    /// interpolation.
    pub fn color_at(&self, x: u32, y: u32, width: u32, height: u32) -> Rgba<u8> {
        let t = self.factor(x, y, width, height);
        let mut out = [0u8; 4];
        for (c, value) in out.iter_mut().enumerate() {
            let start = self.from[c] as f64;
            let end = self.to[c] as f64;
            *value = (start + (end - start) * t) as u8;
        }
        Rgba(out)
    }

    pub fn render(&self, width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| self.color_at(x, y, width, height))
    }
}

/// Diagonal gradient image from `color_a` at the top-left towards `color_b`.
pub fn synthesize_gradient(
    width: u32,
    height: u32,
    color_a: Rgba<u8>,
    color_b: Rgba<u8>,
) -> RgbaImage {
    Gradient::diagonal(color_a, color_b).render(width, height)
}

/// Paint `gradient` inside `bounds`, with coordinates local to the rectangle.
pub fn fill_gradient_rect(img: &mut RgbaImage, bounds: Bounds, gradient: &Gradient) {
    let (xs, ys) = bounds.pixel_ranges(img.width(), img.height());
    let width = bounds.width().max(0.0).round() as u32;
    let height = bounds.height().max(0.0).round() as u32;
    let origin_x = bounds.x0.floor() as i64;
    let origin_y = bounds.y0.floor() as i64;

    for y in ys {
        for x in xs.clone() {
            let local_x = (x as i64 - origin_x).max(0) as u32;
            let local_y = (y as i64 - origin_y).max(0) as u32;
            let color = gradient.color_at(local_x, local_y, width, height);
            blend_pixel(img.get_pixel_mut(x, y), color, 1.0);
        }
    }
}
