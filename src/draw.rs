//! Flat-filled shape rasterisation.
//!
//! Geometry is continuous: a pixel is covered when its centre
//! `(x + 0.5, y + 0.5)` falls inside the shape. Fills are blended with the
//! "over" operator, so a translucent fill tints what is already there.

use crate::compositor::blend_over;
use image::{Rgba, RgbaImage};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Axis-aligned rectangle from `(x0, y0)` to `(x1, y1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Bounds {
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn from_size(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Box whose far column `x1` and row `y1` are painted too.
    pub fn inclusive(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self::new(x0, y0, x1 + 1.0, y1 + 1.0)
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    /// Pixel columns and rows touched by these bounds, clipped to the image.
    pub(crate) fn pixel_ranges(&self, width: u32, height: u32) -> (Range<u32>, Range<u32>) {
        (
            clip_span(self.x0, self.x1, width),
            clip_span(self.y0, self.y1, height),
        )
    }
}

fn clip_span(start: f32, end: f32, limit: u32) -> Range<u32> {
    let lo = start.floor().max(0.0).min(limit as f32) as u32;
    let hi = end.ceil().max(0.0).min(limit as f32) as u32;
    lo..hi.max(lo)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Ellipse inscribed in the bounds.
    Ellipse(Bounds),
    RoundedRect { bounds: Bounds, radius: f32 },
    /// Closed polygon, filled with the even-odd rule.
    Polygon(Vec<Point>),
}

impl Shape {
    pub fn bounding_box(&self) -> Bounds {
        match self {
            Shape::Ellipse(bounds) | Shape::RoundedRect { bounds, .. } => *bounds,
            Shape::Polygon(points) => points.iter().fold(
                Bounds::new(f32::MAX, f32::MAX, f32::MIN, f32::MIN),
                |acc, p| Bounds::new(acc.x0.min(p.x), acc.y0.min(p.y), acc.x1.max(p.x), acc.y1.max(p.y)),
            ),
        }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        match self {
            Shape::Ellipse(bounds) => {
                let rx = bounds.width() / 2.0;
                let ry = bounds.height() / 2.0;
                if rx <= 0.0 || ry <= 0.0 {
                    return false;
                }
                let dx = (x - (bounds.x0 + rx)) / rx;
                let dy = (y - (bounds.y0 + ry)) / ry;
                dx * dx + dy * dy <= 1.0
            }
            Shape::RoundedRect { bounds, radius } => {
                if !bounds.contains(x, y) {
                    return false;
                }
                let r = radius
                    .max(0.0)
                    .min(bounds.width() / 2.0)
                    .min(bounds.height() / 2.0);
                // Distance to the inner rectangle shrunk by the corner radius
                let cx = x.clamp(bounds.x0 + r, bounds.x1 - r);
                let cy = y.clamp(bounds.y0 + r, bounds.y1 - r);
                (x - cx).powi(2) + (y - cy).powi(2) <= r * r
            }
            Shape::Polygon(points) => polygon_contains(points, x, y),
        }
    }
}

fn polygon_contains(points: &[Point], x: f32, y: f32) -> bool {
    if points.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (a, b) = (points[i], points[j]);
        if (a.y > y) != (b.y > y) {
            let cross_x = a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y);
            if x < cross_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Blend `color` into `pixel`, scaling its alpha by `coverage` in `0.0..=1.0`.
pub fn blend_pixel(pixel: &mut Rgba<u8>, color: Rgba<u8>, coverage: f32) {
    let coverage = coverage.clamp(0.0, 1.0);
    let alpha = (color[3] as f32 * coverage).round() as u8;
    *pixel = blend_over(*pixel, Rgba([color[0], color[1], color[2], alpha]));
}

pub fn draw_shape(img: &mut RgbaImage, shape: &Shape, fill: Rgba<u8>) {
    let (xs, ys) = shape.bounding_box().pixel_ranges(img.width(), img.height());
    for y in ys {
        for x in xs.clone() {
            if shape.contains(x as f32 + 0.5, y as f32 + 0.5) {
                blend_pixel(img.get_pixel_mut(x, y), fill, 1.0);
            }
        }
    }
}

pub fn fill_rect(img: &mut RgbaImage, bounds: Bounds, fill: Rgba<u8>) {
    draw_shape(
        img,
        &Shape::RoundedRect {
            bounds,
            radius: 0.0,
        },
        fill,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

    #[test]
    fn test_ellipse_fills_centre_not_corners() {
        let mut img = RgbaImage::new(20, 20);
        draw_shape(&mut img, &Shape::Ellipse(Bounds::new(0.0, 0.0, 20.0, 20.0)), RED);

        assert_eq!(*img.get_pixel(10, 10), RED);
        assert_eq!(*img.get_pixel(0, 10), RED);
        assert_eq!(*img.get_pixel(0, 0), CLEAR);
        assert_eq!(*img.get_pixel(19, 19), CLEAR);
    }

    #[test]
    fn test_rounded_rect_cuts_corners() {
        let mut img = RgbaImage::new(40, 40);
        let shape = Shape::RoundedRect {
            bounds: Bounds::new(0.0, 0.0, 40.0, 40.0),
            radius: 10.0,
        };
        draw_shape(&mut img, &shape, RED);

        assert_eq!(*img.get_pixel(0, 0), CLEAR);
        assert_eq!(*img.get_pixel(39, 39), CLEAR);
        assert_eq!(*img.get_pixel(20, 0), RED);
        assert_eq!(*img.get_pixel(0, 20), RED);
        assert_eq!(*img.get_pixel(20, 20), RED);
    }

    #[test]
    fn test_fill_rect_is_exact() {
        let mut img = RgbaImage::new(10, 10);
        fill_rect(&mut img, Bounds::from_size(2.0, 3.0, 4.0, 2.0), RED);

        let filled = img.pixels().filter(|p| **p == RED).count();
        assert_eq!(filled, 8);
        assert_eq!(*img.get_pixel(2, 3), RED);
        assert_eq!(*img.get_pixel(5, 4), RED);
        assert_eq!(*img.get_pixel(6, 4), CLEAR);
    }

    #[test]
    fn test_inclusive_bounds_paint_far_edge() {
        let mut img = RgbaImage::new(10, 10);
        fill_rect(&mut img, Bounds::inclusive(2.0, 3.0, 5.0, 4.0), RED);
        assert_eq!(img.pixels().filter(|p| **p == RED).count(), 8);
        assert_eq!(*img.get_pixel(5, 4), RED);
        assert_eq!(*img.get_pixel(6, 4), CLEAR);

        let mut img = RgbaImage::new(12, 12);
        draw_shape(&mut img, &Shape::Ellipse(Bounds::inclusive(0.0, 0.0, 10.0, 10.0)), RED);
        assert_eq!(*img.get_pixel(10, 5), RED);
        assert_eq!(*img.get_pixel(5, 10), RED);
        assert_eq!(*img.get_pixel(11, 5), CLEAR);
    }

    #[test]
    fn test_polygon_triangle() {
        let mut img = RgbaImage::new(60, 60);
        let triangle = Shape::Polygon(vec![
            Point::new(20.0, 15.0),
            Point::new(20.0, 45.0),
            Point::new(45.0, 30.0),
        ]);
        draw_shape(&mut img, &triangle, RED);

        assert_eq!(*img.get_pixel(25, 30), RED);
        assert_eq!(*img.get_pixel(44, 17), CLEAR);
        assert_eq!(*img.get_pixel(10, 30), CLEAR);
    }

    #[test]
    fn test_translucent_fill_blends() {
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        fill_rect(&mut img, Bounds::new(0.0, 0.0, 4.0, 4.0), Rgba([255, 255, 255, 51]));
        assert_eq!(*img.get_pixel(1, 1), Rgba([51, 51, 51, 255]));
    }

    #[test]
    fn test_shapes_clip_to_image() {
        let mut img = RgbaImage::new(8, 8);
        draw_shape(&mut img, &Shape::Ellipse(Bounds::new(-20.0, -20.0, 6.0, 6.0)), RED);
        draw_shape(&mut img, &Shape::Ellipse(Bounds::new(100.0, 100.0, 120.0, 120.0)), RED);
        assert_eq!(*img.get_pixel(0, 0), RED);
        assert_eq!(*img.get_pixel(7, 7), CLEAR);
    }

    #[test]
    fn test_degenerate_polygon_draws_nothing() {
        let mut img = RgbaImage::new(4, 4);
        draw_shape(
            &mut img,
            &Shape::Polygon(vec![Point::new(0.0, 0.0), Point::new(4.0, 4.0)]),
            RED,
        );
        assert!(img.pixels().all(|p| *p == CLEAR));
    }
}
