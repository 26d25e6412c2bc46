//! The asset jobs: two blue icon variants and the store feature graphic.

use crate::{
    compositor::{
        adjust_contrast, adjust_saturation, composite_over, copy_file, ensure_png_support, load,
        save_png, scale_rgb, sharpen, Overlay,
    },
    config::{parse_color, GraphicJob, GraphicText, IconJob},
    draw::{draw_shape, Bounds, Point, Shape},
    error::{Error, Result},
    font::{draw_text, draw_text_with_shadow, resolve_font, Font},
    gradient::{fill_gradient_rect, synthesize_gradient, Axis, Gradient},
};
use image::{Rgba, RgbaImage};
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Red, green and blue factors of the plain blue tint.
pub const BLUE_CHANNEL_FACTORS: [f64; 3] = [0.7, 0.8, 1.3];
pub const BLUE_OVERLAY_ALPHA: u8 = 100;

pub const SIMPLE_OVERLAY_ALPHA: u8 = 80;
pub const SIMPLE_SATURATION: f64 = 1.2;
pub const SIMPLE_CONTRAST: f64 = 1.1;

/// Red, green and blue factors of the professional variant.
pub const PRO_CHANNEL_FACTORS: [f64; 3] = [0.6, 0.75, 1.4];
pub const PRO_OVERLAY_ALPHA: u8 = 60;
pub const PRO_SATURATION: f64 = 1.3;
pub const PRO_CONTRAST: f64 = 1.1;
pub const PRO_SHARPEN_RADIUS: f32 = 1.0;
pub const PRO_SHARPEN_PERCENT: u32 = 120;
pub const PRO_SHARPEN_THRESHOLD: u8 = 3;

pub const GRAPHIC_WIDTH: u32 = 1024;
pub const GRAPHIC_HEIGHT: u32 = 500;

const PURPLE: Rgba<u8> = Rgba([102, 126, 234, 255]);
const VIOLET: Rgba<u8> = Rgba([118, 75, 162, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const PHONE_FRAME: Rgba<u8> = Rgba([40, 40, 40, 255]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BlueIconMethod {
    /// Blue overlay followed by per-channel scaling
    Tint,
    /// Lighter overlay with a saturation and contrast boost
    Simple,
}

/// Blue overlay, then suppress red and green and boost blue.
pub fn tint_blue(source: &RgbaImage, tint: Rgba<u8>) -> Result<RgbaImage> {
    let overlay = Overlay::new(tint, BLUE_OVERLAY_ALPHA).to_image(source.width(), source.height());
    let tinted = composite_over(source, &overlay)?;
    scale_rgb(&tinted, BLUE_CHANNEL_FACTORS)
}

pub fn tint_simple(source: &RgbaImage, tint: Rgba<u8>) -> Result<RgbaImage> {
    let overlay =
        Overlay::new(tint, SIMPLE_OVERLAY_ALPHA).to_image(source.width(), source.height());
    let tinted = composite_over(source, &overlay)?;
    let saturated = adjust_saturation(&tinted, SIMPLE_SATURATION);
    Ok(adjust_contrast(&saturated, SIMPLE_CONTRAST))
}

/// Channel rebalance, light overlay, saturation and contrast boost, then an
/// unsharp mask for crisp edges.
pub fn tint_professional(source: &RgbaImage, tint: Rgba<u8>) -> Result<RgbaImage> {
    let scaled = scale_rgb(source, PRO_CHANNEL_FACTORS)?;
    let overlay = Overlay::new(tint, PRO_OVERLAY_ALPHA).to_image(source.width(), source.height());
    let tinted = composite_over(&scaled, &overlay)?;
    let saturated = adjust_saturation(&tinted, PRO_SATURATION);
    let contrasted = adjust_contrast(&saturated, PRO_CONTRAST);
    Ok(sharpen(
        &contrasted,
        PRO_SHARPEN_RADIUS,
        PRO_SHARPEN_PERCENT,
        PRO_SHARPEN_THRESHOLD,
    ))
}

/// Create the blue icon. When the tint method fails for any reason other
/// than a missing source, the simple method is tried once as a best-effort
/// retry.
pub fn create_blue_icon(job: &IconJob, method: BlueIconMethod) -> Result<Vec<PathBuf>> {
    ensure_png_support()?;
    let source = load(&job.source_path)?;
    let tint = parse_color(&job.tint_color)?;

    info!("Creating blue variant of: {}", job.source_path.display());
    info!("Output will be saved to: {}", job.output_path.display());

    let render = |method: BlueIconMethod| -> Result<()> {
        let img = match method {
            BlueIconMethod::Tint => tint_blue(&source, tint)?,
            BlueIconMethod::Simple => tint_simple(&source, tint)?,
        };
        save_png(&img, &job.output_path)
    };

    match render_with_fallback(method, render)? {
        BlueIconMethod::Tint => {
            info!("✓ Blue icon variant created: {}", job.output_path.display())
        }
        BlueIconMethod::Simple => {
            info!("✓ Simple blue icon variant created: {}", job.output_path.display())
        }
    }

    finish_icon(job)
}

/// Run `render` with `method`, retrying once with the simple method when the
/// tint method fails. Returns the method that produced the output.
fn render_with_fallback(
    method: BlueIconMethod,
    mut render: impl FnMut(BlueIconMethod) -> Result<()>,
) -> Result<BlueIconMethod> {
    if method == BlueIconMethod::Tint {
        match render(BlueIconMethod::Tint) {
            Ok(()) => return Ok(BlueIconMethod::Tint),
            Err(err) => {
                warn!("Error creating blue icon: {err}");
                info!("Trying simpler method...");
            }
        }
    }
    render(BlueIconMethod::Simple)?;
    Ok(BlueIconMethod::Simple)
}

pub fn create_pro_icon(job: &IconJob) -> Result<Vec<PathBuf>> {
    ensure_png_support()?;
    let source = load(&job.source_path)?;
    let tint = parse_color(&job.tint_color)?;

    info!("Processing: {}", job.source_path.display());
    let img = tint_professional(&source, tint)?;
    save_png(&img, &job.output_path)?;
    info!("✓ Professional blue icon created: {}", job.output_path.display());

    let written = finish_icon(job)?;
    report_pro_icon(job, &written);
    Ok(written)
}

/// Copy the output to the cast receiver path, if one is configured.
fn finish_icon(job: &IconJob) -> Result<Vec<PathBuf>> {
    let mut written = vec![job.output_path.clone()];
    if let Some(cast) = &job.cast_output_path {
        copy_file(&job.output_path, cast)?;
        info!("✓ Cast receiver icon created: {}", cast.display());
        written.push(cast.clone());
    }
    Ok(written)
}

fn report_pro_icon(job: &IconJob, written: &[PathBuf]) {
    let size_kib = |path: &Path| {
        std::fs::metadata(path)
            .map(|m| format!("{}KB", m.len() / 1024))
            .unwrap_or_else(|_| "?".to_string())
    };

    info!("Created files:");
    info!("  Original: {}", size_kib(&job.source_path));
    for path in written {
        info!("  {}: {}", path.display(), size_kib(path));
    }
    info!("Tint colour used: {}", job.tint_color);
    info!("Adjustments applied:");
    let [r, g, b] = PRO_CHANNEL_FACTORS;
    info!("  - Red channel: {:+.0}%", (r - 1.0) * 100.0);
    info!("  - Green channel: {:+.0}%", (g - 1.0) * 100.0);
    info!("  - Blue channel: {:+.0}%", (b - 1.0) * 100.0);
    info!(
        "  - Overlay: {:.0}% opacity",
        PRO_OVERLAY_ALPHA as f64 / 255.0 * 100.0
    );
    info!("  - Saturation: {:+.0}%", (PRO_SATURATION - 1.0) * 100.0);
    info!("  - Contrast: {:+.0}%", (PRO_CONTRAST - 1.0) * 100.0);
    info!("  - Sharpening applied");
}

pub fn create_feature_graphic(job: &GraphicJob) -> Result<Vec<PathBuf>> {
    ensure_png_support()?;
    info!("Generating feature graphic...");

    let font = resolve_font(job.font_path.as_deref());
    let graphic = render_feature_graphic(&font, &job.text)?;
    save_png(&graphic, &job.output_path)?;

    info!("✓ Feature graphic saved as: {}", job.output_path.display());
    info!("Dimensions: {GRAPHIC_WIDTH}x{GRAPHIC_HEIGHT} pixels");
    Ok(vec![job.output_path.clone()])
}

/// Draw the 1024x500 store banner: gradient backdrop, decorative circles,
/// title block with feature list, phone mockup and a badge.
pub fn render_feature_graphic(font: &Font, text: &GraphicText) -> Result<RgbaImage> {
    let (width, height) = (GRAPHIC_WIDTH, GRAPHIC_HEIGHT);
    let mut canvas = synthesize_gradient(width, height, PURPLE, VIOLET);

    // Subtle circles, composited as one translucent layer
    let mut pattern = RgbaImage::new(width, height);
    for i in 0..3 {
        let x = width as f32 * (0.2 + i as f32 * 0.3);
        let y = height as f32 * (0.3 + i as f32 * 0.2);
        let radius = 80.0 + i as f32 * 20.0;
        draw_shape(
            &mut pattern,
            &Shape::Ellipse(Bounds::inclusive(x - radius, y - radius, x + radius, y + radius)),
            Rgba([255, 255, 255, 15]),
        );
    }
    canvas = composite_over(&canvas, &pattern)?;

    draw_text_with_shadow(
        &mut canvas,
        &text.title,
        Point::new(60.0, 80.0),
        font,
        72.0,
        WHITE,
        Rgba([0, 0, 0, 100]),
        3.0,
    );
    draw_text_with_shadow(
        &mut canvas,
        &text.subtitle,
        Point::new(60.0, 170.0),
        font,
        24.0,
        Rgba([240, 240, 255, 255]),
        Rgba([0, 0, 0, 80]),
        2.0,
    );

    // Two columns of features
    for (i, feature) in text.features.iter().enumerate() {
        let x = 60.0 + (i % 2) as f32 * 200.0;
        let y = 220.0 + (i / 2) as f32 * 35.0;
        draw_text_with_shadow(
            &mut canvas,
            feature,
            Point::new(x, y),
            font,
            16.0,
            WHITE,
            Rgba([0, 0, 0, 60]),
            1.0,
        );
    }

    draw_phone_mockup(&mut canvas, font, &text.icon_label);
    draw_badge(&mut canvas, font, &text.badge);

    Ok(canvas)
}

fn draw_phone_mockup(canvas: &mut RgbaImage, font: &Font, icon_label: &str) {
    let (phone_x, phone_y) = (700.0, 100.0);
    let (phone_width, phone_height) = (200.0, 300.0);

    draw_shape(
        canvas,
        &Shape::RoundedRect {
            bounds: Bounds::inclusive(
                phone_x - 10.0,
                phone_y - 10.0,
                phone_x + phone_width + 10.0,
                phone_y + phone_height + 10.0,
            ),
            radius: 25.0,
        },
        PHONE_FRAME,
    );
    // Screen rows span the full width, edge pixel included
    fill_gradient_rect(
        canvas,
        Bounds::new(phone_x, phone_y, phone_x + phone_width + 1.0, phone_y + phone_height),
        &Gradient::new(PURPLE, VIOLET, Axis::Vertical),
    );

    // App icon tile
    let icon_size = 80.0;
    let icon_x = phone_x + ((phone_width - icon_size) / 2.0).floor();
    let icon_y = phone_y + 60.0;
    draw_shape(
        canvas,
        &Shape::RoundedRect {
            bounds: Bounds::inclusive(icon_x, icon_y, icon_x + icon_size, icon_y + icon_size),
            radius: 15.0,
        },
        WHITE,
    );

    let icon_font_size = 36.0;
    let (label_width, label_height) = font.measure(icon_label, icon_font_size);
    let label_x = icon_x + ((icon_size - label_width as f32) / 2.0).floor();
    let label_y = icon_y + ((icon_size - label_height as f32) / 2.0).floor();
    draw_text(
        canvas,
        icon_label,
        Point::new(label_x, label_y),
        font,
        icon_font_size,
        PURPLE,
    );

    // Play button
    let play_size = 60.0;
    let play_x = phone_x + ((phone_width - play_size) / 2.0).floor();
    let play_y = icon_y + icon_size + 30.0;
    draw_shape(
        canvas,
        &Shape::Ellipse(Bounds::inclusive(
            play_x,
            play_y,
            play_x + play_size,
            play_y + play_size,
        )),
        Rgba([255, 255, 255, 230]),
    );
    draw_shape(
        canvas,
        &Shape::Polygon(vec![
            Point::new(play_x + 20.0, play_y + 15.0),
            Point::new(play_x + 20.0, play_y + 45.0),
            Point::new(play_x + 45.0, play_y + 30.0),
        ]),
        PURPLE,
    );
}

fn draw_badge(canvas: &mut RgbaImage, font: &Font, label: &str) {
    let font_size = 14.0;
    let (text_width, text_height) = font.measure(label, font_size);
    let badge_width = text_width as f32 + 20.0;
    let badge_height = text_height as f32 + 10.0;
    let badge_x = canvas.width() as f32 - badge_width - 20.0;
    let badge_y = 20.0;

    draw_shape(
        canvas,
        &Shape::RoundedRect {
            bounds: Bounds::inclusive(
                badge_x,
                badge_y,
                badge_x + badge_width,
                badge_y + badge_height,
            ),
            radius: 15.0,
        },
        Rgba([255, 255, 255, 50]),
    );
    draw_text(
        canvas,
        label,
        Point::new(badge_x + 10.0, badge_y + 5.0),
        font,
        font_size,
        WHITE,
    );
}

/// Fail before touching any output when the source icon is missing.
pub fn check_source(job: &IconJob) -> Result<()> {
    if job.source_path.exists() {
        Ok(())
    } else {
        Err(Error::InputNotFound {
            path: job.source_path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::{merge_channels, split_channels};
    use pretty_assertions::assert_eq;

    const MATERIAL_BLUE: Rgba<u8> = Rgba([33, 150, 243, 255]);

    fn four_colors() -> RgbaImage {
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
        img.put_pixel(0, 1, Rgba([0, 0, 255, 255]));
        img.put_pixel(1, 1, Rgba([100, 100, 100, 255]));
        img
    }

    #[test]
    fn test_professional_channel_factors_by_hand() {
        let out = scale_rgb(&four_colors(), PRO_CHANNEL_FACTORS).unwrap();

        let mut expected = RgbaImage::new(2, 2);
        expected.put_pixel(0, 0, Rgba([153, 0, 0, 255]));
        expected.put_pixel(1, 0, Rgba([0, 191, 0, 255]));
        expected.put_pixel(0, 1, Rgba([0, 0, 255, 255]));
        expected.put_pixel(1, 1, Rgba([60, 75, 140, 255]));
        assert_eq!(out, expected);
    }

    #[test]
    fn test_blue_tint_shifts_towards_blue() {
        let gray = RgbaImage::from_pixel(4, 4, Rgba([128, 128, 128, 255]));
        let out = tint_blue(&gray, MATERIAL_BLUE).unwrap();
        let pixel = out.get_pixel(2, 2);
        assert!(pixel[2] > pixel[1] && pixel[1] > pixel[0]);
        assert_eq!(pixel[3], 255);
    }

    #[test]
    fn test_blue_tint_by_hand() {
        let white = RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255]));
        let out = tint_blue(&white, MATERIAL_BLUE).unwrap();
        // over with a = 100/255: (255 * 155 + c * 100) / 255
        //   r: (39525 + 3300) / 255 = 167.94 -> 168, * 0.7 = 117.6 -> 117
        //   g: (39525 + 15000) / 255 = 213.82 -> 214, * 0.8 = 171.2 -> 171
        //   b: (39525 + 24300) / 255 = 250.29 -> 250, * 1.3 = 325 -> 255
        assert_eq!(*out.get_pixel(0, 0), Rgba([117, 171, 255, 255]));
    }

    #[test]
    fn test_tint_failure_falls_back_to_simple() {
        let mut tried = Vec::new();
        let used = render_with_fallback(BlueIconMethod::Tint, |method| {
            tried.push(method);
            match method {
                BlueIconMethod::Tint => Err(Error::TransformFailure("boom".to_string())),
                BlueIconMethod::Simple => Ok(()),
            }
        })
        .unwrap();

        assert_eq!(used, BlueIconMethod::Simple);
        assert_eq!(tried, vec![BlueIconMethod::Tint, BlueIconMethod::Simple]);
    }

    #[test]
    fn test_fallback_reports_second_failure() {
        let mut calls = 0;
        let result = render_with_fallback(BlueIconMethod::Tint, |_| {
            calls += 1;
            Err(Error::TransformFailure(format!("attempt {calls}")))
        });

        assert_eq!(calls, 2);
        match result {
            Err(Error::TransformFailure(msg)) => assert_eq!(msg, "attempt 2"),
            other => panic!("expected TransformFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_simple_method_is_not_retried() {
        let mut tried = Vec::new();
        let used = render_with_fallback(BlueIconMethod::Simple, |method| {
            tried.push(method);
            Ok(())
        })
        .unwrap();
        assert_eq!(used, BlueIconMethod::Simple);
        assert_eq!(tried, vec![BlueIconMethod::Simple]);

        let mut tried = Vec::new();
        let used = render_with_fallback(BlueIconMethod::Tint, |method| {
            tried.push(method);
            Ok(())
        })
        .unwrap();
        assert_eq!(used, BlueIconMethod::Tint);
        assert_eq!(tried, vec![BlueIconMethod::Tint]);
    }

    #[test]
    fn test_tint_keeps_transparent_pixels_see_through() {
        let clear = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 0]));
        let out = tint_blue(&clear, MATERIAL_BLUE).unwrap();
        assert_eq!(out.get_pixel(0, 0)[3], BLUE_OVERLAY_ALPHA);
    }

    #[test]
    fn test_simple_and_professional_preserve_size() {
        let source = RgbaImage::from_fn(24, 16, |x, y| Rgba([(x * 10) as u8, (y * 15) as u8, 90, 255]));
        for out in [
            tint_simple(&source, MATERIAL_BLUE).unwrap(),
            tint_professional(&source, MATERIAL_BLUE).unwrap(),
        ] {
            assert_eq!(out.dimensions(), (24, 16));
            assert!(out.pixels().all(|p| p[3] == 255));
        }
    }

    #[test]
    fn test_professional_is_deterministic() {
        let source = merge_channels(split_channels(&four_colors())).unwrap();
        let a = tint_professional(&source, MATERIAL_BLUE).unwrap();
        let b = tint_professional(&source, MATERIAL_BLUE).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_feature_graphic_layout_with_builtin_font() {
        let graphic = render_feature_graphic(&Font::Builtin, &GraphicText::default()).unwrap();
        assert_eq!(graphic.dimensions(), (GRAPHIC_WIDTH, GRAPHIC_HEIGHT));
        assert!(graphic.pixels().all(|p| p[3] == 255));

        let backdrop = Gradient::diagonal(PURPLE, VIOLET);
        // bottom-left corner is untouched gradient
        assert_eq!(
            *graphic.get_pixel(5, 495),
            backdrop.color_at(5, 495, GRAPHIC_WIDTH, GRAPHIC_HEIGHT)
        );
        // first decorative circle lightens the backdrop
        let plain = backdrop.color_at(204, 150, GRAPHIC_WIDTH, GRAPHIC_HEIGHT);
        assert!(graphic.get_pixel(204, 150)[0] > plain[0]);

        assert_eq!(*graphic.get_pixel(695, 250), PHONE_FRAME);
        assert_eq!(*graphic.get_pixel(800, 165), WHITE);
        assert_eq!(*graphic.get_pixel(800, 300), PURPLE);

        // far edges of the boxes are painted
        assert_eq!(*graphic.get_pixel(840, 200), WHITE);
        assert_eq!(*graphic.get_pixel(841, 200), backdrop_of_screen(200));
        assert_eq!(*graphic.get_pixel(910, 250), PHONE_FRAME);
        assert_eq!(*graphic.get_pixel(900, 250), backdrop_of_screen(250));
    }

    fn backdrop_of_screen(y: u32) -> Rgba<u8> {
        Gradient::new(PURPLE, VIOLET, Axis::Vertical).color_at(0, y - 100, 201, 300)
    }

    #[test]
    fn test_check_source() {
        let mut job = IconJob::blue_icon();
        job.source_path = PathBuf::from("/definitely/not/here.png");
        assert!(matches!(check_source(&job), Err(Error::InputNotFound { .. })));
    }
}
