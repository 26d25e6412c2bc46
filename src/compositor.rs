//! Pixel-level operations on RGBA rasters.
//!
//! Every operation takes its input by reference and returns a new buffer, so a
//! pipeline reads as a straight sequence of steps from the loaded source to
//! the saved PNG.

use crate::error::{Error, Result};
use image::{
    codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder},
    imageops, ColorType, GrayImage, ImageEncoder, ImageFormat, Luma, Rgba, RgbaImage,
};
use log::debug;
use std::{
    fs::create_dir_all,
    io::{BufWriter, Write},
    path::Path,
};
use tempfile::NamedTempFile;

/// A uniform colour laid over a whole image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlay {
    pub color: Rgba<u8>,
}

impl Overlay {
    pub fn new(color: Rgba<u8>, alpha: u8) -> Self {
        Self {
            color: Rgba([color[0], color[1], color[2], alpha]),
        }
    }

    pub fn to_image(&self, width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, self.color)
    }
}

/// Fail fast when the PNG codec was not compiled into the `image` crate.
pub fn ensure_png_support() -> Result<()> {
    if !ImageFormat::Png.reading_enabled() {
        return Err(Error::DependencyMissing("PNG decoder".to_string()));
    }
    if !ImageFormat::Png.writing_enabled() {
        return Err(Error::DependencyMissing("PNG encoder".to_string()));
    }
    Ok(())
}

/// Read a raster file and normalise it to RGBA.
pub fn load(path: &Path) -> Result<RgbaImage> {
    if !path.exists() {
        return Err(Error::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    let source = image::open(path).map_err(|source| Error::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        "Loaded {} ({}x{}, {:?})",
        path.display(),
        source.width(),
        source.height(),
        source.color()
    );

    Ok(source.to_rgba8())
}

/// Split an image into its R, G, B and A channels.
pub fn split_channels(img: &RgbaImage) -> [GrayImage; 4] {
    let (width, height) = img.dimensions();
    let mut channels = [
        GrayImage::new(width, height),
        GrayImage::new(width, height),
        GrayImage::new(width, height),
        GrayImage::new(width, height),
    ];

    for (x, y, pixel) in img.enumerate_pixels() {
        for (channel, value) in channels.iter_mut().zip(pixel.0) {
            channel.put_pixel(x, y, Luma([value]));
        }
    }

    channels
}

/// Multiply every intensity by `factor`, clamping to `0..=255` and truncating
/// the fractional part.
pub fn scale_channel(channel: &GrayImage, factor: f64) -> Result<GrayImage> {
    if !factor.is_finite() || factor < 0.0 {
        return Err(Error::TransformFailure(format!(
            "channel scale factor must be a non-negative finite number, got {factor}"
        )));
    }

    let mut scaled = channel.clone();
    for pixel in scaled.pixels_mut() {
        pixel[0] = clamp_truncate(pixel[0] as f64 * factor);
    }
    Ok(scaled)
}

/// Recombine four equally sized channels into an RGBA image.
pub fn merge_channels(channels: [GrayImage; 4]) -> Result<RgbaImage> {
    let expected = channels[0].dimensions();
    for channel in &channels[1..] {
        if channel.dimensions() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                found: channel.dimensions(),
            });
        }
    }

    let [r, g, b, a] = channels;
    Ok(RgbaImage::from_fn(expected.0, expected.1, |x, y| {
        Rgba([
            r.get_pixel(x, y)[0],
            g.get_pixel(x, y)[0],
            b.get_pixel(x, y)[0],
            a.get_pixel(x, y)[0],
        ])
    }))
}

/// Scale the colour channels independently, leaving alpha untouched.
pub fn scale_rgb(img: &RgbaImage, factors: [f64; 3]) -> Result<RgbaImage> {
    let [r, g, b, a] = split_channels(img);
    let [fr, fg, fb] = factors;
    merge_channels([
        scale_channel(&r, fr)?,
        scale_channel(&g, fg)?,
        scale_channel(&b, fb)?,
        a,
    ])
}

/// Porter-Duff "over" of a single pixel.
pub fn blend_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    match src[3] {
        0 => dst,
        255 => src,
        _ => {
            let src_a = src[3] as f64 / 255.0;
            let dst_a = dst[3] as f64 / 255.0;
            let out_a = src_a + dst_a * (1.0 - src_a);

            let mut out = [0u8; 4];
            for c in 0..3 {
                let value =
                    (src[c] as f64 * src_a + dst[c] as f64 * dst_a * (1.0 - src_a)) / out_a;
                out[c] = clamp_round(value);
            }
            out[3] = clamp_round(out_a * 255.0);
            Rgba(out)
        }
    }
}

/// Alpha-composite `overlay` onto `base`.
pub fn composite_over(base: &RgbaImage, overlay: &RgbaImage) -> Result<RgbaImage> {
    if base.dimensions() != overlay.dimensions() {
        return Err(Error::DimensionMismatch {
            expected: base.dimensions(),
            found: overlay.dimensions(),
        });
    }

    Ok(RgbaImage::from_fn(base.width(), base.height(), |x, y| {
        blend_over(*base.get_pixel(x, y), *overlay.get_pixel(x, y))
    }))
}

/// Blend every pixel with its own luminance gray.
///
/// `factor < 1.0` desaturates (0.0 yields grayscale), `factor > 1.0` pushes
/// colours away from gray. Alpha is kept.
pub fn adjust_saturation(img: &RgbaImage, factor: f64) -> RgbaImage {
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        let gray = luminance(pixel) as f64;
        for c in 0..3 {
            pixel[c] = blend_toward(gray, pixel[c], factor);
        }
    }
    out
}

/// Blend every pixel with a uniform gray at the image's mean luminance.
pub fn adjust_contrast(img: &RgbaImage, factor: f64) -> RgbaImage {
    let mean = mean_luminance(img).round();
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        for c in 0..3 {
            pixel[c] = blend_toward(mean, pixel[c], factor);
        }
    }
    out
}

/// Unsharp mask: add `percent` % of (original - blurred) back wherever the
/// difference reaches `threshold`. All four bands are sharpened, so soft
/// alpha edges get crisper too.
pub fn sharpen(img: &RgbaImage, radius: f32, percent: u32, threshold: u8) -> RgbaImage {
    if radius <= 0.0 {
        return img.clone();
    }

    let blurred = imageops::blur(img, radius);
    let percent = percent.min(i32::MAX as u32 / 255) as i32;
    let mut out = img.clone();

    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let soft = blurred.get_pixel(x, y);
        for c in 0..4 {
            let diff = pixel[c] as i32 - soft[c] as i32;
            if diff.abs() >= threshold as i32 {
                pixel[c] = (pixel[c] as i32 + diff * percent / 100).clamp(0, 255) as u8;
            }
        }
    }

    out
}

/// Write `img` as an optimised PNG.
///
/// The data goes to a temporary file next to `path` first and is renamed into
/// place, so a failed write never leaves a truncated PNG behind.
pub fn save_png(img: &RgbaImage, path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    let mut tmp = temp_file_in(dir).map_err(|e| Error::io(dir, e))?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        let encoder = PngEncoder::new_with_quality(
            &mut writer,
            CompressionType::Best,
            PngFilterType::Adaptive,
        );
        encoder
            .write_image(img.as_raw(), img.width(), img.height(), ColorType::Rgba8)
            .map_err(|source| Error::Encode {
                path: path.to_path_buf(),
                source,
            })?;
        writer.flush().map_err(|e| Error::io(path, e))?;
    }

    tmp.persist(path).map_err(|e| Error::io(path, e.error))?;
    debug!("Wrote {}", path.display());
    Ok(())
}

/// Temporary file that ends up world-readable (subject to the umask) once
/// persisted; the default would keep it owner-only.
fn temp_file_in(dir: &Path) -> std::io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".asset-gen");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o644));
    }
    builder.tempfile_in(dir)
}

/// Plain file copy, creating the destination directory when needed.
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    std::fs::copy(from, to).map_err(|e| Error::io(to, e))?;
    Ok(())
}

/// ITU-R 601-2 luma, rounded.
pub fn luminance(pixel: &Rgba<u8>) -> u8 {
    let weighted = pixel[0] as u32 * 299 + pixel[1] as u32 * 587 + pixel[2] as u32 * 114;
    ((weighted + 500) / 1000) as u8
}

fn mean_luminance(img: &RgbaImage) -> f64 {
    let count = img.width() as u64 * img.height() as u64;
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = img.pixels().map(|p| luminance(p) as u64).sum();
    sum as f64 / count as f64
}

fn blend_toward(base: f64, value: u8, factor: f64) -> u8 {
    clamp_truncate(base + factor * (value as f64 - base))
}

fn clamp_truncate(value: f64) -> u8 {
    value.clamp(0.0, 255.0) as u8
}

fn clamp_round(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
