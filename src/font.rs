//! Text rendering.
//!
//! A preferred TrueType face is used when it can be found on disk; otherwise
//! text falls back to a small embedded 5x7 bitmap face so rendering never
//! depends on the host's font installation.

use crate::draw::{blend_pixel, Point};
use image::{Rgba, RgbaImage};
use log::{debug, warn};
use rusttype::{point, Scale};
use std::{fmt, path::Path};

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
const GLYPH_ADVANCE: u32 = GLYPH_WIDTH + 1;

pub enum Font {
    TrueType(rusttype::Font<'static>),
    Builtin,
}

impl fmt::Debug for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Font::TrueType(_) => f.write_str("Font::TrueType"),
            Font::Builtin => f.write_str("Font::Builtin"),
        }
    }
}

/// Pick the preferred font file when it exists and parses, the builtin face
/// otherwise. Collections (`.ttc`) use their first face.
pub fn resolve_font(preferred: Option<&Path>) -> Font {
    let Some(path) = preferred else {
        return Font::Builtin;
    };

    if !path.exists() {
        warn!(
            "Font {} not found, falling back to builtin font",
            path.display()
        );
        return Font::Builtin;
    }

    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(err) => {
            warn!("Can't read font {}: {err}", path.display());
            return Font::Builtin;
        }
    };

    match rusttype::Font::try_from_vec_and_index(data, 0) {
        Some(font) => {
            debug!("Using TrueType font {}", path.display());
            Font::TrueType(font)
        }
        None => {
            warn!(
                "{} is not a usable TrueType font, falling back to builtin font",
                path.display()
            );
            Font::Builtin
        }
    }
}

impl Font {
    pub fn is_builtin(&self) -> bool {
        matches!(self, Font::Builtin)
    }

    /// Width and height of the inked area of `text` at `size` pixels.
    pub fn measure(&self, text: &str, size: f32) -> (u32, u32) {
        match self {
            Font::TrueType(font) => {
                let scale = Scale::uniform(size);
                let ascent = font.v_metrics(scale).ascent;
                let boxes = font
                    .layout(text, scale, point(0.0, ascent))
                    .filter_map(|glyph| glyph.pixel_bounding_box());

                let mut extent: Option<(i32, i32, i32, i32)> = None;
                for bb in boxes {
                    extent = Some(match extent {
                        None => (bb.min.x, bb.min.y, bb.max.x, bb.max.y),
                        Some((x0, y0, x1, y1)) => (
                            x0.min(bb.min.x),
                            y0.min(bb.min.y),
                            x1.max(bb.max.x),
                            y1.max(bb.max.y),
                        ),
                    });
                }
                extent.map_or((0, 0), |(x0, y0, x1, y1)| {
                    ((x1 - x0) as u32, (y1 - y0) as u32)
                })
            }
            Font::Builtin => {
                let count = text.chars().count() as u32;
                if count == 0 {
                    return (0, 0);
                }
                let scale = builtin_scale(size);
                (
                    (count * GLYPH_ADVANCE - 1) * scale,
                    GLYPH_HEIGHT * scale,
                )
            }
        }
    }
}

/// Integer block size used to enlarge the bitmap face to roughly `size` px.
fn builtin_scale(size: f32) -> u32 {
    ((size / 8.0).round() as u32).max(1)
}

fn builtin_glyph(c: char) -> Option<&'static [u8; 5]> {
    let code = c as u32;
    if (0x20..=0x7e).contains(&code) {
        Some(&GLYPHS[(code - 0x20) as usize])
    } else {
        None
    }
}

/// Draw `text` with its top-left corner at `pos`.
pub fn draw_text(
    img: &mut RgbaImage,
    text: &str,
    pos: Point,
    font: &Font,
    size: f32,
    fill: Rgba<u8>,
) {
    let (width, height) = (img.width() as i32, img.height() as i32);

    match font {
        Font::TrueType(face) => {
            let scale = Scale::uniform(size);
            let ascent = face.v_metrics(scale).ascent;
            for glyph in face.layout(text, scale, point(pos.x, pos.y + ascent)) {
                let Some(bb) = glyph.pixel_bounding_box() else {
                    continue;
                };
                glyph.draw(|gx, gy, coverage| {
                    let x = bb.min.x + gx as i32;
                    let y = bb.min.y + gy as i32;
                    if x >= 0 && x < width && y >= 0 && y < height {
                        blend_pixel(img.get_pixel_mut(x as u32, y as u32), fill, coverage);
                    }
                });
            }
        }
        Font::Builtin => {
            let scale = builtin_scale(size) as i32;
            let origin_x = pos.x.round() as i32;
            let origin_y = pos.y.round() as i32;

            for (index, c) in text.chars().enumerate() {
                let Some(columns) = builtin_glyph(c) else {
                    continue;
                };
                let cell_x = origin_x + index as i32 * GLYPH_ADVANCE as i32 * scale;

                for (col, bits) in columns.iter().enumerate() {
                    for row in 0..GLYPH_HEIGHT as i32 {
                        if bits & (1 << row) == 0 {
                            continue;
                        }
                        let block_x = cell_x + col as i32 * scale;
                        let block_y = origin_y + row * scale;
                        for y in block_y.max(0)..(block_y + scale).min(height) {
                            for x in block_x.max(0)..(block_x + scale).min(width) {
                                blend_pixel(img.get_pixel_mut(x as u32, y as u32), fill, 1.0);
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Draw a shadow copy at `pos + (offset, offset)` and then the text itself.
#[allow(clippy::too_many_arguments)]
pub fn draw_text_with_shadow(
    img: &mut RgbaImage,
    text: &str,
    pos: Point,
    font: &Font,
    size: f32,
    fill: Rgba<u8>,
    shadow: Rgba<u8>,
    offset: f32,
) {
    draw_text(img, text, pos.offset(offset, offset), font, size, shadow);
    draw_text(img, text, pos, font, size, fill);
}

// Column-major 5x7 ASCII face, bit 0 is the top row.
#[rustfmt::skip]
static GLYPHS: [[u8; 5]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x00, 0x00, 0x5f, 0x00, 0x00], // !
    [0x00, 0x07, 0x00, 0x07, 0x00], // "
    [0x14, 0x7f, 0x14, 0x7f, 0x14], // #
    [0x24, 0x2a, 0x7f, 0x2a, 0x12], // $
    [0x23, 0x13, 0x08, 0x64, 0x62], // %
    [0x36, 0x49, 0x55, 0x22, 0x50], // &
    [0x00, 0x05, 0x03, 0x00, 0x00], // '
    [0x00, 0x1c, 0x22, 0x41, 0x00], // (
    [0x00, 0x41, 0x22, 0x1c, 0x00], // )
    [0x08, 0x2a, 0x1c, 0x2a, 0x08], // *
    [0x08, 0x08, 0x3e, 0x08, 0x08], // +
    [0x00, 0x50, 0x30, 0x00, 0x00], // ,
    [0x08, 0x08, 0x08, 0x08, 0x08], // -
    [0x00, 0x60, 0x60, 0x00, 0x00], // .
    [0x20, 0x10, 0x08, 0x04, 0x02], // /
    [0x3e, 0x51, 0x49, 0x45, 0x3e], // 0
    [0x00, 0x42, 0x7f, 0x40, 0x00], // 1
    [0x42, 0x61, 0x51, 0x49, 0x46], // 2
    [0x21, 0x41, 0x45, 0x4b, 0x31], // 3
    [0x18, 0x14, 0x12, 0x7f, 0x10], // 4
    [0x27, 0x45, 0x45, 0x45, 0x39], // 5
    [0x3c, 0x4a, 0x49, 0x49, 0x30], // 6
    [0x01, 0x71, 0x09, 0x05, 0x03], // 7
    [0x36, 0x49, 0x49, 0x49, 0x36], // 8
    [0x06, 0x49, 0x49, 0x29, 0x1e], // 9
    [0x00, 0x36, 0x36, 0x00, 0x00], // :
    [0x00, 0x56, 0x36, 0x00, 0x00], // ;
    [0x08, 0x14, 0x22, 0x41, 0x00], // <
    [0x14, 0x14, 0x14, 0x14, 0x14], // =
    [0x00, 0x41, 0x22, 0x14, 0x08], // >
    [0x02, 0x01, 0x51, 0x09, 0x06], // ?
    [0x32, 0x49, 0x79, 0x41, 0x3e], // @
    [0x7e, 0x11, 0x11, 0x11, 0x7e], // A
    [0x7f, 0x49, 0x49, 0x49, 0x36], // B
    [0x3e, 0x41, 0x41, 0x41, 0x22], // C
    [0x7f, 0x41, 0x41, 0x22, 0x1c], // D
    [0x7f, 0x49, 0x49, 0x49, 0x41], // E
    [0x7f, 0x09, 0x09, 0x09, 0x01], // F
    [0x3e, 0x41, 0x49, 0x49, 0x7a], // G
    [0x7f, 0x08, 0x08, 0x08, 0x7f], // H
    [0x00, 0x41, 0x7f, 0x41, 0x00], // I
    [0x20, 0x40, 0x41, 0x3f, 0x01], // J
    [0x7f, 0x08, 0x14, 0x22, 0x41], // K
    [0x7f, 0x40, 0x40, 0x40, 0x40], // L
    [0x7f, 0x02, 0x0c, 0x02, 0x7f], // M
    [0x7f, 0x04, 0x08, 0x10, 0x7f], // N
    [0x3e, 0x41, 0x41, 0x41, 0x3e], // O
    [0x7f, 0x09, 0x09, 0x09, 0x06], // P
    [0x3e, 0x41, 0x51, 0x21, 0x5e], // Q
    [0x7f, 0x09, 0x19, 0x29, 0x46], // R
    [0x46, 0x49, 0x49, 0x49, 0x31], // S
    [0x01, 0x01, 0x7f, 0x01, 0x01], // T
    [0x3f, 0x40, 0x40, 0x40, 0x3f], // U
    [0x1f, 0x20, 0x40, 0x20, 0x1f], // V
    [0x3f, 0x40, 0x38, 0x40, 0x3f], // W
    [0x63, 0x14, 0x08, 0x14, 0x63], // X
    [0x07, 0x08, 0x70, 0x08, 0x07], // Y
    [0x61, 0x51, 0x49, 0x45, 0x43], // Z
    [0x00, 0x7f, 0x41, 0x41, 0x00], // [
    [0x02, 0x04, 0x08, 0x10, 0x20], // backslash
    [0x00, 0x41, 0x41, 0x7f, 0x00], // ]
    [0x04, 0x02, 0x01, 0x02, 0x04], // ^
    [0x40, 0x40, 0x40, 0x40, 0x40], // _
    [0x00, 0x01, 0x02, 0x04, 0x00], // `
    [0x20, 0x54, 0x54, 0x54, 0x78], // a
    [0x7f, 0x48, 0x44, 0x44, 0x38], // b
    [0x38, 0x44, 0x44, 0x44, 0x20], // c
    [0x38, 0x44, 0x44, 0x48, 0x7f], // d
    [0x38, 0x54, 0x54, 0x54, 0x18], // e
    [0x08, 0x7e, 0x09, 0x01, 0x02], // f
    [0x0c, 0x52, 0x52, 0x52, 0x3e], // g
    [0x7f, 0x08, 0x04, 0x04, 0x78], // h
    [0x00, 0x44, 0x7d, 0x40, 0x00], // i
    [0x20, 0x40, 0x44, 0x3d, 0x00], // j
    [0x7f, 0x10, 0x28, 0x44, 0x00], // k
    [0x00, 0x41, 0x7f, 0x40, 0x00], // l
    [0x7c, 0x04, 0x18, 0x04, 0x78], // m
    [0x7c, 0x08, 0x04, 0x04, 0x78], // n
    [0x38, 0x44, 0x44, 0x44, 0x38], // o
    [0x7c, 0x14, 0x14, 0x14, 0x08], // p
    [0x08, 0x14, 0x14, 0x18, 0x7c], // q
    [0x7c, 0x08, 0x04, 0x04, 0x08], // r
    [0x48, 0x54, 0x54, 0x54, 0x20], // s
    [0x04, 0x3f, 0x44, 0x40, 0x20], // t
    [0x3c, 0x40, 0x40, 0x20, 0x7c], // u
    [0x1c, 0x20, 0x40, 0x20, 0x1c], // v
    [0x3c, 0x40, 0x30, 0x40, 0x3c], // w
    [0x44, 0x28, 0x10, 0x28, 0x44], // x
    [0x0c, 0x50, 0x50, 0x50, 0x3c], // y
    [0x44, 0x64, 0x54, 0x4c, 0x44], // z
    [0x00, 0x08, 0x36, 0x41, 0x00], // {
    [0x00, 0x00, 0x7f, 0x00, 0x00], // |
    [0x00, 0x41, 0x36, 0x08, 0x00], // }
    [0x08, 0x04, 0x08, 0x10, 0x08], // ~
];

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

    #[test]
    fn test_resolve_without_preference_is_builtin() {
        assert!(resolve_font(None).is_builtin());
    }

    #[test]
    fn test_resolve_missing_path_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let font = resolve_font(Some(&dir.path().join("Helvetica.ttc")));
        assert!(font.is_builtin());
    }

    #[test]
    fn test_resolve_invalid_font_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font at all").unwrap();
        assert!(resolve_font(Some(&path)).is_builtin());
    }

    #[test]
    fn test_resolve_system_font_when_available() {
        let candidates = [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/System/Library/Fonts/Helvetica.ttc",
        ];
        let Some(path) = candidates.iter().map(Path::new).find(|p| p.exists()) else {
            return;
        };

        let font = resolve_font(Some(path));
        assert!(!font.is_builtin());

        let (w, h) = font.measure("TS", 36.0);
        assert!(w > 0 && h > 0);

        let mut img = RgbaImage::new(120, 60);
        draw_text(&mut img, "TS", Point::new(4.0, 4.0), &font, 36.0, WHITE);
        assert!(img.pixels().any(|p| p[3] > 0));
    }

    #[test]
    fn test_builtin_measure() {
        let font = Font::Builtin;
        assert_eq!(font.measure("", 16.0), (0, 0));
        assert_eq!(font.measure("TS", 8.0), (11, 7));
        assert_eq!(font.measure("TS", 16.0), (22, 14));
    }

    #[test]
    fn test_builtin_draws_glyph_bits() {
        let mut img = RgbaImage::new(10, 10);
        draw_text(&mut img, "|", Point::new(0.0, 0.0), &Font::Builtin, 8.0, WHITE);

        for y in 0..7 {
            assert_eq!(*img.get_pixel(2, y), WHITE);
        }
        assert_eq!(*img.get_pixel(2, 7), CLEAR);
        assert_eq!(*img.get_pixel(1, 3), CLEAR);
    }

    #[test]
    fn test_shadow_is_offset_and_under_text() {
        let mut img = RgbaImage::new(12, 12);
        draw_text_with_shadow(
            &mut img,
            "|",
            Point::new(0.0, 0.0),
            &Font::Builtin,
            8.0,
            WHITE,
            BLACK,
            2.0,
        );

        assert_eq!(*img.get_pixel(2, 0), WHITE);
        assert_eq!(*img.get_pixel(4, 2), BLACK);
        assert_eq!(*img.get_pixel(4, 8), BLACK);
        assert_eq!(*img.get_pixel(4, 1), CLEAR);
    }

    #[test]
    fn test_unknown_characters_are_skipped() {
        let mut img = RgbaImage::new(40, 10);
        draw_text(&mut img, "é€", Point::new(0.0, 0.0), &Font::Builtin, 8.0, WHITE);
        assert!(img.pixels().all(|p| *p == CLEAR));
    }

    #[test]
    fn test_text_clips_at_edges() {
        let mut img = RgbaImage::new(6, 6);
        draw_text(&mut img, "WWW", Point::new(-3.0, -3.0), &Font::Builtin, 16.0, WHITE);
        assert!(img.pixels().any(|p| *p == WHITE));
    }
}
