//! Where each asset job reads from and writes to.
//!
//! Paths are plain data: the defaults mirror the layout of the app
//! repository (`ios/...` for the source icon, `static/...` for outputs) and
//! are made absolute with [`AssetConfig::rebase`].

use crate::error::{Error, Result};
use image::Rgba;
use serde::Deserialize;
use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

pub const DEFAULT_SOURCE_ICON: &str = "ios/App/App/Assets.xcassets/Icons.appiconset/icon-512.png";
pub const DEFAULT_TINT_COLOR: &str = "#2196F3";
pub const DEFAULT_FONT: &str = "/System/Library/Fonts/Helvetica.ttc";

/// Paths and tint for one icon variant.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IconJob {
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    /// Secondary copy used by the Cast receiver.
    #[serde(default)]
    pub cast_output_path: Option<PathBuf>,
    #[serde(default = "default_tint_color")]
    pub tint_color: String,
}

impl IconJob {
    pub fn blue_icon() -> Self {
        Self {
            source_path: PathBuf::from(DEFAULT_SOURCE_ICON),
            output_path: PathBuf::from("static/icon-512-blue.png"),
            cast_output_path: Some(PathBuf::from("static/cast-icon-512.png")),
            tint_color: default_tint_color(),
        }
    }

    pub fn pro_icon() -> Self {
        Self {
            source_path: PathBuf::from(DEFAULT_SOURCE_ICON),
            output_path: PathBuf::from("static/icon-512-blue-pro.png"),
            cast_output_path: Some(PathBuf::from("static/cast-icon-512-pro.png")),
            tint_color: default_tint_color(),
        }
    }

    fn rebase(&mut self, base: &Path) {
        self.source_path = base.join(&self.source_path);
        self.output_path = base.join(&self.output_path);
        if let Some(cast) = self.cast_output_path.as_mut() {
            *cast = base.join(&*cast);
        }
    }
}

/// Labels drawn on the feature graphic.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphicText {
    pub title: String,
    pub subtitle: String,
    pub features: Vec<String>,
    pub icon_label: String,
    pub badge: String,
}

impl Default for GraphicText {
    fn default() -> Self {
        Self {
            title: "TomeSonic".to_string(),
            subtitle: "Your AudiobookShelf companion".to_string(),
            features: [
                "📱 Stream & Download",
                "🚗 Android Auto Ready",
                "📺 ChromeCast Support",
                "📊 Progress Sync",
                "🎨 Material You Design",
                "📚 Library Management",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            icon_label: "TS".to_string(),
            badge: "Material You".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphicJob {
    pub output_path: PathBuf,
    /// Preferred TrueType font; the builtin face is used when it is missing.
    pub font_path: Option<PathBuf>,
    pub text: GraphicText,
}

impl Default for GraphicJob {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("tomesonic-feature-graphic.png"),
            font_path: Some(PathBuf::from(DEFAULT_FONT)),
            text: GraphicText::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetConfig {
    pub blue_icon: IconJob,
    pub pro_icon: IconJob,
    pub feature_graphic: GraphicJob,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            blue_icon: IconJob::blue_icon(),
            pro_icon: IconJob::pro_icon(),
            feature_graphic: GraphicJob::default(),
        }
    }
}

impl AssetConfig {
    /// Load a JSON config; omitted jobs keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        serde_json::from_str(&content).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve every relative path against `base`. Absolute paths are kept.
    pub fn rebase(mut self, base: &Path) -> Self {
        self.blue_icon.rebase(base);
        self.pro_icon.rebase(base);
        self.feature_graphic.output_path = base.join(&self.feature_graphic.output_path);
        if let Some(font) = self.feature_graphic.font_path.as_mut() {
            *font = base.join(&*font);
        }
        self
    }
}

fn default_tint_color() -> String {
    DEFAULT_TINT_COLOR.to_string()
}

/// Parse a CSS colour (`#2196F3`, `rgb(...)`, named colours) into RGBA.
pub fn parse_color(value: &str) -> Result<Rgba<u8>> {
    let color = css_color::Srgb::from_str(value)
        .map_err(|_| Error::InvalidColor(value.to_string()))?;
    let channel = |v: f32| (v * 255.).round().clamp(0., 255.) as u8;
    Ok(Rgba([
        channel(color.red),
        channel(color.green),
        channel(color.blue),
        channel(color.alpha),
    ]))
}
