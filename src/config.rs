//! Plot settings, optionally read from a YAML file.

use std::convert::TryFrom;
use std::fmt;
use std::path::Path;

use anyhow::{bail, Context, Result};
use rgb::RGBA8;
use serde::{Deserialize, Serialize};

/// Genome-wide significance, p = 5e-8.
pub const DEFAULT_HIGH: f64 = 7.301_029_995_663_981;

/// Largest figure side accepted, in pixels.
pub const MAX_DIMENSION: u32 = 8192;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Figure width in pixels
    pub width: u32,

    /// Figure height in pixels
    pub height: u32,

    /// Radius of a plotted variant in pixels
    pub point_radius: u32,

    /// -log10(p) above which variants are highlighted and tabulated
    pub high: f64,

    /// Optional suggestive line, -log10(p)
    pub low: Option<f64>,

    /// Rows per table page
    pub page_size: usize,

    pub colors: Palette,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            width: 1000,
            height: 480,
            point_radius: 2,
            high: DEFAULT_HIGH,
            low: None,
            page_size: 10,
            colors: Palette::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub background: Color,
    pub band_even: Color,
    pub band_odd: Color,
    pub point_even: Color,
    pub point_odd: Color,
    pub highlight: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            background: Color::rgb(0xff, 0xff, 0xff),
            band_even: Color::rgb(0xf4, 0xf4, 0xf4),
            band_odd: Color::rgb(0xff, 0xff, 0xff),
            point_even: Color::rgb(0x1f, 0x4e, 0x79),
            point_odd: Color::rgb(0x6b, 0xa3, 0xd6),
            highlight: Color::rgb(0xd6, 0x27, 0x28),
        }
    }
}

/// An opaque `#rrggbb` colour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub RGBA8);

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color(RGBA8 { r, g, b, a: 255 })
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("invalid colour '{}', expected #rrggbb", s));
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string());
        Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl From<Color> for String {
    fn from(c: Color) -> String {
        c.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0.r, self.0.g, self.0.b)
    }
}

impl Config {
    /// Load configuration from YAML file
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width < 200 || self.height < 150 {
            bail!(
                "figure must be at least 200x150 pixels, got {}x{}",
                self.width,
                self.height
            );
        }
        if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            bail!(
                "figure must be at most {0}x{0} pixels, got {1}x{2}",
                MAX_DIMENSION,
                self.width,
                self.height
            );
        }
        if self.point_radius == 0 {
            bail!("point_radius must be at least 1");
        }
        if !self.high.is_finite() || self.high < 0.0 {
            bail!("high threshold must be a non-negative number, got {}", self.high);
        }
        if let Some(low) = self.low {
            if !low.is_finite() || low < 0.0 {
                bail!("low threshold must be a non-negative number, got {}", low);
            }
        }
        if self.page_size == 0 {
            bail!("page_size must be at least 1");
        }
        Ok(())
    }
}
