use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::RenderError;

/// Background brightness of the terminal; picks one side of a [`ColorPair`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Appearance {
    #[default]
    Dark,
    Light,
}

impl Appearance {
    /// Guess the terminal background from `COLORFGBG` ("fg;bg"). Terminals
    /// that don't export it are assumed dark.
    pub fn detect() -> Self {
        std::env::var("COLORFGBG")
            .ok()
            .map(|value| Self::from_colorfgbg(&value))
            .unwrap_or_default()
    }

    fn from_colorfgbg(value: &str) -> Self {
        match value.rsplit(';').next().and_then(|bg| bg.parse::<u8>().ok()) {
            // 7 is light gray, 9-15 are the bright colors
            Some(7) | Some(9..=15) => Appearance::Light,
            _ => Appearance::Dark,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPair {
    pub dark: Color,
    pub light: Color,
}

impl ColorPair {
    pub const fn new(dark: u32, light: u32) -> Self {
        Self {
            dark: Color::from_u32(dark),
            light: Color::from_u32(light),
        }
    }

    pub fn resolve(&self, appearance: Appearance) -> Color {
        match appearance {
            Appearance::Dark => self.dark,
            Appearance::Light => self.light,
        }
    }
}

pub const GRAY: Color = Color::from_u32(0x333333);
pub const YELLOW_GREEN: Color = Color::from_u32(0xECFD65);
pub const FUSCHIA: Color = Color::from_u32(0xEE6FF8);
pub const CREAM: Color = Color::from_u32(0xFFFDF5);
pub const GREEN: Color = Color::from_u32(0x04B575);

pub const STATUS_BAR_BG: ColorPair = ColorPair::new(0x242424, 0xE6E6E6);
pub const STATUS_BAR_NOTE_FG: ColorPair = ColorPair::new(0x7D7D7D, 0x656565);
pub const STATUS_BAR_SCROLL_POS_FG: ColorPair = ColorPair::new(0x5A5A5A, 0x949494);

// Color palette structure
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base16Palette {
    pub base_00: Color, // Background
    pub base_01: Color, // Lighter background
    pub base_02: Color, // Selection background
    pub base_03: Color, // Comments, invisibles
    pub base_04: Color, // Dark foreground
    pub base_05: Color, // Default foreground
    pub base_06: Color, // Light foreground
    pub base_07: Color, // Light background
    pub base_08: Color, // Red
    pub base_09: Color, // Orange
    pub base_0a: Color, // Yellow
    pub base_0b: Color, // Green
    pub base_0c: Color, // Cyan
    pub base_0d: Color, // Blue
    pub base_0e: Color, // Purple
    pub base_0f: Color, // Brown
}

impl Base16Palette {
    pub fn for_appearance(appearance: Appearance) -> &'static Base16Palette {
        match appearance {
            Appearance::Dark => &OCEANIC_NEXT_PALETTE,
            Appearance::Light => &ONE_LIGHT_PALETTE,
        }
    }

    /// Load a base16 scheme from a YAML file.
    pub fn load(path: &Path) -> Result<Base16Palette, RenderError> {
        let content = fs::read_to_string(path).map_err(|source| RenderError::StyleRead {
            path: path.to_path_buf(),
            source,
        })?;
        let scheme: YamlScheme =
            serde_yaml::from_str(&content).map_err(|source| RenderError::StyleParse {
                path: path.to_path_buf(),
                source,
            })?;
        scheme.to_palette()
    }
}

// Oceanic Next theme
static OCEANIC_NEXT_PALETTE: Base16Palette = Base16Palette {
    base_00: Color::from_u32(0x1B2B34),
    base_01: Color::from_u32(0x343D46),
    base_02: Color::from_u32(0x4F5B66),
    base_03: Color::from_u32(0x65737E),
    base_04: Color::from_u32(0xA7ADBA),
    base_05: Color::from_u32(0xC0C5CE),
    base_06: Color::from_u32(0xCDD3DE),
    base_07: Color::from_u32(0xD8DEE9),
    base_08: Color::from_u32(0xEC5F67),
    base_09: Color::from_u32(0xF99157),
    base_0a: Color::from_u32(0xFAC863),
    base_0b: Color::from_u32(0x99C794),
    base_0c: Color::from_u32(0x5FB3B3),
    base_0d: Color::from_u32(0x6699CC),
    base_0e: Color::from_u32(0xC594C5),
    base_0f: Color::from_u32(0xAB7967),
};

// One Light theme
static ONE_LIGHT_PALETTE: Base16Palette = Base16Palette {
    base_00: Color::from_u32(0xFAFAFA),
    base_01: Color::from_u32(0xF0F0F1),
    base_02: Color::from_u32(0xE5E5E6),
    base_03: Color::from_u32(0xA0A1A7),
    base_04: Color::from_u32(0x696C77),
    base_05: Color::from_u32(0x383A42),
    base_06: Color::from_u32(0x202227),
    base_07: Color::from_u32(0x090A0B),
    base_08: Color::from_u32(0xCA1243),
    base_09: Color::from_u32(0xD75F00),
    base_0a: Color::from_u32(0xC18401),
    base_0b: Color::from_u32(0x50A14F),
    base_0c: Color::from_u32(0x0184BC),
    base_0d: Color::from_u32(0x4078F2),
    base_0e: Color::from_u32(0xA626A4),
    base_0f: Color::from_u32(0x986801),
};

/// On-disk base16 scheme, as published by the base16 project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YamlScheme {
    pub scheme: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub base00: String,
    pub base01: String,
    pub base02: String,
    pub base03: String,
    pub base04: String,
    pub base05: String,
    pub base06: String,
    pub base07: String,
    pub base08: String,
    pub base09: String,
    #[serde(alias = "base0A")]
    pub base0a: String,
    #[serde(alias = "base0B")]
    pub base0b: String,
    #[serde(alias = "base0C")]
    pub base0c: String,
    #[serde(alias = "base0D")]
    pub base0d: String,
    #[serde(alias = "base0E")]
    pub base0e: String,
    #[serde(alias = "base0F")]
    pub base0f: String,
}

impl YamlScheme {
    pub fn to_palette(&self) -> Result<Base16Palette, RenderError> {
        let color = |field: &'static str, value: &str| {
            parse_hex(value).ok_or_else(|| RenderError::StyleColor {
                scheme: self.scheme.clone(),
                field,
                value: value.to_string(),
            })
        };
        Ok(Base16Palette {
            base_00: color("base00", &self.base00)?,
            base_01: color("base01", &self.base01)?,
            base_02: color("base02", &self.base02)?,
            base_03: color("base03", &self.base03)?,
            base_04: color("base04", &self.base04)?,
            base_05: color("base05", &self.base05)?,
            base_06: color("base06", &self.base06)?,
            base_07: color("base07", &self.base07)?,
            base_08: color("base08", &self.base08)?,
            base_09: color("base09", &self.base09)?,
            base_0a: color("base0A", &self.base0a)?,
            base_0b: color("base0B", &self.base0b)?,
            base_0c: color("base0C", &self.base0c)?,
            base_0d: color("base0D", &self.base0d)?,
            base_0e: color("base0E", &self.base0e)?,
            base_0f: color("base0F", &self.base0f)?,
        })
    }
}

fn parse_hex(value: &str) -> Option<Color> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().map(Color::from_u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SCHEME: &str = r##"
scheme: "Test Scheme"
author: "nobody"
base00: "101010"
base01: "202020"
base02: "303030"
base03: "404040"
base04: "505050"
base05: "606060"
base06: "707070"
base07: "808080"
base08: "#900000"
base09: "a00000"
base0A: "b00000"
base0B: "c00000"
base0C: "d00000"
base0D: "e00000"
base0E: "f00000"
base0F: "ffffff"
"##;

    #[test]
    fn colorfgbg_light_and_dark() {
        assert_eq!(Appearance::from_colorfgbg("0;15"), Appearance::Light);
        assert_eq!(Appearance::from_colorfgbg("15;0"), Appearance::Dark);
        assert_eq!(Appearance::from_colorfgbg("12;7"), Appearance::Light);
        assert_eq!(Appearance::from_colorfgbg("garbage"), Appearance::Dark);
    }

    #[test]
    fn color_pair_resolves_by_appearance() {
        assert_eq!(
            STATUS_BAR_BG.resolve(Appearance::Dark),
            Color::Rgb(0x24, 0x24, 0x24)
        );
        assert_eq!(
            STATUS_BAR_BG.resolve(Appearance::Light),
            Color::Rgb(0xE6, 0xE6, 0xE6)
        );
    }

    #[test]
    fn loads_base16_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SCHEME.as_bytes()).unwrap();

        let palette = Base16Palette::load(file.path()).unwrap();
        assert_eq!(palette.base_00, Color::Rgb(0x10, 0x10, 0x10));
        assert_eq!(palette.base_08, Color::Rgb(0x90, 0, 0));
        assert_eq!(palette.base_0f, Color::Rgb(0xFF, 0xFF, 0xFF));
    }

    #[test]
    fn missing_style_file_is_a_render_error() {
        let err = Base16Palette::load(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, RenderError::StyleRead { .. }));
    }

    #[test]
    fn bad_color_is_reported() {
        let broken = SCHEME.replace("\"101010\"", "\"nothex\"");
        let scheme: YamlScheme = serde_yaml::from_str(&broken).unwrap();
        let err = scheme.to_palette().unwrap_err();
        assert!(matches!(
            err,
            RenderError::StyleColor { field: "base00", .. }
        ));
    }
}
