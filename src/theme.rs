//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Block palette and UI colours, One Dark by default.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Block colours (palette index 0..=5): green, yellow, red, blue,
    /// magenta, cyan. Games with fewer colours use a prefix of this array.
    pub blocks: [Color; 6],
    /// Board background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, counters).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Inactive / secondary text.
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

/// Theme-file key per block slot, with the One Dark hex fallback.
const BLOCK_KEYS: [(&str, &str); 6] = [
    ("mem_box", "#98C379"),  // green
    ("cpu_mid", "#E5C07B"),  // yellow
    ("cpu_end", "#E06C75"),  // red
    ("cpu_box", "#61AFEF"),  // blue
    ("net_box", "#C678DD"),  // magenta
    ("hi_fg", "#56B6C2"),    // cyan
];

impl Theme {
    /// Hardcoded One Dark defaults (exact hex values from onedark.theme).
    pub fn onedark_default() -> Self {
        let mut blocks = [Color::Reset; 6];
        for (slot, (_, hex)) in blocks.iter_mut().zip(BLOCK_KEYS) {
            *slot = parse_hex(hex).unwrap();
        }
        Self {
            blocks,
            bg: parse_hex("#31353F").unwrap(),
            div_line: parse_hex("#3F444F").unwrap(),
            main_fg: parse_hex("#ABB2BF").unwrap(),
            title: parse_hex("#E5C07B").unwrap(),
            inactive_fg: parse_hex("#5C6370").unwrap(),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"`.
    /// Falls back to One Dark defaults if path is None or file is missing.
    /// `palette` selects the colour variant.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => {
                let mut t = Self::onedark_default();
                t.apply_palette(palette);
                return Ok(t);
            }
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Override block colours for high-contrast or colorblind variants.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        let hexes: [&str; 6] = match palette {
            crate::Palette::Normal => return,
            // Saturated primaries on a dark background.
            crate::Palette::HighContrast => [
                "#00FF00", "#FFFF00", "#FF0000", "#0088FF", "#FF00FF", "#00FFFF",
            ],
            // Avoid red/green confusion pairs.
            crate::Palette::Colorblind => [
                "#0077BB", "#EE7733", "#009988", "#CC3311", "#EE3377", "#BBBB00",
            ],
        };
        for (slot, hex) in self.blocks.iter_mut().zip(hexes) {
            *slot = parse_hex(hex).unwrap();
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str, fallback: &str| {
            map.get(key)
                .and_then(|v| parse_hex(v).ok())
                .unwrap_or_else(|| parse_hex(fallback).unwrap())
        };
        let mut blocks = [Color::Reset; 6];
        for (slot, (key, fallback)) in blocks.iter_mut().zip(BLOCK_KEYS) {
            *slot = get(key, fallback);
        }
        Self {
            blocks,
            bg: get("meter_bg", "#31353F"),
            div_line: get("div_line", "#3F444F"),
            main_fg: get("main_fg", "#ABB2BF"),
            title: get("title", "#E5C07B"),
            inactive_fg: get("inactive_fg", "#5C6370"),
        }
    }

    /// Block colour for a palette index.
    #[inline]
    pub fn block_color(&self, index: u8) -> Color {
        self.blocks[(index as usize) % 6]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(stripped) = line.strip_prefix("theme[") {
            if let Some(end) = stripped.find(']') {
                let key = stripped[..end].trim();
                let rest = stripped[end + 1..].trim();
                if let Some(eq) = rest.find('=') {
                    let value = rest[eq + 1..]
                        .trim()
                        .trim_matches('"')
                        .trim_matches('\'')
                        .to_string();
                    if !value.is_empty() {
                        map.insert(key.to_string(), value);
                    }
                }
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let (r, g, b) = if s.len() == 6 {
        let r =
            u8::from_str_radix(&s[0..2], 16).map_err(|_| ThemeError::InvalidHex(s.to_string()))?;
        let g =
            u8::from_str_radix(&s[2..4], 16).map_err(|_| ThemeError::InvalidHex(s.to_string()))?;
        let b =
            u8::from_str_radix(&s[4..6], 16).map_err(|_| ThemeError::InvalidHex(s.to_string()))?;
        (r, g, b)
    } else if s.len() == 3 {
        let r = u8::from_str_radix(&s[0..1], 16)
            .map_err(|_| ThemeError::InvalidHex(s.to_string()))?
            * 17;
        let g = u8::from_str_radix(&s[1..2], 16)
            .map_err(|_| ThemeError::InvalidHex(s.to_string()))?
            * 17;
        let b = u8::from_str_radix(&s[2..3], 16)
            .map_err(|_| ThemeError::InvalidHex(s.to_string()))?
            * 17;
        (r, g, b)
    } else {
        return Err(ThemeError::InvalidHex(s.to_string()));
    };
    Ok(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#98C379").unwrap();
        assert!(matches!(c, Color::Rgb(0x98, 0xC3, 0x79)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[meter_bg]="#31353F""##);
        assert_eq!(map.get("meter_bg"), Some(&"#31353F".to_string()));
    }

    #[test]
    fn block_color_wraps_palette_index() {
        let t = Theme::default();
        assert_eq!(t.block_color(1), t.block_color(7));
    }

    #[test]
    fn theme_file_overrides_block_slot() {
        let map = parse_theme_file(r##"theme[mem_box]="#112233""##);
        let t = Theme::from_map(&map);
        assert!(matches!(t.blocks[0], Color::Rgb(0x11, 0x22, 0x33)));
    }
}
