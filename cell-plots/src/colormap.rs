use plotters::style::RGBColor;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ColorError {
    #[error("unrecognised color '{0}'")]
    Unrecognised(String),
    #[error("color component {0} is outside the displayable range")]
    OutOfRange(f64),
    #[error("color rows need 3 or 4 components, got {0}")]
    Components(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RGB {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

// matplotlib single-letter and base names, plus the CSS names the
// generators tend to use.
const NAMED: &[(&str, RGB)] = &[
    ("b", RGB::from_hex(0x0000ff)),
    ("g", RGB::from_hex(0x008000)),
    ("r", RGB::from_hex(0xff0000)),
    ("c", RGB::from_hex(0x00bfbf)),
    ("m", RGB::from_hex(0xbf00bf)),
    ("y", RGB::from_hex(0xbfbf00)),
    ("k", RGB::from_hex(0x000000)),
    ("w", RGB::from_hex(0xffffff)),
    ("black", RGB::from_hex(0x000000)),
    ("white", RGB::from_hex(0xffffff)),
    ("red", RGB::from_hex(0xff0000)),
    ("green", RGB::from_hex(0x008000)),
    ("blue", RGB::from_hex(0x0000ff)),
    ("cyan", RGB::from_hex(0x00ffff)),
    ("magenta", RGB::from_hex(0xff00ff)),
    ("yellow", RGB::from_hex(0xffff00)),
    ("orange", RGB::from_hex(0xffa500)),
    ("gold", RGB::from_hex(0xffd700)),
    ("purple", RGB::from_hex(0x800080)),
    ("pink", RGB::from_hex(0xffc0cb)),
    ("brown", RGB::from_hex(0xa52a2a)),
    ("gray", RGB::from_hex(0x808080)),
    ("grey", RGB::from_hex(0x808080)),
    ("lightgray", RGB::from_hex(0xd3d3d3)),
    ("lightgrey", RGB::from_hex(0xd3d3d3)),
    ("darkgray", RGB::from_hex(0xa9a9a9)),
    ("darkgrey", RGB::from_hex(0xa9a9a9)),
    ("navy", RGB::from_hex(0x000080)),
    ("teal", RGB::from_hex(0x008080)),
    ("olive", RGB::from_hex(0x808000)),
    ("maroon", RGB::from_hex(0x800000)),
    ("lime", RGB::from_hex(0x00ff00)),
    ("wheat", RGB::from_hex(0xf5deb3)),
    ("tab:blue", RGB::from_hex(0x1f77b4)),
    ("tab:orange", RGB::from_hex(0xff7f0e)),
    ("tab:green", RGB::from_hex(0x2ca02c)),
    ("tab:red", RGB::from_hex(0xd62728)),
    ("tab:purple", RGB::from_hex(0x9467bd)),
    ("tab:brown", RGB::from_hex(0x8c564b)),
    ("tab:pink", RGB::from_hex(0xe377c2)),
    ("tab:gray", RGB::from_hex(0x7f7f7f)),
    ("tab:olive", RGB::from_hex(0xbcbd22)),
    ("tab:cyan", RGB::from_hex(0x17becf)),
];

impl RGB {
    pub const fn from_hex(hex: u32) -> Self {
        RGB {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
        }
    }

    /// Accepts `#rgb`, `#rrggbb`, `#rrggbbaa` and the names in the table.
    /// Any alpha in the string is dropped; marker opacity comes from the style.
    pub fn parse(value: &str) -> Result<Self, ColorError> {
        let trimmed = value.trim();
        if let Some(hex) = trimmed.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| ColorError::Unrecognised(value.to_string()));
        }
        let lower = trimmed.to_ascii_lowercase();
        NAMED
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, rgb)| *rgb)
            .ok_or_else(|| ColorError::Unrecognised(value.to_string()))
    }

    /// One numeric color row: floats in `[0, 1]` or integers in `[0, 255]`.
    pub fn from_components(row: &[f64], integer: bool) -> Result<Self, ColorError> {
        if row.len() != 3 && row.len() != 4 {
            return Err(ColorError::Components(row.len()));
        }
        let scale = if integer { 1.0 } else { 255.0 };
        let channel = |v: f64| {
            let scaled = (v * scale).round();
            if !(0.0..=255.0).contains(&scaled) {
                return Err(ColorError::OutOfRange(v));
            }
            Ok(scaled as u8)
        };
        Ok(RGB {
            r: channel(row[0])?,
            g: channel(row[1])?,
            b: channel(row[2])?,
        })
    }

    pub fn to_hex_string(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn to_plotters(&self) -> RGBColor {
        RGBColor(self.r, self.g, self.b)
    }
}

fn parse_hex(hex: &str) -> Option<RGB> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|d| d * 17);
            Some(RGB {
                r: digit(0)?,
                g: digit(1)?,
                b: digit(2)?,
            })
        }
        6 | 8 => {
            let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            Some(RGB {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(RGB::parse("#e74c3c"), Ok(RGB::from_hex(0xe74c3c)));
        assert_eq!(RGB::parse("#E74C3C"), Ok(RGB::from_hex(0xe74c3c)));
        assert_eq!(RGB::parse("#fff"), Ok(RGB::from_hex(0xffffff)));
        assert_eq!(RGB::parse("#3498dbcc"), Ok(RGB::from_hex(0x3498db)));
        assert!(RGB::parse("#12345").is_err());
        assert!(RGB::parse("#gggggg").is_err());
    }

    #[test]
    fn parses_names() {
        assert_eq!(RGB::parse("gold"), Ok(RGB::from_hex(0xffd700)));
        assert_eq!(RGB::parse(" Red "), Ok(RGB::from_hex(0xff0000)));
        assert_eq!(RGB::parse("tab:blue"), Ok(RGB::from_hex(0x1f77b4)));
        assert_eq!(
            RGB::parse("chartreuse-ish"),
            Err(ColorError::Unrecognised("chartreuse-ish".into()))
        );
    }

    #[test]
    fn numeric_rows() {
        assert_eq!(
            RGB::from_components(&[1.0, 0.0, 0.5], false),
            Ok(RGB { r: 255, g: 0, b: 128 })
        );
        assert_eq!(
            RGB::from_components(&[231.0, 76.0, 60.0, 255.0], true),
            Ok(RGB::from_hex(0xe74c3c))
        );
        assert_eq!(
            RGB::from_components(&[1.0, 0.0], false),
            Err(ColorError::Components(2))
        );
        assert!(RGB::from_components(&[1.5, 0.0, 0.0], false).is_err());
    }

    #[test]
    fn hex_string() {
        assert_eq!(RGB::from_hex(0x2ecc71).to_hex_string(), "#2ecc71");
    }
}
