//! CSS color string parsing for the border fill.
//!
//! The border color reaches the pipeline as an uninterpreted string. It is
//! parsed only when it is assigned as a surface fill style, and a string that
//! does not parse is simply ignored there, as a 2D canvas ignores an invalid
//! `fillStyle`.

use std::str::FromStr;

use image::Rgba;
use palette::Srgb;

/// Fill style of a fresh surface (opaque black).
pub const DEFAULT_FILL: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Parses a CSS color string into straight RGBA.
///
/// Supports `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb()`/`rgba()` in both
/// the comma and the space-separated syntax, `transparent` and the CSS named
/// colors. Returns `None` for anything else.
pub fn parse_css_color(value: &str) -> Option<Rgba<u8>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(hex) = trimmed.strip_prefix('#') {
        return parse_hex(hex);
    }

    let lower = trimmed.to_ascii_lowercase();
    if let Some(args) = functional_args(&lower, "rgba").or_else(|| functional_args(&lower, "rgb")) {
        return parse_rgb_function(args);
    }

    if lower == "transparent" {
        return Some(Rgba([0, 0, 0, 0]));
    }

    palette::named::from_str(&lower).map(|c| Rgba([c.red, c.green, c.blue, 255]))
}

fn parse_hex(hex: &str) -> Option<Rgba<u8>> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let (rgb, alpha) = match hex.len() {
        3 | 6 => (hex, 255),
        4 => {
            let a = u8::from_str_radix(&hex[3..4].repeat(2), 16).ok()?;
            (&hex[..3], a)
        }
        8 => (&hex[..6], u8::from_str_radix(&hex[6..8], 16).ok()?),
        _ => return None,
    };

    let color = Srgb::<u8>::from_str(rgb).ok()?;
    Some(Rgba([color.red, color.green, color.blue, alpha]))
}

/// Returns the text between `name(` and the closing `)`.
fn functional_args<'a>(value: &'a str, name: &str) -> Option<&'a str> {
    value
        .strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn parse_rgb_function(args: &str) -> Option<Rgba<u8>> {
    // Both `r, g, b[, a]` and `r g b[ / a]`.
    let (channels, alpha) = match args.split_once('/') {
        Some((channels, alpha)) => (channels, Some(alpha.trim())),
        None => (args, None),
    };

    let mut parts: Vec<&str> = channels
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect();

    let alpha = match (alpha, parts.len()) {
        (Some(a), 3) => Some(a),
        (None, 4) => parts.pop(),
        (None, 3) => None,
        _ => return None,
    };

    let r = parse_channel(parts[0])?;
    let g = parse_channel(parts[1])?;
    let b = parse_channel(parts[2])?;
    let a = match alpha {
        Some(a) => parse_alpha(a)?,
        None => 255,
    };

    Some(Rgba([r, g, b, a]))
}

fn parse_channel(value: &str) -> Option<u8> {
    let v = match value.strip_suffix('%') {
        Some(pct) => pct.parse::<f32>().ok()? / 100.0 * 255.0,
        None => value.parse::<f32>().ok()?,
    };
    v.is_finite().then(|| v.round().clamp(0.0, 255.0) as u8)
}

fn parse_alpha(value: &str) -> Option<u8> {
    let v = match value.strip_suffix('%') {
        Some(pct) => pct.parse::<f32>().ok()? / 100.0,
        None => value.parse::<f32>().ok()?,
    };
    v.is_finite()
        .then(|| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_forms() {
        assert_eq!(parse_css_color("#FF0000"), Some(Rgba([255, 0, 0, 255])));
        assert_eq!(parse_css_color("#0f0"), Some(Rgba([0, 255, 0, 255])));
        assert_eq!(parse_css_color("#0000ff80"), Some(Rgba([0, 0, 255, 128])));
        assert_eq!(parse_css_color("#fff8"), Some(Rgba([255, 255, 255, 136])));
        assert_eq!(parse_css_color("#12345"), None);
        assert_eq!(parse_css_color("#gggggg"), None);
    }

    #[test]
    fn rgb_functions() {
        assert_eq!(parse_css_color("rgb(10, 20, 30)"), Some(Rgba([10, 20, 30, 255])));
        assert_eq!(
            parse_css_color("rgba(255, 0, 0, 0.5)"),
            Some(Rgba([255, 0, 0, 128]))
        );
        assert_eq!(
            parse_css_color("rgb(100% 0% 0% / 25%)"),
            Some(Rgba([255, 0, 0, 64]))
        );
        assert_eq!(parse_css_color("rgb(1, 2)"), None);
    }

    #[test]
    fn named_and_keywords() {
        assert_eq!(parse_css_color("Red"), Some(Rgba([255, 0, 0, 255])));
        assert_eq!(parse_css_color("gold"), Some(Rgba([255, 215, 0, 255])));
        assert_eq!(parse_css_color("transparent"), Some(Rgba([0, 0, 0, 0])));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(parse_css_color(""), None);
        assert_eq!(parse_css_color("not-a-color"), None);
    }
}
