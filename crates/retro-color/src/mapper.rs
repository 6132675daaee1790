//! Palette Mapping
//!
//! `original color -> retro palette color` for a tone and intensity.
//! Unparseable and intentionally preserved values pass through unchanged.

use crate::color::{Hsl, Rgba};
use crate::palette::{self, RETRO_PALETTE};
use crate::parse::{is_preserved, parse_color};

/// Lightness multiplier applied in dark tone. Tunable.
pub const DARK_LIGHTNESS_FACTOR: f64 = 0.7;
/// Saturation multiplier applied in dark tone. Tunable.
pub const DARK_SATURATION_FACTOR: f64 = 1.2;
/// Fraction of the remaining headroom to white added in light tone. Tunable.
pub const LIGHT_LIFT_FACTOR: f64 = 0.3;

/// Resolved rendering tone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tone {
    #[default]
    Light,
    Dark,
}

/// Map a CSS color onto the retro palette
///
/// Returns `color` unchanged when it is preserved (keywords, gradients,
/// images), fully transparent, or cannot be parsed.
pub fn map_to_retro_palette(color: &str, tone: Tone, intensity: f64) -> String {
    map_color(color, tone, intensity).unwrap_or_else(|| color.to_string())
}

/// Like [`map_to_retro_palette`], but `None` signals passthrough
///
/// Mapping is a projection: a color that is already a toned palette value
/// for `tone` and `intensity` maps to itself.
pub fn map_color(color: &str, tone: Tone, intensity: f64) -> Option<String> {
    if is_preserved(color) {
        return None;
    }
    let original = parse_color(color)?;
    if original.is_transparent() {
        return None;
    }
    if is_toned_palette_value(original, tone, intensity) {
        return Some(original.to_css());
    }

    let target = palette::nearest(&original.to_hsl()).rgb.to_hsl();
    let adjusted = apply_tone(target, tone, intensity);
    let mapped = Hsl { a: original.a, ..adjusted }.to_rgba();

    Some(mapped.to_css())
}

fn is_toned_palette_value(color: Rgba, tone: Tone, intensity: f64) -> bool {
    RETRO_PALETTE.iter().any(|entry| {
        let toned = apply_tone(entry.rgb.to_hsl(), tone, intensity).to_rgba();
        (toned.r, toned.g, toned.b) == (color.r, color.g, color.b)
    })
}

/// Darken and saturate for dark tone, lighten for light tone, then scale
/// saturation by intensity
fn apply_tone(hsl: Hsl, tone: Tone, intensity: f64) -> Hsl {
    let intensity = if intensity.is_nan() { 0.0 } else { intensity.clamp(0.0, 1.0) };
    let (s, l) = match tone {
        Tone::Dark => (hsl.s * DARK_SATURATION_FACTOR, hsl.l * DARK_LIGHTNESS_FACTOR),
        Tone::Light => (hsl.s, hsl.l + (100.0 - hsl.l) * LIGHT_LIFT_FACTOR),
    };
    Hsl::new(hsl.h, s.min(100.0) * intensity, l, hsl.a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_color;

    #[test]
    fn test_passthrough_keywords() {
        for tone in [Tone::Light, Tone::Dark] {
            for intensity in [0.0, 0.5, 1.0] {
                assert_eq!(map_to_retro_palette("transparent", tone, intensity), "transparent");
                assert_eq!(map_to_retro_palette("inherit", tone, intensity), "inherit");
                assert_eq!(
                    map_to_retro_palette("linear-gradient(red, blue)", tone, intensity),
                    "linear-gradient(red, blue)"
                );
                assert_eq!(
                    map_to_retro_palette("url(a.png)", tone, intensity),
                    "url(a.png)"
                );
            }
        }
    }

    #[test]
    fn test_unparseable_is_identity() {
        assert_eq!(map_to_retro_palette("bogus", Tone::Dark, 1.0), "bogus");
        assert_eq!(map_to_retro_palette("rgba(0, 0, 0, 0)", Tone::Dark, 1.0), "rgba(0, 0, 0, 0)");
    }

    #[test]
    fn test_alpha_preserved() {
        let mapped = map_to_retro_palette("rgba(200, 30, 30, 0.4)", Tone::Light, 1.0);
        let parsed = parse_color(&mapped).unwrap();
        assert!((parsed.a - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_tone_direction() {
        let light = parse_color(&map_to_retro_palette("#ffffff", Tone::Light, 1.0)).unwrap();
        let dark = parse_color(&map_to_retro_palette("#ffffff", Tone::Dark, 1.0)).unwrap();
        assert!(light.to_hsl().l > dark.to_hsl().l);
    }

    #[test]
    fn test_zero_intensity_is_gray() {
        let mapped = parse_color(&map_to_retro_palette("#ff0000", Tone::Light, 0.0)).unwrap();
        assert_eq!(mapped.r, mapped.g);
        assert_eq!(mapped.g, mapped.b);
    }

    #[test]
    fn test_mapping_twice_changes_nothing() {
        for (color, tone, intensity) in [
            ("rgb(0, 0, 51)", Tone::Light, 0.0),
            ("#ffffff", Tone::Dark, 1.0),
            ("rgba(200, 30, 30, 0.4)", Tone::Light, 0.8),
        ] {
            let once = map_to_retro_palette(color, tone, intensity);
            assert_eq!(map_to_retro_palette(&once, tone, intensity), once, "{color}");
        }
    }

    #[test]
    fn test_mapping_is_stable() {
        let a = map_to_retro_palette("hsl(200, 40%, 40%)", Tone::Dark, 0.7);
        let b = map_to_retro_palette("hsl(200, 40%, 40%)", Tone::Dark, 0.7);
        assert_eq!(a, b);
    }
}
