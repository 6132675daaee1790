//! Retro Palette
//!
//! The seven fixed palette colors and the weighted perceptual distance used to
//! pick the nearest one.

use std::sync::OnceLock;

use crate::color::{Hsl, Rgba};

/// Weight applied to the wrapped hue difference (degrees). Tunable.
pub const HUE_WEIGHT: f64 = 2.0;
/// Weight applied to the saturation difference (percent). Tunable.
pub const SATURATION_WEIGHT: f64 = 1.0;
/// Weight applied to the lightness difference (percent). Tunable.
pub const LIGHTNESS_WEIGHT: f64 = 0.5;

/// A named palette entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaletteColor {
    pub name: &'static str,
    pub rgb: Rgba,
}

/// The retro palette, in tie-break order
pub const RETRO_PALETTE: [PaletteColor; 7] = [
    PaletteColor { name: "sand", rgb: Rgba::rgb(0xb7, 0xb2, 0xa5) },
    PaletteColor { name: "mustard", rgb: Rgba::rgb(0xfb, 0xcd, 0x43) },
    PaletteColor { name: "tangerine", rgb: Rgba::rgb(0xe8, 0x70, 0x2a) },
    PaletteColor { name: "brick", rgb: Rgba::rgb(0xc0, 0x46, 0x3b) },
    PaletteColor { name: "teal", rgb: Rgba::rgb(0x3f, 0x8f, 0x8a) },
    PaletteColor { name: "denim", rgb: Rgba::rgb(0x4a, 0x6c, 0x93) },
    PaletteColor { name: "espresso", rgb: Rgba::rgb(0x3b, 0x36, 0x31) },
];

fn palette_hsl() -> &'static [Hsl; 7] {
    static HSL: OnceLock<[Hsl; 7]> = OnceLock::new();
    HSL.get_or_init(|| RETRO_PALETTE.map(|entry| entry.rgb.to_hsl()))
}

/// Shortest angular distance between two hues, in degrees
pub fn hue_delta(a: f64, b: f64) -> f64 {
    let d = (a - b).abs().rem_euclid(360.0);
    d.min(360.0 - d)
}

/// Weighted distance between two HSL colors
///
/// `2·hue + |ΔS| + 0.5·|ΔL|`. Hue does not contribute when either side is
/// achromatic, since a gray has no hue to compare.
pub fn distance(a: &Hsl, b: &Hsl) -> f64 {
    let hue = if a.is_achromatic() || b.is_achromatic() {
        0.0
    } else {
        hue_delta(a.h, b.h)
    };
    HUE_WEIGHT * hue + SATURATION_WEIGHT * (a.s - b.s).abs() + LIGHTNESS_WEIGHT * (a.l - b.l).abs()
}

/// Nearest palette entry; on equal distance the earlier entry wins
pub fn nearest(input: &Hsl) -> &'static PaletteColor {
    &RETRO_PALETTE[nearest_index(input, palette_hsl())]
}

fn nearest_index(input: &Hsl, candidates: &[Hsl]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (idx, candidate) in candidates.iter().enumerate() {
        let d = distance(input, candidate);
        if d < best_distance {
            best = idx;
            best_distance = d;
        }
    }
    best
}
