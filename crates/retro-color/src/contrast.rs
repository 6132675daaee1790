//! WCAG Contrast
//!
//! Relative luminance, contrast ratio, AA validation, and lightness-only
//! contrast repair.

use crate::color::Rgba;
use crate::parse::parse_color;

/// Lightness step per repair iteration (percentage points). Tunable.
pub const CONTRAST_STEP: f64 = 5.0;
/// Upper bound on repair iterations: `100 / CONTRAST_STEP`
pub const MAX_CONTRAST_STEPS: usize = 20;
/// AA ratio for normal text
pub const AA_NORMAL_TEXT: f64 = 4.5;
/// AA ratio for large text
pub const AA_LARGE_TEXT: f64 = 3.0;

/// Background luminance at which black and white give equal contrast.
/// Above it, darker text always gains contrast; below it, lighter text does.
const LUMINANCE_CROSSOVER: f64 = 0.179_128_784_747_792;

/// WCAG relative luminance of an sRGB color (alpha ignored)
pub fn relative_luminance(color: Rgba) -> f64 {
    fn linear(c: u8) -> f64 {
        let c = c as f64 / 255.0;
        if c <= 0.039_28 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) }
    }
    0.2126 * linear(color.r) + 0.7152 * linear(color.g) + 0.0722 * linear(color.b)
}

/// WCAG contrast ratio, `1.0..=21.0`
pub fn contrast_ratio(a: Rgba, b: Rgba) -> f64 {
    let la = relative_luminance(a);
    let lb = relative_luminance(b);
    let (hi, lo) = if la > lb { (la, lb) } else { (lb, la) };
    (hi + 0.05) / (lo + 0.05)
}

/// Whether `fg` on `bg` meets WCAG AA; unparseable input fails
pub fn validate_wcag_aa(fg: &str, bg: &str, large_text: bool) -> bool {
    let (Some(fg), Some(bg)) = (parse_color(fg), parse_color(bg)) else {
        return false;
    };
    let required = if large_text { AA_LARGE_TEXT } else { AA_NORMAL_TEXT };
    contrast_ratio(fg, bg) >= required
}

/// Step the foreground's lightness away from the background until the
/// contrast ratio reaches `target_ratio`
///
/// Returns `fg` unchanged if it already passes or either color is
/// unparseable. When no lightness in `[0, 100]` reaches the target, the most
/// adjusted candidate is returned. Never runs more than
/// [`MAX_CONTRAST_STEPS`] iterations.
pub fn ensure_contrast(fg: &str, bg: &str, target_ratio: f64) -> String {
    let (Some(fg_rgba), Some(bg_rgba)) = (parse_color(fg), parse_color(bg)) else {
        return fg.to_string();
    };
    if contrast_ratio(fg_rgba, bg_rgba) >= target_ratio {
        return fg.to_string();
    }

    let darken = relative_luminance(bg_rgba) > LUMINANCE_CROSSOVER;
    let mut hsl = fg_rgba.to_hsl();
    let mut candidate = fg_rgba;

    for _ in 0..MAX_CONTRAST_STEPS {
        let next = if darken {
            (hsl.l - CONTRAST_STEP).max(0.0)
        } else {
            (hsl.l + CONTRAST_STEP).min(100.0)
        };
        if next == hsl.l {
            break;
        }
        hsl = hsl.with_lightness(next);
        candidate = hsl.to_rgba();
        if contrast_ratio(candidate, bg_rgba) >= target_ratio {
            return candidate.to_css();
        }
    }

    tracing::trace!(fg, bg, target_ratio, "contrast target unreachable by lightness alone");
    candidate.to_css()
}
