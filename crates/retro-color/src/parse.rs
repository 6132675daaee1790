//! CSS Color Parsing
//!
//! Accepts hex, `rgb()`/`rgba()`, `hsl()`/`hsla()` (comma or space separated,
//! optional `/ alpha`) and named colors. Anything else is unparseable.

use crate::color::{Hsl, Rgba};

/// Values the mapper must never rewrite, even when they would parse
const PRESERVED_KEYWORDS: &[&str] = &[
    "",
    "transparent",
    "inherit",
    "initial",
    "unset",
    "revert",
    "revert-layer",
    "currentcolor",
    "none",
    "auto",
];

/// Whether a color value is intentionally left untouched
///
/// Covers CSS-wide keywords, `transparent`, `currentcolor`, custom property
/// references, and anything carrying a gradient or image.
pub fn is_preserved(value: &str) -> bool {
    let value = value.trim().to_ascii_lowercase();
    PRESERVED_KEYWORDS.iter().any(|k| *k == value)
        || value.contains("gradient")
        || value.contains("url(")
        || value.starts_with("var(")
}

/// Parse a CSS color value
pub fn parse_color(input: &str) -> Option<Rgba> {
    let value = input.trim().to_ascii_lowercase();

    if value.starts_with('#') {
        return Rgba::from_hex(&value);
    }

    if let Some(open) = value.find('(') {
        let inner = value[open + 1..].strip_suffix(')')?;
        let args = split_args(inner);
        return match &value[..open] {
            "rgb" | "rgba" => parse_rgb_args(&args),
            "hsl" | "hsla" => parse_hsl_args(&args),
            _ => None,
        };
    }

    named_color(&value)
}

fn split_args(inner: &str) -> Vec<&str> {
    inner
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_rgb_args(args: &[&str]) -> Option<Rgba> {
    if args.len() != 3 && args.len() != 4 {
        return None;
    }
    let r = rgb_component(args[0])?;
    let g = rgb_component(args[1])?;
    let b = rgb_component(args[2])?;
    let a = match args.get(3) {
        Some(a) => alpha_component(a)?,
        None => 1.0,
    };
    Some(Rgba::rgba(r, g, b, a))
}

fn parse_hsl_args(args: &[&str]) -> Option<Rgba> {
    if args.len() != 3 && args.len() != 4 {
        return None;
    }
    let h = hue_component(args[0])?;
    let s = percent_component(args[1])?;
    let l = percent_component(args[2])?;
    let a = match args.get(3) {
        Some(a) => alpha_component(a)?,
        None => 1.0,
    };
    Some(Hsl::new(h, s, l, a).to_rgba())
}

fn number(s: &str) -> Option<f64> {
    let v: f64 = s.parse().ok()?;
    v.is_finite().then_some(v)
}

fn rgb_component(s: &str) -> Option<u8> {
    let v = match s.strip_suffix('%') {
        Some(pct) => number(pct)? * 255.0 / 100.0,
        None => number(s)?,
    };
    Some(v.round().clamp(0.0, 255.0) as u8)
}

fn alpha_component(s: &str) -> Option<f64> {
    let v = match s.strip_suffix('%') {
        Some(pct) => number(pct)? / 100.0,
        None => number(s)?,
    };
    Some(v.clamp(0.0, 1.0))
}

fn percent_component(s: &str) -> Option<f64> {
    number(s.strip_suffix('%').unwrap_or(s))
}

fn hue_component(s: &str) -> Option<f64> {
    if let Some(v) = s.strip_suffix("deg") {
        number(v)
    } else if let Some(v) = s.strip_suffix("grad") {
        Some(number(v)? * 0.9)
    } else if let Some(v) = s.strip_suffix("rad") {
        Some(number(v)?.to_degrees())
    } else if let Some(v) = s.strip_suffix("turn") {
        Some(number(v)? * 360.0)
    } else {
        number(s)
    }
}

/// Look up a named color
pub fn named_color(name: &str) -> Option<Rgba> {
    Some(match name {
        "transparent" => Rgba::TRANSPARENT,
        "black" => Rgba::BLACK,
        "white" => Rgba::WHITE,
        "red" => Rgba::rgb(255, 0, 0),
        "green" => Rgba::rgb(0, 128, 0),
        "blue" => Rgba::rgb(0, 0, 255),
        "yellow" => Rgba::rgb(255, 255, 0),
        "cyan" | "aqua" => Rgba::rgb(0, 255, 255),
        "magenta" | "fuchsia" => Rgba::rgb(255, 0, 255),
        "gray" | "grey" => Rgba::rgb(128, 128, 128),
        "silver" => Rgba::rgb(192, 192, 192),
        "maroon" => Rgba::rgb(128, 0, 0),
        "olive" => Rgba::rgb(128, 128, 0),
        "lime" => Rgba::rgb(0, 255, 0),
        "navy" => Rgba::rgb(0, 0, 128),
        "purple" => Rgba::rgb(128, 0, 128),
        "teal" => Rgba::rgb(0, 128, 128),
        "orange" => Rgba::rgb(255, 165, 0),
        "pink" => Rgba::rgb(255, 192, 203),
        "brown" => Rgba::rgb(165, 42, 42),
        "gold" => Rgba::rgb(255, 215, 0),
        "beige" => Rgba::rgb(245, 245, 220),
        "ivory" => Rgba::rgb(255, 255, 240),
        "khaki" => Rgba::rgb(240, 230, 140),
        "coral" => Rgba::rgb(255, 127, 80),
        "salmon" => Rgba::rgb(250, 128, 114),
        "tomato" => Rgba::rgb(255, 99, 71),
        "crimson" => Rgba::rgb(220, 20, 60),
        "indigo" => Rgba::rgb(75, 0, 130),
        "violet" => Rgba::rgb(238, 130, 238),
        "orchid" => Rgba::rgb(218, 112, 214),
        "tan" => Rgba::rgb(210, 180, 140),
        "chocolate" => Rgba::rgb(210, 105, 30),
        "sienna" => Rgba::rgb(160, 82, 45),
        "whitesmoke" => Rgba::rgb(245, 245, 245),
        "gainsboro" => Rgba::rgb(220, 220, 220),
        "lightgray" | "lightgrey" => Rgba::rgb(211, 211, 211),
        "darkgray" | "darkgrey" => Rgba::rgb(169, 169, 169),
        "dimgray" | "dimgrey" => Rgba::rgb(105, 105, 105),
        "slategray" | "slategrey" => Rgba::rgb(112, 128, 144),
        "steelblue" => Rgba::rgb(70, 130, 180),
        "royalblue" => Rgba::rgb(65, 105, 225),
        "skyblue" => Rgba::rgb(135, 206, 235),
        "lightblue" => Rgba::rgb(173, 216, 230),
        "darkblue" => Rgba::rgb(0, 0, 139),
        "darkred" => Rgba::rgb(139, 0, 0),
        "darkgreen" => Rgba::rgb(0, 100, 0),
        "forestgreen" => Rgba::rgb(34, 139, 34),
        "seagreen" => Rgba::rgb(46, 139, 87),
        "olivedrab" => Rgba::rgb(107, 142, 35),
        "turquoise" => Rgba::rgb(64, 224, 208),
        "rebeccapurple" => Rgba::rgb(102, 51, 153),
        _ => return None,
    })
}
