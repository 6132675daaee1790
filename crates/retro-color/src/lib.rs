//! Retroshade Color
//!
//! Pure color math for the retro theme: parsing, palette mapping, and WCAG
//! contrast repair. No state, no I/O.
//!
//! # Example
//! ```
//! use retro_color::{map_to_retro_palette, Tone};
//!
//! let mapped = map_to_retro_palette("#ffffff", Tone::Light, 0.8);
//! assert!(mapped.starts_with("rgb("));
//! assert_eq!(map_to_retro_palette("transparent", Tone::Dark, 1.0), "transparent");
//! ```

mod color;
mod contrast;
mod mapper;
mod palette;
mod parse;

pub use color::{Hsl, Rgba};
pub use contrast::{
    contrast_ratio, ensure_contrast, relative_luminance, validate_wcag_aa, AA_LARGE_TEXT,
    AA_NORMAL_TEXT, CONTRAST_STEP, MAX_CONTRAST_STEPS,
};
pub use mapper::{map_color, map_to_retro_palette, Tone};
pub use palette::{distance, hue_delta, nearest, PaletteColor, RETRO_PALETTE};
pub use parse::{is_preserved, named_color, parse_color};
