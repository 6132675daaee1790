//! Command line arguments

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use retro_engine::ThemeMode;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "retro-theme",
    about = "Apply the Retroshade theme to an HTML file",
    version
)]
pub struct CliArgs {
    /// HTML file to theme
    pub input: PathBuf,

    /// Theme mode
    #[arg(long, value_enum, default_value_t = ModeArg::Light)]
    pub mode: ModeArg,

    /// Saturation intensity, 0 to 1
    #[arg(long, value_parser = parse_intensity, default_value = "0.8")]
    pub intensity: f64,

    /// Host color scheme for auto mode
    #[arg(long)]
    pub prefers_dark: bool,

    /// Engine configuration (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Theme, revert, and verify the page is unchanged
    #[arg(long)]
    pub revert_check: bool,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum ModeArg {
    Light,
    Dark,
    Auto,
}

impl ModeArg {
    pub fn as_mode(self) -> ThemeMode {
        match self {
            ModeArg::Light => ThemeMode::Light,
            ModeArg::Dark => ThemeMode::Dark,
            ModeArg::Auto => ThemeMode::Auto,
        }
    }
}

fn parse_intensity(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid intensity `{raw}`"))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("intensity must be between 0 and 1, got {value}"));
    }
    Ok(value)
}
