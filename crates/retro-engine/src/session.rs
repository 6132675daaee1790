//! Theme Session
//!
//! The per-page theme state: mode, intensity, enabled flag, and the class
//! currently applied to the document root. Constructed once per page load and
//! changed only through its setters.

use retro_color::Tone;
use retro_dom::{DomTree, NodeId};

use crate::config::{Preferences, ThemeMode};
use crate::error::{EngineError, EngineResult};

/// Root class prefix; the full class is `retro-theme-light` or `-dark`
pub const ROOT_CLASS_PREFIX: &str = "retro-theme-";
/// Root attribute carrying the resolved tone
pub const ROOT_MODE_ATTRIBUTE: &str = "data-retro-mode";
/// Root attribute carrying the intensity
pub const ROOT_INTENSITY_ATTRIBUTE: &str = "data-retro-intensity";

#[derive(Debug, Clone, PartialEq)]
pub struct ThemeSession {
    mode: ThemeMode,
    intensity: f64,
    enabled: bool,
    prefers_dark: bool,
    applied_class: Option<String>,
}

impl ThemeSession {
    pub fn new(mode: ThemeMode, intensity: f64, enabled: bool) -> EngineResult<Self> {
        check_intensity(intensity)?;
        Ok(Self {
            mode,
            intensity,
            enabled,
            prefers_dark: false,
            applied_class: None,
        })
    }

    pub fn from_preferences(preferences: &Preferences) -> EngineResult<Self> {
        Self::new(preferences.mode, preferences.intensity, preferences.enabled)
    }

    pub fn mode(&self) -> ThemeMode {
        self.mode
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn prefers_dark(&self) -> bool {
        self.prefers_dark
    }

    /// Class currently set on the document root, if any
    pub fn applied_class(&self) -> Option<&str> {
        self.applied_class.as_deref()
    }

    /// Tone after resolving `auto` against the host color-scheme preference
    pub fn tone(&self) -> Tone {
        match self.mode {
            ThemeMode::Light => Tone::Light,
            ThemeMode::Dark => Tone::Dark,
            ThemeMode::Auto if self.prefers_dark => Tone::Dark,
            ThemeMode::Auto => Tone::Light,
        }
    }

    pub fn set_mode(&mut self, mode: ThemeMode) {
        self.mode = mode;
    }

    pub fn set_intensity(&mut self, intensity: f64) -> EngineResult<()> {
        check_intensity(intensity)?;
        self.intensity = intensity;
        Ok(())
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_prefers_dark(&mut self, prefers_dark: bool) {
        self.prefers_dark = prefers_dark;
    }

    /// Put the theme class and attributes on `root`, replacing a class set
    /// for a different tone
    pub fn apply_root(&mut self, tree: &mut DomTree, root: NodeId) {
        let tone = match self.tone() {
            Tone::Light => "light",
            Tone::Dark => "dark",
        };
        let class = format!("{ROOT_CLASS_PREFIX}{tone}");
        if let Some(previous) = self.applied_class.take() {
            if previous != class {
                tree.remove_class(root, &previous);
            }
        }
        tree.add_class(root, &class);
        tree.set_attribute(root, ROOT_MODE_ATTRIBUTE, tone);
        tree.set_attribute(root, ROOT_INTENSITY_ATTRIBUTE, &format_intensity(self.intensity));
        self.applied_class = Some(class);
    }

    /// Remove everything [`ThemeSession::apply_root`] added. Safe to repeat.
    pub fn strip_root(&mut self, tree: &mut DomTree, root: NodeId) {
        if let Some(class) = self.applied_class.take() {
            tree.remove_class(root, &class);
        }
        for tone in ["light", "dark"] {
            tree.remove_class(root, &format!("{ROOT_CLASS_PREFIX}{tone}"));
        }
        tree.remove_attribute(root, ROOT_MODE_ATTRIBUTE);
        tree.remove_attribute(root, ROOT_INTENSITY_ATTRIBUTE);
    }
}

fn check_intensity(intensity: f64) -> EngineResult<()> {
    if (0.0..=1.0).contains(&intensity) {
        Ok(())
    } else {
        Err(EngineError::InvalidIntensity(intensity))
    }
}

fn format_intensity(intensity: f64) -> String {
    let text = format!("{intensity:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
