//! Engine Configuration

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Pipeline tuning and marker names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Budget for one scan pass (full-scan chunk or incremental pass)
    pub scan_budget_ms: f64,
    /// Full-scan ceiling is `scan_budget_ms * full_scan_ceiling_multiplier`
    pub full_scan_ceiling_multiplier: u32,
    /// Apply time allowance before the remainder is deferred
    pub apply_budget_ms: f64,
    /// Elements applied between budget checks
    pub apply_yield_interval: usize,
    /// Pending elements drained per animation frame
    pub batch_size: usize,
    /// Skip invisible elements (their children are still visited)
    pub visible_only: bool,
    /// Repair text contrast against the element's mapped background
    pub repair_contrast: bool,
    pub contrast_target: f64,
    /// Set on every element a scan pass has handled
    pub processed_attribute: String,
    /// Set on every element carrying theme inline styles
    pub applied_attribute: String,
    /// Holds the element's snapshot id
    pub snapshot_id_attribute: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scan_budget_ms: 50.0,
            full_scan_ceiling_multiplier: 10,
            apply_budget_ms: 16.0,
            apply_yield_interval: 50,
            batch_size: 100,
            visible_only: true,
            repair_contrast: false,
            contrast_target: retro_color::AA_NORMAL_TEXT,
            processed_attribute: "data-retro-processed".to_string(),
            applied_attribute: "data-retro-applied".to_string(),
            snapshot_id_attribute: "data-retro-id".to_string(),
        }
    }
}

impl EngineConfig {
    /// Overall allowance for one full-page scan
    pub fn full_scan_ceiling_ms(&self) -> f64 {
        self.scan_budget_ms * self.full_scan_ceiling_multiplier as f64
    }

    pub fn validate(&self) -> EngineResult<()> {
        let positive = |value: f64, name: &'static str| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(EngineError::ZeroBudget { name })
            }
        };
        positive(self.scan_budget_ms, "scan_budget_ms")?;
        positive(self.apply_budget_ms, "apply_budget_ms")?;
        if self.apply_yield_interval == 0 {
            return Err(EngineError::ZeroBudget { name: "apply_yield_interval" });
        }
        if self.batch_size == 0 {
            return Err(EngineError::ZeroBudget { name: "batch_size" });
        }
        if self.full_scan_ceiling_multiplier < 1 {
            return Err(EngineError::InvalidCeiling(self.full_scan_ceiling_multiplier));
        }
        if !(1.0..=21.0).contains(&self.contrast_target) {
            return Err(EngineError::InvalidContrastTarget(self.contrast_target));
        }
        for name in [&self.processed_attribute, &self.applied_attribute, &self.snapshot_id_attribute] {
            let valid = !name.is_empty()
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
            if !valid {
                return Err(EngineError::InvalidAttributeName(name.clone()));
            }
        }
        Ok(())
    }
}

/// Requested theme mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
    /// Follow the host's color-scheme preference
    Auto,
}

/// User preferences as handed over by the preference provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub enabled: bool,
    pub mode: ThemeMode,
    pub intensity: f64,
    pub site_allowlist: Vec<String>,
    pub site_blocklist: Vec<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: ThemeMode::Light,
            intensity: 0.8,
            site_allowlist: Vec::new(),
            site_blocklist: Vec::new(),
        }
    }
}

impl Preferences {
    pub fn validate(&self) -> EngineResult<()> {
        if !(0.0..=1.0).contains(&self.intensity) {
            return Err(EngineError::InvalidIntensity(self.intensity));
        }
        Ok(())
    }
}
