//! Engine errors
//!
//! Only configuration and preference values can be rejected. The pipeline
//! operations themselves treat every page anomaly as routine.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("intensity must be within 0..=1, got {0}")]
    InvalidIntensity(f64),

    #[error("{name} must be greater than zero")]
    ZeroBudget { name: &'static str },

    #[error("full scan ceiling multiplier must be at least 1, got {0}")]
    InvalidCeiling(u32),

    #[error("contrast target must be within 1..=21, got {0}")]
    InvalidContrastTarget(f64),

    #[error("marker attribute `{0}` is not a valid attribute name")]
    InvalidAttributeName(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
