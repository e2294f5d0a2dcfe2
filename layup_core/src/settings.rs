//! # Analysis Settings
//!
//! Knobs that control how a molded tube is sampled and integrated. They
//! travel with each tube in a design document, so a saved part reproduces
//! the same numbers when reloaded.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Default sample count for Simpson's rule (must be odd)
pub const DEFAULT_SIMPSON_SAMPLES: usize = 101;

/// Default offset (m) placed either side of a ply boundary by `positions()`
pub const DEFAULT_POSITION_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Samples used by Simpson's rule; odd and at least 3
    pub simpson_samples: usize,

    /// Neighbour offset used to straddle step changes at ply ends (m)
    pub position_epsilon: f64,

    /// Extend the outer-diameter profile linearly past its end points
    /// instead of failing with `OutOfRange`
    pub extrapolate: bool,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        AnalysisSettings {
            simpson_samples: DEFAULT_SIMPSON_SAMPLES,
            position_epsilon: DEFAULT_POSITION_EPSILON,
            extrapolate: false,
        }
    }
}

impl AnalysisSettings {
    pub fn validate(&self) -> CalcResult<()> {
        if self.simpson_samples < 3 || self.simpson_samples % 2 == 0 {
            return Err(CalcError::invalid_input(
                "simpson_samples",
                self.simpson_samples.to_string(),
                "Sample count must be odd and at least 3",
            ));
        }
        if !(self.position_epsilon.is_finite() && self.position_epsilon > 0.0) {
            return Err(CalcError::invalid_input(
                "position_epsilon",
                self.position_epsilon.to_string(),
                "Epsilon must be positive",
            ));
        }
        Ok(())
    }
}
