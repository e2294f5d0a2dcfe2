//! # Unit Types
//!
//! The engine computes in SI base units throughout (kg, m, s, rad, Pa).
//! The wall-compression regression was fitted in US customary units, so this
//! module provides the few newtype wrappers needed to cross that boundary.
//!
//! ## Example
//!
//! ```rust
//! use layup_core::units::{Inches, Meters};
//!
//! let wall = Meters(0.0254);
//! let wall_in: Inches = wall.into();
//! assert!((wall_in.0 - 1.0).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};

/// Metres per inch (exact by definition)
pub const METERS_PER_INCH: f64 = 0.0254;

/// Newtons per pound-force (exact by definition of the standard pound)
pub const NEWTONS_PER_LBF: f64 = 4.448_221_615_260_5;

// ============================================================================
// Length Units
// ============================================================================

/// Length in metres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

/// Length in inches
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inches(pub f64);

impl From<Meters> for Inches {
    fn from(m: Meters) -> Self {
        Inches(m.0 / METERS_PER_INCH)
    }
}

impl From<Inches> for Meters {
    fn from(inches: Inches) -> Self {
        Meters(inches.0 * METERS_PER_INCH)
    }
}

// ============================================================================
// Moment Units (bending stiffness per unit width reads in the same units)
// ============================================================================

/// Moment in newton-metres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NewtonMeters(pub f64);

/// Moment in pound-force inches
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LbfInches(pub f64);

impl From<NewtonMeters> for LbfInches {
    fn from(nm: NewtonMeters) -> Self {
        LbfInches(nm.0 / (NEWTONS_PER_LBF * METERS_PER_INCH))
    }
}

impl From<LbfInches> for NewtonMeters {
    fn from(lbfin: LbfInches) -> Self {
        NewtonMeters(lbfin.0 * NEWTONS_PER_LBF * METERS_PER_INCH)
    }
}

// ============================================================================
// Angles
// ============================================================================

/// Convert an angle in degrees to radians
#[inline]
pub fn deg_to_rad(degrees: f64) -> f64 {
    degrees.to_radians()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_length_conversions() {
        let inches: Inches = Meters(1.0).into();
        assert_relative_eq!(inches.0, 39.370_078_740_157_48, max_relative = 1e-12);

        let back: Meters = Inches(12.0).into();
        assert_relative_eq!(back.0, 0.3048, max_relative = 1e-12);
    }

    #[test]
    fn test_moment_conversions() {
        // 1 N·m is about 8.8507 lbf·in
        let lbfin: LbfInches = NewtonMeters(1.0).into();
        assert_relative_eq!(lbfin.0, 8.850_745_793_490_558, max_relative = 1e-9);

        let nm: NewtonMeters = lbfin.into();
        assert_relative_eq!(nm.0, 1.0, max_relative = 1e-12);
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&Meters(0.5)).unwrap();
        assert_eq!(json, "0.5");
    }
}
