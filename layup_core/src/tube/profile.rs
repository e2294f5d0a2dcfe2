//! Outer-diameter profile of a tubular part.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// One sample of the profile: axial position and outer diameter (m)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfilePoint {
    pub x: f64,
    pub od: f64,
}

/// Piecewise-linear OD(x), strictly increasing in x.
///
/// ## JSON Example
///
/// ```json
/// [ { "x": 0.0, "od": 0.025 }, { "x": 0.5, "od": 0.025 }, { "x": 0.8, "od": 0.066 } ]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ProfilePoint>", into = "Vec<ProfilePoint>")]
pub struct Profile {
    points: Vec<ProfilePoint>,
}

impl Profile {
    pub fn new(points: Vec<ProfilePoint>) -> CalcResult<Profile> {
        if points.len() < 2 {
            return Err(CalcError::invalid_input(
                "profile",
                points.len().to_string(),
                "A profile needs at least two points",
            ));
        }
        for point in &points {
            if !point.x.is_finite() {
                return Err(CalcError::invalid_input("x", point.x.to_string(), "Position must be finite"));
            }
            if !(point.od.is_finite() && point.od > 0.0) {
                return Err(CalcError::invalid_input("od", point.od.to_string(), "Diameter must be positive"));
            }
        }
        if let Some(pair) = points.windows(2).find(|pair| pair[1].x <= pair[0].x) {
            return Err(CalcError::invalid_input(
                "x",
                pair[1].x.to_string(),
                "Profile positions must be strictly increasing",
            ));
        }
        Ok(Profile { points })
    }

    /// Build from `(x, od)` pairs
    pub fn from_pairs(pairs: &[(f64, f64)]) -> CalcResult<Profile> {
        Profile::new(pairs.iter().map(|&(x, od)| ProfilePoint { x, od }).collect())
    }

    pub fn points(&self) -> &[ProfilePoint] {
        &self.points
    }

    pub fn x_min(&self) -> f64 {
        self.points[0].x
    }

    pub fn x_max(&self) -> f64 {
        self.points[self.points.len() - 1].x
    }

    pub fn breakpoints(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.x)
    }

    pub fn contains(&self, x: f64) -> bool {
        x >= self.x_min() && x <= self.x_max()
    }

    /// OD at `x`; fails outside `[x_min, x_max]`.
    pub fn od_at(&self, x: f64) -> CalcResult<f64> {
        if !self.contains(x) {
            return Err(CalcError::out_of_range("x", x, self.x_min(), self.x_max()));
        }
        Ok(self.interpolate(x))
    }

    /// OD at `x`, extending the end segments linearly past the ends.
    pub fn od_at_extrapolated(&self, x: f64) -> f64 {
        if !self.contains(x) {
            warn!("extrapolating profile to x = {x} (range {} .. {})", self.x_min(), self.x_max());
        }
        self.interpolate(x)
    }

    fn interpolate(&self, x: f64) -> f64 {
        let n = self.points.len();
        let i = self.points.partition_point(|p| p.x <= x).clamp(1, n - 1);
        let (p0, p1) = (self.points[i - 1], self.points[i]);
        p0.od + (p1.od - p0.od) * (x - p0.x) / (p1.x - p0.x)
    }
}

impl TryFrom<Vec<ProfilePoint>> for Profile {
    type Error = CalcError;

    fn try_from(points: Vec<ProfilePoint>) -> CalcResult<Profile> {
        Profile::new(points)
    }
}

impl From<Profile> for Vec<ProfilePoint> {
    fn from(profile: Profile) -> Self {
        profile.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bat() -> Profile {
        Profile::from_pairs(&[(0.0, 0.025), (0.4, 0.025), (0.6, 0.060), (0.8, 0.066)]).unwrap()
    }

    #[test]
    fn test_interpolation() {
        let p = bat();
        assert_eq!(p.od_at(0.0).unwrap(), 0.025);
        assert_eq!(p.od_at(0.4).unwrap(), 0.025);
        assert_relative_eq!(p.od_at(0.5).unwrap(), 0.0425, max_relative = 1e-12);
        assert_relative_eq!(p.od_at(0.8).unwrap(), 0.066, max_relative = 1e-12);
    }

    #[test]
    fn test_out_of_range() {
        let p = bat();
        let err = p.od_at(0.9).unwrap_err();
        assert_eq!(err, CalcError::out_of_range("x", 0.9, 0.0, 0.8));
        assert!(p.od_at(-0.01).is_err());
    }

    #[test]
    fn test_extrapolation() {
        let p = bat();
        // Last segment slope is 0.006 / 0.2 = 0.03
        assert_relative_eq!(p.od_at_extrapolated(0.9), 0.069, max_relative = 1e-12);
        assert_relative_eq!(p.od_at_extrapolated(-0.1), 0.025, max_relative = 1e-12);
    }

    #[test]
    fn test_validation() {
        assert!(Profile::from_pairs(&[(0.0, 0.02)]).is_err());
        let err = Profile::from_pairs(&[(0.0, 0.02), (0.0, 0.03)]).unwrap_err();
        assert_eq!(err.field(), Some("x"));
        let err = Profile::from_pairs(&[(0.0, 0.02), (1.0, -0.03)]).unwrap_err();
        assert_eq!(err.field(), Some("od"));
    }

    #[test]
    fn test_serde_validates() {
        let json = serde_json::to_string(&bat()).unwrap();
        let back: Profile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bat());

        let bad: Result<Profile, _> = serde_json::from_str(r#"[{"x": 1.0, "od": 0.02}, {"x": 0.0, "od": 0.02}]"#);
        assert!(bad.is_err());
    }
}
