//! ABD stiffness block.
//!
//! A 6×6 matrix relating `[Nx, Ny, Nxy, Mx, My, Mxy]` to
//! `[ε0x, ε0y, γ0xy, κx, κy, κxy]`, held as three 3×3 blocks:
//!
//! ```text
//! | A  B |
//! | B  D |
//! ```
//!
//! Every block is expressed about some reference surface. Moving that
//! surface, rotating the axes or flipping the stack over are all linear maps
//! on the blocks, so they commute with each other and with summation.

use std::ops::{Add, AddAssign};

use nalgebra::{Matrix3, Matrix6};

use crate::errors::{CalcError, CalcResult};
use crate::units::deg_to_rad;

pub type Mat3 = Matrix3<f64>;
pub type Mat6 = Matrix6<f64>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Abd(Mat6);

impl Abd {
    pub fn zeros() -> Self {
        Abd(Mat6::zeros())
    }

    pub fn from_blocks(a: &Mat3, b: &Mat3, d: &Mat3) -> Self {
        let mut m = Mat6::zeros();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(a);
        m.fixed_view_mut::<3, 3>(0, 3).copy_from(b);
        m.fixed_view_mut::<3, 3>(3, 0).copy_from(b);
        m.fixed_view_mut::<3, 3>(3, 3).copy_from(d);
        Abd(m)
    }

    pub fn a(&self) -> Mat3 {
        self.0.fixed_view::<3, 3>(0, 0).into_owned()
    }

    pub fn b(&self) -> Mat3 {
        self.0.fixed_view::<3, 3>(0, 3).into_owned()
    }

    pub fn d(&self) -> Mat3 {
        self.0.fixed_view::<3, 3>(3, 3).into_owned()
    }

    pub fn matrix(&self) -> &Mat6 {
        &self.0
    }

    /// Transform from ply axes to axes rotated by `degrees` (counter-clockwise
    /// from the laminate x-axis to the ply 1-axis).
    pub fn rotated(&self, degrees: f64) -> Abd {
        if degrees == 0.0 {
            return *self;
        }
        let r = rotation(degrees);
        let rt = r.transpose();
        Abd::from_blocks(&(r * self.a() * rt), &(r * self.b() * rt), &(r * self.d() * rt))
    }

    /// Turn the block upside down about its own reference surface.
    pub fn mirrored(&self) -> Abd {
        Abd::from_blocks(&self.a(), &(-self.b()), &self.d())
    }

    /// Re-express a block about a surface `z` below its current reference
    /// surface, i.e. the block's datum sits at +z in the new frame.
    ///
    /// ```text
    /// A' = A
    /// B' = B + z·A
    /// D' = D + 2z·B + z²·A
    /// ```
    pub fn shifted(&self, z: f64) -> Abd {
        if z == 0.0 {
            return *self;
        }
        let a = self.a();
        let b = self.b();
        let d = self.d();
        Abd::from_blocks(&a, &(b + a * z), &(d + b * (2.0 * z) + a * (z * z)))
    }

    /// Full 6×6 compliance
    pub fn inverse(&self) -> CalcResult<Mat6> {
        self.0.try_inverse().ok_or_else(|| {
            CalcError::calculation_failed("ABD inversion", "stiffness matrix is singular")
        })
    }

    /// Bending stiffness about the neutral surface, `D - B·A⁻¹·B`.
    ///
    /// Independent of where the reference surface was taken.
    pub fn neutral_bending(&self) -> CalcResult<Mat3> {
        let a_inv = self.a().try_inverse().ok_or_else(|| {
            CalcError::calculation_failed("neutral bending", "extensional stiffness is singular")
        })?;
        let b = self.b();
        Ok(self.d() - b * a_inv * b)
    }
}

impl Add for Abd {
    type Output = Abd;

    fn add(self, rhs: Abd) -> Abd {
        Abd(self.0 + rhs.0)
    }
}

impl AddAssign for Abd {
    fn add_assign(&mut self, rhs: Abd) {
        self.0 += rhs.0;
    }
}

/// Stress rotation taking ply-axis components to laminate-axis components,
/// in engineering shear notation. `Q̄ = R·Q·Rᵀ`.
pub fn rotation(degrees: f64) -> Mat3 {
    let theta = deg_to_rad(degrees);
    let (s, c) = theta.sin_cos();
    let (c2, s2, cs) = (c * c, s * s, c * s);
    Mat3::new(
        c2, s2, -2.0 * cs,
        s2, c2, 2.0 * cs,
        cs, -cs, c2 - s2,
    )
}

pub fn to_rows6(m: &Mat6) -> [[f64; 6]; 6] {
    let mut rows = [[0.0; 6]; 6];
    for (i, row) in rows.iter_mut().enumerate() {
        for (j, value) in row.iter_mut().enumerate() {
            *value = m[(i, j)];
        }
    }
    rows
}

pub fn to_rows3(m: &Mat3) -> [[f64; 3]; 3] {
    let mut rows = [[0.0; 3]; 3];
    for (i, row) in rows.iter_mut().enumerate() {
        for (j, value) in row.iter_mut().enumerate() {
            *value = m[(i, j)];
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn orthotropic_q() -> Mat3 {
        Mat3::new(
            140e9, 3e9, 0.0,
            3e9, 10e9, 0.0,
            0.0, 0.0, 5e9,
        )
    }

    fn ply(t: f64) -> Abd {
        let q = orthotropic_q();
        Abd::from_blocks(&(q * t), &Mat3::zeros(), &(q * (t * t * t / 12.0)))
    }

    #[test]
    fn test_rotation_90_swaps_axes() {
        let abd = ply(1e-3).rotated(90.0);
        let a = abd.a();
        assert_relative_eq!(a[(0, 0)], 10e9 * 1e-3, max_relative = 1e-9);
        assert_relative_eq!(a[(1, 1)], 140e9 * 1e-3, max_relative = 1e-9);
        assert_relative_eq!(a[(0, 2)], 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_off_axis_introduces_coupling() {
        let a = ply(1e-3).rotated(30.0).a();
        assert!(a[(0, 2)].abs() > 1e3);
        assert!(a[(1, 2)].abs() > 1e3);
    }

    #[test]
    fn test_rotations_compose() {
        let once = ply(1e-3).shifted(2e-3).rotated(75.0);
        let twice = ply(1e-3).shifted(2e-3).rotated(30.0).rotated(45.0);
        for i in 0..6 {
            for j in 0..6 {
                assert_relative_eq!(
                    once.matrix()[(i, j)],
                    twice.matrix()[(i, j)],
                    epsilon = 1e-6 * once.matrix().amax()
                );
            }
        }
    }

    #[test]
    fn test_shift_round_trip() {
        let base = ply(2e-3);
        let back = base.shifted(1e-3).shifted(-1e-3);
        for i in 0..6 {
            for j in 0..6 {
                assert_relative_eq!(base.matrix()[(i, j)], back.matrix()[(i, j)], epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_shifted_homogeneous_plate_about_bottom() {
        // Homogeneous plate, datum moved to the bottom face: B = Q·t²/2, D = Q·t³/3
        let t = 2e-3;
        let bottom = ply(t).shifted(t / 2.0);
        let q = orthotropic_q();
        assert_relative_eq!(bottom.b()[(0, 0)], q[(0, 0)] * t * t / 2.0, max_relative = 1e-12);
        assert_relative_eq!(bottom.d()[(0, 0)], q[(0, 0)] * t * t * t / 3.0, max_relative = 1e-12);
    }

    #[test]
    fn test_mirror_negates_coupling() {
        let shifted = ply(1e-3).shifted(1e-3);
        let mirrored = shifted.mirrored();
        assert_eq!(mirrored.b(), -shifted.b());
        assert_eq!(mirrored.d(), shifted.d());
    }

    #[test]
    fn test_neutral_bending_is_datum_independent() {
        let base = ply(1e-3).rotated(20.0);
        let d0 = base.neutral_bending().unwrap();
        let d1 = base.shifted(3e-3).neutral_bending().unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(d0[(i, j)], d1[(i, j)], epsilon = 1e-6 * d0.amax());
            }
        }
    }

    #[test]
    fn test_singular_inverse_fails() {
        let err = Abd::zeros().inverse().unwrap_err();
        assert_eq!(err.error_code(), "CALCULATION_FAILED");
    }
}
