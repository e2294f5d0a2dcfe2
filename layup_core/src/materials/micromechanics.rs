//! FRP micromechanics.
//!
//! Density, E1 and the major Poisson ratios follow the linear rule of
//! mixtures. The matrix-dominated constants (E2, E3, G12, G13, G23) use the
//! inverse square-root rule
//!
//! ```text
//! P = Pr / (1 - sqrt(vf) * (1 - Pr / Pf))
//! ```
//!
//! with exact branches at vf = 0 and vf = 1 so the end points reproduce the
//! constituents bit for bit.

use super::ElasticConstants;

/// Linear rule of mixtures
#[inline]
pub fn rule_of_mixtures(vf: f64, fiber: f64, resin: f64) -> f64 {
    vf * fiber + (1.0 - vf) * resin
}

/// Inverse square-root rule for matrix-dominated constants
#[inline]
pub fn transverse_rule(vf: f64, fiber: f64, resin: f64) -> f64 {
    if vf == 1.0 {
        fiber
    } else if vf == 0.0 {
        resin
    } else {
        resin / (1.0 - vf.sqrt() * (1.0 - resin / fiber))
    }
}

/// Elastic constants of a fiber/resin mix at fiber volume fraction `vf`.
pub fn mix(fiber: &ElasticConstants, resin: &ElasticConstants, vf: f64) -> ElasticConstants {
    ElasticConstants {
        density: rule_of_mixtures(vf, fiber.density, resin.density),
        e1: rule_of_mixtures(vf, fiber.e1, resin.e1),
        e2: transverse_rule(vf, fiber.e2, resin.e2),
        e3: transverse_rule(vf, fiber.e3, resin.e3),
        g12: transverse_rule(vf, fiber.g12, resin.g12),
        g13: transverse_rule(vf, fiber.g13, resin.g13),
        g23: transverse_rule(vf, fiber.g23, resin.g23),
        pr12: rule_of_mixtures(vf, fiber.pr12, resin.pr12),
        pr13: rule_of_mixtures(vf, fiber.pr13, resin.pr13),
        pr23: rule_of_mixtures(vf, fiber.pr23, resin.pr23),
    }
}
