//! Single physical ply.
//!
//! A lamina is either a sheet of one material at a given thickness, or a
//! fiber/resin ply described by its fiber areal weight and fiber volume
//! fraction. The resin of the latter may be left open and supplied later by
//! the part it is laid into.

use std::rc::Rc;

use log::debug;
use serde::{Deserialize, Serialize};

use super::abd::{Abd, Mat3};
use super::ArealWeights;
use crate::errors::{CalcError, CalcResult};
use crate::materials::{fraction, micromechanics, ElasticConstants, Material};

/// Angular averaging weights (sin⁴, cos⁴, sin²cos²) for an in-plane random
/// fiber mat
const RANDOM_WEIGHTS: (f64, f64, f64) = (0.375, 0.375, 0.125);

/// Weights for an aligned ply: no blending
const ALIGNED_WEIGHTS: (f64, f64, f64) = (0.0, 1.0, 0.0);

/// Where a ply's material and thickness come from
#[derive(Debug, Clone, PartialEq)]
pub enum PlySource {
    /// One material at a given thickness (m)
    Solid { material: Rc<Material>, thickness: f64 },
    /// Fiber at areal weight `faw` (kg/m²) wetted to fiber fraction `vf`
    FiberResin {
        fiber: Rc<Material>,
        resin: Option<Rc<Material>>,
        faw: f64,
        vf: f64,
    },
}

/// Configuration record for a lamina.
///
/// Give either `material` + `thickness`, or `fiber` + `faw` + `vf`
/// (optionally `resin`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaminaConfig<M = Rc<Material>> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub random: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<M>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thickness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiber: Option<M>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resin: Option<M>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faw: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vf: Option<f64>,
}

impl<M> Default for LaminaConfig<M> {
    fn default() -> Self {
        LaminaConfig {
            name: None,
            random: None,
            material: None,
            thickness: None,
            fiber: None,
            resin: None,
            faw: None,
            vf: None,
        }
    }
}

impl<M> LaminaConfig<M> {
    pub fn try_map_refs<N, F>(self, mut f: F) -> CalcResult<LaminaConfig<N>>
    where
        F: FnMut(M) -> CalcResult<N>,
    {
        Ok(LaminaConfig {
            name: self.name,
            random: self.random,
            material: self.material.map(&mut f).transpose()?,
            thickness: self.thickness,
            fiber: self.fiber.map(&mut f).transpose()?,
            resin: self.resin.map(&mut f).transpose()?,
            faw: self.faw,
            vf: self.vf,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lamina {
    name: String,
    random: bool,
    source: PlySource,
}

impl Lamina {
    pub fn build(config: LaminaConfig) -> CalcResult<Lamina> {
        let name = config.name.unwrap_or_default();
        let random = config.random.unwrap_or(false);

        if let Some(material) = config.material {
            let thickness = config.thickness.ok_or_else(|| CalcError::missing_field("thickness"))?;
            return Lamina::solid(name, material, thickness, random);
        }
        if let Some(fiber) = config.fiber {
            let faw = config.faw.ok_or_else(|| CalcError::missing_field("faw"))?;
            let vf = fraction("vf", config.vf)?;
            return Lamina::fiber_resin(name, fiber, config.resin, faw, vf, random);
        }
        Err(CalcError::missing_field("material"))
    }

    /// Sheet of `material`, `thickness` metres thick.
    pub fn solid(name: impl Into<String>, material: Rc<Material>, thickness: f64, random: bool) -> CalcResult<Lamina> {
        if !(thickness.is_finite() && thickness > 0.0) {
            return Err(CalcError::invalid_input("thickness", thickness.to_string(), "Thickness must be positive"));
        }
        Ok(Lamina {
            name: name.into(),
            random,
            source: PlySource::Solid { material, thickness },
        })
    }

    /// Fiber/resin ply. Its thickness follows from `faw / (ρ_fiber · vf)`.
    pub fn fiber_resin(
        name: impl Into<String>,
        fiber: Rc<Material>,
        resin: Option<Rc<Material>>,
        faw: f64,
        vf: f64,
        random: bool,
    ) -> CalcResult<Lamina> {
        if !(faw.is_finite() && faw > 0.0) {
            return Err(CalcError::invalid_input("faw", faw.to_string(), "Fiber areal weight must be positive"));
        }
        if !(vf > 0.0 && vf <= 1.0) {
            return Err(CalcError::invalid_input("vf", vf.to_string(), "Fiber fraction must be in (0, 1]"));
        }
        Ok(Lamina {
            name: name.into(),
            random,
            source: PlySource::FiberResin { fiber, resin, faw, vf },
        })
    }

    pub fn to_config(&self) -> LaminaConfig {
        let mut config = LaminaConfig {
            name: Some(self.name.clone()),
            random: Some(self.random),
            ..Default::default()
        };
        match &self.source {
            PlySource::Solid { material, thickness } => {
                config.material = Some(Rc::clone(material));
                config.thickness = Some(*thickness);
            }
            PlySource::FiberResin { fiber, resin, faw, vf } => {
                config.fiber = Some(Rc::clone(fiber));
                config.resin = resin.clone();
                config.faw = Some(*faw);
                config.vf = Some(*vf);
            }
        }
        config
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_random(&self) -> bool {
        self.random
    }

    pub fn source(&self) -> &PlySource {
        &self.source
    }

    pub fn thickness(&self) -> f64 {
        match &self.source {
            PlySource::Solid { thickness, .. } => *thickness,
            PlySource::FiberResin { fiber, faw, vf, .. } => faw / (fiber.density() * vf),
        }
    }

    pub fn vf(&self) -> f64 {
        match &self.source {
            PlySource::Solid { material, .. } => material.vf(),
            PlySource::FiberResin { vf, .. } => *vf,
        }
    }

    fn resin(&self) -> CalcResult<&Rc<Material>> {
        match &self.source {
            PlySource::FiberResin { resin: Some(resin), .. } => Ok(resin),
            _ => Err(CalcError::missing_field("resin")),
        }
    }

    /// Effective elastic constants of the ply's material
    pub fn constants(&self) -> CalcResult<ElasticConstants> {
        match &self.source {
            PlySource::Solid { material, .. } => Ok(material.constants()),
            PlySource::FiberResin { fiber, vf, .. } => {
                let resin = self.resin()?;
                Ok(micromechanics::mix(&fiber.constants(), &resin.constants(), *vf))
            }
        }
    }

    pub fn areal_weights(&self) -> CalcResult<ArealWeights> {
        let t = self.thickness();
        match &self.source {
            PlySource::Solid { material, .. } => match material.constituents() {
                Some((fiber, resin)) => {
                    let vf = material.vf();
                    Ok(ArealWeights::new(
                        vf * fiber.density() * t,
                        (1.0 - vf) * resin.density() * t,
                        0.0,
                    ))
                }
                None => Ok(ArealWeights::new(0.0, 0.0, material.density() * t)),
            },
            PlySource::FiberResin { faw, vf, .. } => {
                let resin = self.resin()?;
                Ok(ArealWeights::new(*faw, (1.0 - vf) * resin.density() * t, 0.0))
            }
        }
    }

    /// Copy with `resin` filled in if this ply left it open
    pub fn with_default_resin(&self, resin: &Rc<Material>) -> Lamina {
        match &self.source {
            PlySource::FiberResin { fiber, resin: None, faw, vf } => Lamina {
                name: self.name.clone(),
                random: self.random,
                source: PlySource::FiberResin {
                    fiber: Rc::clone(fiber),
                    resin: Some(Rc::clone(resin)),
                    faw: *faw,
                    vf: *vf,
                },
            },
            _ => self.clone(),
        }
    }

    /// Copy with thickness (or fiber areal weight) multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Lamina {
        let source = match &self.source {
            PlySource::Solid { material, thickness } => PlySource::Solid {
                material: Rc::clone(material),
                thickness: thickness * factor,
            },
            PlySource::FiberResin { fiber, resin, faw, vf } => PlySource::FiberResin {
                fiber: Rc::clone(fiber),
                resin: resin.clone(),
                faw: faw * factor,
                vf: *vf,
            },
        };
        Lamina {
            name: self.name.clone(),
            random: self.random,
            source,
        }
    }

    /// ABD block about the ply's own mid-plane: A = Q·t, B = 0, D = Q·t³/12
    pub fn stiffness(&self) -> CalcResult<Abd> {
        let q = reduced_stiffness(&self.constants()?, self.random);
        let t = self.thickness();
        debug!("lamina '{}': t = {:.4e} m, Q11 = {:.4e} Pa", self.name, t, q[(0, 0)]);
        Ok(Abd::from_blocks(&(q * t), &Mat3::zeros(), &(q * (t * t * t / 12.0))))
    }
}

/// Plane-stress reduced stiffness in ply axes, optionally averaged over all
/// in-plane fiber directions.
pub fn reduced_stiffness(c: &ElasticConstants, random: bool) -> Mat3 {
    let pr21 = c.pr12 * c.e2 / c.e1;
    let denom = 1.0 - c.pr12 * pr21;
    let q11 = c.e1 / denom;
    let q12 = c.pr12 * c.e2 / denom;
    let q22 = c.e2 / denom;
    let q66 = c.g12;

    let (ssss, cccc, sscc) = if random { RANDOM_WEIGHTS } else { ALIGNED_WEIGHTS };

    let q11b = q11 * cccc + 2.0 * (q12 + 2.0 * q66) * sscc + q22 * ssss;
    let q22b = q11 * ssss + 2.0 * (q12 + 2.0 * q66) * sscc + q22 * cccc;
    let q12b = (q11 + q22 - 4.0 * q66) * sscc + q12 * (ssss + cccc);
    let q66b = (q11 + q22 - 2.0 * q12 - 2.0 * q66) * sscc + q66 * (ssss + cccc);

    Mat3::new(
        q11b, q12b, 0.0,
        q12b, q22b, 0.0,
        0.0, 0.0, q66b,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::Layer;
    use crate::materials::test_support::{carbon_fiber, epoxy, isotropic};
    use approx::assert_relative_eq;

    #[test]
    fn test_isotropic_ply_recovers_modulus() {
        let steel = isotropic("Steel", 7850.0, 200e9, 0.3);
        let layer = Layer::Lamina(Lamina::solid("steel", steel, 1.5e-3, false).unwrap());
        let props = layer.properties().unwrap();

        assert_relative_eq!(props.ex, 200e9, max_relative = 1e-9);
        assert_relative_eq!(props.ey, 200e9, max_relative = 1e-9);
        assert_relative_eq!(props.exf, props.ex, max_relative = 1e-9);
        assert_relative_eq!(props.gxy, 200e9 / 2.6, max_relative = 1e-9);
        assert_relative_eq!(props.prxy, 0.3, max_relative = 1e-9);
        assert_relative_eq!(props.na_x, 0.75e-3, max_relative = 1e-12);
        assert_relative_eq!(props.density, 7850.0, max_relative = 1e-12);
        assert_eq!(props.ply_count, 1);
    }

    #[test]
    fn test_random_mat_of_isotropic_is_unchanged() {
        let c = isotropic("Al", 2700.0, 70e9, 0.33).constants();
        let aligned = reduced_stiffness(&c, false);
        let random = reduced_stiffness(&c, true);
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(aligned[(i, j)], random[(i, j)], epsilon = 1e-6 * aligned.amax());
            }
        }
    }

    #[test]
    fn test_random_mat_is_in_plane_isotropic() {
        let c = micromechanics::mix(&carbon_fiber().constants(), &epoxy().constants(), 0.3);
        let q = reduced_stiffness(&c, true);
        assert_relative_eq!(q[(0, 0)], q[(1, 1)], max_relative = 1e-12);
        assert!(q[(0, 0)] < c.e1);
        assert!(q[(0, 0)] > c.e2);
    }

    #[test]
    fn test_fiber_resin_thickness_and_weights() {
        let ply = Lamina::fiber_resin("UD150", carbon_fiber(), Some(epoxy()), 0.150, 0.6, false).unwrap();
        let t = 0.150 / (1800.0 * 0.6);
        assert_relative_eq!(ply.thickness(), t, max_relative = 1e-12);

        let w = ply.areal_weights().unwrap();
        assert_relative_eq!(w.faw, 0.150);
        assert_relative_eq!(w.raw, 0.4 * 1200.0 * t, max_relative = 1e-12);
        assert_relative_eq!(w.taw / t, 0.6 * 1800.0 + 0.4 * 1200.0, max_relative = 1e-12);
    }

    #[test]
    fn test_open_resin_needs_default() {
        let ply = Lamina::fiber_resin("dry", carbon_fiber(), None, 0.2, 0.55, false).unwrap();
        assert_eq!(ply.stiffness().unwrap_err(), CalcError::missing_field("resin"));

        let wet = ply.with_default_resin(&epoxy());
        assert!(wet.stiffness().is_ok());
        assert_eq!(wet.thickness(), ply.thickness());
    }

    #[test]
    fn test_build_from_config() {
        let err = Lamina::build(LaminaConfig::default()).unwrap_err();
        assert_eq!(err, CalcError::missing_field("material"));

        let err = Lamina::build(LaminaConfig {
            material: Some(epoxy()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err, CalcError::missing_field("thickness"));

        let err = Lamina::build(LaminaConfig {
            material: Some(epoxy()),
            thickness: Some(-1e-3),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.field(), Some("thickness"));

        let ply = Lamina::build(LaminaConfig {
            name: Some("mat".to_string()),
            random: Some(true),
            fiber: Some(carbon_fiber()),
            resin: Some(epoxy()),
            faw: Some(0.3),
            vf: Some(0.35),
            ..Default::default()
        })
        .unwrap();
        assert!(ply.is_random());
        assert_eq!(Lamina::build(ply.to_config()).unwrap(), ply);
    }

    #[test]
    fn test_scaled_keeps_stiffness_density() {
        let ply = Lamina::fiber_resin("UD", carbon_fiber(), Some(epoxy()), 0.2, 0.6, false).unwrap();
        let half = ply.scaled(0.5);
        assert_relative_eq!(half.thickness(), ply.thickness() * 0.5, max_relative = 1e-12);
        assert_eq!(half.constants().unwrap(), ply.constants().unwrap());
    }
}
