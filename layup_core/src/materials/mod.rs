//! # Materials
//!
//! Anisotropic elastic-constant model for homogeneous materials, plus the
//! fiber-reinforced (FRP) variant whose constants are derived on demand from a
//! fiber, a resin and a fiber volume fraction.
//!
//! ## Symmetry Classes
//!
//! Each class stores only its independent constants; dependents are computed.
//!
//! | Kind          | Independent constants                       |
//! |---------------|---------------------------------------------|
//! | `Isotropic`   | density, E1, PR12                           |
//! | `PlanarIso12` | density, E1, E3, PR12, PR13, G13            |
//! | `PlanarIso13` | density, E1, E2, PR12, PR13, G12            |
//! | `PlanarIso23` | density, E1, E2, PR12, PR23, G12            |
//! | `Orthotropic` | density and all nine elastic constants      |
//! | `Frp`         | fiber, resin, vf                            |
//!
//! Materials are immutable once built and are shared through `Rc`, so a
//! material can only ever reference materials that already exist.
//!
//! ## Example
//!
//! ```rust
//! use std::rc::Rc;
//! use layup_core::materials::{Material, MaterialConfig, MaterialKind};
//!
//! let epoxy = Material::build(MaterialConfig {
//!     kind: Some(MaterialKind::Isotropic),
//!     name: Some("Epoxy".to_string()),
//!     density: Some(1200.0),
//!     e1: Some(3.5e9),
//!     pr12: Some(0.35),
//!     ..Default::default()
//! }).unwrap();
//!
//! assert_eq!(epoxy.e2(), epoxy.e1());
//! let epoxy = Rc::new(epoxy);
//! assert!(epoxy.contains(&epoxy));
//! ```

pub mod library;
pub mod micromechanics;

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Symmetry class tag for a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialKind {
    Isotropic,
    PlanarIso12,
    PlanarIso13,
    PlanarIso23,
    Orthotropic,
    Frp,
}

impl MaterialKind {
    pub const ALL: [MaterialKind; 6] = [
        MaterialKind::Isotropic,
        MaterialKind::PlanarIso12,
        MaterialKind::PlanarIso13,
        MaterialKind::PlanarIso23,
        MaterialKind::Orthotropic,
        MaterialKind::Frp,
    ];

    /// Display name for reports
    pub fn display_name(&self) -> &'static str {
        match self {
            MaterialKind::Isotropic => "Isotropic",
            MaterialKind::PlanarIso12 => "Planar isotropic (1-2)",
            MaterialKind::PlanarIso13 => "Planar isotropic (1-3)",
            MaterialKind::PlanarIso23 => "Planar isotropic (2-3)",
            MaterialKind::Orthotropic => "Orthotropic",
            MaterialKind::Frp => "Fiber reinforced",
        }
    }
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Configuration record for building a material.
///
/// Every field is optional; [`Material::build`] reports the first missing or
/// invalid field required by `kind`. `M` is the reference type used for the
/// FRP constituents: `Rc<Material>` in the API, an object id in documents.
///
/// ## JSON Example
///
/// ```json
/// { "kind": "Isotropic", "name": "Epoxy", "density": 1200.0, "e1": 3.5e9, "pr12": 0.35 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialConfig<M = Rc<Material>> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<MaterialKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Density (kg/m³)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
    /// Young's moduli (Pa)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e1: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e3: Option<f64>,
    /// Shear moduli (Pa)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub g12: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub g13: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub g23: Option<f64>,
    /// Major Poisson ratios
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr12: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr13: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr23: Option<f64>,
    /// FRP constituents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiber: Option<M>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resin: Option<M>,
    /// Fiber volume fraction, 0..=1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vf: Option<f64>,
}

impl<M> Default for MaterialConfig<M> {
    fn default() -> Self {
        MaterialConfig {
            kind: None,
            name: None,
            description: None,
            density: None,
            e1: None,
            e2: None,
            e3: None,
            g12: None,
            g13: None,
            g23: None,
            pr12: None,
            pr13: None,
            pr23: None,
            fiber: None,
            resin: None,
            vf: None,
        }
    }
}

impl<M> MaterialConfig<M> {
    /// Convert the constituent references, keeping every other field. `f`
    /// receives the field name (`"fiber"` or `"resin"`) with each reference.
    pub fn try_map_refs<N, F>(self, mut f: F) -> CalcResult<MaterialConfig<N>>
    where
        F: FnMut(&'static str, M) -> CalcResult<N>,
    {
        Ok(MaterialConfig {
            kind: self.kind,
            name: self.name,
            description: self.description,
            density: self.density,
            e1: self.e1,
            e2: self.e2,
            e3: self.e3,
            g12: self.g12,
            g13: self.g13,
            g23: self.g23,
            pr12: self.pr12,
            pr13: self.pr13,
            pr23: self.pr23,
            fiber: self.fiber.map(|m| f("fiber", m)).transpose()?,
            resin: self.resin.map(|m| f("resin", m)).transpose()?,
            vf: self.vf,
        })
    }
}

/// Full set of elastic constants for a material, independent or derived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElasticConstants {
    /// Density (kg/m³)
    pub density: f64,
    pub e1: f64,
    pub e2: f64,
    pub e3: f64,
    pub g12: f64,
    pub g13: f64,
    pub g23: f64,
    pub pr12: f64,
    pub pr13: f64,
    pub pr23: f64,
}

/// Stored constants per symmetry class.
#[derive(Debug, Clone, PartialEq)]
pub enum Elastic {
    Isotropic {
        density: f64,
        e1: f64,
        pr12: f64,
    },
    PlanarIso12 {
        density: f64,
        e1: f64,
        e3: f64,
        pr12: f64,
        pr13: f64,
        g13: f64,
    },
    PlanarIso13 {
        density: f64,
        e1: f64,
        e2: f64,
        pr12: f64,
        pr13: f64,
        g12: f64,
    },
    PlanarIso23 {
        density: f64,
        e1: f64,
        e2: f64,
        pr12: f64,
        pr23: f64,
        g12: f64,
    },
    Orthotropic(ElasticConstants),
    Frp {
        fiber: Rc<Material>,
        resin: Rc<Material>,
        vf: f64,
    },
}

/// Shear modulus of an isotropic plane
#[inline]
fn isotropic_shear(e: f64, pr: f64) -> f64 {
    e / (2.0 * (1.0 + pr))
}

impl Elastic {
    pub fn kind(&self) -> MaterialKind {
        match self {
            Elastic::Isotropic { .. } => MaterialKind::Isotropic,
            Elastic::PlanarIso12 { .. } => MaterialKind::PlanarIso12,
            Elastic::PlanarIso13 { .. } => MaterialKind::PlanarIso13,
            Elastic::PlanarIso23 { .. } => MaterialKind::PlanarIso23,
            Elastic::Orthotropic(_) => MaterialKind::Orthotropic,
            Elastic::Frp { .. } => MaterialKind::Frp,
        }
    }

    /// Expand the stored constants into the full set.
    pub fn constants(&self) -> ElasticConstants {
        match *self {
            Elastic::Isotropic { density, e1, pr12 } => {
                let g = isotropic_shear(e1, pr12);
                ElasticConstants {
                    density,
                    e1,
                    e2: e1,
                    e3: e1,
                    g12: g,
                    g13: g,
                    g23: g,
                    pr12,
                    pr13: pr12,
                    pr23: pr12,
                }
            }
            Elastic::PlanarIso12 { density, e1, e3, pr12, pr13, g13 } => ElasticConstants {
                density,
                e1,
                e2: e1,
                e3,
                g12: isotropic_shear(e1, pr12),
                g13,
                g23: g13,
                pr12,
                pr13,
                pr23: pr13,
            },
            Elastic::PlanarIso13 { density, e1, e2, pr12, pr13, g12 } => ElasticConstants {
                density,
                e1,
                e2,
                e3: e1,
                g12,
                g13: isotropic_shear(e1, pr13),
                g23: g12,
                pr12,
                pr13,
                // nu32 == nu12 when 3 behaves like 1
                pr23: pr12 * e2 / e1,
            },
            Elastic::PlanarIso23 { density, e1, e2, pr12, pr23, g12 } => ElasticConstants {
                density,
                e1,
                e2,
                e3: e2,
                g12,
                g13: g12,
                g23: isotropic_shear(e2, pr23),
                pr12,
                pr13: pr12,
                pr23,
            },
            Elastic::Orthotropic(constants) => constants,
            Elastic::Frp { ref fiber, ref resin, vf } => {
                micromechanics::mix(&fiber.constants(), &resin.constants(), vf)
            }
        }
    }
}

/// A named homogeneous anisotropic elastic solid.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    name: String,
    description: String,
    elastic: Elastic,
}

impl Material {
    /// Build a material from a configuration record.
    ///
    /// Validates every field required by the record's `kind`:
    /// moduli and density must be positive, Poisson ratios within 0..=0.5,
    /// `vf` within 0..=1 and both FRP constituents present.
    pub fn build(config: MaterialConfig) -> CalcResult<Material> {
        let kind = config.kind.ok_or_else(|| CalcError::missing_field("kind"))?;
        let name = config.name.clone().unwrap_or_default();
        let description = config.description.clone().unwrap_or_default();

        let elastic = match kind {
            MaterialKind::Isotropic => Elastic::Isotropic {
                density: positive("density", config.density)?,
                e1: positive("e1", config.e1)?,
                pr12: poisson("pr12", config.pr12)?,
            },
            MaterialKind::PlanarIso12 => Elastic::PlanarIso12 {
                density: positive("density", config.density)?,
                e1: positive("e1", config.e1)?,
                e3: positive("e3", config.e3)?,
                pr12: poisson("pr12", config.pr12)?,
                pr13: poisson("pr13", config.pr13)?,
                g13: positive("g13", config.g13)?,
            },
            MaterialKind::PlanarIso13 => Elastic::PlanarIso13 {
                density: positive("density", config.density)?,
                e1: positive("e1", config.e1)?,
                e2: positive("e2", config.e2)?,
                pr12: poisson("pr12", config.pr12)?,
                pr13: poisson("pr13", config.pr13)?,
                g12: positive("g12", config.g12)?,
            },
            MaterialKind::PlanarIso23 => Elastic::PlanarIso23 {
                density: positive("density", config.density)?,
                e1: positive("e1", config.e1)?,
                e2: positive("e2", config.e2)?,
                pr12: poisson("pr12", config.pr12)?,
                pr23: poisson("pr23", config.pr23)?,
                g12: positive("g12", config.g12)?,
            },
            MaterialKind::Orthotropic => Elastic::Orthotropic(ElasticConstants {
                density: positive("density", config.density)?,
                e1: positive("e1", config.e1)?,
                e2: positive("e2", config.e2)?,
                e3: positive("e3", config.e3)?,
                g12: positive("g12", config.g12)?,
                g13: positive("g13", config.g13)?,
                g23: positive("g23", config.g23)?,
                pr12: poisson("pr12", config.pr12)?,
                pr13: poisson("pr13", config.pr13)?,
                pr23: poisson("pr23", config.pr23)?,
            }),
            MaterialKind::Frp => {
                let fiber = config.fiber.ok_or_else(|| CalcError::missing_field("fiber"))?;
                let resin = config.resin.ok_or_else(|| CalcError::missing_field("resin"))?;
                Elastic::Frp {
                    fiber,
                    resin,
                    vf: fraction("vf", config.vf)?,
                }
            }
        };

        Ok(Material {
            name,
            description,
            elastic,
        })
    }

    /// Build a replacement for `original`.
    ///
    /// Fails with `SelfReference` if either FRP constituent transitively
    /// contains `original`, since substituting the result would create a cycle.
    pub fn rebuild(original: &Material, config: MaterialConfig) -> CalcResult<Material> {
        for (field, constituent) in [("fiber", &config.fiber), ("resin", &config.resin)] {
            if let Some(constituent) = constituent {
                if constituent.contains(original) {
                    return Err(CalcError::self_reference(field, constituent.name()));
                }
            }
        }
        Material::build(config)
    }

    /// Symmetry-class-preserving copy. FRP constituents stay shared.
    pub fn duplicate(&self) -> Material {
        Material {
            name: format!("{} (copy)", self.name),
            description: self.description.clone(),
            elastic: self.elastic.clone(),
        }
    }

    /// True if `other` is this material or is reachable through its
    /// fiber/resin references.
    pub fn contains(&self, other: &Material) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        match &self.elastic {
            Elastic::Frp { fiber, resin, .. } => fiber.contains(other) || resin.contains(other),
            _ => false,
        }
    }

    /// Configuration record holding only this material's independent fields.
    pub fn to_config(&self) -> MaterialConfig {
        let mut config = MaterialConfig {
            kind: Some(self.kind()),
            name: Some(self.name.clone()),
            description: Some(self.description.clone()),
            ..Default::default()
        };
        match &self.elastic {
            Elastic::Isotropic { density, e1, pr12 } => {
                config.density = Some(*density);
                config.e1 = Some(*e1);
                config.pr12 = Some(*pr12);
            }
            Elastic::PlanarIso12 { density, e1, e3, pr12, pr13, g13 } => {
                config.density = Some(*density);
                config.e1 = Some(*e1);
                config.e3 = Some(*e3);
                config.pr12 = Some(*pr12);
                config.pr13 = Some(*pr13);
                config.g13 = Some(*g13);
            }
            Elastic::PlanarIso13 { density, e1, e2, pr12, pr13, g12 } => {
                config.density = Some(*density);
                config.e1 = Some(*e1);
                config.e2 = Some(*e2);
                config.pr12 = Some(*pr12);
                config.pr13 = Some(*pr13);
                config.g12 = Some(*g12);
            }
            Elastic::PlanarIso23 { density, e1, e2, pr12, pr23, g12 } => {
                config.density = Some(*density);
                config.e1 = Some(*e1);
                config.e2 = Some(*e2);
                config.pr12 = Some(*pr12);
                config.pr23 = Some(*pr23);
                config.g12 = Some(*g12);
            }
            Elastic::Orthotropic(c) => {
                config.density = Some(c.density);
                config.e1 = Some(c.e1);
                config.e2 = Some(c.e2);
                config.e3 = Some(c.e3);
                config.g12 = Some(c.g12);
                config.g13 = Some(c.g13);
                config.g23 = Some(c.g23);
                config.pr12 = Some(c.pr12);
                config.pr13 = Some(c.pr13);
                config.pr23 = Some(c.pr23);
            }
            Elastic::Frp { fiber, resin, vf } => {
                config.fiber = Some(Rc::clone(fiber));
                config.resin = Some(Rc::clone(resin));
                config.vf = Some(*vf);
            }
        }
        config
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> MaterialKind {
        self.elastic.kind()
    }

    pub fn elastic(&self) -> &Elastic {
        &self.elastic
    }

    /// All ten constants, derived where the class does not store them
    pub fn constants(&self) -> ElasticConstants {
        self.elastic.constants()
    }

    /// Fiber volume fraction; zero for anything but an FRP mix
    pub fn vf(&self) -> f64 {
        match self.elastic {
            Elastic::Frp { vf, .. } => vf,
            _ => 0.0,
        }
    }

    /// Fiber and resin of an FRP mix
    pub fn constituents(&self) -> Option<(&Rc<Material>, &Rc<Material>)> {
        match &self.elastic {
            Elastic::Frp { fiber, resin, .. } => Some((fiber, resin)),
            _ => None,
        }
    }

    pub fn density(&self) -> f64 {
        self.constants().density
    }

    pub fn e1(&self) -> f64 {
        self.constants().e1
    }

    pub fn e2(&self) -> f64 {
        self.constants().e2
    }

    pub fn e3(&self) -> f64 {
        self.constants().e3
    }

    pub fn g12(&self) -> f64 {
        self.constants().g12
    }

    pub fn g13(&self) -> f64 {
        self.constants().g13
    }

    pub fn g23(&self) -> f64 {
        self.constants().g23
    }

    pub fn pr12(&self) -> f64 {
        self.constants().pr12
    }

    pub fn pr13(&self) -> f64 {
        self.constants().pr13
    }

    pub fn pr23(&self) -> f64 {
        self.constants().pr23
    }

    /// Minor Poisson ratio PR21 = PR12·E2/E1
    pub fn pr21(&self) -> f64 {
        let c = self.constants();
        c.pr12 * c.e2 / c.e1
    }

    /// Minor Poisson ratio PR31 = PR13·E3/E1
    pub fn pr31(&self) -> f64 {
        let c = self.constants();
        c.pr13 * c.e3 / c.e1
    }

    /// Minor Poisson ratio PR32 = PR23·E3/E2
    pub fn pr32(&self) -> f64 {
        let c = self.constants();
        c.pr23 * c.e3 / c.e2
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind())
    }
}

// ============================================================================
// Field validation
// ============================================================================

fn require(field: &str, value: Option<f64>) -> CalcResult<f64> {
    let value = value.ok_or_else(|| CalcError::missing_field(field))?;
    if !value.is_finite() {
        return Err(CalcError::invalid_input(field, value.to_string(), "Value must be finite"));
    }
    Ok(value)
}

fn positive(field: &str, value: Option<f64>) -> CalcResult<f64> {
    let value = require(field, value)?;
    if value <= 0.0 {
        return Err(CalcError::invalid_input(field, value.to_string(), "Value must be positive"));
    }
    Ok(value)
}

fn poisson(field: &str, value: Option<f64>) -> CalcResult<f64> {
    let value = require(field, value)?;
    if !(0.0..=0.5).contains(&value) {
        return Err(CalcError::invalid_input(
            field,
            value.to_string(),
            "Poisson ratio must be between 0 and 0.5",
        ));
    }
    Ok(value)
}

pub(crate) fn fraction(field: &str, value: Option<f64>) -> CalcResult<f64> {
    let value = require(field, value)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(CalcError::invalid_input(
            field,
            value.to_string(),
            "Fraction must be between 0 and 1",
        ));
    }
    Ok(value)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn isotropic(name: &str, density: f64, e1: f64, pr12: f64) -> Rc<Material> {
        Rc::new(
            Material::build(MaterialConfig {
                kind: Some(MaterialKind::Isotropic),
                name: Some(name.to_string()),
                density: Some(density),
                e1: Some(e1),
                pr12: Some(pr12),
                ..Default::default()
            })
            .unwrap(),
        )
    }

    pub fn carbon_fiber() -> Rc<Material> {
        Rc::new(
            Material::build(MaterialConfig {
                kind: Some(MaterialKind::PlanarIso23),
                name: Some("Carbon".to_string()),
                density: Some(1800.0),
                e1: Some(230e9),
                e2: Some(15e9),
                pr12: Some(0.2),
                pr23: Some(0.45),
                g12: Some(24e9),
                ..Default::default()
            })
            .unwrap(),
        )
    }

    pub fn epoxy() -> Rc<Material> {
        isotropic("Epoxy", 1200.0, 3.5e9, 0.35)
    }

    pub fn carbon_epoxy(vf: f64) -> Rc<Material> {
        Rc::new(
            Material::build(MaterialConfig {
                kind: Some(MaterialKind::Frp),
                name: Some("Carbon/Epoxy".to_string()),
                fiber: Some(carbon_fiber()),
                resin: Some(epoxy()),
                vf: Some(vf),
                ..Default::default()
            })
            .unwrap(),
        )
    }
}
