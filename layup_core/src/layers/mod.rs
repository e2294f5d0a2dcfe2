//! # Layers
//!
//! A layer is either a single physical ply ([`Lamina`]) or an ordered stack of
//! child layers ([`Laminate`]), each placed at an angle and orientation.
//! Stacks nest: a laminate placed inside another acts as one super-ply.
//!
//! ## Reference Surfaces
//!
//! - [`Layer::stiffness`] returns the ABD block about the layer's own
//!   mid-plane.
//! - Neutral-axis offsets in [`LayerProperties`] are measured from the
//!   layer's bottom (first ply) surface.
//!
//! ## Example
//!
//! ```rust
//! use std::rc::Rc;
//! use layup_core::layers::{Lamina, Laminate, Layer, Orientation};
//! use layup_core::materials::library;
//!
//! let aluminum = Rc::new(library::material("aluminum-7075").unwrap());
//! let ply = Rc::new(Layer::Lamina(Lamina::solid("Al sheet", aluminum, 1e-3, false).unwrap()));
//!
//! let mut laminate = Laminate::new("Al stack");
//! laminate.add_repeated(ply, 0.0, Orientation::Normal, 3).unwrap();
//!
//! let props = Layer::Laminate(laminate).properties().unwrap();
//! assert_eq!(props.ply_count, 3);
//! assert!((props.thickness - 3e-3).abs() < 1e-12);
//! assert!((props.ex - 71.7e9).abs() / 71.7e9 < 1e-9);
//! ```

pub mod abd;
pub mod lamina;
pub mod laminate;

pub use abd::Abd;
pub use lamina::{Lamina, LaminaConfig, PlySource};
pub use laminate::{Laminate, LaminateConfig, LaminateEntry, PlyEntryConfig};

use std::fmt;
use std::ops::{Add, AddAssign};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::materials::Material;

/// Which face of a ply points outward when it is placed in a stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// The ply's defined top faces the top of the stack
    #[default]
    Normal,
    /// The ply is turned over before placement
    Flipped,
}

impl Orientation {
    pub fn is_flipped(&self) -> bool {
        matches!(self, Orientation::Flipped)
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Normal => write!(f, "normal"),
            Orientation::Flipped => write!(f, "flipped"),
        }
    }
}

/// Mass per unit area of each constituent (kg/m²)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ArealWeights {
    /// Fiber areal weight
    pub faw: f64,
    /// Resin areal weight
    pub raw: f64,
    /// Solid (homogeneous material) areal weight
    pub saw: f64,
    /// Total areal weight
    pub taw: f64,
}

impl ArealWeights {
    pub fn new(faw: f64, raw: f64, saw: f64) -> Self {
        ArealWeights {
            faw,
            raw,
            saw,
            taw: faw + raw + saw,
        }
    }

    pub fn scaled(&self, factor: f64) -> Self {
        ArealWeights::new(self.faw * factor, self.raw * factor, self.saw * factor)
    }
}

impl Add for ArealWeights {
    type Output = ArealWeights;

    fn add(self, rhs: ArealWeights) -> ArealWeights {
        ArealWeights::new(self.faw + rhs.faw, self.raw + rhs.raw, self.saw + rhs.saw)
    }
}

impl AddAssign for ArealWeights {
    fn add_assign(&mut self, rhs: ArealWeights) {
        *self = *self + rhs;
    }
}

/// A ply or a stack of plies
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    Lamina(Lamina),
    Laminate(Laminate),
}

impl Layer {
    pub fn name(&self) -> &str {
        match self {
            Layer::Lamina(l) => l.name(),
            Layer::Laminate(l) => l.name(),
        }
    }

    pub fn thickness(&self) -> f64 {
        match self {
            Layer::Lamina(l) => l.thickness(),
            Layer::Laminate(l) => l.thickness(),
        }
    }

    /// Number of physical plies; a nested laminate counts all of its own
    pub fn ply_count(&self) -> usize {
        match self {
            Layer::Lamina(_) => 1,
            Layer::Laminate(l) => l.ply_count(),
        }
    }

    /// ABD block about this layer's own mid-plane
    pub fn stiffness(&self) -> CalcResult<Abd> {
        match self {
            Layer::Lamina(l) => l.stiffness(),
            Layer::Laminate(l) => l.stiffness(),
        }
    }

    pub fn areal_weights(&self) -> CalcResult<ArealWeights> {
        match self {
            Layer::Lamina(l) => l.areal_weights(),
            Layer::Laminate(l) => l.areal_weights(),
        }
    }

    /// Fiber volume per unit area, Σ vf·t (m)
    pub fn fiber_volume(&self) -> f64 {
        match self {
            Layer::Lamina(l) => l.vf() * l.thickness(),
            Layer::Laminate(l) => l.fiber_volume(),
        }
    }

    pub fn vf(&self) -> f64 {
        let thickness = self.thickness();
        if thickness > 0.0 {
            self.fiber_volume() / thickness
        } else {
            0.0
        }
    }

    pub fn density(&self) -> CalcResult<f64> {
        let thickness = self.thickness();
        if thickness <= 0.0 {
            return Err(CalcError::calculation_failed("density", "layer has no thickness"));
        }
        Ok(self.areal_weights()?.taw / thickness)
    }

    /// True if `other` is this layer or appears anywhere below it
    pub fn contains(&self, other: &Layer) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        match self {
            Layer::Lamina(_) => false,
            Layer::Laminate(l) => l.entries().iter().any(|entry| entry.layer.contains(other)),
        }
    }

    /// Copy with every unresolved fiber/resin ply given `resin`.
    pub fn with_default_resin(&self, resin: &Rc<Material>) -> CalcResult<Layer> {
        match self {
            Layer::Lamina(l) => Ok(Layer::Lamina(l.with_default_resin(resin))),
            Layer::Laminate(l) => Ok(Layer::Laminate(l.map_layers(|child| child.with_default_resin(resin))?)),
        }
    }

    /// Copy with every ply's thickness multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> CalcResult<Layer> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(CalcError::invalid_input("factor", factor.to_string(), "Scale factor must be positive"));
        }
        match self {
            Layer::Lamina(l) => Ok(Layer::Lamina(l.scaled(factor))),
            Layer::Laminate(l) => Ok(Layer::Laminate(l.map_layers(|child| child.scaled(factor))?)),
        }
    }

    /// Detached snapshot of the layer's effective properties.
    pub fn properties(&self) -> CalcResult<LayerProperties> {
        if let Layer::Laminate(l) = self {
            return l.properties();
        }
        let thickness = self.thickness();
        if thickness <= 0.0 {
            return Err(CalcError::calculation_failed(
                "layer properties",
                format!("'{}' has no plies", self.name()),
            ));
        }
        LayerProperties::from_stiffness(
            &self.stiffness()?,
            thickness,
            self.areal_weights()?,
            self.vf(),
            self.ply_count(),
        )
    }
}

impl From<Lamina> for Layer {
    fn from(lamina: Lamina) -> Self {
        Layer::Lamina(lamina)
    }
}

impl From<Laminate> for Layer {
    fn from(laminate: Laminate) -> Self {
        Layer::Laminate(laminate)
    }
}

/// Effective properties of a layer, computed on demand.
///
/// Plain numbers only; nothing here aliases the layer's internal matrices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerProperties {
    /// Total thickness (m)
    pub thickness: f64,
    /// In-plane moduli (Pa)
    pub ex: f64,
    pub ey: f64,
    pub gxy: f64,
    pub prxy: f64,
    pub pryx: f64,
    /// Flexural moduli (Pa)
    pub exf: f64,
    pub eyf: f64,
    pub gxyf: f64,
    /// Neutral-axis offsets from the bottom surface (m)
    pub na_x: f64,
    pub na_y: f64,
    /// Average density (kg/m³)
    pub density: f64,
    /// Thickness-weighted fiber volume fraction
    pub vf: f64,
    pub areal_weights: ArealWeights,
    /// ABD about the mid-plane
    pub stiffness_matrix: [[f64; 6]; 6],
    /// Inverse of `stiffness_matrix`
    pub compliance_matrix: [[f64; 6]; 6],
    /// Bending stiffness about the neutral surface, D - B·A⁻¹·B (N·m)
    pub neutral_bending: [[f64; 3]; 3],
    pub ply_count: usize,
}

impl LayerProperties {
    pub(crate) fn from_stiffness(
        mid: &Abd,
        thickness: f64,
        areal_weights: ArealWeights,
        vf: f64,
        ply_count: usize,
    ) -> CalcResult<Self> {
        let compliance = mid.inverse()?;
        let neutral = mid.neutral_bending()?;
        let t = thickness;
        let t3 = t * t * t;
        let a = mid.a();
        let b = mid.b();

        Ok(LayerProperties {
            thickness,
            ex: 1.0 / (compliance[(0, 0)] * t),
            ey: 1.0 / (compliance[(1, 1)] * t),
            gxy: 1.0 / (compliance[(2, 2)] * t),
            prxy: -compliance[(0, 1)] / compliance[(0, 0)],
            pryx: -compliance[(0, 1)] / compliance[(1, 1)],
            exf: 12.0 / (compliance[(3, 3)] * t3),
            eyf: 12.0 / (compliance[(4, 4)] * t3),
            gxyf: 12.0 / (compliance[(5, 5)] * t3),
            na_x: t / 2.0 + b[(0, 0)] / a[(0, 0)],
            na_y: t / 2.0 + b[(1, 1)] / a[(1, 1)],
            density: areal_weights.taw / t,
            vf,
            areal_weights,
            stiffness_matrix: abd::to_rows6(mid.matrix()),
            compliance_matrix: abd::to_rows6(&compliance),
            neutral_bending: abd::to_rows3(&neutral),
            ply_count,
        })
    }

    pub fn dxx(&self) -> f64 {
        self.neutral_bending[0][0]
    }

    pub fn dyy(&self) -> f64 {
        self.neutral_bending[1][1]
    }

    pub fn dxy(&self) -> f64 {
        self.neutral_bending[0][1]
    }

    pub fn dss(&self) -> f64 {
        self.neutral_bending[2][2]
    }
}
