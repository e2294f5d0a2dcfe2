//! Laminate assembly.
//!
//! Plies are appended bottom to top. Appending only checks that the child has
//! a thickness; stiffness and areal weights are assembled when asked for, so
//! a stack may hold fiber plies whose resin is supplied later.
//!
//! Assembly takes each child's mid-plane block, rotates it to laminate axes,
//! turns it over if it is flipped, moves it from its own mid-plane to the
//! laminate's bottom surface and adds it to the total.
//!
//! Order matters: two stacks holding the same plies in a different order have
//! the same A block but, in general, different B and D blocks.

use std::rc::Rc;

use log::debug;
use serde::{Deserialize, Serialize};

use super::abd::Abd;
use super::{ArealWeights, Layer, LayerProperties, Orientation};
use crate::errors::{CalcError, CalcResult};

/// One placed child of a laminate
#[derive(Debug, Clone, PartialEq)]
pub struct LaminateEntry {
    pub layer: Rc<Layer>,
    /// Degrees, counter-clockwise from the laminate x-axis
    pub angle: f64,
    pub orientation: Orientation,
}

/// Configuration record for one laminate entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlyEntryConfig<L = Rc<Layer>> {
    pub layer: L,
    #[serde(default)]
    pub angle: f64,
    #[serde(default)]
    pub orientation: Orientation,
}

/// Configuration record for a laminate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaminateConfig<L = Rc<Layer>> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub plies: Vec<PlyEntryConfig<L>>,
}

impl<L> Default for LaminateConfig<L> {
    fn default() -> Self {
        LaminateConfig {
            name: None,
            plies: Vec::new(),
        }
    }
}

impl<L> LaminateConfig<L> {
    pub fn try_map_refs<N, F>(self, mut f: F) -> CalcResult<LaminateConfig<N>>
    where
        F: FnMut(L) -> CalcResult<N>,
    {
        let plies = self
            .plies
            .into_iter()
            .map(|ply| {
                Ok(PlyEntryConfig {
                    layer: f(ply.layer)?,
                    angle: ply.angle,
                    orientation: ply.orientation,
                })
            })
            .collect::<CalcResult<Vec<_>>>()?;
        Ok(LaminateConfig { name: self.name, plies })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Laminate {
    name: String,
    entries: Vec<LaminateEntry>,
    thickness: f64,
    ply_count: usize,
    fiber_volume: f64,
}

impl Laminate {
    pub fn new(name: impl Into<String>) -> Self {
        Laminate {
            name: name.into(),
            entries: Vec::new(),
            thickness: 0.0,
            ply_count: 0,
            fiber_volume: 0.0,
        }
    }

    /// Build a stack from `(layer, angle, orientation)` triples, bottom first.
    pub fn with_plies<I>(name: impl Into<String>, plies: I) -> CalcResult<Laminate>
    where
        I: IntoIterator<Item = (Rc<Layer>, f64, Orientation)>,
    {
        let mut laminate = Laminate::new(name);
        for (layer, angle, orientation) in plies {
            laminate.add_ply(layer, angle, orientation)?;
        }
        Ok(laminate)
    }

    pub fn build(config: LaminateConfig) -> CalcResult<Laminate> {
        let mut laminate = Laminate::new(config.name.unwrap_or_default());
        for ply in config.plies {
            laminate.add_ply(ply.layer, ply.angle, ply.orientation)?;
        }
        Ok(laminate)
    }

    pub fn to_config(&self) -> LaminateConfig {
        LaminateConfig {
            name: Some(self.name.clone()),
            plies: self
                .entries
                .iter()
                .map(|entry| PlyEntryConfig {
                    layer: Rc::clone(&entry.layer),
                    angle: entry.angle,
                    orientation: entry.orientation,
                })
                .collect(),
        }
    }

    /// Place `layer` on top of the stack.
    pub fn add_ply(&mut self, layer: Rc<Layer>, angle: f64, orientation: Orientation) -> CalcResult<()> {
        if !angle.is_finite() {
            return Err(CalcError::invalid_input("angle", angle.to_string(), "Angle must be finite"));
        }
        let t = layer.thickness();
        if !(t.is_finite() && t > 0.0) {
            return Err(CalcError::invalid_input(
                "thickness",
                t.to_string(),
                format!("Ply '{}' has no thickness", layer.name()),
            ));
        }

        let z = self.thickness + t / 2.0;
        self.thickness += t;
        self.ply_count += layer.ply_count();
        self.fiber_volume += layer.fiber_volume();

        debug!(
            "laminate '{}': + '{}' at {}° ({}), z = {:.4e} m, total t = {:.4e} m",
            self.name,
            layer.name(),
            angle,
            orientation,
            z,
            self.thickness
        );

        self.entries.push(LaminateEntry { layer, angle, orientation });
        Ok(())
    }

    /// Place `count` copies of `layer`, one on top of the other.
    pub fn add_repeated(&mut self, layer: Rc<Layer>, angle: f64, orientation: Orientation, count: usize) -> CalcResult<()> {
        for _ in 0..count {
            self.add_ply(Rc::clone(&layer), angle, orientation)?;
        }
        Ok(())
    }

    /// Rebuild with every child replaced by `f(child)`, keeping angles and
    /// orientations.
    pub fn map_layers<F>(&self, mut f: F) -> CalcResult<Laminate>
    where
        F: FnMut(&Layer) -> CalcResult<Layer>,
    {
        let mut mapped = Laminate::new(self.name.clone());
        for entry in &self.entries {
            mapped.add_ply(Rc::new(f(&entry.layer)?), entry.angle, entry.orientation)?;
        }
        Ok(mapped)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[LaminateEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    pub fn ply_count(&self) -> usize {
        self.ply_count
    }

    /// Sum of the children's areal weights; fails while a ply's resin is open
    pub fn areal_weights(&self) -> CalcResult<ArealWeights> {
        let mut total = ArealWeights::default();
        for entry in &self.entries {
            total += entry.layer.areal_weights()?;
        }
        Ok(total)
    }

    pub fn fiber_volume(&self) -> f64 {
        self.fiber_volume
    }

    /// ABD about the bottom (first ply) surface
    pub fn bottom_stiffness(&self) -> CalcResult<Abd> {
        let mut total = Abd::zeros();
        let mut z = 0.0;
        for entry in &self.entries {
            let t = entry.layer.thickness();
            let mut block = entry.layer.stiffness()?.rotated(entry.angle);
            if entry.orientation.is_flipped() {
                block = block.mirrored();
            }
            total += block.shifted(z + t / 2.0);
            z += t;
        }
        Ok(total)
    }

    /// ABD about the mid-plane
    pub fn stiffness(&self) -> CalcResult<Abd> {
        Ok(self.bottom_stiffness()?.shifted(-self.thickness / 2.0))
    }

    pub fn properties(&self) -> CalcResult<LayerProperties> {
        if self.is_empty() {
            return Err(CalcError::calculation_failed(
                "layer properties",
                format!("'{}' has no plies", self.name),
            ));
        }
        LayerProperties::from_stiffness(
            &self.stiffness()?,
            self.thickness,
            self.areal_weights()?,
            self.fiber_volume / self.thickness,
            self.ply_count,
        )
    }
}
