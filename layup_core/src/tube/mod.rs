//! # Molded Tubes
//!
//! A molded tube is an outer-diameter [`Profile`], a default resin and an
//! ordered list of [`PlySpec`]s, innermost first. At any axial position it
//! resolves into a concrete [`Laminate`] and from there into beam section
//! properties.
//!
//! ## Resolution Order
//!
//! Plies are stored inside to outside but the outer diameter is the only
//! known surface, so resolution walks the list from the outermost ply
//! inward. Each active ply is sized against the running diameter, inserted at
//! the front of the wall list and then removes twice its thickness from the
//! diameter. The resulting list is stacked inside to outside.
//!
//! ## Example
//!
//! ```rust
//! use std::f64::consts::PI;
//! use std::rc::Rc;
//! use layup_core::layers::{Lamina, Layer};
//! use layup_core::materials::library;
//! use layup_core::tube::{MoldedTube, PlySpec, Profile};
//!
//! let aluminum = Rc::new(library::material("aluminum-7075").unwrap());
//! let resin = Rc::new(library::material("epoxy").unwrap());
//! let sheet = Rc::new(Layer::Lamina(Lamina::solid("sheet", aluminum, 1e-3, false).unwrap()));
//!
//! let profile = Profile::from_pairs(&[(0.0, 0.05), (1.0, 0.05)]).unwrap();
//! let mut tube = MoldedTube::new("sleeve", profile, resin);
//! tube.add_ply(PlySpec::uniform(sheet, 0.0, 2.0, PI * 0.05, 0.0).unwrap());
//!
//! let section = tube.section_properties(0.5).unwrap();
//! assert!((section.thickness - 1e-3).abs() < 1e-12);
//! ```

pub mod integration;
pub mod ply_spec;
pub mod profile;

pub use ply_spec::{PlySpec, PlySpecConfig};
pub use profile::{Profile, ProfilePoint};

use std::f64::consts::PI;
use std::rc::Rc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::layers::{Laminate, Layer, Orientation};
use crate::materials::Material;
use crate::metrics;
use crate::settings::AnalysisSettings;

#[derive(Debug, Clone, PartialEq)]
pub struct MoldedTube {
    name: String,
    profile: Profile,
    resin: Rc<Material>,
    plies: Vec<PlySpec>,
    settings: AnalysisSettings,
}

/// Configuration record for a molded tube
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoldedTubeConfig<M = Rc<Material>, L = Rc<Layer>> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resin: Option<M>,
    /// Innermost first
    pub plies: Vec<PlySpecConfig<L>>,
}

impl<M, L> Default for MoldedTubeConfig<M, L> {
    fn default() -> Self {
        MoldedTubeConfig {
            name: None,
            profile: None,
            resin: None,
            plies: Vec::new(),
        }
    }
}

impl<M, L> MoldedTubeConfig<M, L> {
    pub fn try_map_refs<N, K, FM, FL>(self, material: FM, mut layer: FL) -> CalcResult<MoldedTubeConfig<N, K>>
    where
        FM: FnOnce(M) -> CalcResult<N>,
        FL: FnMut(L) -> CalcResult<K>,
    {
        let plies = self
            .plies
            .into_iter()
            .map(|ply| ply.try_map_refs(&mut layer))
            .collect::<CalcResult<Vec<_>>>()?;
        Ok(MoldedTubeConfig {
            name: self.name,
            profile: self.profile,
            resin: self.resin.map(material).transpose()?,
            plies,
        })
    }
}

/// Beam section at one axial position.
///
/// Neutral-axis offsets come from the wall laminate and are measured from
/// its inner surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionProperties {
    /// Axial position (m)
    pub x: f64,
    pub od: f64,
    pub id: f64,
    pub thickness: f64,
    /// Annulus area (m²)
    pub area: f64,
    /// Second moment of area (m⁴)
    pub inertia: f64,
    /// Wall moduli (Pa)
    pub ex: f64,
    pub exf: f64,
    pub na_x: f64,
    pub na_y: f64,
    /// Beam bending stiffness EI (N·m²)
    pub bending_stiffness: f64,
    /// Local wall flexural stiffness per unit width, Exf·t³/12 (N·m)
    pub flexural_stiffness: f64,
    pub density: f64,
    /// Mass per unit length (kg/m)
    pub weight_per_length: f64,
    /// Empirical barrel compression (lbf)
    pub barrel_compression: f64,
    pub ply_count: usize,
}

impl SectionProperties {
    fn bare(x: f64, od: f64) -> Self {
        SectionProperties {
            x,
            od,
            id: od,
            thickness: 0.0,
            area: 0.0,
            inertia: 0.0,
            ex: 0.0,
            exf: 0.0,
            na_x: 0.0,
            na_y: 0.0,
            bending_stiffness: 0.0,
            flexural_stiffness: 0.0,
            density: 0.0,
            weight_per_length: 0.0,
            barrel_compression: 0.0,
            ply_count: 0,
        }
    }
}

fn annulus_area(od: f64, id: f64) -> f64 {
    PI / 4.0 * (od * od - id * id)
}

fn annulus_inertia(od: f64, id: f64) -> f64 {
    PI / 64.0 * (od.powi(4) - id.powi(4))
}

impl MoldedTube {
    pub fn new(name: impl Into<String>, profile: Profile, resin: Rc<Material>) -> Self {
        MoldedTube {
            name: name.into(),
            profile,
            resin,
            plies: Vec::new(),
            settings: AnalysisSettings::default(),
        }
    }

    pub fn build(config: MoldedTubeConfig) -> CalcResult<MoldedTube> {
        let profile = config.profile.ok_or_else(|| CalcError::missing_field("profile"))?;
        let resin = config.resin.ok_or_else(|| CalcError::missing_field("resin"))?;
        let mut tube = MoldedTube::new(config.name.unwrap_or_default(), profile, resin);
        for ply in config.plies {
            tube.add_ply(PlySpec::build(ply)?);
        }
        Ok(tube)
    }

    pub fn to_config(&self) -> MoldedTubeConfig {
        MoldedTubeConfig {
            name: Some(self.name.clone()),
            profile: Some(self.profile.clone()),
            resin: Some(Rc::clone(&self.resin)),
            plies: self.plies.iter().map(PlySpec::to_config).collect(),
        }
    }

    /// Apply outside the innermost plies already present
    pub fn add_ply(&mut self, spec: PlySpec) {
        self.plies.push(spec);
    }

    pub fn with_settings(mut self, settings: AnalysisSettings) -> CalcResult<Self> {
        settings.validate()?;
        self.settings = settings;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn resin(&self) -> &Rc<Material> {
        &self.resin
    }

    pub fn plies(&self) -> &[PlySpec] {
        &self.plies
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    pub fn x_min(&self) -> f64 {
        self.profile.x_min()
    }

    pub fn x_max(&self) -> f64 {
        self.profile.x_max()
    }

    /// Outer diameter at `x`, extrapolated only if the settings allow it
    pub fn od_at(&self, x: f64) -> CalcResult<f64> {
        if self.settings.extrapolate {
            Ok(self.profile.od_at_extrapolated(x))
        } else {
            self.profile.od_at(x)
        }
    }

    /// One sub-laminate per active ply at `x`, innermost first.
    pub fn walls_at(&self, x: f64) -> CalcResult<Vec<Laminate>> {
        let od = self.od_at(x)?;
        let mut running_od = od;
        let mut walls = Vec::new();
        for spec in self.plies.iter().rev() {
            if !spec.is_active(x) {
                continue;
            }
            if let Some(wall) = spec.resolve(x, running_od, &self.resin)? {
                running_od -= 2.0 * wall.thickness();
                walls.insert(0, wall);
            }
        }
        debug!(
            "tube '{}' at x = {x}: {} active plies, od = {od:.4e} m, id = {running_od:.4e} m",
            self.name,
            walls.len()
        );
        Ok(walls)
    }

    /// The wall at `x` as one laminate, inner surface first. Empty where no
    /// ply is active.
    pub fn laminate_at(&self, x: f64) -> CalcResult<Laminate> {
        self.stack(x, &self.wall_layers(x)?)
    }

    fn wall_layers(&self, x: f64) -> CalcResult<Vec<Rc<Layer>>> {
        Ok(self
            .walls_at(x)?
            .into_iter()
            .map(|wall| Rc::new(Layer::Laminate(wall)))
            .collect())
    }

    fn stack(&self, x: f64, walls: &[Rc<Layer>]) -> CalcResult<Laminate> {
        Laminate::with_plies(
            format!("{} @ {x}", self.name),
            walls.iter().map(|wall| (Rc::clone(wall), 0.0, Orientation::Normal)),
        )
    }

    /// Suggested sampling positions: every ply boundary with a neighbour on
    /// each side, plus the profile breakpoints, sorted and inside the profile.
    pub fn positions(&self) -> Vec<f64> {
        let eps = self.settings.position_epsilon;
        let mut xs: Vec<f64> = self
            .plies
            .iter()
            .flat_map(|spec| [spec.start(), spec.end()])
            .flat_map(|x| [x - eps, x, x + eps])
            .chain(self.profile.breakpoints())
            .filter(|&x| self.profile.contains(x))
            .collect();
        xs.sort_by(f64::total_cmp);
        xs.dedup();
        xs
    }

    pub fn section_properties(&self, x: f64) -> CalcResult<SectionProperties> {
        let od = self.od_at(x)?;
        let walls = self.wall_layers(x)?;
        if walls.is_empty() {
            return Ok(SectionProperties::bare(x, od));
        }
        let props = self.stack(x, &walls)?.properties()?;
        let outermost_first = walls
            .iter()
            .rev()
            .map(|wall| wall.properties())
            .collect::<CalcResult<Vec<_>>>()?;

        let t = props.thickness;
        let id = od - 2.0 * t;
        let area = annulus_area(od, id);
        let inertia = annulus_inertia(od, id);

        Ok(SectionProperties {
            x,
            od,
            id,
            thickness: t,
            area,
            inertia,
            ex: props.ex,
            exf: props.exf,
            na_x: props.na_x,
            na_y: props.na_y,
            bending_stiffness: props.ex * (inertia + area * props.na_x * props.na_x),
            flexural_stiffness: props.exf * t * t * t / 12.0,
            density: props.density,
            weight_per_length: area * props.density,
            barrel_compression: metrics::sum_wall_compression(od, &outermost_first),
            ply_count: props.ply_count,
        })
    }

    /// Section area and mass per length at `x`, without the stiffness work
    fn mass_section(&self, x: f64) -> CalcResult<(f64, f64)> {
        let od = self.od_at(x)?;
        let walls = self.walls_at(x)?;
        let t: f64 = walls.iter().map(Laminate::thickness).sum();
        if t <= 0.0 {
            return Ok((0.0, 0.0));
        }
        let mut taw = 0.0;
        for wall in &walls {
            taw += wall.areal_weights()?.taw;
        }
        let area = annulus_area(od, od - 2.0 * t);
        Ok((area, area * taw / t))
    }

    fn integrate<F>(&self, x0: f64, x1: f64, f: F) -> CalcResult<f64>
    where
        F: FnMut(f64) -> CalcResult<f64>,
    {
        self.settings.validate()?;
        integration::simpson(x0, x1, self.settings.simpson_samples, f)
    }

    /// Material volume between `x0` and `x1` (m³)
    pub fn volume(&self, x0: f64, x1: f64) -> CalcResult<f64> {
        self.integrate(x0, x1, |x| Ok(self.mass_section(x)?.0))
    }

    /// Mass between `x0` and `x1` (kg)
    pub fn weight(&self, x0: f64, x1: f64) -> CalcResult<f64> {
        self.integrate(x0, x1, |x| Ok(self.mass_section(x)?.1))
    }

    /// Axial centre of gravity of the mass between `x0` and `x1` (m)
    pub fn cog(&self, x0: f64, x1: f64) -> CalcResult<f64> {
        let weight = self.weight(x0, x1)?;
        if weight <= 0.0 {
            return Err(CalcError::calculation_failed(
                "centre of gravity",
                format!("'{}' has no mass between {x0} and {x1}", self.name),
            ));
        }
        let moment = self.integrate(x0, x1, |x| Ok(x * self.mass_section(x)?.1))?;
        Ok(moment / weight)
    }

    /// Mass moment of inertia about a transverse axis through `pivot` (kg·m²)
    pub fn moi(&self, x0: f64, x1: f64, pivot: f64) -> CalcResult<f64> {
        self.integrate(x0, x1, |x| {
            let arm = x - pivot;
            Ok(arm * arm * self.mass_section(x)?.1)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::Lamina;
    use crate::materials::test_support::{carbon_fiber, epoxy, isotropic};
    use approx::assert_relative_eq;

    const OD: f64 = 0.05;
    const T: f64 = 1e-3;

    fn sheet(name: &str, density: f64, e: f64) -> Rc<Layer> {
        let material = isotropic(name, density, e, 0.3);
        Rc::new(Layer::Lamina(Lamina::solid(name, material, T, false).unwrap()))
    }

    fn straight_tube() -> MoldedTube {
        let profile = Profile::from_pairs(&[(0.0, OD), (0.5, OD), (1.0, OD)]).unwrap();
        MoldedTube::new("straight", profile, epoxy())
    }

    #[test]
    fn test_single_full_length_ply_thickness() {
        let mut tube = straight_tube();
        tube.add_ply(PlySpec::uniform(sheet("steel", 7850.0, 200e9), 0.0, 1.0, PI * OD, 0.0).unwrap());

        for i in 0..100 {
            let x = i as f64 / 100.0;
            assert_relative_eq!(tube.laminate_at(x).unwrap().thickness(), T, max_relative = 1e-12);
        }
        // The ply ends at x_max
        assert!(tube.laminate_at(1.0).unwrap().is_empty());
        assert_eq!(tube.laminate_at(1.2).unwrap_err().error_code(), "OUT_OF_RANGE");
    }

    #[test]
    fn test_plies_stack_inside_to_outside() {
        let mut tube = straight_tube();
        tube.add_ply(PlySpec::uniform(sheet("inner", 7850.0, 200e9), 0.0, 1.0, PI * OD, 0.0).unwrap());
        tube.add_ply(PlySpec::uniform(sheet("outer", 2700.0, 70e9), 0.0, 1.0, PI * OD, 0.0).unwrap());

        let laminate = tube.laminate_at(0.5).unwrap();
        let names: Vec<&str> = laminate.entries().iter().map(|e| e.layer.name()).collect();
        assert_eq!(names, vec!["inner", "outer"]);

        // The outer ply sits at the full diameter; the inner one is sized
        // against the diameter left once the outer wall is removed
        let walls = tube.walls_at(0.5).unwrap();
        assert_relative_eq!(walls[1].thickness(), T, max_relative = 1e-12);
        assert_relative_eq!(walls[0].thickness(), T * OD / (OD - 2.0 * T), max_relative = 1e-12);

        // Stiff steel on the inside pulls the neutral axis inward
        let section = tube.section_properties(0.5).unwrap();
        assert!(section.na_x < section.thickness / 2.0);
    }

    #[test]
    fn test_section_of_homogeneous_wall() {
        let mut tube = straight_tube();
        tube.add_ply(PlySpec::uniform(sheet("steel", 7850.0, 200e9), 0.0, 2.0, PI * OD, 0.0).unwrap());

        let s = tube.section_properties(0.25).unwrap();
        let id = OD - 2.0 * T;
        let area = PI / 4.0 * (OD * OD - id * id);
        let inertia = PI / 64.0 * (OD.powi(4) - id.powi(4));
        assert_relative_eq!(s.id, id, max_relative = 1e-12);
        assert_relative_eq!(s.area, area, max_relative = 1e-9);
        assert_relative_eq!(s.ex, 200e9, max_relative = 1e-9);
        assert_relative_eq!(s.na_x, T / 2.0, max_relative = 1e-9);
        assert_relative_eq!(s.bending_stiffness, 200e9 * (inertia + area * T * T / 4.0), max_relative = 1e-9);
        assert_relative_eq!(s.flexural_stiffness, 200e9 * T.powi(3) / 12.0, max_relative = 1e-9);
        assert_relative_eq!(s.weight_per_length, area * 7850.0, max_relative = 1e-9);
        assert!(s.barrel_compression > 0.0);
        assert_eq!(s.ply_count, 1);
    }

    #[test]
    fn test_uncovered_position_is_bare() {
        let mut tube = straight_tube();
        tube.add_ply(PlySpec::uniform(sheet("steel", 7850.0, 200e9), 0.4, 0.6, PI * OD, 0.0).unwrap());
        let s = tube.section_properties(0.1).unwrap();
        assert_eq!(s.thickness, 0.0);
        assert_eq!(s.area, 0.0);
        assert_eq!(s.bending_stiffness, 0.0);
        assert_eq!(s.id, OD);
    }

    #[test]
    fn test_positions_straddle_ply_ends() {
        let mut tube = straight_tube();
        tube.add_ply(PlySpec::uniform(sheet("steel", 7850.0, 200e9), 0.2, 1.0, PI * OD, 0.0).unwrap());
        let eps = tube.settings().position_epsilon;
        let xs = tube.positions();
        assert_eq!(xs, vec![0.0, 0.2 - eps, 0.2, 0.2 + eps, 0.5, 1.0 - eps, 1.0]);
    }

    #[test]
    fn test_integrals_of_straight_tube() {
        let mut tube = straight_tube();
        tube.add_ply(PlySpec::uniform(sheet("steel", 7850.0, 200e9), 0.0, 2.0, PI * OD, 0.0).unwrap());
        let id = OD - 2.0 * T;
        let area = PI / 4.0 * (OD * OD - id * id);
        let wpl = area * 7850.0;

        assert_relative_eq!(tube.volume(0.0, 1.0).unwrap(), area, max_relative = 1e-9);
        assert_relative_eq!(tube.weight(0.0, 1.0).unwrap(), wpl, max_relative = 1e-9);
        assert_relative_eq!(tube.cog(0.0, 1.0).unwrap(), 0.5, max_relative = 1e-9);
        assert_relative_eq!(tube.moi(0.0, 1.0, 0.0).unwrap(), wpl / 3.0, max_relative = 1e-9);
        assert_relative_eq!(tube.moi(0.0, 1.0, 0.5).unwrap(), wpl / 12.0, max_relative = 1e-9);
    }

    #[test]
    fn test_cog_of_empty_range_fails() {
        let tube = straight_tube();
        assert_eq!(tube.cog(0.0, 1.0).unwrap_err().error_code(), "CALCULATION_FAILED");
    }

    #[test]
    fn test_extrapolation_is_opt_in() {
        let mut tube = straight_tube();
        tube.add_ply(PlySpec::uniform(sheet("steel", 7850.0, 200e9), 0.0, 2.0, PI * OD, 0.0).unwrap());
        assert!(tube.section_properties(1.5).is_err());

        let tube = tube
            .with_settings(AnalysisSettings {
                extrapolate: true,
                ..Default::default()
            })
            .unwrap();
        assert_relative_eq!(tube.section_properties(1.5).unwrap().od, OD, max_relative = 1e-12);
    }

    #[test]
    fn test_open_resin_stack_takes_tube_resin() {
        let dry = Rc::new(Layer::Lamina(
            Lamina::fiber_resin("UD 150", carbon_fiber(), None, 0.150, 0.55, false).unwrap(),
        ));
        let pair = Laminate::with_plies(
            "±30",
            [(Rc::clone(&dry), 30.0, Orientation::Normal), (dry, -30.0, Orientation::Normal)],
        )
        .unwrap();
        let mut tube = straight_tube();
        tube.add_ply(PlySpec::uniform(Rc::new(Layer::Laminate(pair)), 0.2, 0.8, PI * OD, 0.0).unwrap());

        let section = tube.section_properties(0.5).unwrap();
        assert!(section.ex > 0.0);
        assert!(section.barrel_compression > 0.0);
        assert_eq!(section.ply_count, 2);
        assert_relative_eq!(section.thickness, 2.0 * 0.150 / (1800.0 * 0.55), max_relative = 1e-12);
        assert!(tube.weight(0.0, 1.0).unwrap() > 0.0);
    }

    #[test]
    fn test_section_compression_matches_wall_list() {
        let mut tube = straight_tube();
        tube.add_ply(PlySpec::uniform(sheet("inner", 7850.0, 200e9), 0.0, 1.0, PI * OD, 0.0).unwrap());
        tube.add_ply(PlySpec::uniform(sheet("outer", 2700.0, 70e9), 0.0, 1.0, PI * OD, 90.0).unwrap());

        let mut walls = tube.walls_at(0.5).unwrap();
        walls.reverse();
        let expected = metrics::calculate_barrel_compression(OD, &walls).unwrap();
        assert_relative_eq!(
            tube.section_properties(0.5).unwrap().barrel_compression,
            expected,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_config_roundtrip() {
        let mut tube = straight_tube();
        tube.add_ply(PlySpec::uniform(sheet("steel", 7850.0, 200e9), 0.1, 0.9, 0.1, 45.0).unwrap());
        let rebuilt = MoldedTube::build(tube.to_config()).unwrap();
        assert_eq!(rebuilt, tube);
    }

    #[test]
    fn test_build_requires_profile_and_resin() {
        let err = MoldedTube::build(MoldedTubeConfig::default()).unwrap_err();
        assert_eq!(err, CalcError::missing_field("profile"));
    }
}
