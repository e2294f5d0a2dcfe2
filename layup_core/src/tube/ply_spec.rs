//! Ply placement on a tube: where a ply starts and stops, and how wide it is
//! along the way.
//!
//! Width follows three zones:
//!
//! ```text
//! width
//!   │ ws ─────────┐
//!   │             ╲
//!   │              ╲───────── we
//!   └──┬──────────┬─┬────────┬── x
//!    start       ts te      end
//! ```
//!
//! and is multiplied by the number of identical pieces laid around the
//! circumference.

use std::f64::consts::PI;
use std::rc::Rc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::layers::{Laminate, Layer, Orientation};
use crate::materials::Material;

#[derive(Debug, Clone, PartialEq)]
pub struct PlySpec {
    layer: Rc<Layer>,
    start: f64,
    end: f64,
    taper_start: f64,
    taper_end: f64,
    width_at_start: f64,
    width_at_end: f64,
    angle: f64,
    orientation: Orientation,
    num_pieces: u32,
    clocking: f64,
}

/// Configuration record for a ply spec.
///
/// Required: `layer`, `start`, `end`, `width_at_start`. `width_at_end`
/// defaults to `width_at_start`; the taper zone defaults to the whole ply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlySpecConfig<L = Rc<Layer>> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<L>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taper_start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taper_end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width_at_start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width_at_end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_pieces: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clocking: Option<f64>,
}

impl<L> Default for PlySpecConfig<L> {
    fn default() -> Self {
        PlySpecConfig {
            layer: None,
            start: None,
            end: None,
            taper_start: None,
            taper_end: None,
            width_at_start: None,
            width_at_end: None,
            angle: None,
            orientation: None,
            num_pieces: None,
            clocking: None,
        }
    }
}

impl<L> PlySpecConfig<L> {
    pub fn try_map_refs<N, F>(self, f: F) -> CalcResult<PlySpecConfig<N>>
    where
        F: FnOnce(L) -> CalcResult<N>,
    {
        Ok(PlySpecConfig {
            layer: self.layer.map(f).transpose()?,
            start: self.start,
            end: self.end,
            taper_start: self.taper_start,
            taper_end: self.taper_end,
            width_at_start: self.width_at_start,
            width_at_end: self.width_at_end,
            angle: self.angle,
            orientation: self.orientation,
            num_pieces: self.num_pieces,
            clocking: self.clocking,
        })
    }
}

fn finite(field: &str, value: f64) -> CalcResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::invalid_input(field, value.to_string(), "Value must be finite"))
    }
}

fn width(field: &str, value: f64) -> CalcResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(CalcError::invalid_input(field, value.to_string(), "Width must be zero or positive"))
    }
}

impl PlySpec {
    pub fn build(config: PlySpecConfig) -> CalcResult<PlySpec> {
        let layer = config.layer.ok_or_else(|| CalcError::missing_field("layer"))?;
        let start = finite("start", config.start.ok_or_else(|| CalcError::missing_field("start"))?)?;
        let end = finite("end", config.end.ok_or_else(|| CalcError::missing_field("end"))?)?;
        if end <= start {
            return Err(CalcError::invalid_input(
                "end",
                end.to_string(),
                format!("End must be greater than start ({start})"),
            ));
        }

        let taper_start = finite("taper_start", config.taper_start.unwrap_or(start))?.clamp(start, end);
        let taper_end = finite("taper_end", config.taper_end.unwrap_or(end))?.clamp(start, end);
        if taper_end < taper_start {
            return Err(CalcError::invalid_input(
                "taper_end",
                taper_end.to_string(),
                format!("Taper end must not precede taper start ({taper_start})"),
            ));
        }

        let width_at_start = width(
            "width_at_start",
            config.width_at_start.ok_or_else(|| CalcError::missing_field("width_at_start"))?,
        )?;
        let width_at_end = width("width_at_end", config.width_at_end.unwrap_or(width_at_start))?;

        let num_pieces = config.num_pieces.unwrap_or(1);
        if num_pieces == 0 {
            return Err(CalcError::invalid_input("num_pieces", "0", "At least one piece is required"));
        }

        Ok(PlySpec {
            layer,
            start,
            end,
            taper_start,
            taper_end,
            width_at_start,
            width_at_end,
            angle: finite("angle", config.angle.unwrap_or(0.0))?,
            orientation: config.orientation.unwrap_or_default(),
            num_pieces,
            clocking: finite("clocking", config.clocking.unwrap_or(0.0))?,
        })
    }

    /// A single constant-width ply over `[start, end)`
    pub fn uniform(layer: Rc<Layer>, start: f64, end: f64, width: f64, angle: f64) -> CalcResult<PlySpec> {
        PlySpec::build(PlySpecConfig {
            layer: Some(layer),
            start: Some(start),
            end: Some(end),
            width_at_start: Some(width),
            angle: Some(angle),
            ..Default::default()
        })
    }

    pub fn to_config(&self) -> PlySpecConfig {
        PlySpecConfig {
            layer: Some(Rc::clone(&self.layer)),
            start: Some(self.start),
            end: Some(self.end),
            taper_start: Some(self.taper_start),
            taper_end: Some(self.taper_end),
            width_at_start: Some(self.width_at_start),
            width_at_end: Some(self.width_at_end),
            angle: Some(self.angle),
            orientation: Some(self.orientation),
            num_pieces: Some(self.num_pieces),
            clocking: Some(self.clocking),
        }
    }

    pub fn layer(&self) -> &Rc<Layer> {
        &self.layer
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn taper_start(&self) -> f64 {
        self.taper_start
    }

    pub fn taper_end(&self) -> f64 {
        self.taper_end
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn num_pieces(&self) -> u32 {
        self.num_pieces
    }

    pub fn clocking(&self) -> f64 {
        self.clocking
    }

    /// Half-open: a ply covers `start <= x < end`
    pub fn is_active(&self, x: f64) -> bool {
        x >= self.start && x < self.end
    }

    /// Total width of all pieces at `x`
    pub fn width_at_pos(&self, x: f64) -> f64 {
        let single = if x <= self.taper_start {
            self.width_at_start
        } else if x >= self.taper_end {
            self.width_at_end
        } else {
            let s = (x - self.taper_start) / (self.taper_end - self.taper_start);
            self.width_at_start + (self.width_at_end - self.width_at_start) * s
        };
        single * f64::from(self.num_pieces)
    }

    /// Planform area of all pieces (m²)
    pub fn area(&self) -> f64 {
        let head = self.width_at_start * (self.taper_start - self.start);
        let taper = 0.5 * (self.width_at_start + self.width_at_end) * (self.taper_end - self.taper_start);
        let tail = self.width_at_end * (self.end - self.taper_end);
        (head + taper + tail) * f64::from(self.num_pieces)
    }

    /// Circumferential start angle of each piece (degrees)
    pub fn piece_angles(&self) -> Vec<f64> {
        let pitch = 360.0 / f64::from(self.num_pieces);
        (0..self.num_pieces).map(|i| self.clocking + f64::from(i) * pitch).collect()
    }

    /// Resolve this ply into a one-entry sub-laminate at `x`, where the
    /// running outer diameter is `od`.
    ///
    /// Partial circumferential coverage thins the ply in proportion, so the
    /// wall carries the same material spread evenly around the tube.
    /// Returns `None` where the ply has no width.
    pub fn resolve(&self, x: f64, od: f64, resin: &Rc<Material>) -> CalcResult<Option<Laminate>> {
        if !(od.is_finite() && od > 0.0) {
            return Err(CalcError::calculation_failed(
                "ply resolution",
                format!("'{}' reaches non-positive diameter {od} at x = {x}", self.layer.name()),
            ));
        }
        let width = self.width_at_pos(x);
        if width <= 0.0 {
            return Ok(None);
        }
        let coverage = width / (PI * od);
        if coverage > 1.0 + 1e-9 {
            debug!(
                "ply '{}' at x = {x} covers {:.3} of the circumference",
                self.layer.name(),
                coverage
            );
        }

        let layer = self.layer.with_default_resin(resin)?.scaled(coverage)?;
        let mut laminate = Laminate::new(self.layer.name());
        laminate.add_ply(Rc::new(layer), self.angle, self.orientation)?;
        Ok(Some(laminate))
    }
}
