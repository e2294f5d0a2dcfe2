//! # layup_core - Composite Laminate Calculation Engine
//!
//! `layup_core` computes effective mechanical properties of fiber-reinforced
//! laminates with Classical Laminate Theory and applies them to tubular parts
//! whose diameter and ply coverage vary along their length. Inputs are
//! configuration records and outputs are plain property snapshots, all
//! JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Immutable**: entities are validated once in `build` and never mutated
//! - **Shared**: materials and layers are reference-counted and reused freely
//! - **Rich Errors**: every failure is a structured [`CalcError`] naming its field
//! - **Recompute**: nothing is cached; every query derives from its inputs
//!
//! ## Quick Start
//!
//! ```rust
//! use std::rc::Rc;
//! use layup_core::layers::{Lamina, Laminate, Layer, Orientation};
//! use layup_core::materials::library;
//!
//! let fiber = Rc::new(library::material("carbon-sm").unwrap());
//! let resin = Rc::new(library::material("epoxy").unwrap());
//! let ply = Rc::new(Layer::Lamina(
//!     Lamina::fiber_resin("UD 150", fiber, Some(resin), 0.150, 0.55, false).unwrap(),
//! ));
//!
//! let mut laminate = Laminate::new("±45");
//! laminate.add_ply(Rc::clone(&ply), 45.0, Orientation::Normal).unwrap();
//! laminate.add_ply(ply, -45.0, Orientation::Normal).unwrap();
//!
//! let props = laminate.properties().unwrap();
//! assert_eq!(props.ply_count, 2);
//! println!("{}", serde_json::to_string_pretty(&props).unwrap());
//! ```
//!
//! ## Modules
//!
//! - [`materials`] - Elastic constants, FRP micromechanics and a material library
//! - [`layers`] - Plies, laminates and the ABD assembly
//! - [`tube`] - Molded tubes: ply specs, profiles and section properties
//! - [`metrics`] - Empirical barrel compression
//! - [`document`] - Object-graph round trip for whole designs
//! - [`file_io`] - Atomic saves and version-checked loads
//! - [`settings`] - Sampling and integration settings
//! - [`units`] - Unit newtypes for the imperial boundary
//! - [`errors`] - Structured error types

pub mod document;
pub mod errors;
pub mod file_io;
pub mod layers;
pub mod materials;
pub mod metrics;
pub mod settings;
pub mod tube;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use document::{DesignDocument, Entity};
pub use errors::{CalcError, CalcResult};
pub use file_io::{load_design, save_design};
pub use layers::{Laminate, Lamina, Layer, LayerProperties, Orientation};
pub use materials::{Material, MaterialConfig, MaterialKind};
pub use settings::AnalysisSettings;
pub use tube::{MoldedTube, PlySpec, Profile, SectionProperties};
