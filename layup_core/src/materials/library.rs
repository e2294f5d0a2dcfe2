//! # Material Library
//!
//! Common constituent materials for tubular composite parts. Entries are kept
//! as configuration records and built into fresh instances on request, so
//! every caller owns its own `Rc`.
//!
//! ## Example
//!
//! ```rust
//! use layup_core::materials::library;
//!
//! let carbon = library::material("carbon-sm").unwrap();
//! assert!(carbon.e1() > 200e9);
//! assert!(library::material("balsa").is_err());
//! ```

use std::convert::Infallible;

use once_cell::sync::Lazy;

use super::{Material, MaterialConfig, MaterialKind};
use crate::errors::{CalcError, CalcResult};

/// A library entry: lookup key plus the record it builds from
pub struct LibraryEntry {
    pub key: &'static str,
    config: MaterialConfig<Infallible>,
}

fn isotropic(name: &str, description: &str, density: f64, e1: f64, pr12: f64) -> MaterialConfig<Infallible> {
    MaterialConfig {
        kind: Some(MaterialKind::Isotropic),
        name: Some(name.to_string()),
        description: Some(description.to_string()),
        density: Some(density),
        e1: Some(e1),
        pr12: Some(pr12),
        ..Default::default()
    }
}

/// Transversely isotropic fiber (isotropic in the 2-3 plane)
#[allow(clippy::too_many_arguments)]
fn fiber(
    name: &str,
    description: &str,
    density: f64,
    e1: f64,
    e2: f64,
    pr12: f64,
    pr23: f64,
    g12: f64,
) -> MaterialConfig<Infallible> {
    MaterialConfig {
        kind: Some(MaterialKind::PlanarIso23),
        name: Some(name.to_string()),
        description: Some(description.to_string()),
        density: Some(density),
        e1: Some(e1),
        e2: Some(e2),
        pr12: Some(pr12),
        pr23: Some(pr23),
        g12: Some(g12),
        ..Default::default()
    }
}

static LIBRARY: Lazy<Vec<LibraryEntry>> = Lazy::new(|| {
    vec![
        LibraryEntry {
            key: "carbon-sm",
            config: fiber("Carbon SM", "Standard modulus carbon fiber", 1800.0, 230e9, 15e9, 0.2, 0.45, 24e9),
        },
        LibraryEntry {
            key: "carbon-im",
            config: fiber("Carbon IM", "Intermediate modulus carbon fiber", 1780.0, 294e9, 15e9, 0.2, 0.45, 24e9),
        },
        LibraryEntry {
            key: "aramid",
            config: fiber("Aramid", "Para-aramid fiber", 1440.0, 124e9, 4.1e9, 0.36, 0.45, 2.9e9),
        },
        LibraryEntry {
            key: "e-glass",
            config: isotropic("E-Glass", "E-glass fiber", 2580.0, 72e9, 0.22),
        },
        LibraryEntry {
            key: "epoxy",
            config: isotropic("Epoxy", "Toughened epoxy matrix", 1200.0, 3.5e9, 0.35),
        },
        LibraryEntry {
            key: "aluminum-7075",
            config: isotropic("Al 7075-T6", "Aluminum alloy 7075-T6", 2810.0, 71.7e9, 0.33),
        },
    ]
});

/// Keys of every library entry, in table order
pub fn keys() -> Vec<&'static str> {
    LIBRARY.iter().map(|entry| entry.key).collect()
}

/// Build a fresh instance of the library material stored under `key`.
pub fn material(key: &str) -> CalcResult<Material> {
    let entry = LIBRARY
        .iter()
        .find(|entry| entry.key == key)
        .ok_or_else(|| CalcError::material_not_found(key))?;
    let config = entry.config.clone().try_map_refs(|_, never| match never {})?;
    Material::build(config)
}
