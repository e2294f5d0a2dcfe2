//! # Design Documents
//!
//! A `DesignDocument` is the root container for a saved design: materials,
//! layers and tubes flattened into an id-keyed arena, plus the analysis
//! settings and some metadata. It serializes to human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! DesignDocument
//! ├── meta: DesignMetadata (version, name, designer, timestamps)
//! ├── settings: AnalysisSettings
//! ├── objects: HashMap<Uuid, Record> (every entity, references by id)
//! └── roots: Vec<Uuid> (the entities the caller asked to save)
//! ```
//!
//! Encoding visits each shared `Rc` once, so an object used in many places is
//! stored once. Decoding memoizes by id, so those places share one `Rc`
//! again afterwards.
//!
//! ## Example
//!
//! ```rust
//! use std::rc::Rc;
//! use layup_core::document::{DesignDocument, Entity};
//! use layup_core::layers::{Lamina, Laminate, Layer, Orientation};
//! use layup_core::materials::library;
//! use layup_core::settings::AnalysisSettings;
//!
//! let aluminum = Rc::new(library::material("aluminum-7075").unwrap());
//! let sheet = Rc::new(Layer::Lamina(Lamina::solid("sheet", aluminum, 1e-3, false).unwrap()));
//! let mut stack = Laminate::new("stack");
//! stack.add_repeated(sheet, 0.0, Orientation::Normal, 2).unwrap();
//!
//! let roots = [Entity::Layer(Rc::new(Layer::Laminate(stack)))];
//! let doc = DesignDocument::encode("demo", "Designer", AnalysisSettings::default(), &roots).unwrap();
//! // One material, one lamina, one laminate
//! assert_eq!(doc.objects.len(), 3);
//!
//! let decoded = doc.decode().unwrap();
//! assert_eq!(decoded, roots);
//! ```

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{CalcError, CalcResult};
use crate::layers::{Lamina, LaminaConfig, Laminate, LaminateConfig, Layer};
use crate::materials::{Material, MaterialConfig, MaterialKind};
use crate::settings::AnalysisSettings;
use crate::tube::{MoldedTube, MoldedTubeConfig};

/// Current schema version for design files
pub const SCHEMA_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignDocument {
    pub meta: DesignMetadata,

    #[serde(default)]
    pub settings: AnalysisSettings,

    /// Every entity in the design, keyed by id
    pub objects: HashMap<Uuid, Record>,

    /// Top-level entities in caller order
    pub roots: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Design name
    pub name: String,

    pub designer: String,

    pub created: DateTime<Utc>,

    pub modified: DateTime<Utc>,
}

/// One entity in the arena. References to other entities are ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Record {
    Isotropic(MaterialConfig<Uuid>),
    PlanarIso12(MaterialConfig<Uuid>),
    PlanarIso13(MaterialConfig<Uuid>),
    PlanarIso23(MaterialConfig<Uuid>),
    Orthotropic(MaterialConfig<Uuid>),
    Frp(MaterialConfig<Uuid>),
    Lamina(LaminaConfig<Uuid>),
    Laminate(LaminateConfig<Uuid>),
    MoldedTube(MoldedTubeConfig<Uuid, Uuid>),
}

impl Record {
    fn material(kind: MaterialKind, config: MaterialConfig<Uuid>) -> Record {
        match kind {
            MaterialKind::Isotropic => Record::Isotropic(config),
            MaterialKind::PlanarIso12 => Record::PlanarIso12(config),
            MaterialKind::PlanarIso13 => Record::PlanarIso13(config),
            MaterialKind::PlanarIso23 => Record::PlanarIso23(config),
            MaterialKind::Orthotropic => Record::Orthotropic(config),
            MaterialKind::Frp => Record::Frp(config),
        }
    }

    /// The tag written to the `"type"` field
    pub fn type_name(&self) -> &'static str {
        match self {
            Record::Isotropic(_) => "Isotropic",
            Record::PlanarIso12(_) => "PlanarIso12",
            Record::PlanarIso13(_) => "PlanarIso13",
            Record::PlanarIso23(_) => "PlanarIso23",
            Record::Orthotropic(_) => "Orthotropic",
            Record::Frp(_) => "Frp",
            Record::Lamina(_) => "Lamina",
            Record::Laminate(_) => "Laminate",
            Record::MoldedTube(_) => "MoldedTube",
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Record::Isotropic(c)
            | Record::PlanarIso12(c)
            | Record::PlanarIso13(c)
            | Record::PlanarIso23(c)
            | Record::Orthotropic(c)
            | Record::Frp(c) => c.name.as_deref(),
            Record::Lamina(c) => c.name.as_deref(),
            Record::Laminate(c) => c.name.as_deref(),
            Record::MoldedTube(c) => c.name.as_deref(),
        }
    }
}

/// A top-level entity handed to or returned from a document
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Material(Rc<Material>),
    Layer(Rc<Layer>),
    Tube(Rc<MoldedTube>),
}

impl Entity {
    pub fn name(&self) -> &str {
        match self {
            Entity::Material(m) => m.name(),
            Entity::Layer(l) => l.name(),
            Entity::Tube(t) => t.name(),
        }
    }

    pub fn as_material(&self) -> Option<&Rc<Material>> {
        match self {
            Entity::Material(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_layer(&self) -> Option<&Rc<Layer>> {
        match self {
            Entity::Layer(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_tube(&self) -> Option<&Rc<MoldedTube>> {
        match self {
            Entity::Tube(t) => Some(t),
            _ => None,
        }
    }
}

impl DesignDocument {
    /// Create an empty document.
    pub fn new(name: impl Into<String>, designer: impl Into<String>) -> Self {
        let now = Utc::now();
        DesignDocument {
            meta: DesignMetadata {
                version: SCHEMA_VERSION.to_string(),
                name: name.into(),
                designer: designer.into(),
                created: now,
                modified: now,
            },
            settings: AnalysisSettings::default(),
            objects: HashMap::new(),
            roots: Vec::new(),
        }
    }

    /// Flatten `roots` and everything they reference into a new document.
    pub fn encode(
        name: impl Into<String>,
        designer: impl Into<String>,
        settings: AnalysisSettings,
        roots: &[Entity],
    ) -> CalcResult<Self> {
        settings.validate()?;
        let mut doc = DesignDocument::new(name, designer);
        doc.settings = settings;

        let mut encoder = Encoder::default();
        doc.roots = roots
            .iter()
            .map(|root| encoder.entity(root))
            .collect::<CalcResult<Vec<_>>>()?;
        doc.objects = encoder.objects;

        debug!("encoded '{}': {} roots, {} objects", doc.meta.name, doc.roots.len(), doc.objects.len());
        Ok(doc)
    }

    /// Rebuild the root entities, sharing every object referenced more than
    /// once. Tubes pick up the document's analysis settings.
    pub fn decode(&self) -> CalcResult<Vec<Entity>> {
        self.settings.validate()?;
        let mut decoder = Decoder::new(&self.objects, &self.settings);
        self.roots.iter().map(|&id| decoder.entity(id)).collect()
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

impl Default for DesignDocument {
    fn default() -> Self {
        DesignDocument::new("", "")
    }
}

// ============================================================================
// Encoding
// ============================================================================

#[derive(Default)]
struct Encoder {
    objects: HashMap<Uuid, Record>,
    materials: HashMap<*const Material, Uuid>,
    layers: HashMap<*const Layer, Uuid>,
    tubes: HashMap<*const MoldedTube, Uuid>,
}

impl Encoder {
    fn entity(&mut self, entity: &Entity) -> CalcResult<Uuid> {
        match entity {
            Entity::Material(m) => self.material(m),
            Entity::Layer(l) => self.layer(l),
            Entity::Tube(t) => self.tube(t),
        }
    }

    fn material(&mut self, material: &Rc<Material>) -> CalcResult<Uuid> {
        if let Some(&id) = self.materials.get(&Rc::as_ptr(material)) {
            return Ok(id);
        }
        let mut config = material.to_config().try_map_refs(|_, child| self.material(&child))?;
        let kind = config.kind.take().unwrap_or_else(|| material.kind());

        let id = Uuid::new_v4();
        self.objects.insert(id, Record::material(kind, config));
        self.materials.insert(Rc::as_ptr(material), id);
        Ok(id)
    }

    fn layer(&mut self, layer: &Rc<Layer>) -> CalcResult<Uuid> {
        if let Some(&id) = self.layers.get(&Rc::as_ptr(layer)) {
            return Ok(id);
        }
        let record = match layer.as_ref() {
            Layer::Lamina(lamina) => Record::Lamina(lamina.to_config().try_map_refs(|m| self.material(&m))?),
            Layer::Laminate(laminate) => Record::Laminate(laminate.to_config().try_map_refs(|l| self.layer(&l))?),
        };

        let id = Uuid::new_v4();
        self.objects.insert(id, record);
        self.layers.insert(Rc::as_ptr(layer), id);
        Ok(id)
    }

    fn tube(&mut self, tube: &Rc<MoldedTube>) -> CalcResult<Uuid> {
        if let Some(&id) = self.tubes.get(&Rc::as_ptr(tube)) {
            return Ok(id);
        }
        let resin = self.material(tube.resin())?;
        let config = tube.to_config().try_map_refs(|_| Ok(resin), |l| self.layer(&l))?;

        let id = Uuid::new_v4();
        self.objects.insert(id, Record::MoldedTube(config));
        self.tubes.insert(Rc::as_ptr(tube), id);
        Ok(id)
    }
}

// ============================================================================
// Decoding
// ============================================================================

struct Decoder<'a> {
    objects: &'a HashMap<Uuid, Record>,
    settings: &'a AnalysisSettings,
    materials: HashMap<Uuid, Rc<Material>>,
    layers: HashMap<Uuid, Rc<Layer>>,
    tubes: HashMap<Uuid, Rc<MoldedTube>>,
    /// Ids whose decoding has started but not finished
    open: HashSet<Uuid>,
}

impl<'a> Decoder<'a> {
    fn new(objects: &'a HashMap<Uuid, Record>, settings: &'a AnalysisSettings) -> Self {
        Decoder {
            objects,
            settings,
            materials: HashMap::new(),
            layers: HashMap::new(),
            tubes: HashMap::new(),
            open: HashSet::new(),
        }
    }

    fn record(&self, id: Uuid) -> CalcResult<&'a Record> {
        let objects = self.objects;
        objects.get(&id).ok_or_else(|| CalcError::UnknownReference { id: id.to_string() })
    }

    fn enter(&mut self, id: Uuid, field: &str, record: &Record) -> CalcResult<()> {
        if self.open.insert(id) {
            Ok(())
        } else {
            Err(CalcError::self_reference(field, record.name().unwrap_or(record.type_name())))
        }
    }

    fn wrong_type(id: Uuid, record: &Record, expected: &str) -> CalcError {
        CalcError::invalid_input(
            "type",
            record.type_name(),
            format!("Object {id} is referenced as a {expected}"),
        )
    }

    fn entity(&mut self, id: Uuid) -> CalcResult<Entity> {
        match self.record(id)? {
            Record::Lamina(_) | Record::Laminate(_) => Ok(Entity::Layer(self.layer(id)?)),
            Record::MoldedTube(_) => Ok(Entity::Tube(self.tube(id)?)),
            _ => Ok(Entity::Material(self.material(id, "material")?)),
        }
    }

    /// `field` names the reference this material was reached through.
    fn material(&mut self, id: Uuid, field: &str) -> CalcResult<Rc<Material>> {
        if let Some(material) = self.materials.get(&id) {
            return Ok(Rc::clone(material));
        }
        let record = self.record(id)?;
        let (kind, config) = match record {
            Record::Isotropic(c) => (MaterialKind::Isotropic, c),
            Record::PlanarIso12(c) => (MaterialKind::PlanarIso12, c),
            Record::PlanarIso13(c) => (MaterialKind::PlanarIso13, c),
            Record::PlanarIso23(c) => (MaterialKind::PlanarIso23, c),
            Record::Orthotropic(c) => (MaterialKind::Orthotropic, c),
            Record::Frp(c) => (MaterialKind::Frp, c),
            _ => return Err(Self::wrong_type(id, record, "material")),
        };

        self.enter(id, field, record)?;
        let mut config = config.clone().try_map_refs(|field, child| self.material(child, field))?;
        config.kind = Some(kind);
        let material = Rc::new(Material::build(config)?);
        self.open.remove(&id);

        self.materials.insert(id, Rc::clone(&material));
        Ok(material)
    }

    fn layer(&mut self, id: Uuid) -> CalcResult<Rc<Layer>> {
        if let Some(layer) = self.layers.get(&id) {
            return Ok(Rc::clone(layer));
        }
        let record = self.record(id)?;
        self.enter(id, "layer", record)?;
        let layer = match record {
            Record::Lamina(c) => Layer::Lamina(Lamina::build(c.clone().try_map_refs(|m| self.material(m, "material"))?)?),
            Record::Laminate(c) => Layer::Laminate(Laminate::build(c.clone().try_map_refs(|l| self.layer(l))?)?),
            _ => return Err(Self::wrong_type(id, record, "layer")),
        };
        self.open.remove(&id);

        let layer = Rc::new(layer);
        self.layers.insert(id, Rc::clone(&layer));
        Ok(layer)
    }

    fn tube(&mut self, id: Uuid) -> CalcResult<Rc<MoldedTube>> {
        if let Some(tube) = self.tubes.get(&id) {
            return Ok(Rc::clone(tube));
        }
        let record = self.record(id)?;
        let Record::MoldedTube(config) = record else {
            return Err(Self::wrong_type(id, record, "tube"));
        };

        let resin = match config.resin {
            Some(resin_id) => Some(self.material(resin_id, "resin")?),
            None => None,
        };
        let mut plies = Vec::with_capacity(config.plies.len());
        for ply in &config.plies {
            plies.push(ply.clone().try_map_refs(|l| self.layer(l))?);
        }
        let tube = MoldedTube::build(MoldedTubeConfig {
            name: config.name.clone(),
            profile: config.profile.clone(),
            resin,
            plies,
        })?
        .with_settings(self.settings.clone())?;

        let tube = Rc::new(tube);
        self.tubes.insert(id, Rc::clone(&tube));
        Ok(tube)
    }
}
