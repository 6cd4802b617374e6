//! Flattened output records
//!
//! The renderer-facing result of a conversion: one [`MeshRecord`] per scene
//! node, collected into a [`RecordSet`] in pre-order traversal order. All
//! data is deep-copied out of the scene during flattening, so a `RecordSet`
//! stays valid after the scene (and the importer that produced it) is
//! dropped. Records are immutable once emitted and safe to read from
//! multiple threads.

use std::collections::HashMap;
use std::ops::Index;

/// Parent name given to the single root record
pub const ROOT_PARENT_NAME: &str = "null";

/// How many attribute sets a record carries
///
/// Positions and normals are always one set each once geometry is present;
/// UV sets range from zero to however many channels the mesh declared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElementCounts {
    pub positions: u32,
    pub normals: u32,
    pub uv_sets: u32,
}

/// Classification of a resolved material
///
/// `Unknown` is the explicit default for shading models outside the classic
/// Lambert/Phong pair, so an unrecognized model can never masquerade as a
/// previously resolved one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MaterialKind {
    Lambert,
    Phong,
    #[default]
    Unknown,
}

/// How a single material channel is driven
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ElementKind {
    #[default]
    None,
    Color,
    Texture,
    Both,
}

/// One resolved material channel (ambient, diffuse, specular or emissive)
#[derive(Debug, Clone)]
pub struct MaterialElement {
    pub kind: ElementKind,
    /// Resolved RGBA color; written even when `kind` is `None` or
    /// `Texture`, alpha pinned to 1.0
    pub color: [f32; 4],
    /// Texture file paths grouped by the UV set they sample, layering
    /// order preserved
    pub textures: HashMap<String, Vec<String>>,
}

impl Default for MaterialElement {
    fn default() -> Self {
        Self {
            kind: ElementKind::None,
            color: [0.0, 0.0, 0.0, 1.0],
            textures: HashMap::new(),
        }
    }
}

impl MaterialElement {
    /// Texture paths attached to this channel for a given UV set
    pub fn textures_for(&self, uv_set: &str) -> Option<&[String]> {
        self.textures.get(uv_set).map(Vec::as_slice)
    }

    /// Total texture count across all UV sets
    pub fn texture_count(&self) -> usize {
        self.textures.values().map(Vec::len).sum()
    }
}

/// Simplified material description attached to a mesh record
#[derive(Debug, Clone, Default)]
pub struct MaterialDescriptor {
    pub kind: MaterialKind,
    pub ambient: MaterialElement,
    pub diffuse: MaterialElement,
    pub specular: MaterialElement,
    pub emissive: MaterialElement,
    pub specular_power: f32,
    pub transparency: f32,
}

/// Flattened per-node mesh data
///
/// Vertex attributes use the unshared per-corner layout: every triangle
/// corner gets its own entry in `positions`/`normals`/each UV sequence, and
/// `indices` is the sequential list `0, 1, 2, ...`. Corners sharing a
/// source control point are duplicated on purpose, because normals and UVs
/// are defined per corner and may differ between them; index-buffer
/// compaction belongs to a downstream optimization pass.
#[derive(Debug, Clone)]
pub struct MeshRecord {
    pub name: String,
    /// Name of the parent record, or [`ROOT_PARENT_NAME`] for the root
    pub parent_name: String,
    pub elements: ElementCounts,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    /// UV set name to index in `uv_sets`, indices in first-seen order
    pub uv_set_ids: HashMap<String, u32>,
    /// One flattened coordinate sequence per UV set, each the same length
    /// as `positions`
    pub uv_sets: Vec<Vec<[f32; 2]>>,
    /// Sequential triangle indices; `indices[i] == i` at emission time
    pub indices: Vec<u32>,
    /// Baked node-to-world transform, 4x4 row-major (translation at
    /// elements 12..15)
    pub transform: [f32; 16],
    pub materials: Vec<MaterialDescriptor>,
}

impl Default for MeshRecord {
    fn default() -> Self {
        Self {
            name: String::new(),
            parent_name: ROOT_PARENT_NAME.to_string(),
            elements: ElementCounts::default(),
            positions: Vec::new(),
            normals: Vec::new(),
            uv_set_ids: HashMap::new(),
            uv_sets: Vec::new(),
            indices: Vec::new(),
            transform: IDENTITY_TRANSFORM,
            materials: Vec::new(),
        }
    }
}

/// Row-major 4x4 identity, the baked transform of every root record
pub const IDENTITY_TRANSFORM: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

impl MeshRecord {
    /// True when the record carries vertex data
    pub fn has_geometry(&self) -> bool {
        !self.positions.is_empty()
    }

    /// Number of triangles in the expanded layout
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Index of a UV set by name
    pub fn uv_set_index(&self, name: &str) -> Option<u32> {
        self.uv_set_ids.get(name).copied()
    }

    /// Flattened coordinates of a UV set by name
    pub fn uv_coords(&self, name: &str) -> Option<&[[f32; 2]]> {
        let index = self.uv_set_index(name)? as usize;
        self.uv_sets.get(index).map(Vec::as_slice)
    }
}

/// Ordered collection of mesh records, root first
///
/// Access follows slice semantics: indexes are not range-checked beyond the
/// usual panic, matching the bounds contract of the output surface (callers
/// check `node_count()` themselves).
#[derive(Debug, Default)]
pub struct RecordSet {
    records: Vec<MeshRecord>,
}

impl RecordSet {
    pub(crate) fn from_records(records: Vec<MeshRecord>) -> Self {
        Self { records }
    }

    /// Number of records (one per visited node)
    pub fn node_count(&self) -> usize {
        self.records.len()
    }

    /// Record at `index`; panics when `index >= node_count()`
    pub fn record(&self, index: usize) -> &MeshRecord {
        &self.records[index]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MeshRecord> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[MeshRecord] {
        &self.records
    }
}

impl Index<usize> for RecordSet {
    type Output = MeshRecord;

    fn index(&self, index: usize) -> &MeshRecord {
        &self.records[index]
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a MeshRecord;
    type IntoIter = std::slice::Iter<'a, MeshRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_record() {
        let record = MeshRecord::default();
        assert_eq!(record.parent_name, ROOT_PARENT_NAME);
        assert_eq!(record.transform, IDENTITY_TRANSFORM);
        assert!(!record.has_geometry());
        assert_eq!(record.triangle_count(), 0);
    }

    #[test]
    fn test_uv_lookup() {
        let mut record = MeshRecord::default();
        record.uv_set_ids.insert("default".to_string(), 0);
        record.uv_sets.push(vec![[0.0, 0.0], [1.0, 0.0]]);

        assert_eq!(record.uv_set_index("default"), Some(0));
        assert_eq!(record.uv_coords("default").unwrap().len(), 2);
        assert_eq!(record.uv_set_index("lightmap"), None);
        assert!(record.uv_coords("lightmap").is_none());
    }

    #[test]
    fn test_material_element_default() {
        let element = MaterialElement::default();
        assert_eq!(element.kind, ElementKind::None);
        assert_eq!(element.color, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(element.texture_count(), 0);
    }

    #[test]
    fn test_unknown_is_material_default() {
        assert_eq!(MaterialDescriptor::default().kind, MaterialKind::Unknown);
    }

    #[test]
    fn test_record_set_access() {
        let set = RecordSet::from_records(vec![
            MeshRecord {
                name: "root".to_string(),
                ..Default::default()
            },
            MeshRecord {
                name: "child".to_string(),
                parent_name: "root".to_string(),
                ..Default::default()
            },
        ]);

        assert_eq!(set.node_count(), 2);
        assert_eq!(set.record(0).name, "root");
        assert_eq!(set[1].name, "child");
        assert_eq!(set.iter().count(), 2);
    }
}
