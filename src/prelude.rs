//! # Bannock Prelude
//!
//! Convenience imports for typical conversion code.
//!
//! ```rust
//! use bannock::prelude::*;
//! ```
//!
//! This brings the converter, the record types, and the scene-building
//! types custom importers need into one scope.

// Re-export the conversion surface
pub use crate::convert::SceneConverter;
pub use crate::load;

// Re-export the output record types
pub use crate::record::{
    ElementCounts, ElementKind, MaterialDescriptor, MaterialElement, MaterialKind, MeshRecord,
    RecordSet, ROOT_PARENT_NAME,
};

// Re-export the importer seam
pub use crate::asset::{
    FileFormat, GltfImporter, ImporterRegistry, LoadError, ObjImporter, SceneImporter,
};

// Re-export scene-building types for custom importers
pub use crate::scene::{
    AxisSystem, Corner, Geometry, GlobalSettings, Node, NurbsSurface, PatchBasis, PatchSurface,
    Polygon, PolygonMesh, Scene, ShadingModel, SurfaceMaterial, TextureRef, UvSet,
};

// Re-export common external dependencies
pub use cgmath::{Matrix4, SquareMatrix, Vector2, Vector3};
