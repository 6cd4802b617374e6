// src/lib.rs
//! Bannock
//!
//! A scene-graph flattening library: loads a hierarchical 3D scene asset
//! and converts it into a flat, renderer-agnostic collection of mesh
//! records carrying per-corner vertex attributes, sequential triangle
//! indices, baked world transforms, and resolved material descriptors.
//!
//! ```no_run
//! use bannock::{AxisSystem, SceneConverter};
//!
//! let converter = SceneConverter::new(AxisSystem::LeftHandedYUp);
//! let records = converter.load("assets/scene.gltf")?;
//!
//! for record in &records {
//!     println!(
//!         "{} (parent {}): {} triangle(s), {} material(s)",
//!         record.name,
//!         record.parent_name,
//!         record.triangle_count(),
//!         record.materials.len(),
//!     );
//! }
//! # Ok::<(), bannock::LoadError>(())
//! ```

pub mod asset;
pub mod convert;
pub mod prelude;
pub mod record;
pub mod scene;

// Re-export main types for convenience
pub use asset::{FileFormat, ImporterRegistry, LoadError, SceneImporter};
pub use convert::SceneConverter;
pub use record::{
    ElementCounts, ElementKind, MaterialDescriptor, MaterialElement, MaterialKind, MeshRecord,
    RecordSet,
};
pub use scene::{AxisSystem, Scene};

use std::path::Path;

/// Loads and flattens a scene asset in one call
pub fn load(path: impl AsRef<Path>, target_axis: AxisSystem) -> Result<RecordSet, LoadError> {
    SceneConverter::new(target_axis).load(path)
}
