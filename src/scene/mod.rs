//! In-memory scene model
//!
//! This is the intermediate representation between importers and the
//! conversion pipeline: a node hierarchy with geometry payloads, materials,
//! and the coordinate/unit convention the source asset declared. The scene
//! is owned by the pipeline for the duration of a conversion and dropped
//! once flattening has deep-copied everything into output records.

pub mod geometry;
pub mod material;
pub mod node;

pub use geometry::{
    Corner, Geometry, NurbsSurface, PatchBasis, PatchSurface, Polygon, PolygonMesh, UvSet,
    DEFAULT_UV_SET,
};
pub use material::{MaterialProperty, PropertyValue, ShadingModel, SurfaceMaterial, TextureRef};
pub use node::Node;

/// Name given to synthetic scene roots created by importers
pub const ROOT_NODE_NAME: &str = "RootNode";

/// Axis convention of a scene, or the target convention of a conversion
///
/// The closed set of conventions this pipeline understands: a DirectX-style
/// left-handed Y-up system and an OpenGL-style right-handed Y-up system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisSystem {
    LeftHandedYUp,
    RightHandedYUp,
}

/// Coordinate and unit convention declared by the source asset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalSettings {
    pub axis_system: AxisSystem,
    /// Centimeters per scene unit; 1.0 means the scene is already in cm
    pub unit_scale: f64,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            axis_system: AxisSystem::RightHandedYUp,
            unit_scale: 1.0,
        }
    }
}

/// An imported scene: global settings plus the node hierarchy
#[derive(Debug, Clone)]
pub struct Scene {
    pub name: String,
    pub settings: GlobalSettings,
    pub root: Node,
}

impl Scene {
    /// Creates an empty scene with a default root node
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            settings: GlobalSettings::default(),
            root: Node::new(ROOT_NODE_NAME),
        }
    }

    /// Total number of nodes in the hierarchy, root included
    pub fn node_count(&self) -> usize {
        self.root.subtree_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_scene() {
        let scene = Scene::new("test");
        assert_eq!(scene.node_count(), 1);
        assert_eq!(scene.root.name, ROOT_NODE_NAME);
        assert_eq!(scene.settings.unit_scale, 1.0);
    }
}
