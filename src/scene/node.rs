//! Scene nodes
//!
//! Nodes own their children; the hierarchy is a plain tree rooted at
//! [`crate::scene::Scene::root`]. Local transforms are kept as `f64`
//! matrices until the final `f32` bake so repeated normalization passes do
//! not accumulate precision loss.

use cgmath::{Matrix4, SquareMatrix};

use super::geometry::Geometry;
use super::material::SurfaceMaterial;

/// One entry in the scene hierarchy
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    /// Local transform, column-vector convention (`world = parent * local`)
    pub transform: Matrix4<f64>,
    pub geometry: Option<Geometry>,
    pub materials: Vec<SurfaceMaterial>,
    pub children: Vec<Node>,
}

impl Node {
    /// Creates an empty node with an identity local transform
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Matrix4::identity(),
            geometry: None,
            materials: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder pattern: set the local transform
    pub fn with_transform(mut self, transform: Matrix4<f64>) -> Self {
        self.transform = transform;
        self
    }

    /// Builder pattern: attach a geometry payload
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Builder pattern: attach a material slot
    pub fn with_material(mut self, material: SurfaceMaterial) -> Self {
        self.materials.push(material);
        self
    }

    /// Builder pattern: append a child node
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Number of nodes in this subtree, this node included
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Node::subtree_len).sum::<usize>()
    }
}
