//! Geometry payloads carried by scene nodes
//!
//! A node owns at most one geometry payload. Importers produce whatever the
//! source asset contained (polygonal meshes, NURBS surfaces, patches); the
//! normalizer replaces every non-triangle payload with a triangle-only
//! [`PolygonMesh`] before flattening.

use cgmath::{Vector2, Vector3};

/// Conventional name for the UV set of sources that only carry a single
/// unnamed channel (tessellated surfaces, OBJ texture coordinates)
pub const DEFAULT_UV_SET: &str = "default";

/// Geometry attribute attached to a node
///
/// `Nurbs` and `NurbsSurface` mirror the two NURBS attribute kinds found in
/// interchange formats (legacy NURBS geometry vs. the newer surface class);
/// both carry the same payload and are tessellated identically.
#[derive(Debug, Clone)]
pub enum Geometry {
    Mesh(PolygonMesh),
    Nurbs(NurbsSurface),
    NurbsSurface(NurbsSurface),
    Patch(PatchSurface),
}

/// One polygon corner: a control-point reference plus the attributes that
/// are defined per corner rather than per control point.
#[derive(Debug, Clone)]
pub struct Corner {
    pub control_point: usize,
    pub normal: Vector3<f64>,
}

/// A polygon of arbitrary size (triangulation happens in the normalizer)
#[derive(Debug, Clone)]
pub struct Polygon {
    pub corners: Vec<Corner>,
}

/// A named UV channel
///
/// Coordinates are stored flat, one entry per polygon corner in polygon
/// order. `None` marks a corner the source left unmapped for this set.
#[derive(Debug, Clone)]
pub struct UvSet {
    pub name: String,
    pub coords: Vec<Option<Vector2<f64>>>,
}

/// Polygonal mesh with deduplicated control points
///
/// Positions live in `control_points` and are referenced by index from
/// polygon corners, so two polygons sharing an edge share the position but
/// keep independent per-corner normals and UVs.
#[derive(Debug, Clone, Default)]
pub struct PolygonMesh {
    pub control_points: Vec<Vector3<f64>>,
    pub polygons: Vec<Polygon>,
    pub uv_sets: Vec<UvSet>,
}

impl PolygonMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of polygon corners across the whole mesh
    pub fn corner_count(&self) -> usize {
        self.polygons.iter().map(|polygon| polygon.corners.len()).sum()
    }

    /// True when every polygon is a triangle
    pub fn is_triangulated(&self) -> bool {
        self.polygons.iter().all(|polygon| polygon.corners.len() == 3)
    }
}

/// NURBS surface payload
///
/// The control grid is stored flat with U varying fastest: the point at
/// `(u, v)` lives at index `v * u_count + u`. Knot vectors follow the usual
/// `count + order` length convention, and `order` is degree + 1.
#[derive(Debug, Clone)]
pub struct NurbsSurface {
    pub control_points: Vec<Vector3<f64>>,
    pub weights: Vec<f64>,
    pub u_count: usize,
    pub v_count: usize,
    pub u_order: usize,
    pub v_order: usize,
    pub u_knots: Vec<f64>,
    pub v_knots: Vec<f64>,
}

impl NurbsSurface {
    pub fn u_degree(&self) -> usize {
        self.u_order.saturating_sub(1)
    }

    pub fn v_degree(&self) -> usize {
        self.v_order.saturating_sub(1)
    }
}

/// Interpolation basis of a patch direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchBasis {
    Linear,
    Bezier,
}

/// Patch surface payload: a control grid with a per-direction basis
#[derive(Debug, Clone)]
pub struct PatchSurface {
    pub control_points: Vec<Vector3<f64>>,
    pub u_count: usize,
    pub v_count: usize,
    pub u_basis: PatchBasis,
    pub v_basis: PatchBasis,
}
