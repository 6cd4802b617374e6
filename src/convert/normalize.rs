//! Scene normalization
//!
//! First stage of the pipeline: reconcile the imported scene's axis and
//! unit conventions with the conversion target, then reduce every geometry
//! payload to triangles. After `normalize` returns, the flattener can
//! assume centimeter units in the target axis system and triangle-only
//! `Mesh` payloads.

use cgmath::Matrix4;
use log::{debug, warn};

use super::tessellate;
use crate::scene::geometry::{Geometry, Polygon, PolygonMesh, UvSet};
use crate::scene::{AxisSystem, Node, Scene};

/// Normalizes a scene in place against the target axis system
pub fn normalize(scene: &mut Scene, target: AxisSystem) {
    convert_axis_system(scene, target);
    convert_units(scene);
    triangulate_node(&mut scene.root);
}

/// Reconciles the scene's axis convention with the target
///
/// The two supported conventions differ by handedness only, so the
/// conversion is the Z reflection applied as one consistent operation:
/// every local transform is conjugated by the reflection and every stored
/// position/normal has its Z flipped. Conjugation telescopes through the
/// hierarchy product, which keeps the scene's world-space relationships
/// exact instead of compounding per-node error.
fn convert_axis_system(scene: &mut Scene, target: AxisSystem) {
    if scene.settings.axis_system == target {
        return;
    }
    debug!(
        "converting scene '{}' from {:?} to {:?}",
        scene.name, scene.settings.axis_system, target
    );
    flip_handedness(&mut scene.root);
    scene.settings.axis_system = target;
}

fn flip_handedness(node: &mut Node) {
    node.transform = conjugate_z_reflection(node.transform);

    match &mut node.geometry {
        Some(Geometry::Mesh(mesh)) => {
            for point in &mut mesh.control_points {
                point.z = -point.z;
            }
            for polygon in &mut mesh.polygons {
                for corner in &mut polygon.corners {
                    corner.normal.z = -corner.normal.z;
                }
            }
        }
        Some(Geometry::Nurbs(surface)) | Some(Geometry::NurbsSurface(surface)) => {
            for point in &mut surface.control_points {
                point.z = -point.z;
            }
        }
        Some(Geometry::Patch(patch)) => {
            for point in &mut patch.control_points {
                point.z = -point.z;
            }
        }
        None => {}
    }

    for child in &mut node.children {
        flip_handedness(child);
    }
}

/// `C * M * C` for the Z reflection `C = diag(1, 1, -1, 1)`
fn conjugate_z_reflection(matrix: Matrix4<f64>) -> Matrix4<f64> {
    let mut matrix = matrix;
    for column in 0..4 {
        for row in 0..4 {
            if (row == 2) != (column == 2) {
                matrix[column][row] = -matrix[column][row];
            }
        }
    }
    matrix
}

/// Rescales the scene to centimeters
///
/// `unit_scale` is the declared centimeters-per-unit factor. A scene
/// already at 1.0 is left untouched, so normalizing twice is a no-op.
fn convert_units(scene: &mut Scene) {
    let factor = scene.settings.unit_scale;
    if factor == 1.0 {
        return;
    }
    debug!("rescaling scene '{}' by {} to cm", scene.name, factor);
    rescale_node(&mut scene.root, factor);
    scene.settings.unit_scale = 1.0;
}

fn rescale_node(node: &mut Node, factor: f64) {
    // Scaling every local translation together with all stored geometry
    // rescales the composed world space uniformly; rotation and scale
    // blocks stay untouched.
    node.transform.w.x *= factor;
    node.transform.w.y *= factor;
    node.transform.w.z *= factor;

    match &mut node.geometry {
        Some(Geometry::Mesh(mesh)) => {
            for point in &mut mesh.control_points {
                *point *= factor;
            }
        }
        Some(Geometry::Nurbs(surface)) | Some(Geometry::NurbsSurface(surface)) => {
            for point in &mut surface.control_points {
                *point *= factor;
            }
        }
        Some(Geometry::Patch(patch)) => {
            for point in &mut patch.control_points {
                *point *= factor;
            }
        }
        None => {}
    }

    for child in &mut node.children {
        rescale_node(child, factor);
    }
}

/// Pre-order pass replacing every payload with a triangle-only mesh
fn triangulate_node(node: &mut Node) {
    if let Some(geometry) = node.geometry.take() {
        node.geometry = match geometry {
            Geometry::Mesh(mesh) => Some(Geometry::Mesh(fan_triangulate(mesh, &node.name))),
            Geometry::Nurbs(surface) | Geometry::NurbsSurface(surface) => {
                match tessellate::tessellate_nurbs(&surface) {
                    Some(mesh) => Some(Geometry::Mesh(mesh)),
                    None => {
                        warn!("dropping untessellatable NURBS surface on node '{}'", node.name);
                        None
                    }
                }
            }
            Geometry::Patch(patch) => match tessellate::tessellate_patch(&patch) {
                Some(mesh) => Some(Geometry::Mesh(mesh)),
                None => {
                    warn!("dropping untessellatable patch on node '{}'", node.name);
                    None
                }
            },
        };
    }

    for child in &mut node.children {
        triangulate_node(child);
    }
}

/// Fans every n-gon into triangles, keeping per-corner attributes aligned
fn fan_triangulate(mesh: PolygonMesh, node_name: &str) -> PolygonMesh {
    if mesh.is_triangulated() {
        return mesh;
    }

    let mut polygons = Vec::with_capacity(mesh.polygons.len());
    // Maps each emitted corner back to its flat index in the source
    // corner order, so UV sequences can be rebuilt to the new layout.
    let mut corner_map = Vec::new();
    let mut dropped = 0usize;
    let mut base = 0usize;

    for polygon in &mesh.polygons {
        let size = polygon.corners.len();
        if size < 3 {
            dropped += 1;
        } else if size == 3 {
            polygons.push(polygon.clone());
            corner_map.extend(base..base + 3);
        } else {
            for apex in 1..size - 1 {
                let fan = [0, apex, apex + 1];
                polygons.push(Polygon {
                    corners: fan.iter().map(|&c| polygon.corners[c].clone()).collect(),
                });
                corner_map.extend(fan.iter().map(|&c| base + c));
            }
        }
        base += size;
    }

    if dropped > 0 {
        warn!(
            "dropped {} degenerate face(s) (<3 corners) on node '{}'",
            dropped, node_name
        );
    }

    let uv_sets = mesh
        .uv_sets
        .iter()
        .map(|set| UvSet {
            name: set.name.clone(),
            coords: corner_map
                .iter()
                .map(|&flat| set.coords.get(flat).copied().flatten())
                .collect(),
        })
        .collect();

    PolygonMesh {
        control_points: mesh.control_points,
        polygons,
        uv_sets,
    }
}
