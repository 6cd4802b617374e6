//! Node flattening
//!
//! Second stage of the pipeline: walk the normalized hierarchy in
//! pre-order and emit one [`MeshRecord`] per node. Geometry is expanded
//! into the unshared per-corner layout, materials are resolved to
//! descriptors, and world transforms are baked on the way down. The
//! traversal is iterative over an explicit stack so pathologically deep
//! hierarchies cannot exhaust the call stack.

use cgmath::{Matrix4, SquareMatrix};
use log::warn;

use super::{material, transform};
use crate::record::{MeshRecord, RecordSet, ROOT_PARENT_NAME};
use crate::scene::geometry::{Geometry, PolygonMesh};
use crate::scene::{Node, Scene};

/// Flattens a normalized scene into an ordered record collection
///
/// Every node produces a record, geometry or not, so children can always
/// resolve their parent by name. The root record keeps an identity
/// transform; descendants accumulate world transforms through every
/// ancestor.
pub fn flatten(scene: &Scene) -> RecordSet {
    let mut records = Vec::with_capacity(scene.node_count());

    // (node, parent name, accumulated parent world transform)
    let mut stack: Vec<(&Node, &str, Matrix4<f64>)> =
        vec![(&scene.root, ROOT_PARENT_NAME, Matrix4::identity())];

    while let Some((node, parent_name, parent_world)) = stack.pop() {
        let world = parent_world * node.transform;
        let is_root = std::ptr::eq(node, &scene.root);

        let mut record = MeshRecord {
            name: node.name.clone(),
            parent_name: parent_name.to_string(),
            ..Default::default()
        };

        if let Some(Geometry::Mesh(mesh)) = &node.geometry {
            if !mesh.control_points.is_empty() {
                copy_vertex_data(mesh, &mut record, &node.name);
            }
        }

        for surface_material in &node.materials {
            record.materials.push(material::resolve(surface_material));
        }

        if !is_root {
            record.transform = transform::bake(&world);
        }

        records.push(record);

        // Reverse push keeps children in declaration order off the stack
        for child in node.children.iter().rev() {
            stack.push((child, &node.name, world));
        }
    }

    RecordSet::from_records(records)
}

/// Expands a triangulated mesh into per-corner parallel arrays
///
/// Every corner gets its own entry: positions from the corner's control
/// point, the corner's own normal, and the next sequential index. The
/// corner loop is generic over polygon size; triangulation has normally
/// reduced everything to 3-gons, but an oversized polygon still expands
/// corner by corner rather than being assumed away.
fn copy_vertex_data(mesh: &PolygonMesh, record: &mut MeshRecord, node_name: &str) {
    record.elements.positions = 1;
    record.elements.normals = 1;

    let mut index = 0u32;
    for polygon in &mesh.polygons {
        for corner in &polygon.corners {
            let position = mesh.control_points[corner.control_point];
            record
                .positions
                .push([position.x as f32, position.y as f32, position.z as f32]);
            record.normals.push([
                corner.normal.x as f32,
                corner.normal.y as f32,
                corner.normal.z as f32,
            ]);
            record.indices.push(index);
            index += 1;
        }
    }

    // UV sets are expanded separately: there may be several, each needing
    // a full pass over the corners in the same order as above.
    record.elements.uv_sets = mesh.uv_sets.len() as u32;
    for (set_index, uv_set) in mesh.uv_sets.iter().enumerate() {
        record
            .uv_set_ids
            .insert(uv_set.name.clone(), set_index as u32);

        let mut coords = Vec::with_capacity(record.positions.len());
        let mut unmapped = 0usize;
        let mut flat = 0usize;
        for polygon in &mesh.polygons {
            for _ in &polygon.corners {
                match uv_set.coords.get(flat).copied().flatten() {
                    Some(uv) => coords.push([uv.x as f32, uv.y as f32]),
                    None => {
                        unmapped += 1;
                        coords.push([0.0, 0.0]);
                    }
                }
                flat += 1;
            }
        }

        if unmapped > 0 {
            warn!(
                "{} corner(s) unmapped in uv set '{}' on node '{}'",
                unmapped, uv_set.name, node_name
            );
        }
        record.uv_sets.push(coords);
    }
}
