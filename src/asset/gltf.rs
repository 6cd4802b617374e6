//! glTF 2.0 importer
//!
//! The hierarchy-capable backend: node trees, per-primitive geometry with
//! any number of `TEXCOORD_n` channels, and PBR materials mapped onto the
//! classic property table the resolver understands. Primitives of one
//! glTF mesh are merged into a single polygon mesh on their node, with the
//! primitive materials collected into the node's material slots.

use std::path::Path;

use cgmath::{Matrix4, Quaternion, Vector2, Vector3};
use log::warn;

use super::{has_extension, FileFormat, LoadError, SceneImporter};
use crate::scene::material::{
    DIFFUSE_COLOR, DIFFUSE_FACTOR, EMISSIVE_COLOR, EMISSIVE_FACTOR, SHININESS,
    TRANSPARENCY_FACTOR,
};
use crate::scene::{
    AxisSystem, Corner, Geometry, GlobalSettings, Node, Polygon, PolygonMesh, Scene, ShadingModel,
    SurfaceMaterial, TextureRef, UvSet,
};

/// Importer backend for glTF 2.0 assets (.gltf / .glb)
pub struct GltfImporter;

impl SceneImporter for GltfImporter {
    fn detect(&self, path: &Path) -> Option<FileFormat> {
        (has_extension(path, "gltf") || has_extension(path, "glb")).then_some(FileFormat::Gltf)
    }

    fn handles(&self, format: FileFormat) -> bool {
        format == FileFormat::Gltf
    }

    fn import(&self, path: &Path, _format: FileFormat) -> Result<Scene, LoadError> {
        let (document, buffers, _images) = gltf::import(path)?;

        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("scene");
        let mut scene = Scene::new(name);
        // glTF mandates right-handed Y-up in meters; normalization takes
        // the scene to centimeters from there.
        scene.settings = GlobalSettings {
            axis_system: AxisSystem::RightHandedYUp,
            unit_scale: 100.0,
        };

        let materials: Vec<SurfaceMaterial> =
            document.materials().map(convert_material).collect();

        let source_scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or_else(|| {
                LoadError::Import(format!("glTF asset '{}' contains no scenes", path.display()))
            })?;

        for node in source_scene.nodes() {
            scene
                .root
                .children
                .push(build_node(&node, &buffers, &materials));
        }
        Ok(scene)
    }
}

fn build_node(
    node: &gltf::Node,
    buffers: &[gltf::buffer::Data],
    materials: &[SurfaceMaterial],
) -> Node {
    let name = node.name().unwrap_or("Node").to_string();
    let mut out = Node::new(name).with_transform(local_transform(node));

    if let Some(mesh) = node.mesh() {
        let mut payload = PolygonMesh::new();
        let mut seen_materials = Vec::new();

        for primitive in mesh.primitives() {
            append_primitive(&mut payload, &primitive, buffers, &out.name);

            if let Some(index) = primitive.material().index() {
                if !seen_materials.contains(&index) {
                    seen_materials.push(index);
                    if let Some(material) = materials.get(index) {
                        out.materials.push(material.clone());
                    }
                }
            }
        }

        if !payload.control_points.is_empty() {
            out.geometry = Some(Geometry::Mesh(payload));
        }
    }

    for child in node.children() {
        out.children.push(build_node(&child, buffers, materials));
    }
    out
}

fn local_transform(node: &gltf::Node) -> Matrix4<f64> {
    match node.transform() {
        gltf::scene::Transform::Matrix { matrix } => {
            let mut columns = [[0.0f64; 4]; 4];
            for (column, source) in columns.iter_mut().zip(matrix.iter()) {
                for (dst, src) in column.iter_mut().zip(source.iter()) {
                    *dst = *src as f64;
                }
            }
            Matrix4::from(columns)
        }
        gltf::scene::Transform::Decomposed {
            translation,
            rotation,
            scale,
        } => {
            let translation = Matrix4::from_translation(Vector3::new(
                translation[0] as f64,
                translation[1] as f64,
                translation[2] as f64,
            ));
            // glTF stores quaternions xyzw, cgmath takes the scalar first
            let rotation = Matrix4::from(Quaternion::new(
                rotation[3] as f64,
                rotation[0] as f64,
                rotation[1] as f64,
                rotation[2] as f64,
            ));
            let scale = Matrix4::from_nonuniform_scale(
                scale[0] as f64,
                scale[1] as f64,
                scale[2] as f64,
            );
            translation * rotation * scale
        }
    }
}

/// Appends one primitive's triangles into the node's merged mesh
fn append_primitive(
    mesh: &mut PolygonMesh,
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
    node_name: &str,
) {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

    let positions: Vec<[f32; 3]> = match reader.read_positions() {
        Some(read) => read.collect(),
        None => {
            warn!("skipping primitive without positions on node '{}'", node_name);
            return;
        }
    };
    let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|read| read.collect());
    let indices: Vec<u32> = match reader.read_indices() {
        Some(read) => read.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    if indices.len() % 3 != 0 {
        warn!(
            "primitive on node '{}' has a trailing partial triangle, ignoring it",
            node_name
        );
    }

    let mut channels: Vec<(String, Vec<[f32; 2]>)> = Vec::new();
    let mut set = 0u32;
    while let Some(read) = reader.read_tex_coords(set) {
        channels.push((format!("TEXCOORD_{}", set), read.into_f32().collect()));
        set += 1;
    }

    // UV sets merge by name across primitives; corners contributed by
    // primitives without a given channel stay unmapped.
    let existing_corners = mesh.corner_count();
    for (name, _) in &channels {
        if !mesh.uv_sets.iter().any(|uv_set| &uv_set.name == name) {
            mesh.uv_sets.push(UvSet {
                name: name.clone(),
                coords: vec![None; existing_corners],
            });
        }
    }

    let base = mesh.control_points.len();
    mesh.control_points.extend(
        positions
            .iter()
            .map(|p| Vector3::new(p[0] as f64, p[1] as f64, p[2] as f64)),
    );

    for triangle in indices.chunks_exact(3) {
        let corners = triangle
            .iter()
            .map(|&index| {
                let i = index as usize;
                let normal = normals
                    .as_ref()
                    .and_then(|all| all.get(i))
                    .map(|n| Vector3::new(n[0] as f64, n[1] as f64, n[2] as f64))
                    .unwrap_or_else(Vector3::unit_y);
                Corner {
                    control_point: base + i,
                    normal,
                }
            })
            .collect();
        mesh.polygons.push(Polygon { corners });

        for uv_set in &mut mesh.uv_sets {
            let channel = channels.iter().find(|(name, _)| name == &uv_set.name);
            for &index in triangle {
                let coord = channel
                    .and_then(|(_, uvs)| uvs.get(index as usize))
                    .map(|uv| Vector2::new(uv[0] as f64, uv[1] as f64));
                uv_set.coords.push(coord);
            }
        }
    }
}

/// Maps a PBR material onto the classic Lambert/Phong property table
fn convert_material(material: gltf::Material) -> SurfaceMaterial {
    let name = material.name().unwrap_or("Material").to_string();
    // Metallic-roughness always carries a specular response, so Phong is
    // the closest classic analog
    let mut out = SurfaceMaterial::new(name, ShadingModel::Phong);

    let pbr = material.pbr_metallic_roughness();
    let base_color = pbr.base_color_factor();
    out.set_color(
        DIFFUSE_COLOR,
        [
            base_color[0] as f64,
            base_color[1] as f64,
            base_color[2] as f64,
        ],
    );
    out.set_scalar(DIFFUSE_FACTOR, 1.0);
    out.set_scalar(TRANSPARENCY_FACTOR, 1.0 - base_color[3] as f64);
    // Rough surfaces get broad, dim highlights; 128 is the usual Phong cap
    out.set_scalar(SHININESS, (1.0 - pbr.roughness_factor() as f64) * 128.0);

    if let Some(info) = pbr.base_color_texture() {
        if let Some(file) = texture_file(&info.texture()) {
            out.attach_texture(
                DIFFUSE_COLOR,
                TextureRef {
                    uv_set: format!("TEXCOORD_{}", info.tex_coord()),
                    file,
                },
            );
        }
    }

    let emissive = material.emissive_factor();
    out.set_color(
        EMISSIVE_COLOR,
        [emissive[0] as f64, emissive[1] as f64, emissive[2] as f64],
    );
    out.set_scalar(EMISSIVE_FACTOR, 1.0);
    if let Some(info) = material.emissive_texture() {
        if let Some(file) = texture_file(&info.texture()) {
            out.attach_texture(
                EMISSIVE_COLOR,
                TextureRef {
                    uv_set: format!("TEXCOORD_{}", info.tex_coord()),
                    file,
                },
            );
        }
    }

    out
}

/// File reference of a texture, when the image is not an embedded blob
fn texture_file(texture: &gltf::Texture) -> Option<String> {
    match texture.source().source() {
        gltf::image::Source::Uri { uri, .. } => Some(uri.to_string()),
        // Embedded images have no path; fall back to the image name so the
        // descriptor at least identifies the texture
        gltf::image::Source::View { .. } => texture.source().name().map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    // One red triangle at (0,0,0) (1,0,0) (0,1,0), indices 0 1 2 as u16,
    // positions and indices packed into a single base64 data buffer.
    const TRIANGLE_GLTF: &str = r#"{
  "asset": {"version": "2.0"},
  "scene": 0,
  "scenes": [{"nodes": [0]}],
  "nodes": [{"name": "tri", "mesh": 0, "translation": [1.0, 0.0, 0.0]}],
  "meshes": [{"primitives": [{"attributes": {"POSITION": 0}, "indices": 1, "material": 0}]}],
  "materials": [{"name": "red", "pbrMetallicRoughness": {"baseColorFactor": [1.0, 0.0, 0.0, 1.0], "roughnessFactor": 0.5}}],
  "buffers": [{"uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAABAAIA", "byteLength": 42}],
  "bufferViews": [
    {"buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962},
    {"buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963}
  ],
  "accessors": [
    {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]},
    {"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"}
  ]
}"#;

    #[test]
    fn test_detect() {
        let importer = GltfImporter;
        assert_eq!(
            importer.detect(Path::new("scene.gltf")),
            Some(FileFormat::Gltf)
        );
        assert_eq!(
            importer.detect(Path::new("scene.glb")),
            Some(FileFormat::Gltf)
        );
        assert_eq!(importer.detect(Path::new("scene.obj")), None);
    }

    #[test]
    fn test_import_triangle() {
        let path = std::env::temp_dir().join(format!(
            "bannock_{}_triangle.gltf",
            std::process::id()
        ));
        fs::write(&path, TRIANGLE_GLTF).unwrap();

        let scene = GltfImporter.import(&path, FileFormat::Gltf).unwrap();

        assert_eq!(scene.settings.axis_system, AxisSystem::RightHandedYUp);
        assert_eq!(scene.settings.unit_scale, 100.0);
        assert_eq!(scene.node_count(), 2);

        let node = &scene.root.children[0];
        assert_eq!(node.name, "tri");
        assert_eq!(node.transform.w.x, 1.0);

        let Some(Geometry::Mesh(mesh)) = &node.geometry else {
            panic!("expected mesh payload");
        };
        assert_eq!(mesh.control_points.len(), 3);
        assert_eq!(mesh.polygons.len(), 1);
        assert_eq!(mesh.polygons[0].corners.len(), 3);
        assert_eq!(mesh.control_points[1], Vector3::new(1.0, 0.0, 0.0));
        assert!(mesh.uv_sets.is_empty());

        assert_eq!(node.materials.len(), 1);
        let material = &node.materials[0];
        assert_eq!(material.shading_model, ShadingModel::Phong);
        assert_eq!(material.color(DIFFUSE_COLOR), Some([1.0, 0.0, 0.0]));
        assert_eq!(material.scalar(SHININESS), Some(64.0));

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let result = GltfImporter.import(Path::new("/nonexistent/missing.gltf"), FileFormat::Gltf);
        assert!(matches!(result, Err(LoadError::Gltf(_))));
    }
}
