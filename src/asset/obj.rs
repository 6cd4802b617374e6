//! Wavefront OBJ importer
//!
//! Loads OBJ/MTL pairs through `tobj` with triangulation disabled: faces
//! keep their source arity so the normalizer's own triangulation pass does
//! the fanning. OBJ has no hierarchy, so every model becomes one child of
//! a synthetic root. Missing normals are reconstructed from face normals
//! accumulated per control point.

use std::path::Path;

use cgmath::{InnerSpace, Vector2, Vector3};
use log::warn;

use super::{has_extension, FileFormat, LoadError, SceneImporter};
use crate::scene::geometry::DEFAULT_UV_SET;
use crate::scene::material::{
    AMBIENT_COLOR, AMBIENT_FACTOR, DIFFUSE_COLOR, DIFFUSE_FACTOR, SHININESS, SPECULAR_COLOR,
    SPECULAR_FACTOR, TRANSPARENCY_FACTOR,
};
use crate::scene::{
    AxisSystem, Corner, Geometry, GlobalSettings, Node, Polygon, PolygonMesh, Scene, ShadingModel,
    SurfaceMaterial, TextureRef, UvSet,
};

/// Importer backend for Wavefront OBJ assets
pub struct ObjImporter;

impl SceneImporter for ObjImporter {
    fn detect(&self, path: &Path) -> Option<FileFormat> {
        has_extension(path, "obj").then_some(FileFormat::WavefrontObj)
    }

    fn handles(&self, format: FileFormat) -> bool {
        format == FileFormat::WavefrontObj
    }

    fn import(&self, path: &Path, _format: FileFormat) -> Result<Scene, LoadError> {
        let (models, material_result) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: false,
                single_index: false,
                ..Default::default()
            },
        )?;

        let materials = material_result.unwrap_or_else(|error| {
            warn!(
                "no usable material library for '{}': {}",
                path.display(),
                error
            );
            Vec::new()
        });
        let materials: Vec<SurfaceMaterial> = materials.iter().map(convert_material).collect();

        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("scene");
        let mut scene = Scene::new(name);
        // OBJ declares neither axis nor units; the de facto convention is
        // right-handed Y-up with the unit left to the modeler.
        scene.settings = GlobalSettings {
            axis_system: AxisSystem::RightHandedYUp,
            unit_scale: 1.0,
        };

        for model in &models {
            scene.root.children.push(build_node(model, &materials));
        }
        Ok(scene)
    }
}

fn build_node(model: &tobj::Model, materials: &[SurfaceMaterial]) -> Node {
    let mesh = &model.mesh;
    let name = if model.name.is_empty() {
        "Model".to_string()
    } else {
        model.name.clone()
    };
    let mut node = Node::new(name);

    if let Some(id) = mesh.material_id {
        if let Some(material) = materials.get(id) {
            node.materials.push(material.clone());
        }
    }

    let control_points: Vec<Vector3<f64>> = mesh
        .positions
        .chunks_exact(3)
        .map(|p| Vector3::new(p[0] as f64, p[1] as f64, p[2] as f64))
        .collect();
    if control_points.is_empty() {
        return node;
    }

    // With triangulation off, face_arities describes the polygon layout;
    // an empty list means the mesh was already pure triangles.
    let arities: Vec<usize> = if mesh.face_arities.is_empty() {
        vec![3; mesh.indices.len() / 3]
    } else {
        mesh.face_arities.iter().map(|&a| a as usize).collect()
    };

    let has_source_normals = !mesh.normals.is_empty() && !mesh.normal_indices.is_empty();
    let generated_normals = if has_source_normals {
        None
    } else {
        Some(accumulate_vertex_normals(&control_points, &mesh.indices, &arities))
    };

    let has_uvs = !mesh.texcoords.is_empty() && !mesh.texcoord_indices.is_empty();
    let mut uv_coords = Vec::new();
    let mut polygons = Vec::with_capacity(arities.len());
    let mut flat = 0usize;

    for &arity in &arities {
        let mut corners = Vec::with_capacity(arity);
        for offset in 0..arity {
            let corner = flat + offset;
            let control_point = mesh.indices[corner] as usize;

            let normal = match &generated_normals {
                Some(normals) => normals[control_point],
                None => {
                    let n = mesh.normal_indices[corner] as usize * 3;
                    Vector3::new(
                        mesh.normals[n] as f64,
                        mesh.normals[n + 1] as f64,
                        mesh.normals[n + 2] as f64,
                    )
                }
            };
            corners.push(Corner {
                control_point,
                normal,
            });

            if has_uvs {
                let t = mesh.texcoord_indices[corner] as usize * 2;
                uv_coords.push(if t + 1 < mesh.texcoords.len() {
                    Some(Vector2::new(
                        mesh.texcoords[t] as f64,
                        mesh.texcoords[t + 1] as f64,
                    ))
                } else {
                    None
                });
            }
        }
        polygons.push(Polygon { corners });
        flat += arity;
    }

    let uv_sets = if has_uvs {
        vec![UvSet {
            name: DEFAULT_UV_SET.to_string(),
            coords: uv_coords,
        }]
    } else {
        Vec::new()
    };

    node.geometry = Some(Geometry::Mesh(PolygonMesh {
        control_points,
        polygons,
        uv_sets,
    }));
    node
}

/// Face-normal accumulation for meshes without stored normals
///
/// Every polygon contributes its plane normal to each control point it
/// touches; the sums are normalized at the end. Corners referencing the
/// same control point end up sharing the averaged normal, which is the
/// best OBJ can offer without source data.
fn accumulate_vertex_normals(
    control_points: &[Vector3<f64>],
    indices: &[u32],
    arities: &[usize],
) -> Vec<Vector3<f64>> {
    let mut normals = vec![Vector3::new(0.0, 0.0, 0.0); control_points.len()];

    let mut flat = 0usize;
    for &arity in arities {
        if arity >= 3 {
            let a = control_points[indices[flat] as usize];
            let b = control_points[indices[flat + 1] as usize];
            let c = control_points[indices[flat + 2] as usize];
            // Cross product length carries face area, weighting the average
            let face = (b - a).cross(c - a);
            for offset in 0..arity {
                normals[indices[flat + offset] as usize] += face;
            }
        }
        flat += arity;
    }

    for normal in &mut normals {
        *normal = if normal.magnitude2() > 1e-12 {
            normal.normalize()
        } else {
            Vector3::unit_y()
        };
    }
    normals
}

fn convert_material(mtl: &tobj::Material) -> SurfaceMaterial {
    // MTL illumination modes 2 and up carry specular terms
    let shading = match mtl.illumination_model {
        Some(model) if model >= 2 => ShadingModel::Phong,
        _ => ShadingModel::Lambert,
    };
    let name = if mtl.name.is_empty() {
        "Material".to_string()
    } else {
        mtl.name.clone()
    };
    let mut material = SurfaceMaterial::new(name, shading);

    if let Some(ambient) = mtl.ambient {
        material.set_color(
            AMBIENT_COLOR,
            [ambient[0] as f64, ambient[1] as f64, ambient[2] as f64],
        );
        material.set_scalar(AMBIENT_FACTOR, 1.0);
    }
    if let Some(diffuse) = mtl.diffuse {
        material.set_color(
            DIFFUSE_COLOR,
            [diffuse[0] as f64, diffuse[1] as f64, diffuse[2] as f64],
        );
        material.set_scalar(DIFFUSE_FACTOR, 1.0);
    }
    if let Some(specular) = mtl.specular {
        material.set_color(
            SPECULAR_COLOR,
            [specular[0] as f64, specular[1] as f64, specular[2] as f64],
        );
        material.set_scalar(SPECULAR_FACTOR, 1.0);
    }
    if let Some(shininess) = mtl.shininess {
        material.set_scalar(SHININESS, shininess as f64);
    }
    if let Some(dissolve) = mtl.dissolve {
        // MTL dissolve is opacity; the pipeline tracks transparency
        material.set_scalar(TRANSPARENCY_FACTOR, 1.0 - dissolve as f64);
    }

    for (property, texture) in [
        (AMBIENT_COLOR, &mtl.ambient_texture),
        (DIFFUSE_COLOR, &mtl.diffuse_texture),
        (SPECULAR_COLOR, &mtl.specular_texture),
    ] {
        if let Some(file) = texture {
            material.attach_texture(
                property,
                TextureRef {
                    uv_set: DEFAULT_UV_SET.to_string(),
                    file: file.clone(),
                },
            );
        }
    }

    material
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn write_fixture(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("bannock_{}_{}", std::process::id(), name));
        fs::write(&path, contents).unwrap();
        path
    }

    const QUAD_OBJ: &str = "\
mtllib bannock_test_quad.mtl
o quad
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
vn 0.0 0.0 1.0
usemtl red
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    const QUAD_MTL: &str = "\
newmtl red
Kd 1.0 0.0 0.0
Ks 0.5 0.5 0.5
Ns 32.0
illum 2
map_Kd red.png
";

    #[test]
    fn test_detect() {
        let importer = ObjImporter;
        assert_eq!(
            importer.detect(Path::new("mesh.obj")),
            Some(FileFormat::WavefrontObj)
        );
        assert_eq!(
            importer.detect(Path::new("mesh.OBJ")),
            Some(FileFormat::WavefrontObj)
        );
        assert_eq!(importer.detect(Path::new("mesh.gltf")), None);
        assert!(importer.handles(FileFormat::WavefrontObj));
        assert!(!importer.handles(FileFormat::GenericBinary));
    }

    #[test]
    fn test_import_quad() {
        // The MTL name is referenced from the OBJ, so write it first
        let mtl_path = std::env::temp_dir().join("bannock_test_quad.mtl");
        fs::write(&mtl_path, QUAD_MTL).unwrap();
        let obj_path = write_fixture("quad.obj", QUAD_OBJ);

        let scene = ObjImporter
            .import(&obj_path, FileFormat::WavefrontObj)
            .unwrap();

        assert_eq!(scene.node_count(), 2);
        let node = &scene.root.children[0];
        assert_eq!(node.name, "quad");

        let Some(Geometry::Mesh(mesh)) = &node.geometry else {
            panic!("expected mesh payload");
        };
        assert_eq!(mesh.control_points.len(), 4);
        // Quad kept as one 4-corner polygon; triangulation is not the
        // importer's job
        assert_eq!(mesh.polygons.len(), 1);
        assert_eq!(mesh.polygons[0].corners.len(), 4);
        assert_eq!(mesh.uv_sets.len(), 1);
        assert_eq!(mesh.uv_sets[0].name, DEFAULT_UV_SET);
        assert_eq!(mesh.uv_sets[0].coords.len(), 4);

        assert_eq!(node.materials.len(), 1);
        let material = &node.materials[0];
        assert_eq!(material.shading_model, ShadingModel::Phong);
        assert_eq!(material.color(DIFFUSE_COLOR), Some([1.0, 0.0, 0.0]));
        assert_eq!(material.scalar(SHININESS), Some(32.0));
        assert_eq!(
            material.property(DIFFUSE_COLOR).unwrap().textures[0].file,
            "red.png"
        );

        fs::remove_file(obj_path).ok();
        fs::remove_file(mtl_path).ok();
    }

    #[test]
    fn test_missing_normals_are_generated() {
        let obj = "\
o tri
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
f 1 2 3
";
        let path = write_fixture("no_normals.obj", obj);
        let scene = ObjImporter.import(&path, FileFormat::WavefrontObj).unwrap();

        let Some(Geometry::Mesh(mesh)) = &scene.root.children[0].geometry else {
            panic!("expected mesh payload");
        };
        // Counter-clockwise triangle in the XY plane faces +Z
        let normal = mesh.polygons[0].corners[0].normal;
        assert!((normal.z - 1.0).abs() < 1e-9);
        assert!(mesh.uv_sets.is_empty());

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let result = ObjImporter.import(Path::new("/nonexistent/missing.obj"), FileFormat::WavefrontObj);
        assert!(matches!(result, Err(LoadError::Obj(_))));
    }
}
