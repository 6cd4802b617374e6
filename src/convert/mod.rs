//! Conversion pipeline
//!
//! Ties the stages together: importer registry, scene normalization, node
//! flattening. A [`SceneConverter`] is an explicit context value owning
//! the registry and the target convention; nothing about a conversion
//! lives in process-wide state. The whole pipeline is synchronous and
//! atomic: `load` either returns a complete record collection or a single
//! fatal [`LoadError`], never a partial scene.

pub mod flatten;
pub mod material;
pub mod normalize;
pub mod tessellate;
pub mod transform;

use std::path::Path;

use log::info;

use crate::asset::{ImporterRegistry, LoadError, SceneImporter};
use crate::record::RecordSet;
use crate::scene::{AxisSystem, Scene};

/// Context for converting scene assets into flat record collections
///
/// ```no_run
/// use bannock::{AxisSystem, SceneConverter};
///
/// let converter = SceneConverter::new(AxisSystem::LeftHandedYUp);
/// let records = converter.load("model.obj")?;
/// for record in &records {
///     println!("{}: {} triangle(s)", record.name, record.triangle_count());
/// }
/// # Ok::<(), bannock::LoadError>(())
/// ```
pub struct SceneConverter {
    registry: ImporterRegistry,
    target_axis: AxisSystem,
}

impl SceneConverter {
    /// Creates a converter with the built-in importer backends
    pub fn new(target_axis: AxisSystem) -> Self {
        Self {
            registry: ImporterRegistry::with_builtin(),
            target_axis,
        }
    }

    /// Creates a converter around a caller-assembled registry
    pub fn with_registry(target_axis: AxisSystem, registry: ImporterRegistry) -> Self {
        Self {
            registry,
            target_axis,
        }
    }

    /// Registers an additional importer backend
    pub fn register_importer(&mut self, importer: Box<dyn SceneImporter>) {
        self.registry.register(importer);
    }

    pub fn target_axis(&self) -> AxisSystem {
        self.target_axis
    }

    /// Loads an asset and converts it into mesh records
    ///
    /// Detection falls back to the generic-binary format id when no
    /// backend recognizes the file; if no backend handles that either,
    /// the load fails without touching the conversion stages.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<RecordSet, LoadError> {
        let path = path.as_ref();
        let format = self.registry.detect_or_fallback(path);
        let scene = self.registry.import(path, format)?;
        info!(
            "imported '{}' as {:?}: {} node(s)",
            scene.name,
            format,
            scene.node_count()
        );
        Ok(self.convert(scene))
    }

    /// Converts an already-imported scene
    ///
    /// Takes the scene by value: all output data is deep-copied into the
    /// records and the scene is dropped before this returns.
    pub fn convert(&self, mut scene: Scene) -> RecordSet {
        normalize::normalize(&mut scene, self.target_axis);
        let records = flatten::flatten(&scene);
        info!(
            "flattened '{}' into {} record(s)",
            scene.name,
            records.node_count()
        );
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::FileFormat;
    use crate::record::{ElementKind, MaterialKind, IDENTITY_TRANSFORM, ROOT_PARENT_NAME};
    use crate::scene::geometry::DEFAULT_UV_SET;
    use crate::scene::material::{DIFFUSE_COLOR, DIFFUSE_FACTOR};
    use crate::scene::{
        Corner, Geometry, Node, Polygon, PolygonMesh, ShadingModel, SurfaceMaterial, UvSet,
    };
    use cgmath::{Vector2, Vector3};
    use std::fs;

    /// Hands out a prebuilt scene for any generic-binary path
    struct MemoryImporter(Scene);

    impl SceneImporter for MemoryImporter {
        fn detect(&self, _path: &Path) -> Option<FileFormat> {
            None
        }
        fn handles(&self, format: FileFormat) -> bool {
            format == FileFormat::GenericBinary
        }
        fn import(&self, _path: &Path, _format: FileFormat) -> Result<Scene, LoadError> {
            Ok(self.0.clone())
        }
    }

    fn quad_scene() -> Scene {
        let mesh = PolygonMesh {
            control_points: vec![
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(1.0, 1.0, 0.0),
                Vector3::new(0.0, 1.0, 0.0),
            ],
            polygons: vec![Polygon {
                corners: (0..4)
                    .map(|i| Corner {
                        control_point: i,
                        normal: Vector3::new(0.0, 0.0, 1.0),
                    })
                    .collect(),
            }],
            uv_sets: vec![UvSet {
                name: DEFAULT_UV_SET.to_string(),
                coords: vec![
                    Some(Vector2::new(0.0, 0.0)),
                    Some(Vector2::new(1.0, 0.0)),
                    Some(Vector2::new(1.0, 1.0)),
                    Some(Vector2::new(0.0, 1.0)),
                ],
            }],
        };

        let mut material = SurfaceMaterial::new("clay", ShadingModel::Lambert);
        material.set_color(DIFFUSE_COLOR, [0.8, 0.1, 0.1]);
        material.set_scalar(DIFFUSE_FACTOR, 1.0);

        let mut scene = Scene::new("memory");
        scene.root.children.push(
            Node::new("quad")
                .with_geometry(Geometry::Mesh(mesh))
                .with_material(material),
        );
        scene
    }

    #[test]
    fn test_end_to_end_quad_scene() {
        let mut converter = SceneConverter::new(AxisSystem::RightHandedYUp);
        converter.register_importer(Box::new(MemoryImporter(quad_scene())));

        // Unknown extension: detection falls back to generic binary, which
        // the registered importer claims
        let records = converter.load("scene.bin").unwrap();

        assert_eq!(records.node_count(), 2);

        let root = records.record(0);
        assert_eq!(root.parent_name, ROOT_PARENT_NAME);
        assert_eq!(root.transform, IDENTITY_TRANSFORM);
        assert!(!root.has_geometry());

        let quad = records.record(1);
        assert_eq!(quad.parent_name, root.name);
        // Quad fanned into 2 triangles, 3 corners each
        assert_eq!(quad.positions.len(), 6);
        assert_eq!(quad.normals.len(), 6);
        assert_eq!(quad.indices.len(), 6);
        for (i, &index) in quad.indices.iter().enumerate() {
            assert_eq!(index, i as u32);
        }
        assert_eq!(quad.uv_set_index(DEFAULT_UV_SET), Some(0));
        assert_eq!(quad.uv_coords(DEFAULT_UV_SET).unwrap().len(), 6);
        assert_eq!(quad.elements.uv_sets, 1);

        assert_eq!(quad.materials.len(), 1);
        let material = &quad.materials[0];
        assert_eq!(material.kind, MaterialKind::Lambert);
        assert_eq!(material.diffuse.kind, ElementKind::Color);
        assert_eq!(material.diffuse.color, [0.8, 0.1, 0.1, 1.0]);
    }

    #[test]
    fn test_unhandled_format_fails_atomically() {
        let converter = SceneConverter::new(AxisSystem::LeftHandedYUp);
        let result = converter.load("scene.fbx");
        assert!(matches!(
            result,
            Err(LoadError::UnsupportedFormat(FileFormat::GenericBinary))
        ));
    }

    #[test]
    fn test_load_obj_from_disk() {
        let dir = std::env::temp_dir();
        let obj_path = dir.join(format!("bannock_{}_e2e.obj", std::process::id()));
        let mtl_path = dir.join("bannock_e2e.mtl");
        fs::write(
            &mtl_path,
            "newmtl clay\nKd 0.8 0.1 0.1\nillum 1\n",
        )
        .unwrap();
        fs::write(
            &obj_path,
            "\
mtllib bannock_e2e.mtl
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
usemtl clay
f 1/1/1 2/2/1 3/3/1 4/4/1
",
        )
        .unwrap();

        let records = SceneConverter::new(AxisSystem::RightHandedYUp)
            .load(&obj_path)
            .unwrap();

        assert_eq!(records.node_count(), 2);
        let quad = records.record(1);
        assert_eq!(quad.name, "quad");
        assert_eq!(quad.positions.len(), 6);
        assert_eq!(quad.uv_set_index(DEFAULT_UV_SET), Some(0));
        assert_eq!(quad.materials[0].kind, MaterialKind::Lambert);
        assert_eq!(quad.materials[0].diffuse.kind, ElementKind::Color);

        fs::remove_file(obj_path).ok();
        fs::remove_file(mtl_path).ok();
    }

    #[test]
    fn test_axis_target_applies_through_load() {
        let mut converter = SceneConverter::new(AxisSystem::LeftHandedYUp);
        let mut scene = quad_scene();
        scene.root.children[0].transform.w.z = 2.0;
        converter.register_importer(Box::new(MemoryImporter(scene)));

        let records = converter.load("scene.bin").unwrap();
        // Right-handed source converted to the left-handed target flips Z
        assert_eq!(records.record(1).transform[14], -2.0);
    }
}
