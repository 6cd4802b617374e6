//! Asset import seam
//!
//! The conversion pipeline never parses files itself; it asks a registry
//! of [`SceneImporter`] backends to detect and import them. Two backends
//! ship with the crate (Wavefront OBJ and glTF 2.0) and callers can
//! register their own for proprietary formats. When no backend recognizes
//! a file the registry falls back to the generic-binary format id, so an
//! importer registered for that format gets the final say before the load
//! fails.

pub mod gltf;
pub mod obj;

use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use crate::scene::Scene;

pub use self::gltf::GltfImporter;
pub use self::obj::ObjImporter;

/// Identifier of a recognized on-disk format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    WavefrontObj,
    Gltf,
    /// Fallback id assigned when detection fails; stands in for opaque
    /// binary scene containers the built-in backends cannot parse
    GenericBinary,
}

/// Errors fatal to a load call
///
/// Anything that goes wrong before a complete scene exists is fatal and
/// atomic: no partial scene reaches the conversion stages. Per-property
/// and per-surface problems inside an otherwise importable asset are not
/// errors; they degrade with a logged warning instead.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read asset '{}'", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no importer registered for {0:?}")]
    UnsupportedFormat(FileFormat),

    #[error("failed to parse OBJ asset")]
    Obj(#[from] tobj::LoadError),

    #[error("failed to parse glTF asset")]
    Gltf(#[from] ::gltf::Error),

    #[error("importer error: {0}")]
    Import(String),
}

/// A backend able to detect and import one or more file formats
pub trait SceneImporter {
    /// Format id for `path`, if this backend recognizes it
    fn detect(&self, path: &Path) -> Option<FileFormat>;

    /// True when this backend can import `format`
    fn handles(&self, format: FileFormat) -> bool;

    /// Parses `path` into a raw (not yet normalized) scene
    fn import(&self, path: &Path, format: FileFormat) -> Result<Scene, LoadError>;
}

/// Ordered collection of importer backends
pub struct ImporterRegistry {
    importers: Vec<Box<dyn SceneImporter>>,
}

impl ImporterRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self {
            importers: Vec::new(),
        }
    }

    /// Creates a registry with the built-in OBJ and glTF backends
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ObjImporter));
        registry.register(Box::new(GltfImporter));
        registry
    }

    pub fn register(&mut self, importer: Box<dyn SceneImporter>) {
        self.importers.push(importer);
    }

    /// Asks each backend in registration order to identify `path`
    pub fn detect(&self, path: &Path) -> Option<FileFormat> {
        self.importers
            .iter()
            .find_map(|importer| importer.detect(path))
    }

    /// Detection with the generic-binary fallback applied
    pub fn detect_or_fallback(&self, path: &Path) -> FileFormat {
        match self.detect(path) {
            Some(format) => format,
            None => {
                debug!(
                    "could not detect format of '{}', assuming generic binary",
                    path.display()
                );
                FileFormat::GenericBinary
            }
        }
    }

    /// Imports `path` with the first backend claiming `format`
    pub fn import(&self, path: &Path, format: FileFormat) -> Result<Scene, LoadError> {
        let importer = self
            .importers
            .iter()
            .find(|importer| importer.handles(format))
            .ok_or(LoadError::UnsupportedFormat(format))?;
        importer.import(path, format)
    }
}

/// Case-insensitive extension check shared by the built-in backends
pub(crate) fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_detection() {
        let registry = ImporterRegistry::with_builtin();
        assert_eq!(
            registry.detect(Path::new("model.obj")),
            Some(FileFormat::WavefrontObj)
        );
        assert_eq!(
            registry.detect(Path::new("scene.GLB")),
            Some(FileFormat::Gltf)
        );
        assert_eq!(registry.detect(Path::new("scene.fbx")), None);
        assert_eq!(
            registry.detect_or_fallback(Path::new("scene.fbx")),
            FileFormat::GenericBinary
        );
    }

    #[test]
    fn test_unhandled_format_fails_import() {
        let registry = ImporterRegistry::with_builtin();
        let result = registry.import(Path::new("scene.fbx"), FileFormat::GenericBinary);
        assert!(matches!(
            result,
            Err(LoadError::UnsupportedFormat(FileFormat::GenericBinary))
        ));
    }

    #[test]
    fn test_custom_importer_takes_fallback_format() {
        struct BinaryImporter;
        impl SceneImporter for BinaryImporter {
            fn detect(&self, _path: &Path) -> Option<FileFormat> {
                None
            }
            fn handles(&self, format: FileFormat) -> bool {
                format == FileFormat::GenericBinary
            }
            fn import(&self, _path: &Path, _format: FileFormat) -> Result<Scene, LoadError> {
                Ok(Scene::new("binary"))
            }
        }

        let mut registry = ImporterRegistry::with_builtin();
        registry.register(Box::new(BinaryImporter));

        let format = registry.detect_or_fallback(Path::new("opaque.bin"));
        let scene = registry.import(Path::new("opaque.bin"), format).unwrap();
        assert_eq!(scene.name, "binary");
    }
}
