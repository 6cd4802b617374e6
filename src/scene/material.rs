//! Surface materials as imported
//!
//! Materials are stored as a property table keyed by the interchange
//! property names, mirroring how scene formats expose them: a color or
//! scalar value per property, with zero or more textures (direct or
//! layered) hanging off the color properties. Resolution into renderer
//! facing descriptors happens in [`crate::convert::material`].

use std::collections::HashMap;

// Canonical property names shared by importers and the material resolver.
pub const AMBIENT_COLOR: &str = "AmbientColor";
pub const AMBIENT_FACTOR: &str = "AmbientFactor";
pub const DIFFUSE_COLOR: &str = "DiffuseColor";
pub const DIFFUSE_FACTOR: &str = "DiffuseFactor";
pub const SPECULAR_COLOR: &str = "SpecularColor";
pub const SPECULAR_FACTOR: &str = "SpecularFactor";
pub const EMISSIVE_COLOR: &str = "EmissiveColor";
pub const EMISSIVE_FACTOR: &str = "EmissiveFactor";
pub const SHININESS: &str = "Shininess";
pub const TRANSPARENCY_FACTOR: &str = "TransparencyFactor";

/// Shading model declared by the source asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShadingModel {
    Lambert,
    Phong,
    /// Anything the classic Lambert/Phong classification does not cover,
    /// carrying the declared model name for diagnostics.
    Other(String),
}

/// Reference to a texture file, tagged with the UV set it samples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureRef {
    pub uv_set: String,
    pub file: String,
}

/// Value of a material property, when the source provides one
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyValue {
    Color([f64; 3]),
    Scalar(f64),
}

/// One entry in the property table
///
/// A property may exist purely as a texture anchor (`value == None`), for
/// example a diffuse channel driven by a texture with no base color.
#[derive(Debug, Clone, Default)]
pub struct MaterialProperty {
    pub value: Option<PropertyValue>,
    pub textures: Vec<TextureRef>,
    pub layered_textures: Vec<Vec<TextureRef>>,
}

/// A material attached to a scene node
#[derive(Debug, Clone)]
pub struct SurfaceMaterial {
    pub name: String,
    pub shading_model: ShadingModel,
    properties: HashMap<String, MaterialProperty>,
}

impl SurfaceMaterial {
    pub fn new(name: impl Into<String>, shading_model: ShadingModel) -> Self {
        Self {
            name: name.into(),
            shading_model,
            properties: HashMap::new(),
        }
    }

    /// Looks up a property by name
    pub fn property(&self, name: &str) -> Option<&MaterialProperty> {
        self.properties.get(name)
    }

    /// Reads a property's color value, if the property exists and holds one
    pub fn color(&self, name: &str) -> Option<[f64; 3]> {
        match self.properties.get(name)?.value? {
            PropertyValue::Color(rgb) => Some(rgb),
            PropertyValue::Scalar(_) => None,
        }
    }

    /// Reads a property's scalar value, if the property exists and holds one
    pub fn scalar(&self, name: &str) -> Option<f64> {
        match self.properties.get(name)?.value? {
            PropertyValue::Scalar(value) => Some(value),
            PropertyValue::Color(_) => None,
        }
    }

    /// Sets a color-valued property, creating it if needed
    pub fn set_color(&mut self, name: &str, rgb: [f64; 3]) {
        self.properties.entry(name.to_string()).or_default().value =
            Some(PropertyValue::Color(rgb));
    }

    /// Sets a scalar-valued property, creating it if needed
    pub fn set_scalar(&mut self, name: &str, value: f64) {
        self.properties.entry(name.to_string()).or_default().value =
            Some(PropertyValue::Scalar(value));
    }

    /// Attaches a file texture directly to a property
    pub fn attach_texture(&mut self, name: &str, texture: TextureRef) {
        self.properties
            .entry(name.to_string())
            .or_default()
            .textures
            .push(texture);
    }

    /// Attaches a layered texture stack to a property
    pub fn attach_layered_textures(&mut self, name: &str, layers: Vec<TextureRef>) {
        self.properties
            .entry(name.to_string())
            .or_default()
            .layered_textures
            .push(layers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_value_accessors() {
        let mut material = SurfaceMaterial::new("mat", ShadingModel::Lambert);
        material.set_color(DIFFUSE_COLOR, [1.0, 0.5, 0.2]);
        material.set_scalar(DIFFUSE_FACTOR, 0.5);

        assert_eq!(material.color(DIFFUSE_COLOR), Some([1.0, 0.5, 0.2]));
        assert_eq!(material.scalar(DIFFUSE_FACTOR), Some(0.5));
        // Wrong-kind reads come back empty rather than panicking
        assert_eq!(material.scalar(DIFFUSE_COLOR), None);
        assert_eq!(material.color(SPECULAR_COLOR), None);
    }

    #[test]
    fn test_texture_anchor_without_value() {
        let mut material = SurfaceMaterial::new("mat", ShadingModel::Phong);
        material.attach_texture(
            DIFFUSE_COLOR,
            TextureRef {
                uv_set: "default".to_string(),
                file: "albedo.png".to_string(),
            },
        );

        let property = material.property(DIFFUSE_COLOR).unwrap();
        assert!(property.value.is_none());
        assert_eq!(property.textures.len(), 1);
    }
}
