//! Material resolution
//!
//! Turns an imported [`SurfaceMaterial`] property table into the flat
//! [`MaterialDescriptor`] attached to mesh records. Resolution is best
//! effort by design: a missing or malformed property degrades to its
//! default rather than failing the conversion.

use log::debug;

use crate::record::{ElementKind, MaterialDescriptor, MaterialElement, MaterialKind};
use crate::scene::material::{
    AMBIENT_COLOR, AMBIENT_FACTOR, DIFFUSE_COLOR, DIFFUSE_FACTOR, EMISSIVE_COLOR, EMISSIVE_FACTOR,
    SHININESS, SPECULAR_COLOR, SPECULAR_FACTOR, TRANSPARENCY_FACTOR,
};
use crate::scene::{ShadingModel, SurfaceMaterial, TextureRef};

/// Resolves one surface material into a descriptor
pub fn resolve(material: &SurfaceMaterial) -> MaterialDescriptor {
    let kind = match &material.shading_model {
        ShadingModel::Lambert => MaterialKind::Lambert,
        ShadingModel::Phong => MaterialKind::Phong,
        ShadingModel::Other(model) => {
            debug!(
                "material '{}' declares unrecognized shading model '{}'",
                material.name, model
            );
            MaterialKind::Unknown
        }
    };

    MaterialDescriptor {
        kind,
        ambient: resolve_element(material, AMBIENT_COLOR, AMBIENT_FACTOR),
        diffuse: resolve_element(material, DIFFUSE_COLOR, DIFFUSE_FACTOR),
        specular: resolve_element(material, SPECULAR_COLOR, SPECULAR_FACTOR),
        emissive: resolve_element(material, EMISSIVE_COLOR, EMISSIVE_FACTOR),
        specular_power: material.scalar(SHININESS).unwrap_or(0.0) as f32,
        transparency: material.scalar(TRANSPARENCY_FACTOR).unwrap_or(0.0) as f32,
    }
}

/// Resolves one color/factor property pair plus its attached textures
///
/// The color path and the texture path are independent: a channel counts as
/// `Color` only when both the color property and its factor property hold
/// valid values, while textures are collected whenever the color property
/// exists at all. The resolved color is written into the element whatever
/// the final kind, alpha fixed at 1.0.
fn resolve_element(
    material: &SurfaceMaterial,
    color_name: &str,
    factor_name: &str,
) -> MaterialElement {
    let mut element = MaterialElement::default();
    let mut rgb = [0.0f64; 3];

    if let (Some(color), Some(factor)) =
        (material.color(color_name), material.scalar(factor_name))
    {
        rgb = color;
        if factor != 1.0 {
            rgb[0] *= factor;
            rgb[1] *= factor;
            rgb[2] *= factor;
        }
        element.kind = ElementKind::Color;
    }

    if let Some(property) = material.property(color_name) {
        let mut texture_count = 0;

        for texture in &property.textures {
            collect_texture(&mut element, texture);
            texture_count += 1;
        }

        // Layered textures flatten into the same per-UV-set lists, keeping
        // the layer order the source declared.
        for layer in &property.layered_textures {
            for texture in layer {
                collect_texture(&mut element, texture);
                texture_count += 1;
            }
        }

        if texture_count > 0 {
            element.kind = if element.kind == ElementKind::Color {
                ElementKind::Both
            } else {
                ElementKind::Texture
            };
        }
    }

    element.color = [rgb[0] as f32, rgb[1] as f32, rgb[2] as f32, 1.0];
    element
}

fn collect_texture(element: &mut MaterialElement, texture: &TextureRef) {
    element
        .textures
        .entry(texture.uv_set.clone())
        .or_default()
        .push(texture.file.clone());
}
