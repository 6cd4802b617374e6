//! Transform baking
//!
//! World transforms are accumulated as `f64` matrices during traversal and
//! baked to 16 `f32`s per record at emission time. The wire contract for
//! the flattened array is row-major over the row-vector-convention matrix:
//! element `(row, column)` at `row * 4 + column`, translation at 12..15.
//! For the column-vector matrices used scene-side this is exactly cgmath's
//! column-major storage order, so the bake is a flatten plus an `f32` cast.

use cgmath::Matrix4;

/// Flattens a world transform into the 16-float wire layout
pub fn bake(matrix: &Matrix4<f64>) -> [f32; 16] {
    let flat: &[f64; 16] = matrix.as_ref();
    let mut out = [0.0f32; 16];
    for (dst, src) in out.iter_mut().zip(flat.iter()) {
        *dst = *src as f32;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::IDENTITY_TRANSFORM;
    use cgmath::{Deg, SquareMatrix, Vector3};

    #[test]
    fn test_bake_identity() {
        assert_eq!(bake(&Matrix4::identity()), IDENTITY_TRANSFORM);
    }

    #[test]
    fn test_translation_lands_in_last_row() {
        let baked = bake(&Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0)));
        assert_eq!(baked[12], 1.0);
        assert_eq!(baked[13], 2.0);
        assert_eq!(baked[14], 3.0);
        assert_eq!(baked[15], 1.0);
        // Rotation/scale block stays identity
        assert_eq!(baked[0], 1.0);
        assert_eq!(baked[5], 1.0);
        assert_eq!(baked[10], 1.0);
    }

    #[test]
    fn test_rotation_layout() {
        // 90 degrees about Y: for row vectors, row 0 maps +X onto -Z
        let baked = bake(&Matrix4::from_angle_y(Deg(90.0)));
        assert!(baked[0].abs() < 1e-6);
        assert!((baked[2] - -1.0).abs() < 1e-6);
        assert!((baked[8] - 1.0).abs() < 1e-6);
        assert!(baked[10].abs() < 1e-6);
    }
}
