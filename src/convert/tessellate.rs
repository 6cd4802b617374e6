//! Surface tessellation
//!
//! Converts NURBS and patch payloads into triangle-only polygon meshes by
//! sampling the surface on a regular parameter grid. Sample positions
//! become the mesh control points, per-corner normals come from the grid
//! tangents, and the normalized parameter values are emitted as a
//! `"default"` UV set so tessellated surfaces stay texturable.
//!
//! Malformed surfaces (inconsistent knot vectors, undersized control
//! grids) return `None`; the normalizer reports them and drops the payload
//! instead of failing the conversion.

use cgmath::{InnerSpace, Vector2, Vector3};

use crate::scene::geometry::{
    Corner, NurbsSurface, PatchBasis, PatchSurface, Polygon, PolygonMesh, UvSet, DEFAULT_UV_SET,
};

/// Grid samples per knot span (per Bezier span for patches)
const SAMPLES_PER_SPAN: usize = 4;

/// Tessellates a NURBS surface into a triangle mesh
pub fn tessellate_nurbs(surface: &NurbsSurface) -> Option<PolygonMesh> {
    if !validate_nurbs(surface) {
        return None;
    }

    let u_degree = surface.u_degree();
    let v_degree = surface.v_degree();
    let u_samples = (surface.u_count - u_degree) * SAMPLES_PER_SPAN + 1;
    let v_samples = (surface.v_count - v_degree) * SAMPLES_PER_SPAN + 1;

    let u_start = surface.u_knots[u_degree];
    let u_end = surface.u_knots[surface.u_count];
    let v_start = surface.v_knots[v_degree];
    let v_end = surface.v_knots[surface.v_count];

    let mut points = Vec::with_capacity(u_samples * v_samples);
    for j in 0..v_samples {
        let v = v_start + (v_end - v_start) * j as f64 / (v_samples - 1) as f64;
        for i in 0..u_samples {
            let u = u_start + (u_end - u_start) * i as f64 / (u_samples - 1) as f64;
            points.push(surface_point(surface, u, v));
        }
    }

    Some(grid_to_mesh(points, u_samples, v_samples))
}

/// Tessellates a patch surface into a triangle mesh
pub fn tessellate_patch(patch: &PatchSurface) -> Option<PolygonMesh> {
    if patch.u_count < 2 || patch.v_count < 2 {
        return None;
    }
    if patch.control_points.len() != patch.u_count * patch.v_count {
        return None;
    }

    let u_samples = basis_samples(patch.u_basis, patch.u_count);
    let v_samples = basis_samples(patch.v_basis, patch.v_count);

    let mut points = Vec::with_capacity(u_samples * v_samples);
    for j in 0..v_samples {
        let v = j as f64 / (v_samples - 1) as f64;
        let v_weights = basis_weights(patch.v_basis, patch.v_count, v);
        for i in 0..u_samples {
            let u = i as f64 / (u_samples - 1) as f64;
            let u_weights = basis_weights(patch.u_basis, patch.u_count, u);

            let mut point = Vector3::new(0.0, 0.0, 0.0);
            for (b, wv) in v_weights.iter().enumerate() {
                if *wv == 0.0 {
                    continue;
                }
                for (a, wu) in u_weights.iter().enumerate() {
                    point += patch.control_points[b * patch.u_count + a] * (wu * wv);
                }
            }
            points.push(point);
        }
    }

    Some(grid_to_mesh(points, u_samples, v_samples))
}

fn validate_nurbs(surface: &NurbsSurface) -> bool {
    let NurbsSurface {
        u_count,
        v_count,
        u_order,
        v_order,
        ..
    } = *surface;

    if u_order < 2 || v_order < 2 || u_count < u_order || v_count < v_order {
        return false;
    }
    if surface.control_points.len() != u_count * v_count {
        return false;
    }
    if !surface.weights.is_empty() && surface.weights.len() != u_count * v_count {
        return false;
    }
    if surface.u_knots.len() != u_count + u_order || surface.v_knots.len() != v_count + v_order {
        return false;
    }
    if surface.u_knots.windows(2).any(|pair| pair[1] < pair[0])
        || surface.v_knots.windows(2).any(|pair| pair[1] < pair[0])
    {
        return false;
    }
    // Evaluation domain must be nonempty
    surface.u_knots[u_order - 1] < surface.u_knots[u_count]
        && surface.v_knots[v_order - 1] < surface.v_knots[v_count]
}

/// Knot span containing `t` (The NURBS Book, A2.1)
fn find_span(count: usize, degree: usize, t: f64, knots: &[f64]) -> usize {
    let n = count - 1;
    if t >= knots[n + 1] {
        return n;
    }
    if t <= knots[degree] {
        return degree;
    }

    let mut low = degree;
    let mut high = n + 1;
    let mut mid = (low + high) / 2;
    while t < knots[mid] || t >= knots[mid + 1] {
        if t < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

/// Nonzero basis functions at `t` (The NURBS Book, A2.2)
fn basis_functions(span: usize, t: f64, degree: usize, knots: &[f64]) -> Vec<f64> {
    let mut functions = vec![0.0; degree + 1];
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];
    functions[0] = 1.0;

    for j in 1..=degree {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = 0.0;
        for r in 0..j {
            let denominator = right[r + 1] + left[j - r];
            let temp = if denominator != 0.0 {
                functions[r] / denominator
            } else {
                0.0
            };
            functions[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        functions[j] = saved;
    }
    functions
}

/// Rational surface point at `(u, v)`
fn surface_point(surface: &NurbsSurface, u: f64, v: f64) -> Vector3<f64> {
    let u_degree = surface.u_degree();
    let v_degree = surface.v_degree();
    let u_span = find_span(surface.u_count, u_degree, u, &surface.u_knots);
    let v_span = find_span(surface.v_count, v_degree, v, &surface.v_knots);
    let u_basis = basis_functions(u_span, u, u_degree, &surface.u_knots);
    let v_basis = basis_functions(v_span, v, v_degree, &surface.v_knots);

    let mut numerator = Vector3::new(0.0, 0.0, 0.0);
    let mut denominator = 0.0;
    for (b, bv) in v_basis.iter().enumerate() {
        let row = v_span - v_degree + b;
        for (a, bu) in u_basis.iter().enumerate() {
            let column = u_span - u_degree + a;
            let index = row * surface.u_count + column;
            let weight = surface.weights.get(index).copied().unwrap_or(1.0) * bu * bv;
            numerator += surface.control_points[index] * weight;
            denominator += weight;
        }
    }

    if denominator.abs() > f64::EPSILON {
        numerator / denominator
    } else {
        numerator
    }
}

fn basis_samples(basis: PatchBasis, count: usize) -> usize {
    match basis {
        // A linear grid is already exact at its control points
        PatchBasis::Linear => count,
        PatchBasis::Bezier => (count - 1) * SAMPLES_PER_SPAN + 1,
    }
}

/// Per-control-point weights of one patch direction at parameter `t`
fn basis_weights(basis: PatchBasis, count: usize, t: f64) -> Vec<f64> {
    let mut weights = vec![0.0; count];
    match basis {
        PatchBasis::Linear => {
            let position = t * (count - 1) as f64;
            let cell = (position.floor() as usize).min(count - 2);
            let fraction = position - cell as f64;
            weights[cell] = 1.0 - fraction;
            weights[cell + 1] += fraction;
        }
        PatchBasis::Bezier => {
            // Bernstein basis of degree count - 1
            let degree = count - 1;
            let mut coefficient = 1.0f64;
            for (i, weight) in weights.iter_mut().enumerate() {
                *weight = coefficient
                    * t.powi(i as i32)
                    * (1.0 - t).powi((degree - i) as i32);
                coefficient = coefficient * (degree - i) as f64 / (i + 1) as f64;
            }
        }
    }
    weights
}

/// Builds a triangle-only mesh from a sampled grid
fn grid_to_mesh(points: Vec<Vector3<f64>>, u_samples: usize, v_samples: usize) -> PolygonMesh {
    let normals = grid_normals(&points, u_samples, v_samples);

    let mut uv_coords = Vec::new();
    let mut polygons = Vec::new();
    let mut emit = |indices: [usize; 3]| {
        let corners = indices
            .iter()
            .map(|&index| Corner {
                control_point: index,
                normal: normals[index],
            })
            .collect();
        polygons.push(Polygon { corners });
        for &index in &indices {
            let i = index % u_samples;
            let j = index / u_samples;
            uv_coords.push(Some(Vector2::new(
                i as f64 / (u_samples - 1) as f64,
                j as f64 / (v_samples - 1) as f64,
            )));
        }
    };

    for j in 0..v_samples - 1 {
        for i in 0..u_samples - 1 {
            let first = j * u_samples + i;
            let second = (j + 1) * u_samples + i;
            emit([first, second, first + 1]);
            emit([second, second + 1, first + 1]);
        }
    }

    PolygonMesh {
        control_points: points,
        polygons,
        uv_sets: vec![UvSet {
            name: DEFAULT_UV_SET.to_string(),
            coords: uv_coords,
        }],
    }
}

/// Central-difference normals over the sample grid, clamped at the borders
fn grid_normals(points: &[Vector3<f64>], u_samples: usize, v_samples: usize) -> Vec<Vector3<f64>> {
    let at = |i: usize, j: usize| points[j * u_samples + i];
    let mut normals = Vec::with_capacity(points.len());

    for j in 0..v_samples {
        for i in 0..u_samples {
            let du = at((i + 1).min(u_samples - 1), j) - at(i.saturating_sub(1), j);
            let dv = at(i, (j + 1).min(v_samples - 1)) - at(i, j.saturating_sub(1));
            let normal = du.cross(dv);
            normals.push(if normal.magnitude2() > 1e-12 {
                normal.normalize()
            } else {
                Vector3::unit_y()
            });
        }
    }
    normals
}
