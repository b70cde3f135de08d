//! Vertex normal finalization: renormalize supplied normals or synthesize
//! smooth normals from face geometry

use glam::Vec3;

use super::Vertex;

/// Finalize vertex normals after all triangles are accumulated.
///
/// If the source supplied any nonzero normal, every nonzero normal is
/// renormalized and zero normals are left alone (the source is trusted as
/// given, gaps are not filled). Otherwise smooth normals are synthesized
/// from face geometry.
pub(crate) fn finalize_normals(vertices: &mut [Vertex], indices: &[u32]) {
    let has_normals = vertices
        .iter()
        .any(|v| Vec3::from_array(v.normal).length_squared() > 0.0);

    if has_normals {
        for vertex in vertices.iter_mut() {
            if let Some(unit) = Vec3::from_array(vertex.normal).try_normalize() {
                vertex.normal = unit.to_array();
            }
        }
        return;
    }

    synthesize_normals(vertices, indices);
}

/// Unit normal of the triangle `(a, b, c)`, or `None` when degenerate
fn triangle_normal(a: Vec3, b: Vec3, c: Vec3) -> Option<Vec3> {
    (b - a).cross(c - a).try_normalize()
}

/// Accumulate per-face geometric normals into the corner vertices and
/// renormalize. Vertices that receive no contribution default to +Y.
fn synthesize_normals(vertices: &mut [Vertex], indices: &[u32]) {
    for vertex in vertices.iter_mut() {
        vertex.normal = [0.0; 3];
    }

    for triangle in indices.chunks_exact(3) {
        let corners = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];
        let a = Vec3::from_array(vertices[corners[0]].position);
        let b = Vec3::from_array(vertices[corners[1]].position);
        let c = Vec3::from_array(vertices[corners[2]].position);

        // Degenerate triangles stay in the index buffer but contribute no
        // normal.
        let Some(face_normal) = triangle_normal(a, b, c) else {
            continue;
        };

        for corner in corners {
            let sum = Vec3::from_array(vertices[corner].normal) + face_normal;
            vertices[corner].normal = sum.to_array();
        }
    }

    for vertex in vertices.iter_mut() {
        match Vec3::from_array(vertex.normal).try_normalize() {
            Some(unit) => vertex.normal = unit.to_array(),
            None => vertex.normal = [0.0, 1.0, 0.0],
        }
    }
}
