//! Cube mesh generation.
//!
//! Faces are derived from their outward axis direction: tangent and
//! bitangent are chosen so `tangent x bitangent = normal`, which yields an
//! outward normal and counter-clockwise winding on every face from one code
//! path instead of six hand-written vertex lists.

use glam::Vec3;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CubeVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl CubeVertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3,  // position
        1 => Float32x3,  // normal
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<CubeVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Face order: top, bottom, front, back, right, left.
const FACE_NORMALS: [Vec3; 6] = [
    Vec3::Y,
    Vec3::NEG_Y,
    Vec3::Z,
    Vec3::NEG_Z,
    Vec3::X,
    Vec3::NEG_X,
];

pub struct CubeMesh {
    pub vertices: Vec<CubeVertex>,
    pub indices: Vec<u32>,
}

impl CubeMesh {
    /// Generates a cube centered at the origin spanning `±half_extent` on
    /// each axis, four vertices and two triangles per face.
    pub fn generate(half_extent: f32) -> Self {
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for normal in FACE_NORMALS {
            let reference = if normal.y.abs() > 0.5 { Vec3::X } else { Vec3::Y };
            let tangent = normal.cross(reference).normalize();
            let bitangent = normal.cross(tangent);

            let base = vertices.len() as u32;
            // Counter-clockwise seen from outside the cube.
            let corners = [
                normal - tangent - bitangent,
                normal + tangent - bitangent,
                normal + tangent + bitangent,
                normal - tangent + bitangent,
            ];
            for corner in corners {
                vertices.push(CubeVertex {
                    position: (corner * half_extent).to_array(),
                    normal: normal.to_array(),
                });
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self { vertices, indices }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cube_has_six_quad_faces() {
        let mesh = CubeMesh::generate(1.0);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
    }

    #[test]
    fn normals_are_unit_and_outward() {
        let mesh = CubeMesh::generate(1.0);
        for face in 0..6 {
            let verts = &mesh.vertices[face * 4..face * 4 + 4];
            let normal = Vec3::from_array(verts[0].normal);
            assert_relative_eq!(normal.length(), 1.0, epsilon = 1e-6);

            let centroid = verts
                .iter()
                .map(|v| Vec3::from_array(v.position))
                .sum::<Vec3>()
                / 4.0;
            assert!(
                normal.dot(centroid) > 0.0,
                "face {} normal points inward",
                face
            );
        }
    }

    #[test]
    fn winding_is_counter_clockwise_from_outside() {
        let mesh = CubeMesh::generate(1.0);
        for triangle in mesh.indices.chunks(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]]
                .map(|i| Vec3::from_array(mesh.vertices[i as usize].position));
            let normal = Vec3::from_array(mesh.vertices[triangle[0] as usize].normal);
            let face_direction = (b - a).cross(c - a);
            assert!(
                face_direction.dot(normal) > 0.0,
                "triangle winding disagrees with its face normal"
            );
        }
    }

    #[test]
    fn half_extent_scales_positions() {
        let mesh = CubeMesh::generate(0.5);
        for vertex in &mesh.vertices {
            for component in vertex.position {
                assert_relative_eq!(component.abs(), 0.5, epsilon = 1e-6);
            }
        }
    }
}
