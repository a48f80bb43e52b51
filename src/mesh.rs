use std::f32::consts::{PI, TAU};

use bytemuck::{Pod, Zeroable};
use glam::{vec2, vec3, Vec2, Vec3, Vec4};

#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vertex {
    pub position: Vec4,
    pub normal: Vec4,
    pub tex_coord: Vec2,
    _pad0: [u8; 8],
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, tex_coord: Vec2) -> Self {
        Self {
            position: position.extend(1.),
            normal: normal.extend(0.),
            tex_coord,
            ..Default::default()
        }
    }
}

/// Indexed triangle list, counter-clockwise front faces.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    #[cfg(test)]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Unit quad on the XZ plane facing +Y.
    pub fn quad() -> Self {
        let vertices = [
            (vec3(-0.5, 0., 0.5), vec2(0., 1.)),
            (vec3(0.5, 0., 0.5), vec2(1., 1.)),
            (vec3(-0.5, 0., -0.5), vec2(0., 0.)),
            (vec3(0.5, 0., -0.5), vec2(1., 0.)),
        ]
        .into_iter()
        .map(|(position, uv)| Vertex::new(position, Vec3::Y, uv))
        .collect();

        Self {
            vertices,
            indices: vec![0, 1, 2, 2, 1, 3],
        }
    }

    /// Unit cube centered on the origin with per-face normals.
    pub fn cube() -> Self {
        let faces = [Vec3::X, -Vec3::X, Vec3::Y, -Vec3::Y, Vec3::Z, -Vec3::Z];

        let mut mesh = Self::default();
        for normal in faces {
            // Two axes spanning the face, oriented so u x v == normal.
            let u = if normal.y.abs() > 0.5 {
                vec3(normal.y, 0., 0.)
            } else {
                vec3(-normal.z, 0., normal.x)
            };
            let v = normal.cross(u);

            let base = mesh.vertices.len() as u32;
            for (s, t) in [(-1f32, -1f32), (1., -1.), (-1., 1.), (1., 1.)] {
                let position = (normal + u * s + v * t) * 0.5;
                let uv = vec2((s + 1.) * 0.5, (1. - t) * 0.5);
                mesh.vertices.push(Vertex::new(position, normal, uv));
            }
            mesh.indices
                .extend([base, base + 1, base + 2, base + 2, base + 1, base + 3]);
        }
        mesh
    }

    /// Unit-radius UV sphere.
    pub fn sphere(segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);

        let mut mesh = Self::default();
        for ring in 0..=rings {
            let v = ring as f32 / rings as f32;
            let polar = v * PI;
            for segment in 0..=segments {
                let u = segment as f32 / segments as f32;
                let azimuth = u * TAU;
                let normal = vec3(
                    polar.sin() * azimuth.cos(),
                    polar.cos(),
                    -polar.sin() * azimuth.sin(),
                );
                mesh.vertices.push(Vertex::new(normal, normal, vec2(u, v)));
            }
        }

        let stride = segments + 1;
        for ring in 0..rings {
            for segment in 0..segments {
                let a = ring * stride + segment;
                let b = a + stride;
                mesh.indices.extend([a, b, a + 1, a + 1, b, b + 1]);
            }
        }
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_outward_winding(mesh: &MeshData) {
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| mesh.vertices[i as usize]);
            let face = (b.position - a.position)
                .truncate()
                .cross((c.position - a.position).truncate());
            if face.length_squared() < 1e-12 {
                // Degenerate triangles at the sphere poles.
                continue;
            }
            let normal = (a.normal + b.normal + c.normal).truncate();
            assert!(face.dot(normal) > 0., "inward triangle {:?}", tri);
        }
    }

    #[test]
    fn quad_faces_up() {
        let quad = MeshData::quad();
        assert_eq!(quad.triangle_count(), 2);
        assert_outward_winding(&quad);
    }

    #[test]
    fn cube_has_six_outward_faces() {
        let cube = MeshData::cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.triangle_count(), 12);
        for vertex in &cube.vertices {
            let p = vertex.position.truncate();
            assert!((p.abs().max_element() - 0.5).abs() < 1e-6);
            assert!((p.dot(vertex.normal.truncate()) - 0.5).abs() < 1e-6);
        }
        assert_outward_winding(&cube);
    }

    #[test]
    fn sphere_vertices_lie_on_unit_sphere() {
        let sphere = MeshData::sphere(12, 8);
        assert_eq!(sphere.vertices.len(), 13 * 9);
        assert_eq!(sphere.triangle_count(), 12 * 8 * 2);
        for vertex in &sphere.vertices {
            assert!((vertex.position.truncate().length() - 1.).abs() < 1e-5);
        }
        assert!(sphere
            .indices
            .iter()
            .all(|&i| (i as usize) < sphere.vertices.len()));
        assert_outward_winding(&sphere);
    }
}
