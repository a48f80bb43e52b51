use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

use super::{MeshId, SceneTarget, ShaderId};

#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct InstanceUniforms {
    pub projection_view_model: Mat4,
    pub model: Mat4,
    pub tint: Vec4,
}

/// A mesh drawn with a shader at a transform. The mesh and shader belong to
/// the renderer; the instance only names them.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Instance {
    transform: Mat4,
    mesh: MeshId,
    shader: ShaderId,
    pub tint: Vec4,
}

impl Instance {
    pub fn new(transform: Mat4, mesh: MeshId, shader: ShaderId) -> Self {
        Self {
            transform,
            mesh,
            shader,
            tint: Vec4::ONE,
        }
    }

    pub fn with_tint(mut self, tint: Vec4) -> Self {
        self.tint = tint;
        self
    }

    pub fn from_euler(
        position: Vec3,
        euler_degrees: Vec3,
        scale: Vec3,
        mesh: MeshId,
        shader: ShaderId,
    ) -> Self {
        Self::new(create_transform(position, euler_degrees, scale), mesh, shader)
    }

    pub fn transform_mut(&mut self) -> &mut Mat4 {
        &mut self.transform
    }

    #[cfg(test)]
    pub fn mesh(&self) -> MeshId {
        self.mesh
    }

    pub fn shader(&self) -> ShaderId {
        self.shader
    }

    pub fn draw(&self, projection_view: Mat4, target: &mut impl SceneTarget) {
        // Lighting and camera globals were set by the scene.
        target.bind_shader(self.shader);
        target.draw_mesh(
            self.shader,
            self.mesh,
            &InstanceUniforms {
                projection_view_model: projection_view * self.transform,
                model: self.transform,
                tint: self.tint,
            },
        );
    }
}

/// Translation, then Z, Y, X rotations in degrees, then scale.
pub fn create_transform(position: Vec3, euler_degrees: Vec3, scale: Vec3) -> Mat4 {
    Mat4::from_translation(position)
        * Mat4::from_rotation_z(euler_degrees.z.to_radians())
        * Mat4::from_rotation_y(euler_degrees.y.to_radians())
        * Mat4::from_rotation_x(euler_degrees.x.to_radians())
        * Mat4::from_scale(scale)
}
