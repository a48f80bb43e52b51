use bytemuck::{Pod, Zeroable};
use glam::{vec3, Vec3, Vec4};

pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;
pub const MAX_POINT_LIGHTS: usize = 8;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub color: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: vec3(0., -1., 0.),
            color: Vec3::ONE,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub range: f32,
    pub brightness: f32,
    pub color: Vec3,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            range: 20.,
            brightness: 2.,
            color: Vec3::ONE,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct GpuDirectionalLight {
    pub direction: Vec4,
    pub color: Vec4,
}

/// `position.w` is the range, `color.w` the brightness.
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct GpuPointLight {
    pub position: Vec4,
    pub color: Vec4,
}

/// Per-shader globals, matching `Lighting` in the lit WGSL shaders.
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct LightingUniforms {
    pub camera_position: Vec4,
    pub ambient_color: Vec4,
    pub directional_light_count: u32,
    pub point_light_count: u32,
    pub _pad0: [u32; 2],
    pub directional_lights: [GpuDirectionalLight; MAX_DIRECTIONAL_LIGHTS],
    pub point_lights: [GpuPointLight; MAX_POINT_LIGHTS],
}

impl LightingUniforms {
    /// Packs as many lights as fit, in order.
    pub fn new(
        camera_position: Vec3,
        ambient_color: Vec3,
        directional: &[DirectionalLight],
        point: &[PointLight],
    ) -> Self {
        let mut uniforms = Self {
            camera_position: camera_position.extend(1.),
            ambient_color: ambient_color.extend(1.),
            ..Default::default()
        };

        for (slot, light) in uniforms.directional_lights.iter_mut().zip(directional) {
            *slot = GpuDirectionalLight {
                direction: light.direction.normalize_or_zero().extend(0.),
                color: light.color.extend(1.),
            };
        }
        uniforms.directional_light_count = directional.len().min(MAX_DIRECTIONAL_LIGHTS) as _;

        for (slot, light) in uniforms.point_lights.iter_mut().zip(point) {
            *slot = GpuPointLight {
                position: light.position.extend(light.range),
                color: light.color.extend(light.brightness),
            };
        }
        uniforms.point_light_count = point.len().min(MAX_POINT_LIGHTS) as _;

        uniforms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_lights_by_index() {
        let directional = [DirectionalLight {
            direction: vec3(0., 0., -2.),
            color: vec3(1., 0.5, 0.),
        }];
        let point = [
            PointLight::default(),
            PointLight {
                position: vec3(1., 2., 3.),
                range: 5.,
                brightness: 4.,
                color: Vec3::X,
            },
        ];

        let uniforms = LightingUniforms::new(Vec3::ONE, Vec3::splat(0.25), &directional, &point);

        assert_eq!(uniforms.directional_light_count, 1);
        assert_eq!(uniforms.point_light_count, 2);
        assert_eq!(
            uniforms.directional_lights[0].direction,
            vec3(0., 0., -1.).extend(0.)
        );
        assert_eq!(uniforms.point_lights[1].position, vec3(1., 2., 3.).extend(5.));
        assert_eq!(uniforms.point_lights[1].color, Vec3::X.extend(4.));
        assert_eq!(uniforms.ambient_color, Vec3::splat(0.25).extend(1.));
    }

    #[test]
    fn excess_lights_are_left_out() {
        let point = vec![PointLight::default(); MAX_POINT_LIGHTS + 3];
        let uniforms = LightingUniforms::new(Vec3::ZERO, Vec3::ZERO, &[], &point);
        assert_eq!(uniforms.point_light_count as usize, MAX_POINT_LIGHTS);
        assert_eq!(uniforms.directional_light_count, 0);
    }

    #[test]
    fn layout_is_uniform_friendly() {
        assert_eq!(std::mem::size_of::<LightingUniforms>() % 16, 0);
    }
}
