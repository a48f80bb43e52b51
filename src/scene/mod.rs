mod instance;
mod light;

use glam::{Mat4, Vec2, Vec3};
use log::warn;
use thiserror::Error;

use crate::camera::Camera;

pub use instance::{Instance, InstanceUniforms};
pub use light::{
    DirectionalLight, LightingUniforms, PointLight, MAX_DIRECTIONAL_LIGHTS, MAX_POINT_LIGHTS,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ShaderId(pub usize);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct MeshId(pub usize);

#[derive(Debug, Error, PartialEq)]
pub enum SceneError {
    #[error("a scene needs at least one camera")]
    NoCameras,
    #[error("camera index {index} is out of range for {len} cameras")]
    CameraIndexOutOfRange { index: usize, len: usize },
    #[error("unknown mesh `{0}`")]
    UnknownMesh(String),
    #[error("unknown shader `{0}`")]
    UnknownShader(String),
}

/// What a scene needs from whoever executes its draws.
pub trait SceneTarget {
    fn bind_shader(&mut self, shader: ShaderId);
    fn set_globals(&mut self, shader: ShaderId, lighting: &LightingUniforms);
    fn draw_mesh(&mut self, shader: ShaderId, mesh: MeshId, uniforms: &InstanceUniforms);
}

#[derive(Debug)]
pub struct Scene {
    cameras: Vec<Camera>,
    camera_index: usize,
    window_size: Vec2,

    ambient_light: Vec3,
    directional_lights: Vec<DirectionalLight>,
    point_lights: Vec<PointLight>,

    instances: Vec<Instance>,
    // Each unique shader used by the instances, in first-use order.
    shaders: Vec<ShaderId>,
}

impl Scene {
    pub fn new(
        cameras: Vec<Camera>,
        window_size: Vec2,
        ambient_light: Vec3,
    ) -> Result<Self, SceneError> {
        if cameras.is_empty() {
            return Err(SceneError::NoCameras);
        }

        Ok(Self {
            cameras,
            camera_index: 0,
            window_size,
            ambient_light,
            directional_lights: Vec::new(),
            point_lights: Vec::new(),
            instances: Vec::new(),
            shaders: Vec::new(),
        })
    }

    /// Adds `instance` and registers its shader. Returns the instance index.
    pub fn add_instance(&mut self, instance: Instance) -> usize {
        if !self.shaders.contains(&instance.shader()) {
            self.shaders.push(instance.shader());
        }
        self.instances.push(instance);
        self.instances.len() - 1
    }

    pub fn add_directional_light(&mut self, light: DirectionalLight) {
        if self.directional_lights.len() >= MAX_DIRECTIONAL_LIGHTS {
            warn!(
                "More than {} directional lights; {:?} will not be lit",
                MAX_DIRECTIONAL_LIGHTS, light
            );
        }
        self.directional_lights.push(light);
    }

    pub fn add_point_light(&mut self, light: PointLight) {
        if self.point_lights.len() >= MAX_POINT_LIGHTS {
            warn!(
                "More than {} point lights; {:?} will not be lit",
                MAX_POINT_LIGHTS, light
            );
        }
        self.point_lights.push(light);
    }

    pub fn projection_view(&self) -> Mat4 {
        let camera = self.current_camera();
        camera.projection_matrix(self.window_size.x, self.window_size.y) * camera.view_matrix()
    }

    pub fn lighting(&self) -> LightingUniforms {
        LightingUniforms::new(
            self.current_camera().position,
            self.ambient_light,
            &self.directional_lights,
            &self.point_lights,
        )
    }

    /// Sets globals once per unique shader, then draws every instance.
    pub fn draw(&self, target: &mut impl SceneTarget) {
        let lighting = self.lighting();
        for &shader in &self.shaders {
            target.bind_shader(shader);
            target.set_globals(shader, &lighting);
        }

        let projection_view = self.projection_view();
        for instance in &self.instances {
            instance.draw(projection_view, target);
        }
    }

    #[cfg(test)]
    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    pub fn current_camera(&self) -> &Camera {
        &self.cameras[self.camera_index]
    }

    pub fn current_camera_mut(&mut self) -> &mut Camera {
        &mut self.cameras[self.camera_index]
    }

    pub fn camera_index(&self) -> usize {
        self.camera_index
    }

    pub fn set_camera_index(&mut self, index: usize) -> Result<(), SceneError> {
        if index >= self.cameras.len() {
            return Err(SceneError::CameraIndexOutOfRange {
                index,
                len: self.cameras.len(),
            });
        }
        self.camera_index = index;
        Ok(())
    }

    pub fn set_window_size(&mut self, window_size: Vec2) {
        self.window_size = window_size;
    }

    #[cfg(test)]
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// Transforms are editable in place. Mesh and shader are fixed, which
    /// keeps the shader list in sync.
    pub fn instances_mut(&mut self) -> &mut [Instance] {
        &mut self.instances
    }

    #[cfg(test)]
    pub fn shaders(&self) -> &[ShaderId] {
        &self.shaders
    }
}

#[cfg(test)]
mod tests {
    use glam::{vec2, vec3};

    use super::*;

    #[derive(Debug, PartialEq)]
    enum Call {
        Bind(ShaderId),
        Globals(ShaderId, LightingUniforms),
        Draw(ShaderId, MeshId, InstanceUniforms),
    }

    #[derive(Default)]
    struct Recorder(Vec<Call>);

    impl SceneTarget for Recorder {
        fn bind_shader(&mut self, shader: ShaderId) {
            self.0.push(Call::Bind(shader));
        }

        fn set_globals(&mut self, shader: ShaderId, lighting: &LightingUniforms) {
            self.0.push(Call::Globals(shader, *lighting));
        }

        fn draw_mesh(&mut self, shader: ShaderId, mesh: MeshId, uniforms: &InstanceUniforms) {
            self.0.push(Call::Draw(shader, mesh, *uniforms));
        }
    }

    fn scene() -> Scene {
        Scene::new(vec![Camera::default()], vec2(1280., 720.), Vec3::splat(0.25)).unwrap()
    }

    fn instance(mesh: usize, shader: usize) -> Instance {
        Instance::new(Mat4::IDENTITY, MeshId(mesh), ShaderId(shader))
    }

    #[test]
    fn shared_shader_is_listed_once() {
        let mut scene = scene();
        scene.add_instance(instance(0, 1));
        scene.add_instance(instance(1, 1));
        assert_eq!(scene.shaders(), &[ShaderId(1)]);

        scene.add_instance(instance(0, 2));
        assert_eq!(scene.shaders(), &[ShaderId(1), ShaderId(2)]);
        assert_eq!(scene.instances().len(), 3);
    }

    #[test]
    fn add_instance_returns_its_index() {
        let mut scene = scene();
        assert_eq!(scene.add_instance(instance(0, 0)), 0);
        assert_eq!(scene.add_instance(instance(0, 0)), 1);
    }

    #[test]
    fn globals_are_set_once_per_shader_before_draws() {
        let mut scene = scene();
        scene.add_point_light(PointLight::default());
        scene.add_instance(instance(0, 0));
        scene.add_instance(instance(1, 1));
        scene.add_instance(instance(2, 0));

        let mut recorder = Recorder::default();
        scene.draw(&mut recorder);
        let calls = recorder.0;

        let globals: Vec<_> = calls
            .iter()
            .filter_map(|c| match c {
                Call::Globals(shader, lighting) => Some((*shader, *lighting)),
                _ => None,
            })
            .collect();
        assert_eq!(globals.len(), 2);
        assert_eq!(globals[0].0, ShaderId(0));
        assert_eq!(globals[1].0, ShaderId(1));
        assert_eq!(globals[0].1.point_light_count, 1);

        let first_draw = calls
            .iter()
            .position(|c| matches!(c, Call::Draw(..)))
            .unwrap();
        assert!(calls[first_draw..]
            .iter()
            .all(|c| !matches!(c, Call::Globals(..))));

        let draws: Vec<_> = calls
            .iter()
            .filter_map(|c| match c {
                Call::Draw(shader, mesh, _) => Some((*shader, *mesh)),
                _ => None,
            })
            .collect();
        assert_eq!(
            draws,
            vec![
                (ShaderId(0), MeshId(0)),
                (ShaderId(1), MeshId(1)),
                (ShaderId(0), MeshId(2)),
            ]
        );
    }

    #[test]
    fn instance_rebinds_its_shader_before_drawing() {
        let mut scene = scene();
        scene.add_instance(instance(3, 4));

        let mut recorder = Recorder::default();
        scene.draw(&mut recorder);

        let n = recorder.0.len();
        assert_eq!(recorder.0[n - 2], Call::Bind(ShaderId(4)));
        assert!(matches!(recorder.0[n - 1], Call::Draw(ShaderId(4), MeshId(3), _)));
    }

    #[test]
    fn instance_uniforms_carry_projection_view_model() {
        let mut scene = scene();
        let transform = Mat4::from_translation(vec3(1., 2., 3.));
        scene.add_instance(Instance::new(transform, MeshId(0), ShaderId(0)));

        let mut recorder = Recorder::default();
        scene.draw(&mut recorder);

        let expected = scene.projection_view() * transform;
        match recorder.0.last() {
            Some(Call::Draw(_, _, uniforms)) => {
                assert_eq!(uniforms.model, transform);
                assert!(uniforms.projection_view_model.abs_diff_eq(expected, 1e-5));
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[test]
    fn globals_use_current_camera_position() {
        let cameras = vec![
            Camera::new(Vec3::ZERO, 0., 0., true),
            Camera::new(vec3(4., 5., 6.), 0., 0., true),
        ];
        let mut scene = Scene::new(cameras, vec2(100., 100.), Vec3::ZERO).unwrap();
        scene.set_camera_index(1).unwrap();
        assert_eq!(scene.lighting().camera_position, vec3(4., 5., 6.).extend(1.));
    }

    #[test]
    fn empty_camera_list_is_rejected() {
        let result = Scene::new(Vec::new(), vec2(1., 1.), Vec3::ZERO);
        assert_eq!(result.unwrap_err(), SceneError::NoCameras);
    }

    #[test]
    fn out_of_range_camera_index_is_rejected() {
        let mut scene = scene();
        assert_eq!(
            scene.set_camera_index(1),
            Err(SceneError::CameraIndexOutOfRange { index: 1, len: 1 })
        );
        assert_eq!(scene.camera_index(), 0);
        assert!(scene.set_camera_index(0).is_ok());
    }
}
