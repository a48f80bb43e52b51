use std::time::SystemTime;

use anyhow::Result;
use glam::{Vec2, Vec3, Vec4};
use log::{debug, info, warn};
use winit::{
    event::{VirtualKeyCode, WindowEvent},
    window::Window,
};

use crate::{
    camera::Camera,
    config::Config,
    input::{Input, InputState},
    particles::ParticleGenerator,
    planet::Planet,
    renderer::Renderer,
    scene::{DirectionalLight, Instance, MeshId, PointLight, Scene, SceneError, ShaderId},
    window::{HasSize, Size},
};

const CAMERA_KEYS: [VirtualKeyCode; 9] = [
    VirtualKeyCode::Key1,
    VirtualKeyCode::Key2,
    VirtualKeyCode::Key3,
    VirtualKeyCode::Key4,
    VirtualKeyCode::Key5,
    VirtualKeyCode::Key6,
    VirtualKeyCode::Key7,
    VirtualKeyCode::Key8,
    VirtualKeyCode::Key9,
];

pub struct App {
    window: Window,
    renderer: Renderer,
    scene: Scene,
    planets: Vec<Planet>,
    particles: ParticleGenerator,
    input: InputState,
    quit_requested: bool,
}

impl App {
    pub async fn new(window: Window, config: &Config) -> Result<Self> {
        let particles = build_particles(config);
        let renderer = Renderer::new(&window, particles.capacity()).await?;

        let (scene, planets) = build_scene(
            config,
            window.size().as_vec2(),
            |name| renderer.shader_id(name),
            |name| renderer.mesh_id(name),
        )?;
        info!("{:#?}", &scene);

        Ok(Self {
            window,
            renderer,
            scene,
            planets,
            particles,
            input: InputState::new(),
            quit_requested: false,
        })
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        self.input.handle_window_event(event);
    }

    pub fn resize(&mut self, size: Size) {
        if size.is_empty() {
            debug!("Ignoring resize to {:?}", size);
        } else {
            self.scene.set_window_size(size.as_vec2());
        }
        self.renderer.resize(size);
    }

    pub fn update(&mut self, dt: f32) {
        if self.input.is_key_down(VirtualKeyCode::Escape) {
            self.quit_requested = true;
        }

        for (index, key) in CAMERA_KEYS.iter().enumerate() {
            if self.input.was_key_pressed(*key) {
                match self.scene.set_camera_index(index) {
                    Ok(()) => info!("Switched to camera {}", self.scene.camera_index()),
                    Err(e) => warn!("{}", e),
                }
            }
        }

        if self.input.was_key_pressed(VirtualKeyCode::Space) {
            if self.particles.is_emitting() {
                self.particles.stop();
            } else {
                self.particles.start();
            }
            info!("Particle emission: {}", self.particles.is_emitting());
        }

        self.scene.current_camera_mut().update(dt, &self.input);
        debug!("{:?}", self.scene.current_camera());

        let instances = self.scene.instances_mut();
        for planet in &mut self.planets {
            planet.update(dt);
            if let Some(instance) = instances.get_mut(planet.instance) {
                *instance.transform_mut() = planet.transform();
            }
        }

        self.particles.update(dt);

        self.input.end_frame();
    }

    pub fn render(&mut self) {
        self.renderer.render(&self.scene, &self.particles);
    }

    pub fn window(&self) -> &Window {
        &self.window
    }
}

fn build_particles(config: &Config) -> ParticleGenerator {
    let Some(particles) = &config.particles else {
        return ParticleGenerator::new(Vec3::ZERO, 0, 0);
    };

    let seed = particles.seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    });

    let mut generator =
        ParticleGenerator::new(particles.position.into(), particles.max_particles, seed);
    generator.setup(particles.emitter_settings());
    info!(
        "Emitter at {}: {:?}",
        generator.emitter_position(),
        generator.settings()
    );
    generator
}

/// Builds the scene and its planets from `config`, resolving mesh and shader
/// names through the renderer.
fn build_scene<S, M>(
    config: &Config,
    window_size: Vec2,
    shader_id: S,
    mesh_id: M,
) -> Result<(Scene, Vec<Planet>), SceneError>
where
    S: Fn(&str) -> Result<ShaderId, SceneError>,
    M: Fn(&str) -> Result<MeshId, SceneError>,
{
    let mut cameras = config.cameras();
    if cameras.is_empty() {
        info!("No cameras configured, using a free camera");
        cameras.push(Camera::default());
    }

    let mut scene = Scene::new(cameras, window_size, config.lighting.ambient.into())?;

    for light in &config.lighting.directional {
        scene.add_directional_light(DirectionalLight::from(light));
    }
    for light in &config.lighting.point {
        scene.add_point_light(PointLight::from(light));
    }

    for instance in &config.instances {
        scene.add_instance(Instance::from_euler(
            instance.position.into(),
            instance.euler_degrees.into(),
            instance.scale.into(),
            mesh_id(&instance.mesh)?,
            shader_id(&instance.shader)?,
        ));
    }

    let sphere = mesh_id("sphere")?;
    let mut planets = Vec::with_capacity(config.planets.len());
    for planet in &config.planets {
        let color = Vec4::from(planet.color);
        let mut body = Planet::new(
            planet.radius,
            planet.orbit_center.into(),
            planet.orbit_radius,
            planet.orbit_speed,
            planet.rotation_speed,
            planet.rotation_axis.into(),
            color,
            0,
        );
        body.instance = scene.add_instance(
            Instance::new(body.transform(), sphere, shader_id(&planet.shader)?).with_tint(color),
        );
        planets.push(body);
    }

    Ok((scene, planets))
}

#[cfg(test)]
mod tests {
    use glam::vec2;

    use super::*;
    use crate::config::{InstanceConfig, PlanetConfig};

    fn shader_id(name: &str) -> Result<ShaderId, SceneError> {
        match name {
            "simple" => Ok(ShaderId(0)),
            "phong" => Ok(ShaderId(1)),
            _ => Err(SceneError::UnknownShader(name.into())),
        }
    }

    fn mesh_id(name: &str) -> Result<MeshId, SceneError> {
        match name {
            "quad" => Ok(MeshId(0)),
            "cube" => Ok(MeshId(1)),
            "sphere" => Ok(MeshId(2)),
            _ => Err(SceneError::UnknownMesh(name.into())),
        }
    }

    #[test]
    fn demo_config_builds() {
        let config = Config::demo();
        let (scene, planets) =
            build_scene(&config, vec2(1280., 720.), shader_id, mesh_id).unwrap();

        assert_eq!(scene.cameras().len(), config.cameras.len());
        assert_eq!(
            scene.instances().len(),
            config.instances.len() + config.planets.len()
        );
        assert_eq!(scene.shaders(), &[ShaderId(1), ShaderId(0)]);
        assert_eq!(planets.len(), 8);
        for planet in &planets {
            let instance = &scene.instances()[planet.instance];
            assert_eq!(instance.mesh(), MeshId(2));
            assert_eq!(instance.tint, planet.color);
        }
    }

    #[test]
    fn empty_config_gets_a_camera() {
        let (scene, planets) =
            build_scene(&Config::default(), vec2(1., 1.), shader_id, mesh_id).unwrap();
        assert_eq!(scene.cameras().len(), 1);
        assert!(scene.instances().is_empty());
        assert!(planets.is_empty());
    }

    #[test]
    fn unknown_names_are_reported() {
        let config = Config {
            instances: vec![InstanceConfig {
                mesh: "teapot".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let err = build_scene(&config, vec2(1., 1.), shader_id, mesh_id).unwrap_err();
        assert_eq!(err, SceneError::UnknownMesh("teapot".into()));

        let config = Config {
            planets: vec![PlanetConfig {
                shader: "toon".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let err = build_scene(&config, vec2(1., 1.), shader_id, mesh_id).unwrap_err();
        assert_eq!(err, SceneError::UnknownShader("toon".into()));
    }

    #[test]
    fn particles_are_idle_without_config() {
        let generator = build_particles(&Config::default());
        assert!(!generator.is_emitting());

        let generator = build_particles(&Config::demo());
        assert!(generator.is_emitting());
        assert_eq!(generator.capacity(), 1000);
    }
}
