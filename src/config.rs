use std::{fs, path::Path};

use anyhow::{Context, Result};
use glam::{Vec3, Vec4};
use log::info;
use serde::Deserialize;

use crate::{
    camera::Camera,
    particles::EmitterSettings,
    scene::{DirectionalLight, PointLight},
};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub cameras: Vec<CameraConfig>,
    pub lighting: LightingConfig,
    pub instances: Vec<InstanceConfig>,
    pub planets: Vec<PlanetConfig>,
    pub particles: Option<ParticleConfig>,
}

impl Config {
    /// Reads `path`, or falls back to the built-in demo scene when there is
    /// no such file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config at {}, using the demo scene", path.display());
            return Ok(Self::demo());
        }

        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::parse(&text).with_context(|| format!("Invalid config {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Lit meshes on a floor, a small solar system and a fountain.
    pub fn demo() -> Self {
        let planet = |radius: f32, orbit_radius: f32, orbit_speed: f32, color: [f32; 4]| {
            PlanetConfig {
                radius: radius * 0.2,
                orbit_center: [0., 4., 0.],
                orbit_radius: orbit_radius * 0.5,
                orbit_speed: orbit_speed * 5.,
                color,
                ..Default::default()
            }
        };

        Self {
            window: WindowConfig::default(),
            cameras: vec![
                CameraConfig::default(),
                CameraConfig {
                    position: [0., 25., 25.],
                    theta: -90.,
                    phi: -45.,
                    is_static: true,
                },
            ],
            lighting: LightingConfig {
                ambient: [0.25, 0.25, 0.25],
                directional: vec![DirectionalLightConfig {
                    direction: [-1., -1., -0.5],
                    color: [1., 1., 1.],
                }],
                point: vec![
                    PointLightConfig {
                        position: [3., 1.5, 3.],
                        color: [1., 0.2, 0.2],
                        ..Default::default()
                    },
                    PointLightConfig {
                        position: [-3., 1.5, -3.],
                        color: [0.2, 0.2, 1.],
                        ..Default::default()
                    },
                ],
            },
            instances: vec![
                InstanceConfig {
                    mesh: "quad".into(),
                    shader: "phong".into(),
                    scale: [20., 1., 20.],
                    ..Default::default()
                },
                InstanceConfig {
                    mesh: "cube".into(),
                    shader: "phong".into(),
                    position: [2., 0.5, -2.],
                    euler_degrees: [0., 30., 0.],
                    ..Default::default()
                },
                InstanceConfig {
                    mesh: "sphere".into(),
                    shader: "phong".into(),
                    position: [-2., 1., 2.],
                    ..Default::default()
                },
            ],
            planets: vec![
                planet(0.2439, 0.57, 0.240, [0.6, 0.6, 0.6, 1.]),
                planet(0.6051, 1.08, 0.615, [0.9, 0.8, 0.5, 1.]),
                planet(0.6371, 1.49, 1.000, [0.2, 0.4, 1., 1.]),
                planet(0.3389, 2.27, 1.881, [1., 0.3, 0.1, 1.]),
                planet(6.9911, 7.78, 11.86, [0.8, 0.6, 0.4, 1.]),
                planet(5.8232, 14.3, 29.46, [0.9, 0.8, 0.6, 1.]),
                planet(2.5362, 28.7, 84.01, [0.6, 0.9, 1., 1.]),
                planet(2.4622, 44.9, 164.8, [0.3, 0.4, 1., 1.]),
            ],
            particles: Some(ParticleConfig::default()),
        }
    }

    pub fn cameras(&self) -> Vec<Camera> {
        self.cameras.iter().map(CameraConfig::to_camera).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Lumen Orrery".into(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub theta: f32,
    pub phi: f32,
    #[serde(rename = "static")]
    pub is_static: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [-10., 2., 0.],
            theta: 0.,
            phi: 0.,
            is_static: false,
        }
    }
}

impl CameraConfig {
    pub fn to_camera(&self) -> Camera {
        Camera::new(self.position.into(), self.theta, self.phi, self.is_static)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub ambient: [f32; 3],
    pub directional: Vec<DirectionalLightConfig>,
    pub point: Vec<PointLightConfig>,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient: [0.25, 0.25, 0.25],
            directional: Vec::new(),
            point: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DirectionalLightConfig {
    pub direction: [f32; 3],
    pub color: [f32; 3],
}

impl Default for DirectionalLightConfig {
    fn default() -> Self {
        let light = DirectionalLight::default();
        Self {
            direction: light.direction.into(),
            color: light.color.into(),
        }
    }
}

impl From<&DirectionalLightConfig> for DirectionalLight {
    fn from(config: &DirectionalLightConfig) -> Self {
        Self {
            direction: config.direction.into(),
            color: config.color.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PointLightConfig {
    pub position: [f32; 3],
    pub range: f32,
    pub brightness: f32,
    pub color: [f32; 3],
}

impl Default for PointLightConfig {
    fn default() -> Self {
        let light = PointLight::default();
        Self {
            position: light.position.into(),
            range: light.range,
            brightness: light.brightness,
            color: light.color.into(),
        }
    }
}

impl From<&PointLightConfig> for PointLight {
    fn from(config: &PointLightConfig) -> Self {
        Self {
            position: config.position.into(),
            range: config.range,
            brightness: config.brightness,
            color: config.color.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    pub mesh: String,
    pub shader: String,
    pub position: [f32; 3],
    pub euler_degrees: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            mesh: "cube".into(),
            shader: "phong".into(),
            position: [0.; 3],
            euler_degrees: [0.; 3],
            scale: [1.; 3],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlanetConfig {
    pub radius: f32,
    pub orbit_center: [f32; 3],
    pub orbit_radius: f32,
    /// Degrees per second.
    pub orbit_speed: f32,
    /// Radians per second.
    pub rotation_speed: f32,
    pub rotation_axis: [f32; 3],
    pub color: [f32; 4],
    pub shader: String,
}

impl Default for PlanetConfig {
    fn default() -> Self {
        Self {
            radius: 1.,
            orbit_center: [0.; 3],
            orbit_radius: 1.,
            orbit_speed: 1.,
            rotation_speed: 1.,
            rotation_axis: [0., 1., 0.],
            color: [1., 0., 0., 1.],
            shader: "simple".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    pub max_particles: usize,
    pub position: [f32; 3],
    pub emission_rate: f32,
    pub lifetime: f32,
    pub start_color: [f32; 4],
    pub end_color: [f32; 4],
    pub acceleration: [f32; 3],
    pub start_speed: f32,
    pub start_scale: f32,
    pub end_scale: f32,
    /// Fixed RNG seed. Seeded from the clock when absent.
    pub seed: Option<u64>,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            max_particles: 1000,
            position: [0., 1., 0.],
            emission_rate: 100.,
            lifetime: 2.,
            start_color: [1., 0.8, 0.2, 1.],
            end_color: [1., 0.1, 0., 0.],
            acceleration: [0., -2., 0.],
            start_speed: 2.,
            start_scale: 0.2,
            end_scale: 0.02,
            seed: None,
        }
    }
}

impl ParticleConfig {
    pub fn emitter_settings(&self) -> EmitterSettings {
        EmitterSettings {
            emission_rate: self.emission_rate,
            lifetime: self.lifetime,
            start_color: Vec4::from(self.start_color),
            end_color: Vec4::from(self.end_color),
            acceleration: Vec3::from(self.acceleration),
            start_speed: self.start_speed,
            start_scale: self.start_scale,
            end_scale: self.end_scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::vec3;

    use super::*;

    #[test]
    fn empty_file_is_the_default() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.particles.is_none());
    }

    #[test]
    fn partial_sections_fill_in_defaults() {
        let config = Config::parse(
            r#"
            [window]
            title = "Test"

            [[cameras]]
            position = [1.0, 2.0, 3.0]
            static = true

            [[lighting.point]]
            position = [0.0, 5.0, 0.0]

            [[instances]]
            mesh = "sphere"
            scale = [2.0, 2.0, 2.0]

            [particles]
            emission_rate = 10.0
            seed = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.window.title, "Test");
        assert_eq!(config.window.width, 1280);

        let cameras = config.cameras();
        assert_eq!(cameras.len(), 1);
        assert_eq!(cameras[0].position, vec3(1., 2., 3.));
        assert!(cameras[0].is_static);

        let light = PointLight::from(&config.lighting.point[0]);
        assert_eq!(light.position, vec3(0., 5., 0.));
        assert_eq!(light.range, 20.);

        assert_eq!(config.instances[0].mesh, "sphere");
        assert_eq!(config.instances[0].shader, "phong");

        let particles = config.particles.unwrap();
        assert_eq!(particles.seed, Some(4));
        assert_eq!(particles.max_particles, 1000);
        assert_eq!(particles.emitter_settings().emission_rate, 10.);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(Config::parse("cameras = 3").is_err());
    }

    #[test]
    fn example_file_parses() {
        let config = Config::parse(include_str!("../scene.example.toml")).unwrap();
        assert_eq!(config.cameras.len(), 2);
        assert_eq!(config.planets.len(), 2);
        assert_eq!(config.planets[0].shader, "simple");
        assert_eq!(config.particles.unwrap().seed, Some(7));
    }

    #[test]
    fn demo_scene_has_cameras_and_emitter() {
        let config = Config::demo();
        assert!(!config.cameras.is_empty());
        assert_eq!(config.planets.len(), 8);
        assert!(config.particles.is_some());
    }
}
