use anyhow::{Context, Ok, Result};
use log::{error, info, warn};

use crate::{
    mesh::MeshData,
    particles::{ParticleGenerator, ParticleInstance},
    renderer::{
        mesh::GpuMesh, particle::ParticleRenderer, render_target::DepthTarget,
        scene::SceneRenderer, scene::SHADER_NAMES,
    },
    scene::{MeshId, Scene, SceneError, ShaderId},
    window::{HasSize, Size},
};

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.25,
    g: 0.25,
    b: 0.25,
    a: 1.0,
};

pub struct Renderer {
    surface: wgpu::Surface,
    surface_format: wgpu::TextureFormat,
    device: wgpu::Device,
    queue: wgpu::Queue,
    size: Size,
    depth: DepthTarget,
    mesh_names: Vec<&'static str>,
    meshes: Vec<GpuMesh>,
    scene_renderer: SceneRenderer,
    particle_renderer: ParticleRenderer,
}

impl Renderer {
    pub async fn new(window: &winit::window::Window, particle_capacity: usize) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::Backends::PRIMARY);
        let surface = unsafe { instance.create_surface(window) };

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No adapter found")?;
        info!("Using adapter {:?}", adapter.get_info());

        let surface_format = surface
            .get_preferred_format(&adapter)
            .context("No preferred format found")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default(), None)
            .await
            .context("No device found")?;

        // Shader compile and link failures land here. They are reported but
        // do not stop the frame loop.
        device.on_uncaptured_error(|e| error!("wgpu error: {}", e));

        let size = window.size();
        Self::configure_surface(&surface, &device, surface_format, size);

        let depth = DepthTarget::new(&device, size);

        let (mesh_names, meshes): (Vec<_>, Vec<_>) = [
            ("quad", MeshData::quad()),
            ("cube", MeshData::cube()),
            ("sphere", MeshData::sphere(24, 16)),
        ]
        .iter()
        .map(|(name, data)| (*name, GpuMesh::new(&device, name, data)))
        .unzip();

        let scene_renderer = SceneRenderer::new(&device, surface_format, &depth);
        let particle_renderer =
            ParticleRenderer::new(&device, surface_format, &depth, particle_capacity);

        Ok(Self {
            surface,
            surface_format,
            device,
            queue,
            size,
            depth,
            mesh_names,
            meshes,
            scene_renderer,
            particle_renderer,
        })
    }

    fn configure_surface(
        surface: &wgpu::Surface,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: Size,
    ) {
        if size.is_empty() {
            return;
        }

        surface.configure(
            device,
            &wgpu::SurfaceConfiguration {
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                format,
                width: size.width,
                height: size.height,
                present_mode: wgpu::PresentMode::Fifo,
            },
        )
    }

    pub fn shader_id(&self, name: &str) -> Result<ShaderId, SceneError> {
        SHADER_NAMES
            .iter()
            .position(|&n| n == name)
            .map(ShaderId)
            .ok_or_else(|| SceneError::UnknownShader(name.to_owned()))
    }

    pub fn mesh_id(&self, name: &str) -> Result<MeshId, SceneError> {
        self.mesh_names
            .iter()
            .position(|&n| n == name)
            .map(MeshId)
            .ok_or_else(|| SceneError::UnknownMesh(name.to_owned()))
    }

    pub fn resize(&mut self, size: Size) {
        self.size = size;
        Self::configure_surface(&self.surface, &self.device, self.surface_format, size);
        self.depth = DepthTarget::new(&self.device, size);
    }

    pub fn render(&mut self, scene: &Scene, particles: &ParticleGenerator) {
        if self.size.is_empty() {
            return;
        }

        let instances: &[ParticleInstance] = if particles.is_emitting() {
            particles.instances()
        } else {
            &[]
        };
        self.particle_renderer
            .update(&self.queue, scene.current_camera(), self.size, instances);

        let surface_texture = match self.surface.get_current_texture() {
            std::result::Result::Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("Surface lost, reconfiguring");
                self.resize(self.size);
                return;
            }
            Err(e) => {
                error!("Failed to get next surface texture: {}", e);
                return;
            }
        };
        let surface_texture_view = surface_texture.texture.create_view(&Default::default());

        let mut recorder = self.scene_renderer.recorder(&self.queue, self.meshes.len());
        scene.draw(&mut recorder);
        let commands = recorder.finish();

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Command Encoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: true,
                    },
                }],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.texture_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: false,
                    }),
                    stencil_ops: None,
                }),
            });
            self.scene_renderer.draw(&mut rpass, &commands, &self.meshes);
            // Transparent particles go last, over the opaque scene.
            self.particle_renderer.draw(&mut rpass);
        }

        self.queue.submit(Some(encoder.finish()));

        surface_texture.present();
    }
}
