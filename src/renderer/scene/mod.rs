use std::mem::size_of;

use bytemuck::bytes_of;
use log::warn;

use crate::scene::{InstanceUniforms, LightingUniforms, MeshId, SceneTarget, ShaderId};

use super::{mesh, mesh::GpuMesh, render_target::DepthTarget};

/// Instance uniforms are written at this stride and selected with a dynamic
/// offset.
const INSTANCE_STRIDE: wgpu::BufferAddress = 256;
pub const MAX_INSTANCES_PER_FRAME: u32 = 256;

/// Scene shaders by name. A `ShaderId` is an index into this list.
pub const SHADER_NAMES: [&str; 2] = ["simple", "phong"];

struct ShaderPipeline {
    render_pipeline: wgpu::RenderPipeline,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
}

/// GPU side of `Scene::draw`: one pipeline and globals buffer per shader,
/// plus a shared ring of per-instance uniforms.
pub struct SceneRenderer {
    shaders: Vec<ShaderPipeline>,
    instance_buffer: wgpu::Buffer,
    instance_bind_group: wgpu::BindGroup,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DrawCommand {
    shader: ShaderId,
    mesh: MeshId,
    slot: u32,
}

impl SceneRenderer {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        depth: &DepthTarget,
    ) -> Self {
        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Globals Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(size_of::<LightingUniforms>() as _),
                },
                count: None,
            }],
        });

        let instance_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Instance Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(size_of::<InstanceUniforms>() as _),
                },
                count: None,
            }],
        });

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Instance Uniform Buffer"),
            size: INSTANCE_STRIDE * MAX_INSTANCES_PER_FRAME as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let instance_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Instance Bind Group"),
            layout: &instance_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &instance_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(size_of::<InstanceUniforms>() as _),
                }),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&globals_layout, &instance_layout],
            push_constant_ranges: &[],
        });

        let modules = [
            device.create_shader_module(&wgpu::include_wgsl!("simple.wgsl")),
            device.create_shader_module(&wgpu::include_wgsl!("phong.wgsl")),
        ];

        let shaders = SHADER_NAMES
            .iter()
            .zip(&modules)
            .map(|(name, module)| {
                let render_pipeline = Self::make_render_pipeline(
                    device,
                    name,
                    &pipeline_layout,
                    module,
                    color_format,
                    depth,
                );

                let globals_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(format!("{} Globals Buffer", name).as_str()),
                    size: size_of::<LightingUniforms>() as _,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });

                let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(format!("{} Globals Bind Group", name).as_str()),
                    layout: &globals_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: globals_buffer.as_entire_binding(),
                    }],
                });

                ShaderPipeline {
                    render_pipeline,
                    globals_buffer,
                    globals_bind_group,
                }
            })
            .collect();

        Self {
            shaders,
            instance_buffer,
            instance_bind_group,
        }
    }

    fn make_render_pipeline(
        device: &wgpu::Device,
        name: &str,
        pipeline_layout: &wgpu::PipelineLayout,
        module: &wgpu::ShaderModule,
        color_format: wgpu::TextureFormat,
        depth: &DepthTarget,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(format!("{} Pipeline", name).as_str()),
            layout: Some(pipeline_layout),
            vertex: wgpu::VertexState {
                module,
                entry_point: "vs_main",
                buffers: &[mesh::vertex_buffer_layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module,
                entry_point: "fs_main",
                targets: &[color_format.into()],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(depth.depth_stencil_state(true)),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        })
    }

    pub fn recorder<'a>(&'a self, queue: &'a wgpu::Queue, mesh_count: usize) -> FrameRecorder<'a> {
        FrameRecorder {
            renderer: self,
            queue,
            mesh_count,
            bound: None,
            commands: Vec::new(),
            overflowed: false,
        }
    }

    pub fn draw<'rpass>(
        &'rpass self,
        rpass: &mut wgpu::RenderPass<'rpass>,
        commands: &[DrawCommand],
        meshes: &'rpass [GpuMesh],
    ) {
        let mut current = None;
        for command in commands {
            let shader = &self.shaders[command.shader.0];
            if current != Some(command.shader) {
                rpass.set_pipeline(&shader.render_pipeline);
                rpass.set_bind_group(0, &shader.globals_bind_group, &[]);
                current = Some(command.shader);
            }

            let offset = command.slot as wgpu::BufferAddress * INSTANCE_STRIDE;
            rpass.set_bind_group(1, &self.instance_bind_group, &[offset as _]);
            meshes[command.mesh.0].draw(rpass);
        }
    }
}

/// Collects one frame of scene draws. Uniform writes go straight to the
/// queue; draws are replayed later into a render pass.
pub struct FrameRecorder<'a> {
    renderer: &'a SceneRenderer,
    queue: &'a wgpu::Queue,
    mesh_count: usize,
    bound: Option<ShaderId>,
    commands: Vec<DrawCommand>,
    overflowed: bool,
}

impl FrameRecorder<'_> {
    pub fn finish(self) -> Vec<DrawCommand> {
        self.commands
    }

    fn shader(&self, shader: ShaderId) -> Option<&ShaderPipeline> {
        let pipeline = self.renderer.shaders.get(shader.0);
        if pipeline.is_none() {
            warn!("No pipeline for {:?}", shader);
        }
        pipeline
    }
}

impl SceneTarget for FrameRecorder<'_> {
    fn bind_shader(&mut self, shader: ShaderId) {
        self.bound = Some(shader);
    }

    fn set_globals(&mut self, shader: ShaderId, lighting: &LightingUniforms) {
        if let Some(pipeline) = self.shader(shader) {
            self.queue
                .write_buffer(&pipeline.globals_buffer, 0, bytes_of(lighting));
        }
    }

    fn draw_mesh(&mut self, shader: ShaderId, mesh: MeshId, uniforms: &InstanceUniforms) {
        if self.bound != Some(shader) || self.shader(shader).is_none() {
            warn!("Draw with {:?} while {:?} is bound; skipped", shader, self.bound);
            return;
        }
        if mesh.0 >= self.mesh_count {
            warn!("No mesh for {:?}; skipped", mesh);
            return;
        }

        let slot = self.commands.len() as u32;
        if slot >= MAX_INSTANCES_PER_FRAME {
            if !self.overflowed {
                warn!(
                    "More than {} instances this frame; extra draws skipped",
                    MAX_INSTANCES_PER_FRAME
                );
                self.overflowed = true;
            }
            return;
        }

        self.queue.write_buffer(
            &self.renderer.instance_buffer,
            slot as wgpu::BufferAddress * INSTANCE_STRIDE,
            bytes_of(uniforms),
        );
        self.commands.push(DrawCommand { shader, mesh, slot });
    }
}
