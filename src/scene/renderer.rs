use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::math::{matrix_to_uniform, ViewProjection};
use crate::targets::{COLOR_FORMAT, DEPTH_FORMAT};

use super::cube::{CubeMesh, CubeVertex};
use super::{CubeScene, Light, RING_COUNT};

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CameraUniform {
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct LightUniform {
    direction: [f32; 4],
    diffuse: [f32; 4],
    ambient: [f32; 4],
}

impl LightUniform {
    fn from_light(light: &Light) -> Self {
        Self {
            direction: [light.direction.x, light.direction.y, light.direction.z, 0.0],
            diffuse: [light.diffuse.x, light.diffuse.y, light.diffuse.z, 1.0],
            ambient: [light.ambient.x, light.ambient.y, light.ambient.z, 1.0],
        }
    }
}

/// One cube's model matrix, fed to the vertex stage as four vec4 columns.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct InstanceRaw {
    model: [[f32; 4]; 4],
}

impl InstanceRaw {
    const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
    ];

    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }

    fn from_matrix(matrix: Mat4) -> Self {
        Self {
            model: matrix_to_uniform(matrix),
        }
    }
}

/// Stateless scene drawing given (view, projection): the cube mesh, the
/// static grid instances, and the ring instances rewritten each frame.
pub struct SceneRenderer {
    pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    light_buffer: wgpu::Buffer,
    light_bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    grid_instance_buffer: wgpu::Buffer,
    grid_count: u32,
    ring_instance_buffer: wgpu::Buffer,
}

impl SceneRenderer {
    pub fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../shaders/scene.wgsl").into()),
        });

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Buffer"),
            size: std::mem::size_of::<CameraUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let light_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Light Buffer"),
            size: std::mem::size_of::<LightUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Camera Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let light_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Light Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let light_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Light Bind Group"),
            layout: &light_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: light_buffer.as_entire_binding(),
            }],
        });

        let mesh = CubeMesh::generate(1.0);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cube Vertex Buffer"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cube Index Buffer"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let grid_instances: Vec<InstanceRaw> = CubeScene::grid_transforms()
            .into_iter()
            .map(InstanceRaw::from_matrix)
            .collect();
        let grid_instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Grid Instance Buffer"),
            contents: bytemuck::cast_slice(&grid_instances),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let ring_instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Ring Instance Buffer"),
            size: (RING_COUNT as usize * std::mem::size_of::<InstanceRaw>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout, &light_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Scene Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[CubeVertex::desc(), InstanceRaw::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: COLOR_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            camera_buffer,
            camera_bind_group,
            light_buffer,
            light_bind_group,
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            grid_instance_buffer,
            grid_count: grid_instances.len() as u32,
            ring_instance_buffer,
        }
    }

    /// Per-frame uploads shared by both eyes: light values and the ring
    /// instances at the scene's current clock.
    pub fn prepare_frame(&self, queue: &wgpu::Queue, scene: &CubeScene) {
        let light = LightUniform::from_light(&scene.light);
        queue.write_buffer(&self.light_buffer, 0, bytemuck::cast_slice(&[light]));

        let ring: Vec<InstanceRaw> = scene
            .ring_transforms()
            .into_iter()
            .map(InstanceRaw::from_matrix)
            .collect();
        queue.write_buffer(&self.ring_instance_buffer, 0, bytemuck::cast_slice(&ring));
    }

    /// Uploads one eye's view/projection pair. Each eye is prepared and
    /// submitted before the next, so a single camera buffer suffices.
    pub fn prepare_eye(&self, queue: &wgpu::Queue, view_projection: &ViewProjection) {
        let camera = CameraUniform {
            view: matrix_to_uniform(view_projection.view),
            projection: matrix_to_uniform(view_projection.projection),
        };
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[camera]));
    }

    /// Records the scene's draw calls into an eye pass begun by the target
    /// set: the grid in one instanced draw, the ring in a second.
    pub fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
        render_pass.set_bind_group(1, &self.light_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

        render_pass.set_vertex_buffer(1, self.grid_instance_buffer.slice(..));
        render_pass.draw_indexed(0..self.index_count, 0, 0..self.grid_count);

        render_pass.set_vertex_buffer(1, self.ring_instance_buffer.slice(..));
        render_pass.draw_indexed(0..self.index_count, 0, 0..RING_COUNT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use serial_test::serial;

    #[test]
    fn instance_layout_is_one_matrix_per_instance() {
        let layout = InstanceRaw::desc();
        assert_eq!(layout.array_stride, 64);
        assert_eq!(layout.step_mode, wgpu::VertexStepMode::Instance);
        assert_eq!(layout.attributes.len(), 4);
    }

    #[test]
    fn light_uniform_carries_scene_light() {
        let uniform = LightUniform::from_light(&Light::default());
        assert_eq!(uniform.direction[..3], [0.1, 0.4, 1.0]);
        assert_eq!(uniform.diffuse[..3], [1.0, 1.0, 0.8]);
        assert_eq!(uniform.ambient[..3], [0.15, 0.15, 0.25]);
    }

    #[test]
    fn instance_raw_stores_translation_in_last_column() {
        let raw = InstanceRaw::from_matrix(Mat4::from_translation(Vec3::new(4.0, -90.0, 36.0)));
        assert_eq!(raw.model[3][0], 4.0);
        assert_eq!(raw.model[3][1], -90.0);
        assert_eq!(raw.model[3][2], 36.0);
    }

    #[test]
    #[serial]
    fn renderer_builds_and_uploads() {
        let instance = wgpu::Instance::default();
        let Some(adapter) =
            pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            }))
        else {
            println!("Skipping renderer test - no graphics adapter available");
            return;
        };
        let Ok((device, queue)) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: Default::default(),
            },
            None,
        )) else {
            println!("Skipping renderer test - failed to create device");
            return;
        };

        let renderer = SceneRenderer::new(&device);
        assert_eq!(renderer.index_count, 36);
        assert_eq!(renderer.grid_count, 400);

        let scene = CubeScene::new();
        renderer.prepare_frame(&queue, &scene);
    }
}
