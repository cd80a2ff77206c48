use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use tilescroll_scene::{NodeId, SceneGraph};
use tilescroll_terrain::TerrainMesh;
use tilescroll_world::{WorldGrid, TRUNK_HEIGHT, TRUNK_RADIUS};

use crate::camera::FollowCamera;
use crate::daylight::DayCycle;
use crate::shaders;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    /// xyz: toward the light; w: ambient floor.
    light_dir: [f32; 4],
    /// rgb: light tint; a: terrain height scale for the altitude tint.
    light_color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    color: [f32; 4],
}

impl InstanceData {
    fn new(model: Mat4, color: [f32; 4]) -> Self {
        let cols = model.to_cols_array_2d();
        Self {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
            color,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct LineVertex {
    position: [f32; 3],
    color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct TerrainVertex {
    position: [f32; 3],
}

const INSTANCE_ATTRS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
    2 => Float32x4,
    3 => Float32x4,
    4 => Float32x4,
    5 => Float32x4,
    6 => Float32x4,
];

const TILE_COLORS: [[f32; 4]; 2] = [
    [0.30, 0.52, 0.26, 1.0],
    [0.36, 0.58, 0.31, 1.0],
];
const TREE_COLOR: [f32; 4] = [0.42, 0.30, 0.17, 1.0];
const PLAYER_COLOR: [f32; 4] = [0.2, 0.6, 1.0, 1.0];
const TERRAIN_COLOR: [f32; 4] = [0.30, 0.52, 0.26, 1.0];

/// Generate unit cube vertices and indices, one flat-shaded quad per face.
fn cube_mesh() -> (Vec<Vertex>, Vec<u16>) {
    // (normal, u, v) with u cross v = normal, so every face winds
    // counter-clockwise seen from outside.
    let faces = [
        (Vec3::X, Vec3::Y, Vec3::Z),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::Z, Vec3::X),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::Y, Vec3::X),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u, v) in faces {
        let base = vertices.len() as u16;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let position = (normal + u * su + v * sv) * 0.5;
            vertices.push(Vertex {
                position: position.to_array(),
                normal: normal.to_array(),
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    (vertices, indices)
}

/// Colored unit axes rooted at the world origin.
fn axes_mesh(length: f32) -> Vec<LineVertex> {
    let colors = [
        [0.9, 0.2, 0.2, 1.0],
        [0.2, 0.9, 0.2, 1.0],
        [0.2, 0.4, 0.9, 1.0],
    ];
    let ends = [Vec3::X, Vec3::Y, Vec3::Z];

    let mut verts = Vec::with_capacity(6);
    for (end, color) in ends.into_iter().zip(colors) {
        verts.push(LineVertex {
            position: [0.0, 0.0, 0.0],
            color,
        });
        verts.push(LineVertex {
            position: (end * length).to_array(),
            color,
        });
    }
    verts
}

/// Maps the unit cube onto a tile quad: a thin slab whose top face is the
/// walkable surface.
fn tile_shape() -> Mat4 {
    Mat4::from_translation(Vec3::new(0.5, -0.05, 0.5))
        * Mat4::from_scale(Vec3::new(1.0, 0.1, 1.0))
}

/// Maps the unit cube onto a trunk, matching the collision hull exactly.
fn trunk_shape() -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, TRUNK_HEIGHT * 0.5, 0.0))
        * Mat4::from_scale(Vec3::new(
            TRUNK_RADIUS * 2.0,
            TRUNK_HEIGHT,
            TRUNK_RADIUS * 2.0,
        ))
}

fn visible_world(scene: &SceneGraph, id: NodeId) -> Option<Mat4> {
    let node = scene.get(id)?;
    if node.is_hidden() {
        return None;
    }
    Some(scene.world_matrix(id))
}

/// GPU residency for one terrain mesh plus its placement transform.
///
/// The grid and terrain crates only hand out vertex data; whoever renders
/// decides when to upload and how long to keep the buffers.
pub struct TerrainBuffers {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    index_count: u32,
    height_scale: f32,
}

impl TerrainBuffers {
    /// Upload a terrain mesh with its placement transform.
    pub fn upload(device: &wgpu::Device, mesh: &TerrainMesh, model: Mat4) -> Self {
        let vertices: Vec<TerrainVertex> = mesh
            .vertices
            .iter()
            .map(|v| TerrainVertex {
                position: v.to_array(),
            })
            .collect();

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("terrain_vertex_buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("terrain_index_buffer"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("terrain_instance_buffer"),
            contents: bytemuck::bytes_of(&InstanceData::new(model, TERRAIN_COLOR)),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let height_scale = model.y_axis.truncate().length().max(1e-3);
        tracing::debug!(
            vertices = vertices.len(),
            indices = mesh.indices.len(),
            height_scale,
            "uploaded terrain buffers"
        );

        Self {
            vertex_buffer,
            index_buffer,
            instance_buffer,
            index_count: mesh.indices.len() as u32,
            height_scale,
        }
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn height_scale(&self) -> f32 {
        self.height_scale
    }
}

/// wgpu-based renderer for the walking world.
pub struct WgpuRenderer {
    world_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    terrain_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    cube_vertex_buffer: wgpu::Buffer,
    cube_index_buffer: wgpu::Buffer,
    cube_index_count: u32,
    axes_vertex_buffer: wgpu::Buffer,
    axes_vertex_count: u32,
    instance_buffer: wgpu::Buffer,
    max_instances: u32,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                light_dir: [0.0, 1.0, 0.0, 0.25],
                light_color: [1.0, 1.0, 1.0, 1.0],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let instance_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &INSTANCE_ATTRS,
        };

        let world_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("world_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::WORLD_SHADER.into()),
        });

        let world_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("world_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &world_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x3,
                        ],
                    },
                    instance_layout.clone(),
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &world_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let line_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("line_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::LINE_SHADER.into()),
        });

        let line_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("line_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &line_shader,
                entry_point: Some("vs_line"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<LineVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x4,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &line_shader,
                entry_point: Some("fs_line"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let terrain_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("terrain_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::TERRAIN_SHADER.into()),
        });

        let terrain_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("terrain_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &terrain_shader,
                entry_point: Some("vs_terrain"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<TerrainVertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                        ],
                    },
                    instance_layout,
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &terrain_shader,
                entry_point: Some("fs_terrain"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let (cube_verts, cube_indices) = cube_mesh();
        let cube_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube_vertex_buffer"),
            contents: bytemuck::cast_slice(&cube_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let cube_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube_index_buffer"),
            contents: bytemuck::cast_slice(&cube_indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let cube_index_count = cube_indices.len() as u32;

        let axes_verts = axes_mesh(2.0);
        let axes_vertex_count = axes_verts.len() as u32;
        let axes_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("axes_vertex_buffer"),
            contents: bytemuck::cast_slice(&axes_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let max_instances = 4096u32;
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: u64::from(max_instances) * std::mem::size_of::<InstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            world_pipeline,
            line_pipeline,
            terrain_pipeline,
            uniform_buffer,
            uniform_bind_group,
            cube_vertex_buffer,
            cube_index_buffer,
            cube_index_count,
            axes_vertex_buffer,
            axes_vertex_count,
            instance_buffer,
            max_instances,
            depth_texture,
            surface_format,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Render one frame: resident tiles and trees, the player, the optional
    /// terrain mesh, and the axes gizmo when visible.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        camera: &FollowCamera,
        daylight: &DayCycle,
        world: &WorldGrid,
        terrain: Option<&TerrainBuffers>,
    ) {
        // The cycle hands out the ray the light travels; shading wants the
        // direction toward the light.
        let to_light = -daylight.light_direction();
        let tint = daylight.light_color();
        let terrain_height = terrain.map_or(1.0, TerrainBuffers::height_scale);
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms {
                view_proj: camera.view_projection().to_cols_array_2d(),
                light_dir: [to_light.x, to_light.y, to_light.z, 0.25],
                light_color: [tint.x, tint.y, tint.z, terrain_height],
            }),
        );

        let instances = self.build_instances(world);
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let scene = world.scene();
        let axes_visible = scene
            .get(world.axes_node())
            .is_some_and(|node| !node.is_hidden());

        let sky = daylight.sky_color();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(sky.x),
                            g: f64::from(sky.y),
                            b: f64::from(sky.z),
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            if axes_visible {
                pass.set_pipeline(&self.line_pipeline);
                pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                pass.set_vertex_buffer(0, self.axes_vertex_buffer.slice(..));
                pass.draw(0..self.axes_vertex_count, 0..1);
            }

            if let Some(terrain) = terrain {
                if terrain.index_count > 0 {
                    pass.set_pipeline(&self.terrain_pipeline);
                    pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                    pass.set_vertex_buffer(0, terrain.vertex_buffer.slice(..));
                    pass.set_vertex_buffer(1, terrain.instance_buffer.slice(..));
                    pass.set_index_buffer(terrain.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..terrain.index_count, 0, 0..1);
                }
            }

            if !instances.is_empty() {
                pass.set_pipeline(&self.world_pipeline);
                pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                pass.set_vertex_buffer(0, self.cube_vertex_buffer.slice(..));
                pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                pass.set_index_buffer(self.cube_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..self.cube_index_count, 0, 0..instances.len() as u32);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Flatten the resident world into per-cube instance data.
    fn build_instances(&self, world: &WorldGrid) -> Vec<InstanceData> {
        let scene = world.scene();
        let mut instances = Vec::new();

        for tile in world.tiles() {
            if let Some(model) = visible_world(scene, tile.node()) {
                let parity = (tile.coord().x + tile.coord().z).rem_euclid(2) as usize;
                instances.push(InstanceData::new(model * tile_shape(), TILE_COLORS[parity]));
            }
            for obstacle in tile.obstacles() {
                if let Some(model) = visible_world(scene, obstacle.node) {
                    instances.push(InstanceData::new(model * trunk_shape(), TREE_COLOR));
                }
            }
        }

        if let Some(model) = visible_world(scene, world.player().node()) {
            instances.push(InstanceData::new(model, PLAYER_COLOR));
        }

        if instances.len() > self.max_instances as usize {
            tracing::warn!(
                total = instances.len(),
                max = self.max_instances,
                "instance overflow, truncating"
            );
            instances.truncate(self.max_instances as usize);
        }
        instances
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}
