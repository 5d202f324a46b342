//! Forward Renderer
//!
//! A single-pass forward renderer for the 3D overlay. Visible meshes are
//! culled against the scene graph's effective visibility, split into opaque
//! and transparent lists, and drawn in one render pass over a transparent
//! clear so the video background shows through.

use std::sync::Arc;

use glam::{Mat4, Vec3, Vec4};
use rustc_hash::FxHashMap;
use uuid::Uuid;
use wgpu::util::DeviceExt;

use crate::assets::AssetServer;
use crate::errors::Result;
use crate::renderer::context::WgpuContext;
use crate::renderer::SceneRenderer;
use crate::resources::geometry::Geometry;
use crate::scene::light::LightKind;
use crate::scene::Scene;

/// Dynamic-offset slot stride; covers the 256-byte alignment requirement.
const DRAW_STRIDE: u64 = 256;
const INITIAL_DRAW_CAPACITY: u32 = 64;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct GlobalUniforms {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    light_dir: [f32; 4],
    light_color: [f32; 4],
    hemi_sky: [f32; 4],
    hemi_ground: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct DrawUniforms {
    model: [[f32; 4]; 4],
    color: [f32; 4],
    params: [f32; 4],
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    transparent: bool,
    double_sided: bool,
}

struct GpuGeometry {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

struct DrawCall {
    geometry_uuid: Uuid,
    uniforms: DrawUniforms,
    key: PipelineKey,
    depth: f32,
}

pub struct ForwardRenderer {
    pub context: WgpuContext,

    shader: wgpu::ShaderModule,
    draw_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: FxHashMap<PipelineKey, wgpu::RenderPipeline>,

    global_buffer: wgpu::Buffer,
    global_bind_group: wgpu::BindGroup,

    draw_buffer: wgpu::Buffer,
    draw_bind_group: wgpu::BindGroup,
    draw_capacity: u32,

    geometry_cache: FxHashMap<Uuid, GpuGeometry>,
}

impl ForwardRenderer {
    pub fn new(context: WgpuContext) -> Self {
        let device = &context.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Forward Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let global_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Global Uniforms Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<GlobalUniforms>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Draw Uniforms Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<DrawUniforms>() as u64
                    ),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Forward Pipeline Layout"),
            bind_group_layouts: &[Some(&global_layout), Some(&draw_layout)],
            immediate_size: 0,
        });

        let global_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Global Uniforms"),
            size: std::mem::size_of::<GlobalUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let global_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Global Bind Group"),
            layout: &global_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: global_buffer.as_entire_binding(),
            }],
        });

        let (draw_buffer, draw_bind_group) =
            Self::create_draw_buffer(device, &draw_layout, INITIAL_DRAW_CAPACITY);

        Self {
            context,
            shader,
            draw_layout,
            pipeline_layout,
            pipelines: FxHashMap::default(),
            global_buffer,
            global_bind_group,
            draw_buffer,
            draw_bind_group,
            draw_capacity: INITIAL_DRAW_CAPACITY,
            geometry_cache: FxHashMap::default(),
        }
    }

    fn create_draw_buffer(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        capacity: u32,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw Uniforms"),
            size: u64::from(capacity) * DRAW_STRIDE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<DrawUniforms>() as u64),
                }),
            }],
        });

        (buffer, bind_group)
    }

    fn pipeline_for(&mut self, key: PipelineKey) -> &wgpu::RenderPipeline {
        if !self.pipelines.contains_key(&key) {
            let pipeline = self.create_pipeline(key);
            self.pipelines.insert(key, pipeline);
        }
        &self.pipelines[&key]
    }

    fn create_pipeline(&self, key: PipelineKey) -> wgpu::RenderPipeline {
        let vertex_layout = wgpu::VertexBufferLayout {
            array_stride: 24,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 0,
                    shader_location: 0,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 12,
                    shader_location: 1,
                },
            ],
        };

        let blend = if key.transparent {
            Some(wgpu::BlendState::ALPHA_BLENDING)
        } else {
            Some(wgpu::BlendState::REPLACE)
        };

        self.context
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Forward Pipeline"),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &self.shader,
                    entry_point: Some("vs_main"),
                    buffers: &[vertex_layout],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &self.shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.context.color_format(),
                        blend,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    cull_mode: if key.double_sided {
                        None
                    } else {
                        Some(wgpu::Face::Back)
                    },
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: self.context.depth_format,
                    // Transparent draws test but do not write depth.
                    depth_write_enabled: Some(!key.transparent),
                    depth_compare: Some(wgpu::CompareFunction::Less),
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
    }

    fn upload_geometry(&mut self, geometry: &Arc<Geometry>) {
        if self.geometry_cache.contains_key(&geometry.uuid) {
            return;
        }

        let vertex_count = geometry.positions.len();
        let mut vertices: Vec<f32> = Vec::with_capacity(vertex_count * 6);
        for (i, pos) in geometry.positions.iter().enumerate() {
            vertices.extend_from_slice(pos);
            match geometry.normals.get(i) {
                Some(n) => vertices.extend_from_slice(n),
                None => vertices.extend_from_slice(&[0.0, 0.0, 0.0]),
            }
        }

        let device = &self.context.device;
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertices", geometry.name)),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Indices", geometry.name)),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        self.geometry_cache.insert(
            geometry.uuid,
            GpuGeometry {
                vertex_buffer,
                index_buffer,
                index_count: geometry.index_count(),
            },
        );
    }

    fn build_global_uniforms(scene: &Scene, view_proj: Mat4, camera_pos: Vec3) -> GlobalUniforms {
        let mut globals = GlobalUniforms {
            view_proj: view_proj.to_cols_array_2d(),
            camera_pos: camera_pos.extend(1.0).to_array(),
            light_dir: [0.0, -1.0, 0.0, 0.0],
            light_color: [1.0, 1.0, 1.0, 1.0],
            hemi_sky: [0.0, 0.0, 0.0, 0.0],
            hemi_ground: [0.0, 0.0, 0.0, 0.0],
        };

        for (light, world_matrix) in scene.iter_active_lights() {
            match &light.kind {
                LightKind::Directional(_) => {
                    let dir = world_matrix.transform_vector3(-Vec3::Z).normalize();
                    globals.light_dir = dir.extend(light.intensity).to_array();
                    globals.light_color = light.color.extend(1.0).to_array();
                }
                LightKind::Hemisphere(hemi) => {
                    globals.hemi_sky = light.color.extend(light.intensity).to_array();
                    globals.hemi_ground = hemi.ground_color.extend(1.0).to_array();
                }
                LightKind::Point(_) => {
                    // Point lights are not part of the forward shader yet.
                }
            }
        }

        globals
    }
}

impl SceneRenderer for ForwardRenderer {
    fn render(&mut self, scene: &Scene, assets: &AssetServer) -> Result<()> {
        let Some(camera_node) = scene.active_camera else {
            log::warn!("No active camera, skipping frame");
            return Ok(());
        };
        let Some(camera) = scene
            .get_node(camera_node)
            .and_then(|n| n.camera)
            .and_then(|key| scene.cameras.get(key))
        else {
            log::warn!("Active camera node has no camera component");
            return Ok(());
        };

        let view_proj = camera.view_projection_matrix();
        let view_matrix = camera.view_matrix;
        let camera_pos = camera.world_matrix.translation.into();

        // Gather draw calls from effectively visible meshes.
        let mut opaque: Vec<DrawCall> = Vec::new();
        let mut transparent: Vec<DrawCall> = Vec::new();

        for (mesh_key, world_matrix) in scene.visible_mesh_instances() {
            let Some(mesh) = scene.meshes.get(mesh_key) else {
                continue;
            };
            let Some(geometry) = assets.get_geometry(mesh.geometry) else {
                log::warn!("Mesh '{}' references missing geometry", mesh.name);
                continue;
            };
            let Some(material) = assets.get_material(mesh.material) else {
                log::warn!("Mesh '{}' references missing material", mesh.name);
                continue;
            };

            if geometry.indices.is_empty() {
                continue;
            }

            // Sphere-vs-frustum cull in world space. A geometry without a
            // computed bounding box has an infinite sphere and always draws.
            let (local_center, local_radius) = geometry.bounding_box.bounding_sphere();
            if local_radius.is_finite() {
                let center = world_matrix.transform_point3(local_center);
                let scale = world_matrix
                    .matrix3
                    .x_axis
                    .length()
                    .max(world_matrix.matrix3.y_axis.length())
                    .max(world_matrix.matrix3.z_axis.length());
                if !camera.frustum().intersects_sphere(center, local_radius * scale) {
                    continue;
                }
            }

            self.upload_geometry(&geometry);

            let model = Mat4::from(world_matrix);
            let depth = (view_matrix * world_matrix.translation.extend(1.0)).z;

            let call = DrawCall {
                geometry_uuid: geometry.uuid,
                uniforms: DrawUniforms {
                    model: model.to_cols_array_2d(),
                    color: material.color.to_array(),
                    params: Vec4::new(
                        material.opacity,
                        if material.unlit { 1.0 } else { 0.0 },
                        0.0,
                        0.0,
                    )
                    .to_array(),
                },
                key: PipelineKey {
                    transparent: material.transparent,
                    double_sided: material.double_sided,
                },
                depth,
            };

            if material.transparent {
                transparent.push(call);
            } else {
                opaque.push(call);
            }
        }

        // Transparent draws go back to front. View-space depth is negative
        // in front of the camera, so ascending order is farthest first.
        transparent.sort_by(|a, b| a.depth.partial_cmp(&b.depth).unwrap_or(std::cmp::Ordering::Equal));

        let draws: Vec<DrawCall> = opaque.into_iter().chain(transparent).collect();

        // Ensure dynamic uniform capacity.
        let needed = draws.len() as u32;
        if needed > self.draw_capacity {
            let capacity = needed.next_power_of_two();
            let (buffer, bind_group) =
                Self::create_draw_buffer(&self.context.device, &self.draw_layout, capacity);
            self.draw_buffer = buffer;
            self.draw_bind_group = bind_group;
            self.draw_capacity = capacity;
        }

        let globals = Self::build_global_uniforms(scene, view_proj, camera_pos);
        self.context
            .queue
            .write_buffer(&self.global_buffer, 0, bytemuck::bytes_of(&globals));

        if !draws.is_empty() {
            let mut staging = vec![0u8; draws.len() * DRAW_STRIDE as usize];
            for (i, call) in draws.iter().enumerate() {
                let offset = i * DRAW_STRIDE as usize;
                let bytes = bytemuck::bytes_of(&call.uniforms);
                staging[offset..offset + bytes.len()].copy_from_slice(bytes);
            }
            self.context.queue.write_buffer(&self.draw_buffer, 0, &staging);
        }

        // Pre-create pipelines outside the pass to keep the borrows simple.
        for call in &draws {
            self.pipeline_for(call.key);
        }

        let output = match self.context.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(output)
            | wgpu::CurrentSurfaceTexture::Suboptimal(output) => output,
            // Lost or outdated surfaces get reconfigured by resize
            // handling; just drop the frame.
            _ => {
                log::warn!("Surface texture unavailable, skipping frame");
                return Ok(());
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let clear_color = scene.background.map_or(self.context.clear_color, |bg| {
            wgpu::Color {
                r: f64::from(bg.x),
                g: f64::from(bg.y),
                b: f64::from(bg.z),
                a: f64::from(bg.w),
            }
        });

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Render Encoder"),
                });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.context.depth_texture_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            pass.set_bind_group(0, &self.global_bind_group, &[]);

            for (i, call) in draws.iter().enumerate() {
                let Some(gpu_geometry) = self.geometry_cache.get(&call.geometry_uuid) else {
                    continue;
                };

                pass.set_pipeline(&self.pipelines[&call.key]);
                let offset = (i as u64 * DRAW_STRIDE) as u32;
                pass.set_bind_group(1, &self.draw_bind_group, &[offset]);
                pass.set_vertex_buffer(0, gpu_geometry.vertex_buffer.slice(..));
                pass.set_index_buffer(
                    gpu_geometry.index_buffer.slice(..),
                    wgpu::IndexFormat::Uint32,
                );
                pass.draw_indexed(0..gpu_geometry.index_count, 0, 0..1);
            }
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.context.resize(width, height);
    }

    fn size(&self) -> (u32, u32) {
        self.context.size()
    }
}
