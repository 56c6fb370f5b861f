//! The shadow rig: a second camera at the light's viewpoint plus the
//! offscreen target it renders depth into.
//!
//! [`ShadowCamera`] is pure math so the reposition/aim rules are testable
//! without a GPU; [`ShadowResources`] owns the uniform buffer, the 512²
//! offscreen target and the two bind groups — one for rendering the depth
//! pass, one for sampling the result in the lit pass.

use cgmath::{Deg, EuclideanSpace, InnerSpace, Matrix4, Point3, SquareMatrix, Vector3, perspective};
use wgpu::util::DeviceExt;

use crate::{camera::OPENGL_TO_WGPU_MATRIX, data_structures::texture::Texture};

/// Edge length of the square offscreen shadow target.
pub const SHADOW_MAP_SIZE: u32 = 512;

/// The rig pivots around the origin raised by this height.
pub const PIVOT_HEIGHT: f32 = 5.0;

/// Scale applied to the normalized pivot-to-camera direction when placing
/// the rig. Negative: the rig sits on the far side of the pivot from the
/// viewer. See DESIGN.md before changing the sign.
pub const RIG_OFFSET: f32 = -2.0;

/// Fixed frustum of the shadow camera: narrow, square, short-range.
pub const SHADOW_FOVY: Deg<f32> = Deg(35.0);
pub const SHADOW_ASPECT: f32 = 1.0;
pub const SHADOW_ZNEAR: f32 = 0.01;
pub const SHADOW_ZFAR: f32 = 30.0;

/// Camera state of the rig: a position re-derived from the primary camera
/// every frame, and an aim target that persists across frames without a
/// cursor hit.
#[derive(Clone, Debug)]
pub struct ShadowCamera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
}

impl ShadowCamera {
    pub fn new<V: Into<Point3<f32>>>(position: V) -> Self {
        Self {
            position: position.into(),
            target: Point3::origin(),
        }
    }

    pub fn pivot() -> Point3<f32> {
        Point3::new(0.0, PIVOT_HEIGHT, 0.0)
    }

    /// Reposition relative to the primary camera: a fixed-length offset
    /// from the pivot along the pivot-to-camera direction, so the rig stays
    /// in constant relative position to the viewer. A camera sitting
    /// exactly on the pivot has no direction and leaves the rig in place.
    pub fn update_position(&mut self, camera_position: Point3<f32>) {
        let pivot = Self::pivot();
        let direction = camera_position - pivot;
        if direction.magnitude2() > 0.0 {
            self.position = pivot + direction.normalize() * RIG_OFFSET;
        }
    }

    /// Aim the rig at a world-space point. Callers skip this on frames
    /// without a cursor hit, which keeps the previous target.
    pub fn aim_at(&mut self, target: Point3<f32>) {
        self.target = target;
    }

    /// View matrix toward the current target. A view direction collinear
    /// with +Y switches to an X up vector instead of degenerating.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        let forward = self.target - self.position;
        let mut up = Vector3::unit_y();
        if forward.magnitude2() > 0.0 && forward.normalize().dot(up).abs() > 0.95 {
            up = Vector3::unit_x();
        }
        Matrix4::look_at_rh(self.position, self.target, up)
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(SHADOW_FOVY, SHADOW_ASPECT, SHADOW_ZNEAR, SHADOW_ZFAR)
    }
}

/// The three custom shader inputs of the technique: the matrices that
/// reproject a fragment into the rig's clip space, the rig's world
/// position, and the far plane the stored distances are normalized by.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadowUniform {
    projection: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    position: [f32; 3],
    far: f32,
}

impl ShadowUniform {
    pub fn new() -> Self {
        Self {
            projection: Matrix4::identity().into(),
            view: Matrix4::identity().into(),
            position: [0.0; 3],
            far: SHADOW_ZFAR,
        }
    }

    pub fn update(&mut self, camera: &ShadowCamera) {
        self.projection = camera.projection_matrix().into();
        self.view = camera.view_matrix().into();
        self.position = camera.position.to_vec().into();
    }
}

impl Default for ShadowUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ShadowResources {
    pub camera: ShadowCamera,
    pub uniform: ShadowUniform,
    pub buffer: wgpu::Buffer,
    pub pass_bind_group: wgpu::BindGroup,
    pub pass_bind_group_layout: wgpu::BindGroupLayout,
    pub sample_bind_group: wgpu::BindGroup,
    pub sample_bind_group_layout: wgpu::BindGroupLayout,
    pub target: Texture,
    pub target_depth: Texture,
}

impl ShadowResources {
    pub fn new(device: &wgpu::Device, camera: ShadowCamera) -> Self {
        // The uniform is consumed before the first frame renders, so the
        // matrices are computed eagerly here.
        let mut uniform = ShadowUniform::new();
        uniform.update(&camera);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Shadow Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let target = Texture::create_render_target(
            device,
            [SHADOW_MAP_SIZE, SHADOW_MAP_SIZE],
            "shadow_target",
        );
        let target_depth = Texture::create_depth_texture(
            device,
            [SHADOW_MAP_SIZE, SHADOW_MAP_SIZE],
            "shadow_target_depth",
        );

        let pass_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("shadow_pass_bind_group_layout"),
            });

        let pass_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &pass_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("shadow_pass_bind_group"),
        });

        let sample_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
                label: Some("shadow_sample_bind_group_layout"),
            });

        let sample_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &sample_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&target.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&target.sampler),
                },
            ],
            label: Some("shadow_sample_bind_group"),
        });

        Self {
            camera,
            uniform,
            buffer,
            pass_bind_group,
            pass_bind_group_layout,
            sample_bind_group,
            sample_bind_group_layout,
            target,
            target_depth,
        }
    }

    pub fn write(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}
