use std::sync::Arc;

use anyhow::Context as _;
use cgmath::{Point3, Vector2};
use wgpu::util::DeviceExt;
use winit::{dpi::PhysicalPosition, window::Window};

use crate::{
    camera::{
        self, CameraUniform, MAIN_FOVY, MAIN_START_POSITION, MAIN_ZFAR, MAIN_ZNEAR,
        OrbitController, Projection,
    },
    data_structures::texture::Texture,
    pipelines::{
        Pipelines,
        depth::mk_depth_pipeline,
        light::{LightResources, LightUniform},
        lit::mk_lit_pipeline,
    },
    resources::ShaderBundle,
    shadow::{ShadowCamera, ShadowResources},
};

/// Orbit tuning for the primary camera.
const ORBIT_SPEED: f32 = 0.08;
const ORBIT_DAMPING: f32 = 0.1;

/// Start placement of the shadow camera, above the origin looking down.
const SHADOW_START_POSITION: (f32, f32, f32) = (0.0, 5.0, 0.0);

/// Start state of the directional light; only the x coordinate animates.
const LIGHT_START_POSITION: [f32; 3] = [-1.0, 3.0, -0.5];
const LIGHT_COLOR: [f32; 3] = [1.0, 1.0, 1.0];
const LIGHT_INTENSITY: f32 = 2.4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseButtonState {
    Left,
    Right,
    None,
}

/// Latest pointer sample: raw window coordinates, the derived normalized
/// device coordinates, and the pressed button driving the orbit.
#[derive(Clone, Debug)]
pub struct MouseState {
    pub coords: PhysicalPosition<f64>,
    pub ndc: Vector2<f32>,
    pub pressed: MouseButtonState,
}

impl MouseState {
    pub fn new() -> Self {
        Self {
            coords: PhysicalPosition::new(0.0, 0.0),
            ndc: Vector2::new(0.0, 0.0),
            pressed: MouseButtonState::None,
        }
    }

    pub fn update_ndc(&mut self, width: u32, height: u32) {
        self.ndc = to_ndc(self.coords, width, height);
    }
}

impl Default for MouseState {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert window pixel coordinates into normalized device coordinates,
/// [-1, 1] on each axis with +y up.
pub fn to_ndc(coords: PhysicalPosition<f64>, width: u32, height: u32) -> Vector2<f32> {
    Vector2::new(
        (coords.x / width.max(1) as f64 * 2.0 - 1.0) as f32,
        -(coords.y / height.max(1) as f64 * 2.0 - 1.0) as f32,
    )
}

#[derive(Debug)]
pub struct CameraResources {
    pub camera: camera::Camera,
    pub controller: OrbitController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

/// Central GPU and window context. Owns the device, the surface, both
/// cameras, the light, the shadow rig and the two pipelines — everything
/// the render loop reads that is not scene data.
#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub projection: Projection,
    pub light: LightResources,
    pub shadow: ShadowResources,
    pub pipelines: Pipelines,
    pub mouse: MouseState,
    pub clear_colour: wgpu::Color,
}

impl Context {
    pub async fn new(window: Arc<Window>, shaders: &ShaderBundle) -> anyhow::Result<Self> {
        let size = window.inner_size();

        // The instance is a handle to our GPU
        // BackendBit::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no compatible adapter")?;
        log::info!("device and queue");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        log::info!("Surface");
        let surface_caps = surface.get_capabilities(&adapter);
        // The lit shader assumes an Srgb surface texture. Using a different
        // one will result all the colors comming out darker.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let mut camera = camera::Camera::new(MAIN_START_POSITION, cgmath::Deg(0.0), cgmath::Deg(0.0));
        camera.look_at(Point3::new(0.0, 0.0, 0.0));
        let projection =
            Projection::new(config.width, config.height, MAIN_FOVY, MAIN_ZNEAR, MAIN_ZFAR);
        let mut camera_controller = OrbitController::new(ORBIT_SPEED, ORBIT_DAMPING);
        camera_controller.sync_to(&camera, Point3::new(0.0, 0.0, 0.0));

        let mut camera_uniform = CameraUniform::new();

        camera_uniform.update_view_proj(&camera, &projection);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout =
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
                label: Some("camera_bind_group_layout"),
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        let camera = CameraResources {
            camera,
            controller: camera_controller,
            uniform: camera_uniform,
            buffer: camera_buffer,
            bind_group: camera_bind_group,
            bind_group_layout: camera_bind_group_layout,
        };

        let depth_texture = Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            "depth_texture",
        );

        let light_uniform = LightUniform {
            position: LIGHT_START_POSITION,
            _padding: 0,
            color: LIGHT_COLOR,
            intensity: LIGHT_INTENSITY,
        };

        let light = LightResources::new(&device, light_uniform);

        let shadow = ShadowResources::new(&device, ShadowCamera::new(SHADOW_START_POSITION));

        let pipelines = Pipelines {
            lit: mk_lit_pipeline(
                &device,
                &config,
                shaders,
                &camera.bind_group_layout,
                &light.bind_group_layout,
                &shadow.sample_bind_group_layout,
            ),
            depth: mk_depth_pipeline(&device, shaders, &shadow.pass_bind_group_layout),
        };

        Ok(Self {
            surface,
            device,
            queue,
            config,
            camera,
            projection,
            light,
            shadow,
            pipelines,
            window,
            depth_texture,
            mouse: MouseState::new(),
            clear_colour: wgpu::Color::BLACK,
        })
    }
}
