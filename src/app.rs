//! Application shell and render loop.
//!
//! This module owns the winit event loop and the per-frame work. Each frame
//! follows the same fixed sequence:
//! 1. Advance the damped orbit controls and upload the camera uniform
//! 2. Re-derive the shadow camera position from the primary camera
//! 3. Cast the cursor ray against the tracked meshes
//! 4. Aim the shadow camera at the selected hit, if any
//! 5. Upload the refreshed shadow matrices
//! 6. Animate the light and upload it
//! 7. Depth pass: tracked meshes swapped to the depth material, rendered
//!    from the shadow camera into the offscreen target
//! 8. Lit pass: tracked meshes swapped back to the lit material, rendered
//!    from the primary camera to the surface
//! 9. Schedule the next frame
//!
//! Startup is async because the shader sources and the scene binary are
//! fetched resources; on WASM the initialized state is handed back to the
//! event loop through a user event.

use std::{fmt::Debug, iter, sync::Arc};

use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    context::{Context, MouseButtonState},
    data_structures::{
        scene_graph::{MaterialKind, NodeId, Scene},
        texture::Texture,
    },
    ray::{self, Ray},
    resources,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Scene-side state: the loaded arena, the cached tracked-mesh set, and the
/// clock driving the light animation.
pub struct SceneState {
    pub scene: Scene,
    pub tracked: Vec<NodeId>,
    start_time: Instant,
}

impl SceneState {
    /// Finalize a freshly loaded scene: propagate world transforms, create
    /// the GPU buffers, then tag and collect the shadow participants.
    pub fn new(mut scene: Scene, device: &wgpu::Device) -> Self {
        scene.update_world_transforms();
        scene.upload(device);
        let tracked = scene.tag_shadow_participants();
        log::info!("tracking {} shadow-casting meshes", tracked.len());
        Self {
            scene,
            tracked,
            start_time: Instant::now(),
        }
    }
}

/// Application state bundle: GPU context, scene state, and surface status.
pub struct AppState {
    pub(crate) ctx: Context,
    scene: SceneState,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>) -> Self {
        let shaders = match resources::load_shader_bundle().await {
            Ok(shaders) => shaders,
            Err(e) => panic!("App initialization failed. Cannot load shader sources: {}", e),
        };
        let ctx = match Context::new(window, &shaders).await {
            Ok(ctx) => ctx,
            Err(e) => panic!(
                "App initialization failed. Cannot create the main context: {}",
                e
            ),
        };
        let scene = match resources::load_scene_gltf(resources::SCENE_ASSET, &ctx.device, &ctx.queue)
            .await
        {
            Ok(scene) => scene,
            Err(e) => panic!("App initialization failed. Cannot load the scene: {}", e),
        };
        let scene = SceneState::new(scene, &ctx.device);
        Self {
            ctx,
            scene,
            is_surface_configured: false,
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.config.width = width;
            self.ctx.config.height = height;
            self.is_surface_configured = true;
            self.ctx.projection.resize(width, height);
            self.ctx
                .surface
                .configure(&self.ctx.device, &self.ctx.config);
            self.ctx.depth_texture = Texture::create_depth_texture(
                &self.ctx.device,
                [self.ctx.config.width, self.ctx.config.height],
                "depth_texture",
            );
        }
    }

    fn get_surface_texture(&self) -> wgpu::SurfaceTexture {
        self.ctx
            .surface
            .get_current_texture()
            .expect("Failed to create surface.")
    }

    fn render(&mut self, dt: Duration) -> Result<(), wgpu::SurfaceError> {
        // invoke main render loop
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        // Update user controls
        let camera = &mut self.ctx.camera;
        camera.controller.update(&mut camera.camera, dt);
        camera
            .uniform
            .update_view_proj(&camera.camera, &self.ctx.projection);
        self.ctx.queue.write_buffer(
            &self.ctx.camera.buffer,
            0,
            bytemuck::cast_slice(&[self.ctx.camera.uniform]),
        );

        // The rig keeps its relative position to the viewer
        let camera_position = self.ctx.camera.camera.position;
        self.ctx.shadow.camera.update_position(camera_position);

        // Aim at whatever the cursor points at; no hit keeps the old target
        let ray = Ray::from_camera(
            &self.ctx.camera.camera,
            &self.ctx.projection,
            self.ctx.mouse.ndc,
        );
        let hits = ray::intersect_tracked(&ray, &self.scene.scene, &self.scene.tracked);
        if let Some(hit) = ray::farthest_from(hits, camera_position) {
            self.ctx.shadow.camera.aim_at(hit.point);
        }

        let shadow_camera = self.ctx.shadow.camera.clone();
        self.ctx.shadow.uniform.update(&shadow_camera);
        self.ctx.shadow.write(&self.ctx.queue);

        // Update the light
        let elapsed = self.scene.start_time.elapsed().as_secs_f32();
        self.ctx.light.uniform.position[0] = elapsed.sin();
        self.ctx.queue.write_buffer(
            &self.ctx.light.buffer,
            0,
            bytemuck::cast_slice(&[self.ctx.light.uniform]),
        );

        let output = self.get_surface_texture();
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder: wgpu::CommandEncoder =
            self.ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Render Encoder"),
                });

        // Set every tracked mesh to the depth material and render the
        // shadow camera's view into the offscreen target
        self.scene
            .scene
            .set_material(&self.scene.tracked, MaterialKind::Depth);
        {
            let mut render_pass: wgpu::RenderPass<'_> =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Shadow Depth Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &self.ctx.shadow.target.view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            // white = the far plane, i.e. nothing in front
                            load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &self.ctx.shadow.target_depth.view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    occlusion_query_set: None,
                    timestamp_writes: None,
                });

            render_pass.set_pipeline(&self.ctx.pipelines.depth);
            self.scene.scene.draw_depth(
                &self.scene.tracked,
                &mut render_pass,
                &self.ctx.shadow.pass_bind_group,
            );
        }

        // Swap back to the lit material and render the visible frame
        self.scene
            .scene
            .set_material(&self.scene.tracked, MaterialKind::Lit);
        {
            let mut render_pass: wgpu::RenderPass<'_> =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &self.ctx.depth_texture.view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    occlusion_query_set: None,
                    timestamp_writes: None,
                });

            render_pass.set_pipeline(&self.ctx.pipelines.lit);
            self.scene.scene.draw_lit(
                &self.scene.tracked,
                &mut render_pass,
                &self.ctx.camera.bind_group,
                &self.ctx.light.bind_group,
                &self.ctx.shadow.sample_bind_group,
            );
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

pub(crate) enum AppEvent {
    Initialized(AppState),
}

impl Debug for AppEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(_) => f.write_str("Initialized"),
        }
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: winit::event_loop::EventLoopProxy<AppEvent>,
    state: Option<AppState>,
    last_time: Instant,
}

impl App {
    fn new(event_loop: &EventLoop<AppEvent>) -> Self {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new().unwrap();
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            state: None,
            last_time: Instant::now(),
        }
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes();

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

        let init_future = AppState::new(window);

        #[cfg(not(target_arch = "wasm32"))]
        {
            let state = self.async_runtime.block_on(init_future);
            self.state = Some(state);
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let state = init_future.await;
                assert!(proxy.send_event(AppEvent::Initialized(state)).is_ok());
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::Initialized(state) => {
                // This is the message from our wasm `spawn_local`
                self.state = Some(state);

                // Important: Trigger a resize and redraw now that we are initialized
                let state = self.state.as_mut().unwrap();
                let size = state.ctx.window.inner_size();
                state.resize(size.width, size.height);
                state.ctx.window.request_redraw();
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if let MouseButtonState::Left = state.ctx.mouse.pressed {
                state.ctx.camera.controller.handle_mouse(dx, dy);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.ctx.camera.controller.handle_window_events(&event);

        if let WindowEvent::CursorMoved {
            device_id: _,
            position,
        } = event
        {
            state.ctx.mouse.coords = position;
            state
                .ctx
                .mouse
                .update_ndc(state.ctx.config.width, state.ctx.config.height);
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                match state.render(dt) {
                    Ok(_) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => match (button, button_state.is_pressed()) {
                (MouseButton::Left, true) => state.ctx.mouse.pressed = MouseButtonState::Left,
                (MouseButton::Right, true) => state.ctx.mouse.pressed = MouseButtonState::Right,
                (_, false) => state.ctx.mouse.pressed = MouseButtonState::None,
                _ => (),
            },
            _ => {}
        }
    }
}

pub fn run() -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<AppEvent> = EventLoop::with_user_event().build()?;

    let mut app = App::new(&event_loop);

    event_loop.run_app(&mut app)?;

    Ok(())
}
