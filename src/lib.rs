//! umbra
//!
//! A single-scene projected-shadow viewer for native windows and browser
//! canvases. A second camera renders the scene's depth into an offscreen
//! texture every frame, and the lit shader samples that texture to project
//! shadows from a light rig that follows the object under the cursor.
//!
//! High-level modules
//! - `app`: the winit event loop, startup sequencing and the render loop
//! - `camera`: primary camera, projection, uniform and orbit controller
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: scene arena, meshes, materials, textures, instances
//! - `pipelines`: the lit and depth render pipelines
//! - `ray`: cursor ray casting against the tracked meshes
//! - `resources`: shader and glTF asset loading (fetch on the web, fs natively)
//! - `shadow`: the shadow rig and its offscreen target
//!

pub mod app;
pub mod camera;
pub mod context;
pub mod data_structures;
pub mod pipelines;
pub mod ray;
pub mod resources;
pub mod shadow;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use wgpu::*;
pub use winit::dpi::PhysicalPosition;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;

pub use app::run;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    if let Err(e) = run() {
        log::error!("{}", e);
    }
}
