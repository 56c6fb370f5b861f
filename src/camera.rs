//! Camera, projection and the damped orbit controller.
//!
//! The camera is a position plus yaw/pitch pair; the projection is kept
//! separate so a resize only touches the aspect ratio. The orbit controller
//! replays the user-controls collaborator of this system: it circles a
//! fixed target with inertial damping, driven by mouse drag and wheel zoom,
//! and is advanced once at the start of every frame.

use cgmath::{Deg, EuclideanSpace, InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use instant::Duration;
use winit::event::{MouseScrollDelta, WindowEvent};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// The orbit radius never collapses below this, keeping the view matrix
/// invertible.
const MIN_ORBIT_DISTANCE: f32 = 0.05;

#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
}

impl Camera {
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
        }
    }

    pub fn forward(&self) -> Vector3<f32> {
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        Vector3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw).normalize()
    }

    /// Point the camera at a world-space target. A target on top of the
    /// camera leaves the orientation as it was.
    pub fn look_at(&mut self, target: Point3<f32>) {
        let direction = target - self.position;
        if direction.magnitude2() > 0.0 {
            let direction = direction.normalize();
            self.yaw = Rad(direction.z.atan2(direction.x));
            self.pitch = Rad(direction.y.asin());
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.forward(), Vector3::unit_y())
    }
}

#[derive(Clone, Debug)]
pub struct Projection {
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// View/projection state uploaded to the shaders once per frame.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Damped orbit around a fixed target.
///
/// Mouse drag feeds angular velocity, the wheel feeds zoom velocity, and
/// both decay exponentially so the camera keeps gliding briefly after the
/// input stops.
#[derive(Clone, Debug)]
pub struct OrbitController {
    target: Point3<f32>,
    distance: f32,
    yaw: Rad<f32>,
    pitch: Rad<f32>,
    yaw_velocity: f32,
    pitch_velocity: f32,
    zoom_velocity: f32,
    speed: f32,
    damping: f32,
}

impl OrbitController {
    pub fn new(speed: f32, damping: f32) -> Self {
        Self {
            target: Point3::origin(),
            distance: 1.0,
            yaw: Rad(0.0),
            pitch: Rad(0.0),
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
            zoom_velocity: 0.0,
            speed,
            damping,
        }
    }

    pub fn target(&self) -> Point3<f32> {
        self.target
    }

    /// Adopt the camera's current placement as the orbit state.
    pub fn sync_to(&mut self, camera: &Camera, target: Point3<f32>) {
        let offset = camera.position - target;
        self.target = target;
        self.distance = offset.magnitude().max(MIN_ORBIT_DISTANCE);
        self.yaw = Rad(offset.z.atan2(offset.x));
        self.pitch = Rad((offset.y / self.distance).clamp(-1.0, 1.0).asin());
    }

    pub fn handle_mouse(&mut self, mouse_dx: f64, mouse_dy: f64) {
        self.yaw_velocity += mouse_dx as f32 * self.speed;
        self.pitch_velocity += mouse_dy as f32 * self.speed;
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        if let WindowEvent::MouseWheel { delta, .. } = event {
            self.zoom_velocity += match delta {
                MouseScrollDelta::LineDelta(_, scroll) => *scroll,
                MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
            };
        }
    }

    /// Advance the orbit by one frame and write the result into `camera`.
    pub fn update(&mut self, camera: &mut Camera, dt: Duration) {
        let dt = dt.as_secs_f32();

        self.yaw += Rad(self.yaw_velocity * dt);
        self.pitch += Rad(self.pitch_velocity * dt);
        // stop short of the poles, the up vector is fixed
        let limit = std::f32::consts::FRAC_PI_2 - 0.01;
        self.pitch = Rad(self.pitch.0.clamp(-limit, limit));
        self.distance = (self.distance * (1.0 - self.zoom_velocity * dt)).max(MIN_ORBIT_DISTANCE);

        let decay = (1.0 - self.damping).powf(dt * 60.0);
        self.yaw_velocity *= decay;
        self.pitch_velocity *= decay;
        self.zoom_velocity *= decay;

        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        camera.position = self.target
            + Vector3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw) * self.distance;
        camera.look_at(self.target);
    }
}

/// Frustum of the primary view.
pub const MAIN_FOVY: Deg<f32> = Deg(75.0);
pub const MAIN_ZNEAR: f32 = 0.01;
pub const MAIN_ZFAR: f32 = 100.0;
/// Start placement of the primary camera, looking at the origin.
pub const MAIN_START_POSITION: (f32, f32, f32) = (-5.0, 5.0, 5.0);
