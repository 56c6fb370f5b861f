use cgmath::{Deg, InnerSpace, Point3, Vector3};
use instant::Duration;
use umbra::{
    camera::{Camera, OrbitController, Projection},
    context::to_ndc,
};
use winit::dpi::PhysicalPosition;

const EPS: f32 = 1e-4;

#[test]
fn resize_tracks_the_viewport_aspect_ratio() {
    let mut projection = Projection::new(800, 600, Deg(75.0), 0.01, 100.0);
    assert!((projection.aspect - 800.0 / 600.0).abs() < EPS);

    projection.resize(1920, 1080);
    assert!((projection.aspect - 1920.0 / 1080.0).abs() < EPS);

    projection.resize(333, 777);
    assert!((projection.aspect - 333.0 / 777.0).abs() < EPS);

    // A zero-height window must not divide by zero.
    projection.resize(640, 0);
    assert!(projection.aspect.is_finite());
}

#[test]
fn look_at_points_the_camera_at_the_target() {
    let mut camera = Camera::new((-5.0, 5.0, 5.0), Deg(0.0), Deg(0.0));
    camera.look_at(Point3::new(0.0, 0.0, 0.0));

    let expected = (Point3::new(0.0, 0.0, 0.0) - camera.position).normalize();
    assert!((camera.forward() - expected).magnitude() < EPS);
}

#[test]
fn look_at_tolerates_a_target_on_the_camera() {
    let mut camera = Camera::new((1.0, 2.0, 3.0), Deg(30.0), Deg(-10.0));
    let forward_before = camera.forward();
    camera.look_at(Point3::new(1.0, 2.0, 3.0));
    assert!((camera.forward() - forward_before).magnitude() < EPS);
}

#[test]
fn pointer_coordinates_normalize_to_the_symmetric_range() {
    // center of an 800x600 window
    let ndc = to_ndc(PhysicalPosition::new(400.0, 300.0), 800, 600);
    assert!(ndc.x.abs() < EPS);
    assert!(ndc.y.abs() < EPS);

    // top-left corner is (-1, 1): x left, y up
    let ndc = to_ndc(PhysicalPosition::new(0.0, 0.0), 800, 600);
    assert!((ndc.x - -1.0).abs() < EPS);
    assert!((ndc.y - 1.0).abs() < EPS);

    // bottom-right corner is (1, -1)
    let ndc = to_ndc(PhysicalPosition::new(800.0, 600.0), 800, 600);
    assert!((ndc.x - 1.0).abs() < EPS);
    assert!((ndc.y - -1.0).abs() < EPS);
}

#[test]
fn orbit_keeps_the_camera_distance_while_rotating() {
    let mut camera = Camera::new((-5.0, 5.0, 5.0), Deg(0.0), Deg(0.0));
    camera.look_at(Point3::new(0.0, 0.0, 0.0));
    let target = Point3::new(0.0, 0.0, 0.0);
    let radius = (camera.position - target).magnitude();

    let mut controller = OrbitController::new(0.08, 0.1);
    controller.sync_to(&camera, target);

    controller.handle_mouse(40.0, -15.0);
    for _ in 0..120 {
        controller.update(&mut camera, Duration::from_millis(16));
    }

    assert!(
        ((camera.position - target).magnitude() - radius).abs() < 1e-2,
        "dragging must orbit, not dolly"
    );
    // and the camera still faces the target
    let expected = (target - camera.position).normalize();
    assert!((camera.forward() - expected).magnitude() < 1e-3);
}

#[test]
fn orbit_sync_reproduces_the_camera_placement() {
    let mut camera = Camera::new((-5.0, 5.0, 5.0), Deg(0.0), Deg(0.0));
    camera.look_at(Point3::new(0.0, 0.0, 0.0));
    let before = camera.position;

    let mut controller = OrbitController::new(0.08, 0.1);
    controller.sync_to(&camera, Point3::new(0.0, 0.0, 0.0));
    // no input: updating must hold the camera (damping only bleeds
    // velocities that do not exist yet)
    controller.update(&mut camera, Duration::from_millis(16));

    assert!((camera.position - before).magnitude() < 1e-3);
}

#[test]
fn orbit_velocity_decays_to_rest() {
    let mut camera = Camera::new((-5.0, 5.0, 5.0), Deg(0.0), Deg(0.0));
    camera.look_at(Point3::new(0.0, 0.0, 0.0));
    let mut controller = OrbitController::new(0.08, 0.1);
    controller.sync_to(&camera, Point3::new(0.0, 0.0, 0.0));

    controller.handle_mouse(25.0, 10.0);
    for _ in 0..600 {
        controller.update(&mut camera, Duration::from_millis(16));
    }
    let settled = camera.position;
    for _ in 0..10 {
        controller.update(&mut camera, Duration::from_millis(16));
    }
    assert!(
        (camera.position - settled).magnitude() < 1e-3,
        "the orbit must come to rest after input stops"
    );
}

#[test]
fn forward_vector_is_unit_length() {
    let camera = Camera::new((0.0, 0.0, 0.0), Deg(123.0), Deg(-45.0));
    assert!((camera.forward().magnitude() - 1.0).abs() < EPS);
    let up_ish = Vector3::unit_y();
    // pitch below the pole keeps forward and up independent
    assert!(camera.forward().dot(up_ish).abs() < 1.0 - EPS);
}
