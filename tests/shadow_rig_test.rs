use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3};
use umbra::shadow::{PIVOT_HEIGHT, RIG_OFFSET, ShadowCamera};

const EPS: f32 = 1e-4;

fn distance(a: Point3<f32>, b: Point3<f32>) -> f32 {
    (a - b).magnitude()
}

#[test]
fn rig_sits_at_fixed_distance_from_the_pivot() {
    let pivot = ShadowCamera::pivot();
    let camera_positions = [
        Point3::new(-5.0, 5.0, 5.0),
        Point3::new(12.0, 0.0, 0.0),
        Point3::new(0.0, 20.0, 0.0),
        Point3::new(-3.0, -7.0, 1.5),
        Point3::new(0.001, 5.0, 0.0),
    ];

    for camera_position in camera_positions {
        let mut rig = ShadowCamera::new((0.0, 5.0, 0.0));
        rig.update_position(camera_position);
        assert!(
            (distance(rig.position, pivot) - RIG_OFFSET.abs()).abs() < EPS,
            "camera at {:?} put the rig at {:?}",
            camera_position,
            rig.position
        );
    }
}

#[test]
fn rig_lands_on_the_far_side_of_the_pivot() {
    // The offset scale is negative, so the rig ends up opposite the viewer.
    let mut rig = ShadowCamera::new((0.0, 5.0, 0.0));
    rig.update_position(Point3::new(0.0, PIVOT_HEIGHT + 3.0, 0.0));
    assert!(distance(rig.position, Point3::new(0.0, PIVOT_HEIGHT - 2.0, 0.0)) < EPS);

    rig.update_position(Point3::new(4.0, PIVOT_HEIGHT, 0.0));
    assert!(distance(rig.position, Point3::new(-2.0, PIVOT_HEIGHT, 0.0)) < EPS);
}

#[test]
fn camera_on_the_pivot_leaves_the_rig_in_place() {
    let mut rig = ShadowCamera::new((0.0, 5.0, 0.0));
    let before = rig.position;
    rig.update_position(ShadowCamera::pivot());
    assert_eq!(rig.position, before);
}

#[test]
fn aim_target_persists_until_the_next_aim() {
    let mut rig = ShadowCamera::new((0.0, 5.0, 0.0));
    rig.aim_at(Point3::new(1.0, 0.0, -2.0));
    let aimed = rig.target;

    // Frames without a cursor hit never call aim_at; reposition alone must
    // not disturb the target.
    rig.update_position(Point3::new(8.0, 1.0, -3.0));
    rig.update_position(Point3::new(-2.0, 9.0, 4.0));
    assert_eq!(rig.target, aimed);
}

#[test]
fn looking_straight_down_produces_a_finite_view_matrix() {
    // Initial rig placement: above the origin, looking down. Collinear with
    // the default up vector, which must not degenerate into NaNs.
    let rig = ShadowCamera::new((0.0, 5.0, 0.0));
    let view: Matrix4<f32> = rig.view_matrix();
    let flat: [[f32; 4]; 4] = view.into();
    for column in flat.iter() {
        for value in column.iter() {
            assert!(value.is_finite(), "view matrix contains {}", value);
        }
    }
    // The pivot-height point on the ground plane maps in front of the camera.
    let eye_space = view * Point3::new(0.0, 0.0, 0.0).to_homogeneous();
    assert!(eye_space.z < 0.0);
}

#[test]
fn projection_matrix_is_finite_and_constant() {
    let rig = ShadowCamera::new((0.0, 5.0, 0.0));
    let a: [[f32; 4]; 4] = rig.projection_matrix().into();
    let mut moved = rig.clone();
    moved.update_position(Point3::new(3.0, 3.0, 3.0));
    moved.aim_at(Point3::new(1.0, 0.0, 1.0));
    let b: [[f32; 4]; 4] = moved.projection_matrix().into();
    assert_eq!(a, b);
    for column in a.iter() {
        for value in column.iter() {
            assert!(value.is_finite());
        }
    }
}
