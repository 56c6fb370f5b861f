use cgmath::{Deg, InnerSpace, Point3, Vector2, Vector3};
use umbra::{
    camera::{Camera, Projection},
    data_structures::{
        model::{Mesh, MeshGeometry, ModelVertex},
        scene_graph::{Scene, SceneNode},
    },
    ray::{self, Intersection, Ray},
    shadow::ShadowCamera,
};

const EPS: f32 = 1e-3;

fn quad_geometry(name: &str, z: f32) -> MeshGeometry {
    let vertices = vec![
        ModelVertex {
            position: [-1.0, -1.0, z],
            tex_coords: [0.0, 1.0],
            normal: [0.0, 0.0, 1.0],
        },
        ModelVertex {
            position: [1.0, -1.0, z],
            tex_coords: [1.0, 1.0],
            normal: [0.0, 0.0, 1.0],
        },
        ModelVertex {
            position: [1.0, 1.0, z],
            tex_coords: [1.0, 0.0],
            normal: [0.0, 0.0, 1.0],
        },
        ModelVertex {
            position: [-1.0, 1.0, z],
            tex_coords: [0.0, 0.0],
            normal: [0.0, 0.0, 1.0],
        },
    ];
    let indices = vec![0, 1, 2, 0, 2, 3];
    MeshGeometry::new(name, vertices, indices)
}

/// Two parallel quads at z = ±0.5, like the front and back face of a box
/// centered on the origin.
fn slab_scene() -> (Scene, Vec<usize>) {
    let mut scene = Scene::new();
    let root = scene.root();
    scene.add_node(
        root,
        SceneNode::mesh(
            "slab",
            vec![
                Mesh::new(quad_geometry("front", 0.5), 0),
                Mesh::new(quad_geometry("back", -0.5), 0),
            ],
        ),
    );
    scene.update_world_transforms();
    let tracked = scene.tag_shadow_participants();
    (scene, tracked)
}

#[test]
fn ray_hits_a_triangle_straight_ahead() {
    let ray = Ray {
        origin: Point3::new(0.0, 0.0, 5.0),
        direction: Vector3::new(0.0, 0.0, -1.0),
    };
    let t = ray
        .intersect_triangle(
            Vector3::new(-1.0, -1.0, 0.0),
            Vector3::new(1.0, -1.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        )
        .expect("ray should hit the triangle");
    assert!((t - 5.0).abs() < EPS);
    assert!((ray.at(t) - Point3::new(0.0, 0.0, 0.0)).magnitude() < EPS);
}

#[test]
fn ray_misses_a_triangle_off_to_the_side() {
    let ray = Ray {
        origin: Point3::new(5.0, 0.0, 5.0),
        direction: Vector3::new(0.0, 0.0, -1.0),
    };
    assert!(
        ray.intersect_triangle(
            Vector3::new(-1.0, -1.0, 0.0),
            Vector3::new(1.0, -1.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        )
        .is_none()
    );
}

#[test]
fn selection_takes_the_farthest_hit() {
    let eye = Point3::new(0.0, 0.0, 5.0);
    let near = Intersection {
        node: 1,
        point: Point3::new(0.0, 0.0, 0.5),
        t: 4.5,
    };
    let far = Intersection {
        node: 1,
        point: Point3::new(0.0, 0.0, -0.5),
        t: 5.5,
    };
    let picked =
        ray::farthest_from(vec![near.clone(), far.clone()], eye).expect("two hits, one winner");
    // d1 > d2 implies the d1 hit wins, not the conventional nearest
    assert_eq!(picked.point, far.point);

    let picked = ray::farthest_from(vec![far.clone(), near], eye).expect("order must not matter");
    assert_eq!(picked.point, far.point);
}

#[test]
fn no_hits_yields_no_selection() {
    assert!(ray::farthest_from(Vec::new(), Point3::new(0.0, 0.0, 5.0)).is_none());
}

#[test]
fn tracked_intersection_respects_world_transforms() {
    let mut scene = Scene::new();
    let root = scene.root();
    let node = scene.add_node(
        root,
        SceneNode::mesh("quad", vec![Mesh::new(quad_geometry("quad", 0.0), 0)]),
    );
    scene.node_mut(node).local.position = Vector3::new(0.0, 0.0, -2.0);
    scene.update_world_transforms();
    let tracked = scene.tag_shadow_participants();

    let ray = Ray {
        origin: Point3::new(0.0, 0.0, 5.0),
        direction: Vector3::new(0.0, 0.0, -1.0),
    };
    let hits = ray::intersect_tracked(&ray, &scene, &tracked);
    assert!(!hits.is_empty());
    for hit in &hits {
        assert!((hit.point.z - -2.0).abs() < EPS);
    }
}

#[test]
fn centered_pointer_hits_the_slab_and_reorients_the_rig() {
    let (scene, tracked) = slab_scene();

    let mut camera = Camera::new((0.0, 0.0, 5.0), Deg(0.0), Deg(0.0));
    camera.look_at(Point3::new(0.0, 0.0, 0.0));
    let projection = Projection::new(800, 600, Deg(75.0), 0.01, 100.0);

    let ray = Ray::from_camera(&camera, &projection, Vector2::new(0.0, 0.0));
    let hits = ray::intersect_tracked(&ray, &scene, &tracked);
    assert!(!hits.is_empty(), "the centered ray must hit the slab");

    // Both faces are pierced; the farther (back) face wins.
    let picked = ray::farthest_from(hits, camera.position).unwrap();
    assert!((picked.point - Point3::new(0.0, 0.0, -0.5)).magnitude() < EPS);

    let mut rig = ShadowCamera::new((0.0, 5.0, 0.0));
    let initial_target = rig.target;
    rig.update_position(camera.position);
    rig.aim_at(picked.point);
    assert_ne!(rig.target, initial_target);
    assert!((rig.target - Point3::new(0.0, 0.0, -0.5)).magnitude() < EPS);
}

#[test]
fn pointer_in_empty_space_keeps_the_previous_aim() {
    let (scene, tracked) = slab_scene();

    let mut camera = Camera::new((0.0, 0.0, 5.0), Deg(0.0), Deg(0.0));
    camera.look_at(Point3::new(0.0, 0.0, 0.0));
    let projection = Projection::new(800, 600, Deg(75.0), 0.01, 100.0);

    let mut rig = ShadowCamera::new((0.0, 5.0, 0.0));
    rig.aim_at(Point3::new(0.3, 0.0, 0.1));
    let aimed = rig.target;

    // A corner ray passes well outside the 2x2 slab.
    let ray = Ray::from_camera(&camera, &projection, Vector2::new(0.95, 0.95));
    let hits = ray::intersect_tracked(&ray, &scene, &tracked);
    if let Some(hit) = ray::farthest_from(hits, camera.position) {
        rig.aim_at(hit.point);
    }
    assert_eq!(rig.target, aimed);
}
