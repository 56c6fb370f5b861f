use cgmath::Vector3;
use umbra::data_structures::{
    model::{Mesh, MeshGeometry, ModelVertex},
    scene_graph::{MaterialKind, Scene, SceneNode},
};

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

fn mesh_node(name: &str) -> SceneNode {
    SceneNode::mesh(name, vec![Mesh::new(quad_geometry(name, 0.0), 0)])
}

#[test]
fn tagging_collects_exactly_the_mesh_nodes() {
    let mut scene = Scene::new();
    let root = scene.root();
    let group_a = scene.add_node(root, SceneNode::group("a"));
    let mesh_b = scene.add_node(group_a, mesh_node("b"));
    let group_c = scene.add_node(group_a, SceneNode::group("c"));
    let mesh_d = scene.add_node(group_c, mesh_node("d"));
    // a deep chain of groups with a mesh at the bottom
    let mut parent = root;
    for i in 0..64 {
        parent = scene.add_node(parent, SceneNode::group(&format!("chain{}", i)));
    }
    let mesh_deep = scene.add_node(parent, mesh_node("deep"));

    let tracked = scene.tag_shadow_participants();

    assert_eq!(tracked.len(), 3);
    assert!(tracked.contains(&mesh_b));
    assert!(tracked.contains(&mesh_d));
    assert!(tracked.contains(&mesh_deep));
    assert!(!tracked.contains(&group_a));
    assert!(!tracked.contains(&group_c));
    assert!(!tracked.contains(&root));
}

#[test]
fn tagging_sets_both_shadow_flags_on_meshes_only() {
    let mut scene = Scene::new();
    let root = scene.root();
    let group = scene.add_node(root, SceneNode::group("group"));
    let mesh = scene.add_node(group, mesh_node("mesh"));

    let tracked = scene.tag_shadow_participants();

    assert_eq!(tracked, vec![mesh]);
    assert!(scene.node(mesh).cast_shadow);
    assert!(scene.node(mesh).receive_shadow);
    assert!(!scene.node(group).cast_shadow);
    assert!(!scene.node(group).receive_shadow);
}

#[test]
fn tagging_is_stable_across_repeat_runs() {
    let mut scene = Scene::new();
    let root = scene.root();
    scene.add_node(root, mesh_node("only"));

    let first = scene.tag_shadow_participants();
    let second = scene.tag_shadow_participants();

    assert_eq!(first, second);
}

#[test]
fn material_swap_covers_the_whole_tracked_set() {
    let mut scene = Scene::new();
    let root = scene.root();
    for i in 0..5 {
        scene.add_node(root, mesh_node(&format!("mesh{}", i)));
    }
    let tracked = scene.tag_shadow_participants();

    scene.set_material(&tracked, MaterialKind::Depth);
    for &id in &tracked {
        assert_eq!(
            scene.node(id).mesh_node().unwrap().material,
            MaterialKind::Depth
        );
    }

    scene.set_material(&tracked, MaterialKind::Lit);
    for &id in &tracked {
        assert_eq!(
            scene.node(id).mesh_node().unwrap().material,
            MaterialKind::Lit
        );
    }
}

#[test]
fn world_transforms_compose_down_the_hierarchy() {
    let mut scene = Scene::new();
    let root = scene.root();
    let parent = scene.add_node(root, SceneNode::group("parent"));
    let child = scene.add_node(parent, mesh_node("child"));

    scene.node_mut(parent).local.position = Vector3::new(1.0, 2.0, 3.0);
    scene.node_mut(child).local.position = Vector3::new(0.5, 0.0, -1.0);

    scene.update_world_transforms();

    let world = &scene.node(child).world;
    assert_eq!(world.position, Vector3::new(1.5, 2.0, 2.0));

    let parent_world = &scene.node(parent).world;
    assert_eq!(parent_world.position, Vector3::new(1.0, 2.0, 3.0));
}

#[test]
fn world_transforms_apply_parent_scale_to_child_offset() {
    let mut scene = Scene::new();
    let root = scene.root();
    let parent = scene.add_node(root, SceneNode::group("parent"));
    let child = scene.add_node(parent, mesh_node("child"));

    scene.node_mut(parent).local.scale = Vector3::new(2.0, 2.0, 2.0);
    scene.node_mut(child).local.position = Vector3::new(1.0, 0.0, 0.0);

    scene.update_world_transforms();

    let world = &scene.node(child).world;
    assert_eq!(world.position, Vector3::new(2.0, 0.0, 0.0));
    assert_eq!(world.scale, Vector3::new(2.0, 2.0, 2.0));
}
