use std::{
    convert::identity,
    io::{BufReader, Cursor},
};

use crate::{
    data_structures::{
        instance::Instance,
        model::{Material, Mesh, MeshGeometry, ModelVertex},
        scene_graph::{NodeId, Scene, SceneNode},
        texture::Texture,
    },
    resources::texture::{diffuse_layout, load_binary, load_string, load_texture},
};

/**
 * This module contains all logic for loading the startup assets: the four
 * shader sources and the glTF scene binary.
 */
pub mod texture;

pub const LIT_VERTEX_SHADER: &str = "shaders/lit_vertex.wgsl";
pub const LIT_FRAGMENT_SHADER: &str = "shaders/lit_fragment.wgsl";
pub const DEPTH_VERTEX_SHADER: &str = "shaders/depth_vertex.wgsl";
pub const DEPTH_FRAGMENT_SHADER: &str = "shaders/depth_fragment.wgsl";
pub const SCENE_ASSET: &str = "environment.glb";

/// The four shader source strings the viewer is given at startup: the
/// vertex/fragment pair of the lit shader and the pair of the depth shader.
pub struct ShaderBundle {
    pub lit_vertex: String,
    pub lit_fragment: String,
    pub depth_vertex: String,
    pub depth_fragment: String,
}

/// Fetch all four shader sources. Any failure aborts startup; there is no
/// partial bundle.
pub async fn load_shader_bundle() -> anyhow::Result<ShaderBundle> {
    let (lit_vertex, lit_fragment, depth_vertex, depth_fragment) = futures::try_join!(
        load_string(LIT_VERTEX_SHADER),
        load_string(LIT_FRAGMENT_SHADER),
        load_string(DEPTH_VERTEX_SHADER),
        load_string(DEPTH_FRAGMENT_SHADER),
    )?;
    Ok(ShaderBundle {
        lit_vertex,
        lit_fragment,
        depth_vertex,
        depth_fragment,
    })
}

/// Load a binary glTF into a scene arena: materials first, then a worklist
/// walk over the node hierarchy. World transforms are not computed here;
/// the scene owner propagates them before upload.
pub async fn load_scene_gltf(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Scene> {
    let gltf_bytes = load_binary(file_name).await?;
    let gltf_cursor = Cursor::new(gltf_bytes);
    let gltf_reader = BufReader::new(gltf_cursor);
    let gltf = gltf::Gltf::from_reader(gltf_reader)?;

    // Load buffers
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                if let Some(blob) = gltf.blob.as_deref() {
                    buffer_data.push(blob.into());
                };
            }
            gltf::buffer::Source::Uri(uri) => {
                let bin = load_binary(uri).await?;
                buffer_data.push(bin);
            }
        }
    }

    // Load materials
    let layout = diffuse_layout(device);
    let mut materials = Vec::new();
    for material in gltf.materials() {
        let pbr = material.pbr_metallic_roughness();
        let diffuse_texture = match pbr.base_color_texture() {
            Some(tex) => match tex.texture().source().source() {
                gltf::image::Source::View { view, mime_type } => Texture::from_bytes(
                    device,
                    queue,
                    &buffer_data[view.buffer().index()],
                    file_name,
                    mime_type.split('/').next_back(),
                )?,
                gltf::image::Source::Uri { uri, mime_type } => {
                    load_texture(
                        uri,
                        device,
                        queue,
                        mime_type.map(|mt| mt.split('/').next_back().map_or("jpg", identity)),
                    )
                    .await?
                }
            },
            // Untextured materials render with a plain white diffuse instead
            // of requiring a second pipeline
            None => Texture::create_default_diffuse(2, 2, device, queue),
        };
        let name = material.name().unwrap_or(file_name);
        materials.push(Material::new(device, name, diffuse_texture, &layout));
    }
    if materials.is_empty() {
        let diffuse_texture = Texture::create_default_diffuse(2, 2, device, queue);
        materials.push(Material::new(device, file_name, diffuse_texture, &layout));
    }

    let mut scene = Scene::new();
    scene.materials = materials;

    // Walk the node hierarchy with an explicit worklist
    let root = scene.root();
    let mut stack: Vec<(gltf::scene::Node, NodeId)> = Vec::new();
    for gltf_scene in gltf.scenes() {
        for node in gltf_scene.nodes() {
            stack.push((node, root));
        }
    }
    let material_count = scene.materials.len();
    while let Some((node, parent)) = stack.pop() {
        let scene_node = to_scene_node(&node, &buffer_data, material_count);
        let id = scene.add_node(parent, scene_node);
        for child in node.children() {
            stack.push((child, id));
        }
    }

    Ok(scene)
}

fn to_scene_node(node: &gltf::scene::Node, buf: &[Vec<u8>], material_count: usize) -> SceneNode {
    let name = node.name().unwrap_or("unnamed_node");
    let mut scene_node = match node.mesh() {
        Some(mesh) => {
            let mesh_name = mesh.name().unwrap_or("unknown_mesh");
            let mut meshes = Vec::new();
            for primitive in mesh.primitives() {
                let reader = primitive.reader(|buffer| Some(&buf[buffer.index()]));

                let mut vertices = Vec::new();
                if let Some(vertex_attribute) = reader.read_positions() {
                    vertex_attribute.for_each(|vertex| {
                        vertices.push(ModelVertex {
                            position: vertex,
                            tex_coords: Default::default(),
                            normal: Default::default(),
                        })
                    });
                }
                if let Some(normal_attribute) = reader.read_normals() {
                    let mut normal_index = 0;
                    normal_attribute.for_each(|normal| {
                        if let Some(vertex) = vertices.get_mut(normal_index) {
                            vertex.normal = normal;
                        }
                        normal_index += 1;
                    });
                }
                if let Some(tex_coord_attribute) = reader.read_tex_coords(0).map(|v| v.into_f32()) {
                    let mut tex_coord_index = 0;
                    tex_coord_attribute.for_each(|tex_coord| {
                        if let Some(vertex) = vertices.get_mut(tex_coord_index) {
                            vertex.tex_coords = tex_coord;
                        }
                        tex_coord_index += 1;
                    });
                }

                let mut indices = Vec::new();
                if let Some(indices_raw) = reader.read_indices() {
                    indices.append(&mut indices_raw.into_u32().collect::<Vec<u32>>());
                }

                let material = primitive
                    .material()
                    .index()
                    .unwrap_or(0)
                    .min(material_count.saturating_sub(1));

                meshes.push(Mesh::new(
                    MeshGeometry::new(mesh_name, vertices, indices),
                    material,
                ));
            }
            SceneNode::mesh(name, meshes)
        }
        None => SceneNode::group(name),
    };

    let (position, rotation, scale) = node.transform().decomposed();
    scene_node.local = Instance {
        position: position.into(),
        rotation: rotation.into(),
        scale: scale.into(),
    };
    scene_node
}
