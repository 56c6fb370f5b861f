//! Scene graph arena and traversal.
//!
//! The scene is a flat arena of nodes linked by child indices. A node is
//! either a plain group or a mesh, decided once at load time and carried as
//! a tagged variant, so the render loop never needs a runtime type test.
//! All traversals use an explicit worklist stack; scene depth is bounded by
//! the stack allocation, not the call stack.

use log::warn;
use wgpu::util::DeviceExt;

use crate::data_structures::{
    instance::Instance,
    model::{DrawMesh, Material, Mesh},
};

pub type NodeId = usize;

/// Which of the two shared pipelines a mesh is currently assigned to.
///
/// The render loop swaps the whole tracked set to `Depth` before the shadow
/// pass and back to `Lit` before the visible pass. A mesh left in the wrong
/// state is skipped by the pass that does not own it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterialKind {
    Depth,
    Lit,
}

/// Mesh payload of a scene node: its primitives, the current material
/// assignment and the single-entry instance buffer holding the node's world
/// transform.
#[derive(Debug)]
pub struct MeshNode {
    pub meshes: Vec<Mesh>,
    pub material: MaterialKind,
    pub instance_buffer: Option<wgpu::Buffer>,
}

impl MeshNode {
    pub fn new(meshes: Vec<Mesh>) -> Self {
        Self {
            meshes,
            material: MaterialKind::Lit,
            instance_buffer: None,
        }
    }
}

#[derive(Debug)]
pub enum NodeKind {
    Group,
    Mesh(MeshNode),
}

#[derive(Debug)]
pub struct SceneNode {
    pub name: String,
    pub kind: NodeKind,
    pub local: Instance,
    pub world: Instance,
    pub children: Vec<NodeId>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl SceneNode {
    pub fn group(name: &str) -> Self {
        Self::with_kind(name, NodeKind::Group)
    }

    pub fn mesh(name: &str, meshes: Vec<Mesh>) -> Self {
        Self::with_kind(name, NodeKind::Mesh(MeshNode::new(meshes)))
    }

    fn with_kind(name: &str, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            local: Instance::default(),
            world: Instance::default(),
            children: Vec::new(),
            cast_shadow: false,
            receive_shadow: false,
        }
    }

    /// Explicit capability query, decided at load time.
    pub fn is_mesh(&self) -> bool {
        matches!(self.kind, NodeKind::Mesh(_))
    }

    pub fn mesh_node(&self) -> Option<&MeshNode> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            NodeKind::Group => None,
        }
    }

    pub fn mesh_node_mut(&mut self) -> Option<&mut MeshNode> {
        match &mut self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            NodeKind::Group => None,
        }
    }
}

/// The scene arena. Node 0 is the root group; materials are shared across
/// all meshes and referenced by index.
pub struct Scene {
    nodes: Vec<SceneNode>,
    pub materials: Vec<Material>,
    root: NodeId,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            nodes: vec![SceneNode::group("root")],
            materials: Vec::new(),
            root: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &SceneNode {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut SceneNode {
        &mut self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Insert `node` as the last child of `parent` and return its id.
    pub fn add_node(&mut self, parent: NodeId, node: SceneNode) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(node);
        self.nodes[parent].children.push(id);
        id
    }

    /// Walk the whole graph depth-first and mark every mesh node as a
    /// shadow participant, collecting the tracked-mesh set.
    ///
    /// Runs once at setup; the returned set is never resized afterwards.
    /// The walk recurses into children regardless of node kind, via an
    /// explicit stack.
    pub fn tag_shadow_participants(&mut self) -> Vec<NodeId> {
        let mut tracked = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = &mut self.nodes[id];
            if node.is_mesh() {
                node.cast_shadow = true;
                node.receive_shadow = true;
                tracked.push(id);
            }
            // reversed so the pop order matches child order
            for &child in self.nodes[id].children.iter().rev() {
                stack.push(child);
            }
        }
        tracked
    }

    /// Propagate world transforms from the root down, `world = parent * local`.
    pub fn update_world_transforms(&mut self) {
        let mut stack: Vec<(NodeId, Instance)> = vec![(self.root, Instance::default())];
        while let Some((id, parent_world)) = stack.pop() {
            let world = &parent_world * &self.nodes[id].local;
            self.nodes[id].world = world.clone();
            for &child in self.nodes[id].children.iter() {
                stack.push((child, world.clone()));
            }
        }
    }

    /// Assign `kind` to every tracked mesh. The two pipelines behind the
    /// kinds are shared; nothing is cloned per mesh.
    pub fn set_material(&mut self, tracked: &[NodeId], kind: MaterialKind) {
        for &id in tracked {
            if let Some(mesh) = self.nodes[id].mesh_node_mut() {
                mesh.material = kind;
            }
        }
    }

    /// Create the GPU buffers for every mesh node. World transforms must be
    /// up to date since the instance buffers are built from them.
    pub fn upload(&mut self, device: &wgpu::Device) {
        for node in self.nodes.iter_mut() {
            let raw = [node.world.to_raw()];
            if let NodeKind::Mesh(mesh_node) = &mut node.kind {
                mesh_node.instance_buffer =
                    Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Instance Buffer"),
                        contents: bytemuck::cast_slice(&raw),
                        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    }));
                for mesh in mesh_node.meshes.iter_mut() {
                    mesh.upload(device);
                }
            }
        }
    }

    /// Draw every tracked mesh currently assigned to the lit material.
    pub fn draw_lit<'a, 'b>(
        &'a self,
        tracked: &[NodeId],
        render_pass: &'b mut wgpu::RenderPass<'a>,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
        shadow_bind_group: &'a wgpu::BindGroup,
    ) where
        'a: 'b,
    {
        for &id in tracked {
            let mesh_node = match self.nodes[id].mesh_node() {
                Some(mesh_node) if mesh_node.material == MaterialKind::Lit => mesh_node,
                _ => continue,
            };
            let instances = match mesh_node.instance_buffer.as_ref() {
                Some(instances) => instances,
                None => {
                    warn!("you attempted to render node {} before upload", id);
                    continue;
                }
            };
            render_pass.set_vertex_buffer(1, instances.slice(..));
            for mesh in &mesh_node.meshes {
                if let Some(gpu) = mesh.gpu.as_ref() {
                    let material = &self.materials[mesh.material];
                    render_pass.draw_mesh_lit(
                        gpu,
                        material,
                        0..1,
                        camera_bind_group,
                        light_bind_group,
                        shadow_bind_group,
                    );
                }
            }
        }
    }

    /// Draw every tracked mesh currently assigned to the depth material.
    pub fn draw_depth<'a, 'b>(
        &'a self,
        tracked: &[NodeId],
        render_pass: &'b mut wgpu::RenderPass<'a>,
        shadow_bind_group: &'a wgpu::BindGroup,
    ) where
        'a: 'b,
    {
        for &id in tracked {
            let mesh_node = match self.nodes[id].mesh_node() {
                Some(mesh_node) if mesh_node.material == MaterialKind::Depth => mesh_node,
                _ => continue,
            };
            let instances = match mesh_node.instance_buffer.as_ref() {
                Some(instances) => instances,
                None => {
                    warn!("you attempted to render node {} before upload", id);
                    continue;
                }
            };
            render_pass.set_vertex_buffer(1, instances.slice(..));
            for mesh in &mesh_node.meshes {
                if let Some(gpu) = mesh.gpu.as_ref() {
                    render_pass.draw_mesh_depth(gpu, 0..1, shadow_bind_group);
                }
            }
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
