use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{ModelVertex, Vertex},
        texture::Texture,
    },
    pipelines::mk_render_pipeline,
    resources::ShaderBundle,
};

/// Build the depth pipeline that populates the offscreen shadow target.
/// Minimal by design: one bind group, and a fragment output that is the
/// normalized distance to the shadow camera.
pub fn mk_depth_pipeline(
    device: &wgpu::Device,
    shaders: &ShaderBundle,
    shadow_pass_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Depth Pipeline Layout"),
        bind_group_layouts: &[shadow_pass_bind_group_layout],
        push_constant_ranges: &[],
    });

    let vertex_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Depth Vertex Shader"),
        source: wgpu::ShaderSource::Wgsl(shaders.depth_vertex.as_str().into()),
    });
    let fragment_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Depth Fragment Shader"),
        source: wgpu::ShaderSource::Wgsl(shaders.depth_fragment.as_str().into()),
    });

    mk_render_pipeline(
        device,
        &render_pipeline_layout,
        Texture::TARGET_FORMAT,
        Some(wgpu::BlendState {
            alpha: wgpu::BlendComponent::REPLACE,
            color: wgpu::BlendComponent::REPLACE,
        }),
        Some(Texture::DEPTH_FORMAT),
        &[ModelVertex::desc(), InstanceRaw::desc()],
        &vertex_shader,
        &fragment_shader,
    )
}
