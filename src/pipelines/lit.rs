use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{ModelVertex, Vertex},
        texture::Texture,
    },
    pipelines::mk_render_pipeline,
    resources::{ShaderBundle, texture::diffuse_layout},
};

/// Build the lit pipeline: a Blinn-Phong base extended with the shadow
/// sample group, so the fragment shader can reproject each fragment into
/// the shadow camera's clip space and test occlusion.
pub fn mk_lit_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    shaders: &ShaderBundle,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    light_bind_group_layout: &wgpu::BindGroupLayout,
    shadow_sample_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Lit Pipeline Layout"),
        bind_group_layouts: &[
            &diffuse_layout(device),
            camera_bind_group_layout,
            light_bind_group_layout,
            shadow_sample_bind_group_layout,
        ],
        push_constant_ranges: &[],
    });

    let vertex_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Lit Vertex Shader"),
        source: wgpu::ShaderSource::Wgsl(shaders.lit_vertex.as_str().into()),
    });
    let fragment_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Lit Fragment Shader"),
        source: wgpu::ShaderSource::Wgsl(shaders.lit_fragment.as_str().into()),
    });

    mk_render_pipeline(
        device,
        &render_pipeline_layout,
        config.format,
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
