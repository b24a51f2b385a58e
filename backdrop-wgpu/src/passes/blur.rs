//! Blur pass: one full-screen quad per ping-pong step.

use crate::backend::RenderTarget;
use crate::render_targets::FULLSCREEN_QUAD_VERTICES;

/// Render one separable blur step into `target`.
pub fn render_blur_pass(
    encoder: &mut wgpu::CommandEncoder,
    target: &RenderTarget,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
    quad_vbo: &wgpu::Buffer,
    label: &str,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: &target.color.view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        ..Default::default()
    });

    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.set_vertex_buffer(0, quad_vbo.slice(..));
    pass.draw(0..FULLSCREEN_QUAD_VERTICES, 0..1);
}
