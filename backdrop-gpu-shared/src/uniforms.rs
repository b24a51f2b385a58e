use bytemuck::{Pod, Zeroable};

/// Per-pass blur parameters, matching `BlurParams` in gaussian_blur.wgsl
/// (bind group 0, binding 0).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BlurParams {
    /// 1 / output size, in UV units per pixel.
    pub pixel_size: [f32; 2],
    /// Blur direction scaled by the pass radius, in pixels.
    pub direction: [f32; 2],
    /// Output alpha written with the blurred color.
    pub alpha: f32,
    pub _pad0: f32,
    pub _pad1: f32,
    pub _pad2: f32,
}

impl BlurParams {
    pub fn new(width: u32, height: u32, direction: [f32; 2], alpha: f32) -> Self {
        Self {
            pixel_size: [1.0 / width.max(1) as f32, 1.0 / height.max(1) as f32],
            direction,
            alpha,
            ..Self::zeroed()
        }
    }
}
