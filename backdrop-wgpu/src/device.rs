//! The graphics-device boundary the blur effect draws through.
//!
//! The effect and pool only ever talk to a [`BlurDevice`]; `WgpuBlurDevice`
//! is the production implementation.

use backdrop_gpu_shared::uniforms::BlurParams;

use crate::error::BlurError;

/// Opaque host handle for a camera whose scene is blurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CameraId(pub u64);

/// Which fragment stage a program runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    /// Reads the camera's scene color map.
    First,
    /// Reads the previous ping-pong target.
    Loop,
}

/// Color input of a single quad draw.
pub enum PassInput<'a, T> {
    SceneColor(CameraId),
    Target(&'a T),
}

pub trait BlurDevice {
    type Target;
    type Texture;
    type Program;

    /// Current output (back buffer) size in pixels.
    fn output_size(&self) -> (u32, u32);

    fn create_target(&mut self, width: u32, height: u32, label: &str) -> Self::Target;
    fn destroy_target(&mut self, target: Self::Target);

    fn create_program(&mut self, kind: ProgramKind) -> Self::Program;
    fn destroy_program(&mut self, program: Self::Program);

    /// 1x1 fully transparent texture.
    fn create_blank_texture(&mut self) -> Self::Texture;
    fn destroy_texture(&mut self, texture: Self::Texture);

    fn color_buffer(target: &Self::Target) -> &Self::Texture;

    /// Toggle a request for the camera's scene color map. Requests are
    /// counted, so every `true` needs a matching `false`.
    fn request_scene_color(&mut self, camera: CameraId, enabled: bool);

    /// Draw a full-screen quad with `program` into `target`.
    fn draw_quad(
        &mut self,
        target: &Self::Target,
        program: &Self::Program,
        input: PassInput<'_, Self::Target>,
        params: &BlurParams,
    ) -> Result<(), BlurError>;
}
