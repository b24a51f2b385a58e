//! Backdrop: shared, reference-counted Gaussian blur of the scene behind a
//! camera, for UI elements that show a frosted view of what they cover.
//!
//! Consumers acquire a [`BlurEffect`] from an [`EffectPool`] by camera,
//! iteration count and radius factor. Identical requests share one effect
//! (two ping-pong targets, two programs); released effects are parked and
//! reused for the next new configuration instead of being reallocated.
//!
//! The pool and effects are generic over a [`BlurDevice`]; [`WgpuBlurDevice`]
//! is the wgpu implementation.

mod backend;
mod consumer;
mod device;
mod effect;
mod error;
mod handle;
mod passes;
mod pipeline;
mod pool;
mod ref_count;
mod render_targets;

#[cfg(test)]
mod test_device;

pub use backend::{BlurProgram, GPUTexture, RenderTarget, WgpuBlurDevice};
pub use consumer::{element_rect, BlurImage};
pub use device::{BlurDevice, CameraId, PassInput, ProgramKind};
pub use effect::BlurEffect;
pub use error::BlurError;
pub use pool::{ConfigKey, EffectHandle, EffectPool};
pub use ref_count::RefCount;
pub use render_targets::BLUR_FORMAT;

pub use backdrop_gpu_shared::settings::BlurSettings;
