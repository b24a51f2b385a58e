//! GPU-facing data shared by every Backdrop backend: WGSL sources, uniform
//! layouts, the fixed Gaussian kernel and the blur configuration.

pub mod kernel;
pub mod settings;
pub mod shaders;
pub mod uniforms;
