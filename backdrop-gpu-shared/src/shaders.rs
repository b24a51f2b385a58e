/// Embedded WGSL shader source strings for the backdrop blur pipeline.

pub const FULLSCREEN_QUAD_VERT: &str = include_str!("../shaders/fullscreen_quad.wgsl");
pub const GAUSSIAN_BLUR_FRAG: &str = include_str!("../shaders/gaussian_blur.wgsl");

/// Fragment entry point of the first pass (samples the scene color map).
pub const FIRST_PASS_ENTRY: &str = "fs_first";
/// Fragment entry point of every later pass (samples the previous target).
pub const LOOP_PASS_ENTRY: &str = "fs_loop";
/// Vertex entry point of the full-screen quad.
pub const QUAD_VERT_ENTRY: &str = "vs_main";
