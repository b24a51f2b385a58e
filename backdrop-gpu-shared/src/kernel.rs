//! Fixed 5-tap Gaussian kernel and the multi-pass schedule built on top of it.
//!
//! Blur quality changes the number of passes, never the kernel. Each pass
//! reads either the scene color map (pass 0) or the ping-pong target written
//! by the previous pass, and writes the other one.

/// Tap offsets in texels along the pass direction: centre, ±1, ±2.
pub const TAP_OFFSETS: [f32; 5] = [0.0, 1.384_615_4, -1.384_615_4, 3.230_769_2, -3.230_769_2];
/// Weights matching [`TAP_OFFSETS`].
pub const TAP_WEIGHTS: [f32; 5] = [
    0.227_027_03,
    0.316_216_22,
    0.316_216_22,
    0.070_270_27,
    0.070_270_27,
];

/// Number of ping-pong targets an effect owns.
pub const PING_PONG_TARGETS: usize = 2;

/// Where a pass reads its color from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassSource {
    SceneColor,
    Target(usize),
}

/// One scheduled blur pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlurPass {
    pub index: u32,
    pub radius: f32,
    /// `(radius, 0)` for horizontal passes, `(0, radius)` for vertical ones.
    pub direction: [f32; 2],
    pub source: PassSource,
    pub target: usize,
    pub alpha: f32,
}

/// Whole passes for a (possibly fractional) iteration count.
pub fn pass_count(iterations: f32) -> u32 {
    if iterations.is_nan() || iterations < 1.0 {
        0
    } else {
        iterations.floor() as u32
    }
}

/// Ping-pong index holding the last completed pass.
pub fn output_index(iterations: f32) -> usize {
    (pass_count(iterations) as usize + 1) % PING_PONG_TARGETS
}

/// Output alpha for a given radius factor; stronger blur fades in to opaque.
pub fn fade_alpha(radius_factor: f32) -> f32 {
    (radius_factor * radius_factor * 2.0).min(1.0)
}

/// Build the pass schedule: radii shrink from `N * factor` down to `factor`,
/// directions alternate starting horizontal.
pub fn plan_passes(iterations: f32, radius_factor: f32) -> impl Iterator<Item = BlurPass> {
    let n = pass_count(iterations);
    let alpha = fade_alpha(radius_factor);

    (0..n).map(move |i| {
        let radius = (n - i) as f32 * radius_factor;
        let direction = if i % 2 == 0 { [radius, 0.0] } else { [0.0, radius] };
        let source = if i == 0 {
            PassSource::SceneColor
        } else {
            PassSource::Target((i as usize + 1) % PING_PONG_TARGETS)
        };

        BlurPass {
            index: i,
            radius,
            direction,
            source,
            target: i as usize % PING_PONG_TARGETS,
            alpha,
        }
    })
}
