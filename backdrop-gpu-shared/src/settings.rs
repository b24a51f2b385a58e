//! Blur configuration: the two externally adjustable knobs.

use serde::{Deserialize, Serialize};

pub const DEFAULT_ITERATIONS: f32 = 8.0;
pub const DEFAULT_RADIUS_FACTOR: f32 = 1.0;
pub const MIN_RADIUS_FACTOR: f32 = 0.0;
pub const MAX_RADIUS_FACTOR: f32 = 5.0;

/// Blur quality (pass count) and strength (radius factor).
///
/// Values are applied verbatim by the effect; [`BlurSettings::clamped`] is
/// the consumer-layer range check.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlurSettings {
    pub iterations: f32,
    pub radius_factor: f32,
}

impl Default for BlurSettings {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            radius_factor: DEFAULT_RADIUS_FACTOR,
        }
    }
}

impl BlurSettings {
    pub fn new(iterations: f32, radius_factor: f32) -> Self {
        Self {
            iterations,
            radius_factor,
        }
    }

    /// Parse settings from a JSON document; missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Clamp to the range the UI layer accepts.
    pub fn clamped(self) -> Self {
        let radius_factor = if self.radius_factor.is_nan() {
            MIN_RADIUS_FACTOR
        } else {
            self.radius_factor.clamp(MIN_RADIUS_FACTOR, MAX_RADIUS_FACTOR)
        };
        let iterations = if self.iterations.is_nan() {
            0.0
        } else {
            self.iterations.max(0.0)
        };
        Self {
            iterations,
            radius_factor,
        }
    }
}
