//! Render pass implementations for the blur pipeline.

pub mod blur;
