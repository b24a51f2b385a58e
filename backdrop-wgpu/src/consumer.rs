//! UI-side binding of a blurred backdrop: tracks one acquisition per element
//! and swaps it when the element's settings change.

use backdrop_gpu_shared::settings::BlurSettings;
use glam::{Vec2, Vec4};

use crate::device::{BlurDevice, CameraId};
use crate::error::BlurError;
use crate::pool::{EffectHandle, EffectPool};

pub struct BlurImage {
    camera: CameraId,
    settings: BlurSettings,
    handle: Option<EffectHandle>,
    seen_generation: u64,
}

impl BlurImage {
    pub fn new(camera: CameraId, settings: BlurSettings) -> Self {
        Self {
            camera,
            settings: settings.clamped(),
            handle: None,
            seen_generation: 0,
        }
    }

    /// Build from a JSON settings document, e.g. an element's saved properties.
    pub fn from_json(camera: CameraId, json: &str) -> Result<Self, BlurError> {
        Ok(Self::new(camera, BlurSettings::from_json(json)?))
    }

    pub fn camera(&self) -> CameraId {
        self.camera
    }

    pub fn settings(&self) -> BlurSettings {
        self.settings
    }

    pub fn handle(&self) -> Option<EffectHandle> {
        self.handle
    }

    pub fn is_attached(&self) -> bool {
        self.handle.is_some()
    }

    /// Acquire the shared effect for the current settings.
    pub fn attach<D: BlurDevice>(&mut self, pool: &mut EffectPool<D>, device: &mut D) -> EffectHandle {
        if let Some(handle) = self.handle {
            return handle;
        }
        let handle = pool.acquire(
            device,
            self.camera,
            self.settings.iterations,
            self.settings.radius_factor,
        );
        self.handle = Some(handle);
        handle
    }

    /// Change settings, swapping the acquisition when attached. Settings are
    /// clamped to the accepted range first.
    pub fn set_settings<D: BlurDevice>(
        &mut self,
        pool: &mut EffectPool<D>,
        device: &mut D,
        settings: BlurSettings,
    ) {
        let settings = settings.clamped();
        if settings == self.settings {
            return;
        }

        let attached = self.handle.is_some();
        if attached {
            self.detach(pool);
        }
        self.settings = settings;
        if attached {
            self.attach(pool, device);
        }
    }

    pub fn set_radius_factor<D: BlurDevice>(
        &mut self,
        pool: &mut EffectPool<D>,
        device: &mut D,
        radius_factor: f32,
    ) {
        let settings = BlurSettings::new(self.settings.iterations, radius_factor);
        self.set_settings(pool, device, settings);
    }

    pub fn set_iterations<D: BlurDevice>(
        &mut self,
        pool: &mut EffectPool<D>,
        device: &mut D,
        iterations: f32,
    ) {
        let settings = BlurSettings::new(iterations, self.settings.radius_factor);
        self.set_settings(pool, device, settings);
    }

    /// Release the acquisition, if any.
    pub fn detach<D: BlurDevice>(&mut self, pool: &mut EffectPool<D>) {
        if self.handle.take().is_some() {
            pool.release(self.camera, self.settings.iterations, self.settings.radius_factor);
        }
    }

    /// Render the shared effect and return the texture to show.
    pub fn update<'p, D: BlurDevice>(
        &mut self,
        pool: &'p mut EffectPool<D>,
        device: &mut D,
    ) -> Result<Option<&'p D::Texture>, BlurError> {
        let Some(handle) = self.handle else {
            return Ok(None);
        };
        let Some(effect) = pool.effect_mut(handle) else {
            return Ok(None);
        };
        effect.render(device)?;
        self.seen_generation = effect.resize_generation();
        Ok(Some(effect.output_texture()))
    }

    /// True when the effect reallocated its targets since the last `update`.
    pub fn texture_changed<D: BlurDevice>(&self, pool: &EffectPool<D>) -> bool {
        self.handle
            .and_then(|handle| pool.effect(handle))
            .is_some_and(|effect| effect.resize_generation() != self.seen_generation)
    }
}

/// Normalized `[left, top, width, height]` region of the output texture
/// covered by an element. `corners` are the element's screen corners in
/// pixels, ordered top-left, top-right, bottom-right, bottom-left.
pub fn element_rect(corners: [Vec2; 4], output_size: (u32, u32)) -> Vec4 {
    let size = Vec2::new(output_size.0.max(1) as f32, output_size.1.max(1) as f32);
    let top_left = corners[0];
    let right = corners[1].x;
    let bottom = corners[2].y;

    Vec4::new(
        top_left.x / size.x,
        top_left.y / size.y,
        (right - top_left.x) / size.x,
        (bottom - top_left.y) / size.y,
    )
}
