//! Keyed pool of shared blur effects.
//!
//! Effects are keyed per camera by their exact (iterations, radius factor)
//! pair, so every consumer asking for the same configuration on the same
//! camera shares one GPU pipeline. Effects whose count drops to zero are
//! parked on a free list and handed out again for the next unseen key.

use std::collections::HashMap;

use crate::device::{BlurDevice, CameraId};
use crate::effect::BlurEffect;
use crate::error::BlurError;
use crate::handle::HandleStore;

/// Handle to an effect owned by an [`EffectPool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EffectHandle(u64);

impl EffectHandle {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Exact-match configuration key; combined with the camera it identifies one
/// shared effect. `-0.0` and `0.0` are the same key, as are all NaNs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConfigKey {
    iterations: u32,
    radius_factor: u32,
}

impl ConfigKey {
    pub fn new(iterations: f32, radius_factor: f32) -> Self {
        Self {
            iterations: canonical_bits(iterations),
            radius_factor: canonical_bits(radius_factor),
        }
    }
}

fn canonical_bits(value: f32) -> u32 {
    if value == 0.0 {
        0.0f32.to_bits()
    } else if value.is_nan() {
        f32::NAN.to_bits()
    } else {
        value.to_bits()
    }
}

/// Owns every blur effect of a renderer. One per renderer; not thread-safe,
/// all mutation goes through `&mut self` from the frame loop.
pub struct EffectPool<D: BlurDevice> {
    effects: HandleStore<BlurEffect<D>>,
    active: HashMap<CameraId, HashMap<ConfigKey, EffectHandle>>,
    free: Vec<EffectHandle>,
    created: usize,
}

impl<D: BlurDevice> EffectPool<D> {
    pub fn new() -> Self {
        Self {
            effects: HandleStore::new(),
            active: HashMap::new(),
            free: Vec::new(),
            created: 0,
        }
    }

    /// Get the shared effect for this configuration, reusing a free effect
    /// or creating one when the key is not live yet. Always retains.
    pub fn acquire(
        &mut self,
        device: &mut D,
        camera: CameraId,
        iterations: f32,
        radius_factor: f32,
    ) -> EffectHandle {
        let key = ConfigKey::new(iterations, radius_factor);
        let existing = self
            .active
            .get(&camera)
            .and_then(|configs| configs.get(&key))
            .copied();

        let handle = match existing {
            Some(handle) => handle,
            None => match self.free.pop() {
                Some(handle) => {
                    log::debug!(
                        "Reusing free blur effect {} for camera {camera:?} ({iterations}, {radius_factor})",
                        handle.0
                    );
                    if let Some(effect) = self.effects.get_mut(handle.0) {
                        effect.set_camera(device, camera);
                    }
                    handle
                }
                None => {
                    let handle = EffectHandle(self.effects.insert(BlurEffect::new(device, camera)));
                    self.created += 1;
                    log::debug!(
                        "Created blur effect {} for camera {camera:?} ({iterations}, {radius_factor})",
                        handle.0
                    );
                    handle
                }
            },
        };

        if let Some(effect) = self.effects.get_mut(handle.0) {
            effect.set_iterations(iterations);
            effect.set_radius_factor(radius_factor);
            effect.retain();
        }

        self.active.entry(camera).or_default().insert(key, handle);
        handle
    }

    /// Drop one acquisition. Unknown cameras or keys are ignored.
    pub fn release(&mut self, camera: CameraId, iterations: f32, radius_factor: f32) {
        let key = ConfigKey::new(iterations, radius_factor);
        let Some(configs) = self.active.get_mut(&camera) else {
            return;
        };
        let Some(&handle) = configs.get(&key) else {
            return;
        };
        let Some(effect) = self.effects.get_mut(handle.0) else {
            return;
        };

        effect.release();
        if effect.is_free() {
            configs.remove(&key);
            if configs.is_empty() {
                self.active.remove(&camera);
            }
            self.free.push(handle);
            log::debug!("Blur effect {} moved to the free pool", handle.0);
        }
    }

    /// The live effect for a configuration, if any.
    pub fn lookup(&self, camera: CameraId, iterations: f32, radius_factor: f32) -> Option<EffectHandle> {
        self.active
            .get(&camera)?
            .get(&ConfigKey::new(iterations, radius_factor))
            .copied()
    }

    pub fn effect(&self, handle: EffectHandle) -> Option<&BlurEffect<D>> {
        self.effects.get(handle.0)
    }

    /// Parameter changes through this reference are seen by every co-owner.
    pub fn effect_mut(&mut self, handle: EffectHandle) -> Option<&mut BlurEffect<D>> {
        self.effects.get_mut(handle.0)
    }

    pub fn output_texture(&self, handle: EffectHandle) -> Option<&D::Texture> {
        self.effect(handle).map(BlurEffect::output_texture)
    }

    /// Render every pooled effect for this frame. Free effects skip themselves.
    /// A failing effect does not stop the others; the first error is returned.
    pub fn render_all(&mut self, device: &mut D) -> Result<(), BlurError> {
        let mut first_error = None;
        for handle in self.effects.handles() {
            let Some(effect) = self.effects.get_mut(handle) else {
                continue;
            };
            if let Err(e) = effect.render(device) {
                log::error!("Blur effect {handle} failed to render: {e}");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Effects owned by the pool, live or free.
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Effects currently keyed under some camera.
    pub fn active_count(&self) -> usize {
        self.active.values().map(HashMap::len).sum()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Effects ever constructed by this pool.
    pub fn created_count(&self) -> usize {
        self.created
    }

    pub fn is_free(&self, handle: EffectHandle) -> bool {
        self.free.contains(&handle)
    }

    /// Destroy every free effect. The pool never does this on its own.
    pub fn purge_free(&mut self, device: &mut D) -> usize {
        let purged = self.free.len();
        for handle in self.free.drain(..) {
            if let Some(effect) = self.effects.remove(handle.0) {
                effect.destroy(device);
            }
        }
        if purged > 0 {
            log::debug!("Purged {purged} free blur effects");
        }
        purged
    }

    /// Tear down the pool and every effect in it.
    pub fn destroy(mut self, device: &mut D) {
        for (_, effect) in self.effects.drain() {
            effect.destroy(device);
        }
    }
}

impl<D: BlurDevice> Default for EffectPool<D> {
    fn default() -> Self {
        Self::new()
    }
}
