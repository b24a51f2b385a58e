//! One blur configuration bound to one camera: two ping-pong targets, the
//! first-pass and loop-pass programs, and the per-frame pass loop.

use backdrop_gpu_shared::kernel::{self, PassSource, PING_PONG_TARGETS};
use backdrop_gpu_shared::settings::BlurSettings;
use backdrop_gpu_shared::uniforms::BlurParams;

use crate::device::{BlurDevice, CameraId, PassInput, ProgramKind};
use crate::error::BlurError;
use crate::ref_count::RefCount;

type ResizeListener = Box<dyn FnMut(u32, u32)>;

pub struct BlurEffect<D: BlurDevice> {
    camera: CameraId,
    iterations: f32,
    radius_factor: f32,

    width: u32,
    height: u32,
    /// Empty until the first sized render.
    targets: Vec<D::Target>,

    first_program: D::Program,
    loop_program: D::Program,
    blank_texture: D::Texture,

    ref_count: RefCount,
    resize_generation: u64,
    resize_listeners: Vec<ResizeListener>,
}

impl<D: BlurDevice> BlurEffect<D> {
    /// Compile both programs and request the camera's scene color map.
    /// Targets are allocated lazily on the first render.
    pub fn new(device: &mut D, camera: CameraId) -> Self {
        device.request_scene_color(camera, true);

        let defaults = BlurSettings::default();
        log::debug!("Creating blur effect for camera {camera:?}");

        Self {
            camera,
            iterations: defaults.iterations,
            radius_factor: defaults.radius_factor,
            width: 0,
            height: 0,
            targets: Vec::with_capacity(PING_PONG_TARGETS),
            first_program: device.create_program(ProgramKind::First),
            loop_program: device.create_program(ProgramKind::Loop),
            blank_texture: device.create_blank_texture(),
            ref_count: RefCount::new(),
            resize_generation: 0,
            resize_listeners: Vec::new(),
        }
    }

    pub fn camera(&self) -> CameraId {
        self.camera
    }

    /// Move the scene color request over to another camera.
    pub fn set_camera(&mut self, device: &mut D, camera: CameraId) {
        if camera == self.camera {
            return;
        }
        device.request_scene_color(self.camera, false);
        device.request_scene_color(camera, true);
        log::debug!("Blur effect rebound from camera {:?} to {camera:?}", self.camera);
        self.camera = camera;
    }

    pub fn iterations(&self) -> f32 {
        self.iterations
    }

    pub fn set_iterations(&mut self, iterations: f32) {
        self.iterations = iterations;
    }

    pub fn radius_factor(&self) -> f32 {
        self.radius_factor
    }

    pub fn set_radius_factor(&mut self, radius_factor: f32) {
        self.radius_factor = radius_factor;
    }

    pub fn settings(&self) -> BlurSettings {
        BlurSettings::new(self.iterations, self.radius_factor)
    }

    /// Size the targets were last allocated at.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pass_count(&self) -> u32 {
        kernel::pass_count(self.iterations)
    }

    /// Ping-pong index written by the last pass.
    pub fn output_index(&self) -> usize {
        kernel::output_index(self.iterations)
    }

    // Reference counting

    pub fn retain(&mut self) {
        self.ref_count.retain();
    }

    pub fn release(&mut self) {
        self.ref_count.release();
        if self.ref_count.count() < 0 {
            log::warn!(
                "Blur effect for camera {:?} released more often than retained ({})",
                self.camera,
                self.ref_count.count()
            );
        }
    }

    pub fn is_free(&self) -> bool {
        self.ref_count.is_free()
    }

    pub fn ref_count(&self) -> i64 {
        self.ref_count.count()
    }

    // Resize notification

    /// Bumped every time the targets are reallocated. Consumers holding on
    /// to the output texture compare it against their last seen value.
    pub fn resize_generation(&self) -> u64 {
        self.resize_generation
    }

    /// Called with the new size after the targets were reallocated.
    pub fn on_resize(&mut self, listener: impl FnMut(u32, u32) + 'static) {
        self.resize_listeners.push(Box::new(listener));
    }

    /// The most recently completed pass, or the transparent 1x1 texture when
    /// the radius factor is not positive or nothing has been rendered yet.
    pub fn output_texture(&self) -> &D::Texture {
        if self.radius_factor > 0.0 {
            if let Some(target) = self.targets.get(self.output_index()) {
                return D::color_buffer(target);
            }
        }
        &self.blank_texture
    }

    /// Run the blur for this frame.
    pub fn render(&mut self, device: &mut D) -> Result<(), BlurError> {
        // Nobody reads a free effect; with a zero radius it still tracks size.
        if self.is_free() && self.radius_factor > 0.0 {
            return Ok(());
        }

        self.resize(device);

        // Output is the blank texture, nothing to draw.
        if !(self.radius_factor > 0.0) || self.targets.len() < PING_PONG_TARGETS {
            return Ok(());
        }

        for pass in kernel::plan_passes(self.iterations, self.radius_factor) {
            let params = BlurParams::new(self.width, self.height, pass.direction, pass.alpha);
            let target = &self.targets[pass.target];

            log::trace!(
                "Blur pass {} radius {} -> target {}",
                pass.index,
                pass.radius,
                pass.target
            );

            match pass.source {
                PassSource::SceneColor => device.draw_quad(
                    target,
                    &self.first_program,
                    PassInput::SceneColor(self.camera),
                    &params,
                )?,
                PassSource::Target(source) => device.draw_quad(
                    target,
                    &self.loop_program,
                    PassInput::Target(&self.targets[source]),
                    &params,
                )?,
            }
        }

        Ok(())
    }

    /// Release programs, targets and the scene color request.
    pub fn destroy(mut self, device: &mut D) {
        device.request_scene_color(self.camera, false);
        self.destroy_targets(device);
        device.destroy_program(self.first_program);
        device.destroy_program(self.loop_program);
        device.destroy_texture(self.blank_texture);
        log::debug!("Destroyed blur effect for camera {:?}", self.camera);
    }

    fn resize(&mut self, device: &mut D) {
        let (width, height) = device.output_size();
        if width == self.width && height == self.height {
            return;
        }

        self.width = width;
        self.height = height;

        self.destroy_targets(device);
        if width > 0 && height > 0 {
            for i in 0..PING_PONG_TARGETS {
                let label = format!("Blur Target {i}");
                self.targets.push(device.create_target(width, height, &label));
            }
        }

        self.resize_generation += 1;
        log::debug!("Blur targets reallocated at {width}x{height}");

        for listener in &mut self.resize_listeners {
            listener(width, height);
        }
    }

    fn destroy_targets(&mut self, device: &mut D) {
        for target in self.targets.drain(..) {
            device.destroy_target(target);
        }
    }
}
