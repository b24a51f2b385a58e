use std::collections::HashMap;

use backdrop_gpu_shared::uniforms::BlurParams;

use crate::device::{BlurDevice, CameraId, PassInput, ProgramKind};
use crate::error::BlurError;
use crate::{passes, pipeline, render_targets};

/// GPU texture with its default view.
pub struct GPUTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

/// Render target (framebuffer equivalent), color only.
pub struct RenderTarget {
    pub color: GPUTexture,
}

/// Compiled blur program: pipeline plus the layout its bind groups follow.
pub struct BlurProgram {
    pub kind: ProgramKind,
    pub pipeline: wgpu::RenderPipeline,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

/// wgpu implementation of the blur device boundary. Draws are recorded into
/// one command encoder per frame; call [`WgpuBlurDevice::submit`] after the
/// effects have rendered.
pub struct WgpuBlurDevice {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub width: u32,
    pub height: u32,

    // Shared GPU resources
    pub sampler: wgpu::Sampler,
    pub quad_vbo: wgpu::Buffer,

    // Scene color maps published by the host, and who asked for them
    scene_colors: HashMap<CameraId, wgpu::TextureView>,
    scene_requests: HashMap<CameraId, u32>,

    // One uniform buffer per draw slot; queue writes are staged until submit,
    // so a slot is written at most once per frame.
    params_buffers: Vec<wgpu::Buffer>,
    params_used: usize,

    encoder: Option<wgpu::CommandEncoder>,
}

impl WgpuBlurDevice {
    /// Wrap an existing device/queue pair owned by the host renderer.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, width: u32, height: u32) -> Self {
        let sampler = render_targets::create_blur_sampler(&device);
        let quad_vbo = render_targets::create_fullscreen_quad_vbo(&device);

        Self {
            device,
            queue,
            width,
            height,
            sampler,
            quad_vbo,
            scene_colors: HashMap::new(),
            scene_requests: HashMap::new(),
            params_buffers: Vec::new(),
            params_used: 0,
            encoder: None,
        }
    }

    /// Create a device without a surface (offscreen rendering and tests).
    pub fn new_headless(width: u32, height: u32) -> Result<Self, BlurError> {
        let _ = env_logger::try_init();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or(BlurError::AdapterUnavailable)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Backdrop Headless Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        ))?;

        log::info!(
            "Backdrop blur device initialized: {} ({})",
            adapter.get_info().name,
            adapter.get_info().backend.to_str()
        );

        Ok(Self::new(device, queue, width, height))
    }

    /// Track the output size. Zero-sized resizes (minimized windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.width = width;
            self.height = height;
        }
    }

    /// Publish this frame's scene color snapshot for a camera.
    pub fn set_scene_color(&mut self, camera: CameraId, view: wgpu::TextureView) {
        self.scene_colors.insert(camera, view);
    }

    pub fn clear_scene_color(&mut self, camera: CameraId) {
        self.scene_colors.remove(&camera);
    }

    /// Whether any live effect samples this camera's scene color.
    pub fn scene_color_requested(&self, camera: CameraId) -> bool {
        self.scene_requests.contains_key(&camera)
    }

    /// Cameras the host must publish a scene color map for.
    pub fn requested_cameras(&self) -> Vec<CameraId> {
        let mut cameras: Vec<CameraId> = self.scene_requests.keys().copied().collect();
        cameras.sort_unstable();
        cameras
    }

    /// Submit all passes recorded since the last submit.
    pub fn submit(&mut self) {
        if let Some(encoder) = self.encoder.take() {
            self.queue.submit(std::iter::once(encoder.finish()));
        }
        self.params_used = 0;
    }

    /// Next free uniform buffer slot for this frame, allocating on demand.
    fn next_params_slot(&mut self) -> usize {
        let slot = self.params_used;
        if slot == self.params_buffers.len() {
            self.params_buffers.push(self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Blur Params"),
                size: std::mem::size_of::<BlurParams>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            log::debug!("Blur params buffers grown to {}", self.params_buffers.len());
        }
        self.params_used += 1;
        slot
    }
}

impl BlurDevice for WgpuBlurDevice {
    type Target = RenderTarget;
    type Texture = GPUTexture;
    type Program = BlurProgram;

    fn output_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn create_target(&mut self, width: u32, height: u32, label: &str) -> RenderTarget {
        render_targets::create_render_target(&self.device, width, height, label)
    }

    // Never `Texture::destroy()` here: passes recorded into the open encoder
    // may still sample it. Dropped textures live until that work completes.
    fn destroy_target(&mut self, target: RenderTarget) {
        drop(target);
    }

    fn create_program(&mut self, kind: ProgramKind) -> BlurProgram {
        let label = format!("{} BGL", pipeline::program_label(kind));
        let bind_group_layout = pipeline::create_blur_bind_group_layout(&self.device, &label);
        let pipeline = pipeline::create_blur_pipeline(
            &self.device,
            kind,
            &bind_group_layout,
            render_targets::BLUR_FORMAT,
        );

        BlurProgram {
            kind,
            pipeline,
            bind_group_layout,
        }
    }

    fn destroy_program(&mut self, program: BlurProgram) {
        drop(program);
    }

    fn create_blank_texture(&mut self) -> GPUTexture {
        render_targets::create_blank_texture(&self.device, &self.queue)
    }

    fn destroy_texture(&mut self, texture: GPUTexture) {
        drop(texture);
    }

    fn color_buffer(target: &RenderTarget) -> &GPUTexture {
        &target.color
    }

    fn request_scene_color(&mut self, camera: CameraId, enabled: bool) {
        if enabled {
            *self.scene_requests.entry(camera).or_insert(0) += 1;
        } else if let Some(count) = self.scene_requests.get_mut(&camera) {
            *count -= 1;
            if *count == 0 {
                self.scene_requests.remove(&camera);
            }
        }
    }

    fn draw_quad(
        &mut self,
        target: &RenderTarget,
        program: &BlurProgram,
        input: PassInput<'_, RenderTarget>,
        params: &BlurParams,
    ) -> Result<(), BlurError> {
        if let PassInput::SceneColor(camera) = &input {
            if !self.scene_colors.contains_key(camera) {
                return Err(BlurError::MissingSceneColor(*camera));
            }
        }

        let slot = self.next_params_slot();
        let source_view = match input {
            PassInput::SceneColor(camera) => self
                .scene_colors
                .get(&camera)
                .ok_or(BlurError::MissingSceneColor(camera))?,
            PassInput::Target(source) => &source.color.view,
        };
        let params_buffer = &self.params_buffers[slot];
        self.queue.write_buffer(params_buffer, 0, bytemuck::bytes_of(params));

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Blur Bind Group"),
            layout: &program.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(source_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let device = &self.device;
        let encoder = self.encoder.get_or_insert_with(|| {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Blur Encoder"),
            })
        });

        passes::blur::render_blur_pass(
            encoder,
            target,
            &program.pipeline,
            &bind_group,
            &self.quad_vbo,
            pipeline::program_label(program.kind),
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::EffectPool;

    /// Publish a solid-color scene map for `camera` and return its texture.
    fn publish_scene(device: &mut WgpuBlurDevice, camera: CameraId, rgba: [u8; 4]) -> wgpu::Texture {
        let (width, height) = (device.width, device.height);
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Scene Color"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: render_targets::BLUR_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let pixels: Vec<u8> = rgba.iter().copied().cycle().take((width * height * 4) as usize).collect();
        device.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            size,
        );

        device.set_scene_color(camera, texture.create_view(&wgpu::TextureViewDescriptor::default()));
        texture
    }

    /// Copy one RGBA8 texel back to the CPU.
    fn read_pixel(device: &WgpuBlurDevice, texture: &wgpu::Texture, x: u32, y: u32) -> [u8; 4] {
        let row = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let buffer = device.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback"),
            size: row as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Readback") });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(row),
                    rows_per_image: Some(1),
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        device.queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device.device.poll(wgpu::Maintain::Wait);
        rx.recv().unwrap().unwrap();

        let data = slice.get_mapped_range();
        [data[0], data[1], data[2], data[3]]
    }

    #[test]
    fn test_headless_frame() {
        // Machines without any adapter (plain CI containers) skip this test.
        let Ok(mut device) = WgpuBlurDevice::new_headless(64, 32) else {
            return;
        };

        let camera = CameraId(1);
        let mut pool = EffectPool::new();
        let handle = pool.acquire(&mut device, camera, 3.0, 1.0);
        assert!(device.scene_color_requested(camera));
        assert_eq!(device.requested_cameras(), vec![camera]);

        let scene = render_targets::create_render_target(&device.device, 64, 32, "Scene Color");
        let scene_view = scene.color.texture.create_view(&wgpu::TextureViewDescriptor::default());
        device.set_scene_color(camera, scene_view);

        pool.render_all(&mut device).unwrap();
        device.submit();

        let output = pool.output_texture(handle).unwrap();
        assert_eq!((output.width, output.height), (64, 32));

        device.resize(128, 64);
        pool.render_all(&mut device).unwrap();
        device.submit();
        assert_eq!(pool.effect(handle).unwrap().size(), (128, 64));

        pool.destroy(&mut device);
        assert!(!device.scene_color_requested(camera));
    }

    #[test]
    fn test_missing_scene_color_is_an_error() {
        let Ok(mut device) = WgpuBlurDevice::new_headless(16, 16) else {
            return;
        };

        let camera = CameraId(5);
        let mut pool = EffectPool::new();
        pool.acquire(&mut device, camera, 2.0, 1.0);

        let err = pool.render_all(&mut device).unwrap_err();
        assert!(matches!(err, BlurError::MissingSceneColor(c) if c == camera));
        pool.destroy(&mut device);
    }

    #[test]
    fn test_resize_between_renders_in_one_frame() {
        let Ok(mut device) = WgpuBlurDevice::new_headless(64, 32) else {
            return;
        };

        let camera = CameraId(1);
        let mut pool = EffectPool::new();
        let handle = pool.acquire(&mut device, camera, 3.0, 1.0);
        let _scene = publish_scene(&mut device, camera, [255, 0, 0, 255]);

        pool.render_all(&mut device).unwrap();
        device.resize(128, 64);
        pool.render_all(&mut device).unwrap();
        device.submit();

        assert_eq!(pool.effect(handle).unwrap().size(), (128, 64));
        pool.destroy(&mut device);
    }

    #[test]
    fn test_purge_and_destroy_before_submit() {
        let Ok(mut device) = WgpuBlurDevice::new_headless(32, 32) else {
            return;
        };

        let camera = CameraId(1);
        let mut pool = EffectPool::new();
        pool.acquire(&mut device, camera, 2.0, 1.0);
        pool.acquire(&mut device, camera, 4.0, 2.0);
        let _scene = publish_scene(&mut device, camera, [0, 255, 0, 255]);

        pool.render_all(&mut device).unwrap();
        pool.release(camera, 4.0, 2.0);
        assert_eq!(pool.purge_free(&mut device), 1);
        device.submit();

        pool.render_all(&mut device).unwrap();
        pool.destroy(&mut device);
        device.submit();
        assert!(!device.scene_color_requested(camera));
    }

    #[test]
    fn test_blur_writes_fade_alpha() {
        let Ok(mut device) = WgpuBlurDevice::new_headless(16, 16) else {
            return;
        };

        let camera = CameraId(3);
        let mut pool = EffectPool::new();
        // fade alpha = 0.5^2 * 2 = 0.5
        let handle = pool.acquire(&mut device, camera, 2.0, 0.5);
        let _scene = publish_scene(&mut device, camera, [255, 255, 255, 255]);

        pool.render_all(&mut device).unwrap();
        device.submit();

        let output = pool.output_texture(handle).unwrap();
        assert_eq!((output.width, output.height), (16, 16));
        let [r, g, b, a] = read_pixel(&device, &output.texture, 8, 8);
        assert!(r >= 250 && g >= 250 && b >= 250, "blurred white was {r} {g} {b}");
        assert!((127..=128).contains(&a), "alpha was {a}");

        pool.destroy(&mut device);
    }

    #[test]
    fn test_params_buffers_are_reused_across_frames() {
        let Ok(mut device) = WgpuBlurDevice::new_headless(16, 16) else {
            return;
        };

        let camera = CameraId(1);
        let mut pool = EffectPool::new();
        pool.acquire(&mut device, camera, 3.0, 1.0);
        let _scene = publish_scene(&mut device, camera, [0, 0, 255, 255]);

        for _ in 0..3 {
            pool.render_all(&mut device).unwrap();
            device.submit();
        }

        assert_eq!(device.params_buffers.len(), 3, "one buffer per pass, not per frame");
        assert_eq!(device.params_used, 0);
        pool.destroy(&mut device);
    }
}
