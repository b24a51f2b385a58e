//! In-memory `BlurDevice` that records every allocation and draw.

use std::collections::{HashMap, HashSet};

use backdrop_gpu_shared::uniforms::BlurParams;

use crate::device::{BlurDevice, CameraId, PassInput, ProgramKind};
use crate::error::BlurError;

#[derive(Debug, Clone, PartialEq)]
pub struct FakeTexture {
    pub id: u64,
    /// Owning target, `None` for standalone textures.
    pub target: Option<u64>,
    pub width: u32,
    pub height: u32,
    pub blank: bool,
}

#[derive(Debug)]
pub struct FakeTarget {
    pub id: u64,
    pub color: FakeTexture,
}

#[derive(Debug)]
pub struct FakeProgram {
    pub id: u64,
    pub kind: ProgramKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawInput {
    Scene(CameraId),
    Target(u64),
}

#[derive(Debug, Clone)]
pub struct DrawCall {
    pub target: u64,
    pub program: ProgramKind,
    pub input: DrawInput,
    pub params: BlurParams,
}

#[derive(Default)]
pub struct RecordingDevice {
    width: u32,
    height: u32,
    next_id: u64,

    live_targets: HashSet<u64>,
    live_programs: HashSet<u64>,
    live_textures: HashSet<u64>,
    scene_requests: HashMap<CameraId, i32>,
    withheld: HashSet<CameraId>,

    pub targets_created: usize,
    pub targets_destroyed: usize,
    pub programs_created: usize,
    pub draws: Vec<DrawCall>,
}

impl RecordingDevice {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn set_output_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Make draws that sample this camera's scene color fail.
    pub fn withhold_scene_color(&mut self, camera: CameraId) {
        self.withheld.insert(camera);
    }

    pub fn scene_requests(&self, camera: CameraId) -> i32 {
        self.scene_requests.get(&camera).copied().unwrap_or(0)
    }

    pub fn live_targets(&self) -> usize {
        self.live_targets.len()
    }

    pub fn live_programs(&self) -> usize {
        self.live_programs.len()
    }

    pub fn live_textures(&self) -> usize {
        self.live_textures.len()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl BlurDevice for RecordingDevice {
    type Target = FakeTarget;
    type Texture = FakeTexture;
    type Program = FakeProgram;

    fn output_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn create_target(&mut self, width: u32, height: u32, _label: &str) -> FakeTarget {
        let id = self.next_id();
        let texture_id = self.next_id();
        self.live_targets.insert(id);
        self.targets_created += 1;
        FakeTarget {
            id,
            color: FakeTexture {
                id: texture_id,
                target: Some(id),
                width,
                height,
                blank: false,
            },
        }
    }

    fn destroy_target(&mut self, target: FakeTarget) {
        assert!(self.live_targets.remove(&target.id), "double destroy of target {}", target.id);
        self.targets_destroyed += 1;
    }

    fn create_program(&mut self, kind: ProgramKind) -> FakeProgram {
        let id = self.next_id();
        self.live_programs.insert(id);
        self.programs_created += 1;
        FakeProgram { id, kind }
    }

    fn destroy_program(&mut self, program: FakeProgram) {
        assert!(self.live_programs.remove(&program.id));
    }

    fn create_blank_texture(&mut self) -> FakeTexture {
        let id = self.next_id();
        self.live_textures.insert(id);
        FakeTexture {
            id,
            target: None,
            width: 1,
            height: 1,
            blank: true,
        }
    }

    fn destroy_texture(&mut self, texture: FakeTexture) {
        assert!(self.live_textures.remove(&texture.id));
    }

    fn color_buffer(target: &FakeTarget) -> &FakeTexture {
        &target.color
    }

    fn request_scene_color(&mut self, camera: CameraId, enabled: bool) {
        let count = self.scene_requests.entry(camera).or_insert(0);
        *count += if enabled { 1 } else { -1 };
        if *count == 0 {
            self.scene_requests.remove(&camera);
        }
    }

    fn draw_quad(
        &mut self,
        target: &FakeTarget,
        program: &FakeProgram,
        input: PassInput<'_, FakeTarget>,
        params: &BlurParams,
    ) -> Result<(), BlurError> {
        assert!(self.live_targets.contains(&target.id), "draw into dead target");
        let input = match input {
            PassInput::SceneColor(camera) => {
                if self.withheld.contains(&camera) {
                    return Err(BlurError::MissingSceneColor(camera));
                }
                DrawInput::Scene(camera)
            }
            PassInput::Target(source) => {
                assert_ne!(source.id, target.id, "pass samples its own target");
                DrawInput::Target(source.id)
            }
        };
        self.draws.push(DrawCall {
            target: target.id,
            program: program.kind,
            input,
            params: *params,
        });
        Ok(())
    }
}
