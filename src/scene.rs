//! Per-frame snapshot for the scene renderer
//!
//! The renderer is a black box that receives transforms. Entity instances are
//! laid out as plain `#[repr(C)]` data so a GPU-backed renderer can upload
//! `instance_bytes()` straight into an instance buffer.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::assets::AssetHandle;
use crate::sim::{EntityKind, GameState};

/// Camera sits this far above and behind the player
pub const CAMERA_OFFSET: Vec3 = Vec3::new(0.0, 2.0, 5.0);
/// The road model sits just below the track surface
pub const ROAD_POSITION: Vec3 = Vec3::new(0.0, -1.0, 0.0);

/// Instance tags
pub mod tags {
    pub const PLAYER: u32 = 0;
    pub const OBSTACLE: u32 = 1;
    pub const COIN: u32 = 2;
    pub const ROAD: u32 = 3;
}

/// Handle value meaning "not loaded (yet)"
pub const NO_HANDLE: u32 = 0;

/// One drawable transform
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Instance {
    pub position: [f32; 3],
    /// Rotation about +y (radians)
    pub yaw: f32,
    /// Entity ID (0 for the player)
    pub id: u32,
    pub tag: u32,
    /// Provider handle of the model to draw, `NO_HANDLE` if not loaded
    pub handle: u32,
}

impl Instance {
    pub const fn new(id: u32, tag: u32, handle: u32, position: Vec3, yaw: f32) -> Self {
        Self {
            position: [position.x, position.y, position.z],
            yaw,
            id,
            tag,
            handle,
        }
    }
}

/// Scene models that are not track entities
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneHandles {
    pub character: Option<AssetHandle>,
    pub road: Option<AssetHandle>,
}

fn handle_value(handle: Option<AssetHandle>) -> u32 {
    handle.map_or(NO_HANDLE, |h| h.0)
}

fn tag_for(kind: EntityKind) -> u32 {
    match kind {
        EntityKind::Obstacle => tags::OBSTACLE,
        EntityKind::Coin => tags::COIN,
    }
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub tick: u64,
    /// Wall-clock seconds since the previous frame, for animation mixers
    pub dt: f32,
    pub player: Instance,
    /// Present once the road model has loaded
    pub road: Option<Instance>,
    /// Obstacles then coins, each sorted by ID
    pub entities: Vec<Instance>,
    pub camera_eye: Vec3,
    pub camera_target: Vec3,
    /// Background texture to switch to, only on the frame it became available
    pub background: Option<String>,
    pub score: u64,
    pub game_over: bool,
}

impl FrameSnapshot {
    pub fn capture(
        state: &GameState,
        handles: &SceneHandles,
        background: Option<String>,
        dt: f32,
    ) -> Self {
        let player_pos = state.player.pos;
        let entities = state
            .registry
            .iter()
            .map(|e| Instance::new(e.id, tag_for(e.kind), e.handle.0, e.pos, e.yaw()))
            .collect();
        let road = handles
            .road
            .map(|h| Instance::new(0, tags::ROAD, h.0, ROAD_POSITION, 0.0));

        // Follow the player down the track; stay centered on the road
        let camera_target = Vec3::new(0.0, 0.0, player_pos.z);
        Self {
            tick: state.time_ticks,
            dt,
            player: Instance::new(
                0,
                tags::PLAYER,
                handle_value(handles.character),
                player_pos,
                0.0,
            ),
            road,
            entities,
            camera_eye: camera_target + CAMERA_OFFSET,
            camera_target,
            background,
            score: state.session.score,
            game_over: state.session.game_over,
        }
    }

    /// Entity instances as raw bytes
    pub fn instance_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.entities)
    }

    /// Player and road (if loaded) as raw bytes, player first
    pub fn scenery_bytes(&self) -> Vec<u8> {
        let mut bytes = bytemuck::bytes_of(&self.player).to_vec();
        if let Some(road) = &self.road {
            bytes.extend_from_slice(bytemuck::bytes_of(road));
        }
        bytes
    }
}

pub trait SceneRenderer {
    fn draw(&mut self, frame: &FrameSnapshot);
}

/// Renderer that only counts frames (headless runs)
#[derive(Debug, Default)]
pub struct NullRenderer {
    pub frames: u64,
}

impl SceneRenderer for NullRenderer {
    fn draw(&mut self, _frame: &FrameSnapshot) {
        self.frames += 1;
    }
}
