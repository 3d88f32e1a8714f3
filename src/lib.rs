//! Lane Runner - A three-lane endless runner
//!
//! Core modules:
//! - `sim`: Deterministic simulation (movement, spawning, pickups, game state)
//! - `game`: Frame driver tying input, assets, simulation and rendering together
//! - `input`: Keyboard/touch normalization into movement intents
//! - `assets`: Asynchronous asset provider seam
//! - `scene`: Per-frame snapshot handed to the scene renderer
//! - `tuning`: Data-driven game balance

pub mod assets;
pub mod game;
pub mod input;
pub mod scene;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use game::{Game, Selection};
pub use settings::Settings;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one step per browser frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Lane centers, left to right
    pub const LANES: [f32; 3] = [-1.5, 0.0, 1.5];
    /// Player x is clamped to [-LANE_LIMIT, LANE_LIMIT]
    pub const LANE_LIMIT: f32 = 1.5;

    /// Player forward travel per tick (toward -z)
    pub const FORWARD_SPEED: f32 = 0.1;
    /// Entity drift per tick toward the player (toward +z)
    pub const CLOSING_SPEED: f32 = 0.1;
    /// Lateral travel per tick while a move intent is held
    pub const LATERAL_STEP: f32 = 0.1;
    /// Vertical travel per tick during a jump arc
    pub const JUMP_STEP: f32 = 0.1;
    /// Ascended height at which a jump turns into a fall
    pub const JUMP_APEX: f32 = 1.2;

    /// Spawner periods
    pub const OBSTACLE_PERIOD_MS: u32 = 2000;
    pub const COIN_PERIOD_MS: u32 = 1500;
    /// Entities appear this far ahead of the player
    pub const SPAWN_DISTANCE: f32 = 20.0;
    pub const OBSTACLE_HEIGHT: f32 = 0.0;
    pub const COIN_HEIGHT: f32 = 0.5;

    /// Proximity below which the player touches an entity
    pub const HIT_RADIUS: f32 = 0.5;
    pub const COIN_VALUE: u64 = 10;
    /// Entities this far behind the player are dropped
    pub const CULL_DISTANCE: f32 = 10.0;

    /// Render-only coin yaw per tick
    pub const COIN_SPIN_PER_TICK: f32 = 0.1;
}

/// Convert a wall-clock period to a whole number of simulation ticks (at least 1)
#[inline]
pub fn ms_to_ticks(ms: u32) -> u32 {
    ((ms as f32 / 1000.0) / consts::SIM_DT).round().max(1.0) as u32
}

/// Index of the lane whose center is closest to `x`
#[inline]
pub fn nearest_lane(x: f32, lanes: &[f32]) -> usize {
    lanes
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (*a - x)
                .abs()
                .partial_cmp(&(*b - x).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}
