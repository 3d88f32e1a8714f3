//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod movement;
pub mod registry;
pub mod spawner;
pub mod state;
pub mod tick;

pub use collision::{Evaluation, evaluate, touches};
pub use registry::{EntityRegistry, SpawnRequest};
pub use spawner::Spawner;
pub use state::{
    Entity, EntityKind, GameEvent, GamePhase, GameState, Intents, JumpPhase, LaneIntent, Player,
    Session,
};
pub use tick::{TickInput, tick};
