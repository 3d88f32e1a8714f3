//! Game state and core simulation types
//!
//! Everything the tick mutates lives in one `GameState` aggregate owned by the
//! frame driver. Nothing in here touches the platform.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::registry::EntityRegistry;
use super::spawner::Spawner;
use crate::assets::{AssetError, AssetHandle, LoadTicket};
use crate::consts::*;
use crate::tuning::Tuning;

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the go-signal
    NotStarted,
    /// Active gameplay
    Running,
    /// Run ended (terminal)
    Ended,
}

/// What a track entity is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Obstacle,
    Coin,
}

impl EntityKind {
    /// Height an entity of this kind is placed at
    pub fn spawn_height(self) -> f32 {
        match self {
            EntityKind::Obstacle => OBSTACLE_HEIGHT,
            EntityKind::Coin => COIN_HEIGHT,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Obstacle => "obstacle",
            EntityKind::Coin => "coin",
        }
    }
}

/// An obstacle or coin on the track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: u32,
    pub kind: EntityKind,
    pub pos: Vec3,
    /// Renderable the entity was materialized from
    pub handle: AssetHandle,
    /// Ticks since the entity went live (drives the coin spin)
    #[serde(default)]
    pub age_ticks: u32,
}

impl Entity {
    pub fn new(id: u32, kind: EntityKind, pos: Vec3, handle: AssetHandle) -> Self {
        Self {
            id,
            kind,
            pos,
            handle,
            age_ticks: 0,
        }
    }

    /// Drift toward the player by one tick
    pub fn advance(&mut self, closing_speed: f32) {
        self.pos.z += closing_speed;
        self.age_ticks = self.age_ticks.saturating_add(1);
    }

    /// Render-only yaw for spinning coins
    pub fn yaw(&self) -> f32 {
        match self.kind {
            EntityKind::Coin => self.age_ticks as f32 * COIN_SPIN_PER_TICK,
            EntityKind::Obstacle => 0.0,
        }
    }
}

/// Movement intents for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intents {
    pub move_left: bool,
    pub move_right: bool,
    pub jump: bool,
}

/// Lateral intent the player is currently acting on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneIntent {
    pub move_left: bool,
    pub move_right: bool,
}

/// Jump arc state. Once left `Grounded`, only the arc itself can bring it back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum JumpPhase {
    Grounded,
    /// Rising; `ascended` is the height gained so far in this arc
    Ascending { ascended: f32 },
    Descending,
}

impl JumpPhase {
    pub fn is_grounded(&self) -> bool {
        matches!(self, JumpPhase::Grounded)
    }
}

/// The runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec3,
    pub intent: LaneIntent,
    pub jump: JumpPhase,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            pos: Vec3::ZERO,
            intent: LaneIntent::default(),
            jump: JumpPhase::Grounded,
        }
    }
}

/// Score and termination for one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub score: u64,
    pub game_over: bool,
    /// Simulated seconds while running
    pub elapsed: f32,
}

impl Session {
    /// Add points unless the run is over. Returns the new score if applied.
    pub fn award(&mut self, points: u64) -> Option<u64> {
        if self.game_over {
            return None;
        }
        self.score = self.score.saturating_add(points);
        Some(self.score)
    }

    /// Mark the run over. Returns false if it already was.
    pub fn end(&mut self) -> bool {
        if self.game_over {
            return false;
        }
        self.game_over = true;
        true
    }
}

/// Gameplay events for the UI layer, drained once per frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    RunStarted,
    Spawned { id: u32, kind: EntityKind },
    CoinCollected { id: u32, score: u64 },
    AssetFailed { ticket: u32, reason: String },
    GameOver { final_score: u64 },
}

/// Complete game state (deterministic for a given seed and input stream)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Lane picks for both spawners
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub phase: GamePhase,
    /// Simulation tick counter (running ticks only)
    pub time_ticks: u64,
    pub player: Player,
    pub session: Session,
    pub registry: EntityRegistry,
    pub obstacle_spawner: Spawner,
    pub coin_spawner: Spawner,
    events: Vec<GameEvent>,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Create a new game state with default tuning
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            obstacle_spawner: Spawner::new(EntityKind::Obstacle, tuning.obstacle_period_ms),
            coin_spawner: Spawner::new(EntityKind::Coin, tuning.coin_period_ms),
            tuning,
            phase: GamePhase::NotStarted,
            time_ticks: 0,
            player: Player::default(),
            session: Session::default(),
            registry: EntityRegistry::default(),
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// NotStarted -> Running. Returns false from any other phase.
    pub fn begin_run(&mut self) -> bool {
        if self.phase != GamePhase::NotStarted {
            return false;
        }
        self.phase = GamePhase::Running;
        self.events.push(GameEvent::RunStarted);
        log::info!("Run started (seed {})", self.seed);
        true
    }

    /// Running -> Ended. Cancels both spawners and freezes the jump arc where it is.
    /// Idempotent.
    pub fn end_run(&mut self) {
        if self.phase == GamePhase::Ended {
            return;
        }
        self.phase = GamePhase::Ended;
        self.obstacle_spawner.cancel();
        self.coin_spawner.cancel();
        let dropped = self.registry.cancel_in_flight();
        if self.session.end() {
            let final_score = self.session.score;
            self.events.push(GameEvent::GameOver { final_score });
            log::info!(
                "Game over: score {} after {:.1}s ({} pending loads dropped)",
                final_score,
                self.session.elapsed,
                dropped
            );
        }
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::Ended
    }

    /// Apply an asset completion. Successful loads are staged and go live at the
    /// next tick boundary; failures are logged and the entity never appears.
    pub fn resolve_load(&mut self, ticket: LoadTicket, result: Result<AssetHandle, AssetError>) {
        if self.phase == GamePhase::Ended {
            log::debug!("Ignoring load {} after game over", ticket.0);
            return;
        }
        if let Err(err) = self.registry.resolve(ticket, result) {
            log::warn!("Asset load {} failed: {}", ticket.0, err);
            self.events.push(GameEvent::AssetFailed {
                ticket: ticket.0,
                reason: err.to_string(),
            });
        }
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all events raised since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.registry.normalize_order();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_waiting() {
        let state = GameState::new(7);
        assert_eq!(state.phase, GamePhase::NotStarted);
        assert_eq!(state.player.pos, Vec3::ZERO);
        assert!(state.player.jump.is_grounded());
        assert_eq!(state.session.score, 0);
        assert!(state.registry.is_empty());
    }

    #[test]
    fn test_session_award_stops_after_end() {
        let mut session = Session::default();
        assert_eq!(session.award(10), Some(10));
        assert!(session.end());
        assert!(!session.end());
        assert_eq!(session.award(10), None);
        assert_eq!(session.score, 10);
    }

    #[test]
    fn test_end_run_is_idempotent() {
        let mut state = GameState::new(1);
        assert!(state.begin_run());
        state.end_run();
        state.end_run();
        let game_overs = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::GameOver { .. }))
            .count();
        assert_eq!(game_overs, 1);
        assert!(state.obstacle_spawner.is_cancelled());
        assert!(state.coin_spawner.is_cancelled());
        assert!(!state.begin_run());
    }

    #[test]
    fn test_failed_load_raises_event() {
        let mut state = GameState::new(1);
        state.begin_run();
        let id = state.next_entity_id();
        state.registry.request(crate::sim::registry::SpawnRequest {
            ticket: id,
            kind: EntityKind::Coin,
            pos: Vec3::new(0.0, COIN_HEIGHT, -20.0),
        });
        state.resolve_load(
            LoadTicket(id),
            Err(AssetError::NotFound("assets/coin.glb".into())),
        );
        state.registry.commit_staged();
        assert!(state.registry.is_empty());
        assert!(
            state
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::AssetFailed { ticket, .. } if *ticket == id))
        );
    }

    #[test]
    fn test_load_after_game_over_is_dropped() {
        let mut state = GameState::new(1);
        state.begin_run();
        let ok = state.next_entity_id();
        let failed = state.next_entity_id();
        for (ticket, kind) in [(ok, EntityKind::Obstacle), (failed, EntityKind::Coin)] {
            state.registry.request(crate::sim::registry::SpawnRequest {
                ticket,
                kind,
                pos: Vec3::new(0.0, kind.spawn_height(), -20.0),
            });
        }
        state.end_run();
        state.drain_events();

        state.resolve_load(LoadTicket(ok), Ok(AssetHandle(9)));
        state.resolve_load(
            LoadTicket(failed),
            Err(AssetError::NotFound("assets/coin.glb".into())),
        );
        assert!(state.registry.commit_staged().is_empty());
        assert!(state.registry.is_empty());
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_coin_spins_obstacle_does_not() {
        let mut coin = Entity::new(1, EntityKind::Coin, Vec3::ZERO, AssetHandle(1));
        let mut obstacle = Entity::new(2, EntityKind::Obstacle, Vec3::ZERO, AssetHandle(2));
        for _ in 0..5 {
            coin.advance(CLOSING_SPEED);
            obstacle.advance(CLOSING_SPEED);
        }
        assert!((coin.yaw() - 0.5).abs() < 1e-5);
        assert_eq!(obstacle.yaw(), 0.0);
    }
}
