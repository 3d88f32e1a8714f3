//! Frame driver
//!
//! Owns the simulation state together with its collaborators (input, asset
//! provider, renderer) and runs one browser frame at a time:
//!
//! 1. Expire timed input and apply asset completions (frame boundary)
//! 2. Run as many fixed simulation ticks as the elapsed time allows
//! 3. Forward new spawn requests to the asset provider
//! 4. Hand a snapshot to the renderer
//!
//! Once the run has ended no more ticks are run, but the last frame keeps
//! being drawn.

use crate::assets::{AssetKey, AssetProvider, LoadTicket};
use crate::consts::*;
use crate::input::InputSource;
use crate::scene::{FrameSnapshot, SceneHandles, SceneRenderer};
use crate::settings::Settings;
use crate::sim::{GameEvent, GamePhase, GameState, TickInput, tick};
use crate::tuning::Tuning;

/// Start-screen choices, passed through as opaque asset names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub character: String,
    pub theme: String,
}

impl Default for Selection {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for Selection {
    fn from(settings: &Settings) -> Self {
        Self {
            character: settings.character.clone(),
            theme: settings.theme.clone(),
        }
    }
}

/// Game instance holding all state
pub struct Game<A: AssetProvider, R: SceneRenderer> {
    state: GameState,
    assets: A,
    renderer: R,
    input: InputSource,
    accumulator: f32,
    last_time_ms: Option<f64>,
    idle_mode: bool,
    start_requested: bool,
    /// Character and road models once loaded
    handles: SceneHandles,
    /// Theme name waiting to be shown on the next drawn frame
    background: Option<String>,
}

impl<A: AssetProvider, R: SceneRenderer> Game<A, R> {
    pub fn new(seed: u64, tuning: Tuning, assets: A, renderer: R) -> Self {
        Self {
            state: GameState::with_tuning(seed, tuning),
            assets,
            renderer,
            input: InputSource::new(),
            accumulator: 0.0,
            last_time_ms: None,
            idle_mode: false,
            start_requested: false,
            handles: SceneHandles::default(),
            background: None,
        }
    }

    /// Go-signal: request the scene assets and start the run on the next tick.
    /// Ignored once a run is underway.
    pub fn start(&mut self, selection: &Selection) {
        if self.state.phase != GamePhase::NotStarted || self.start_requested {
            log::warn!("Start ignored: run already {:?}", self.state.phase);
            return;
        }
        log::info!(
            "Starting run with character {} and theme {}",
            selection.character,
            selection.theme
        );
        for key in [
            AssetKey::Character(selection.character.clone()),
            AssetKey::Theme(selection.theme.clone()),
            AssetKey::Road,
        ] {
            let ticket = LoadTicket(self.state.next_entity_id());
            self.assets.request(ticket, key);
        }
        self.start_requested = true;
    }

    pub fn input_mut(&mut self) -> &mut InputSource {
        &mut self.input
    }

    pub fn set_idle_mode(&mut self, idle: bool) {
        self.idle_mode = idle;
    }

    pub fn idle_mode(&self) -> bool {
        self.idle_mode
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn assets_mut(&mut self) -> &mut A {
        &mut self.assets
    }

    pub fn is_over(&self) -> bool {
        self.state.is_over()
    }

    pub fn scene_handles(&self) -> SceneHandles {
        self.handles
    }

    /// Run one display frame at wall-clock time `now_ms`. Returns the
    /// gameplay events raised during the frame.
    pub fn frame(&mut self, now_ms: f64) -> Vec<GameEvent> {
        // Clamp to avoid a burst of catch-up ticks after a stall
        let dt = match self.last_time_ms {
            Some(last) => ((now_ms - last) / 1000.0) as f32,
            None => SIM_DT,
        }
        .clamp(0.0, 0.1);
        self.last_time_ms = Some(now_ms);

        self.input.update(now_ms);
        self.apply_loads();

        if self.state.is_over() {
            self.accumulator = 0.0;
        } else {
            self.run_ticks(dt);
        }

        for request in self.state.registry.take_requests() {
            self.assets
                .request(LoadTicket(request.ticket), AssetKey::for_kind(request.kind));
        }

        let snapshot =
            FrameSnapshot::capture(&self.state, &self.handles, self.background.take(), dt);
        self.renderer.draw(&snapshot);

        self.state.drain_events()
    }

    fn run_ticks(&mut self, dt: f32) {
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = TickInput {
                intents: self.input.intents(),
                start: self.start_requested,
                idle_mode: self.idle_mode,
            };
            tick(&mut self.state, &input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            self.start_requested = false;
            self.input.consume_presses();

            if self.state.is_over() {
                self.accumulator = 0.0;
                break;
            }
        }
    }

    fn apply_loads(&mut self) {
        for done in self.assets.poll() {
            match done.key {
                AssetKey::Obstacle | AssetKey::Coin => {
                    self.state.resolve_load(done.ticket, done.result);
                }
                AssetKey::Theme(name) => match done.result {
                    Ok(_) => self.background = Some(name),
                    Err(e) => log::warn!("Theme unavailable: {}", e),
                },
                AssetKey::Character(name) => match done.result {
                    Ok(handle) => self.handles.character = Some(handle),
                    Err(e) => log::warn!("Character {} unavailable: {}", name, e),
                },
                AssetKey::Road => match done.result {
                    Ok(handle) => self.handles.road = Some(handle),
                    Err(e) => log::warn!("Road unavailable: {}", e),
                },
            }
        }
    }
}
