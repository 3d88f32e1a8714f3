//! Periodic obstacle and coin spawning
//!
//! Each spawner counts simulation ticks and fires once per period. A fired
//! spawner picks a lane with the run's seeded RNG and places the entity a
//! fixed distance ahead of the player.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::EntityKind;
use crate::ms_to_ticks;
use crate::tuning::Tuning;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spawner {
    kind: EntityKind,
    period_ticks: u32,
    elapsed_ticks: u32,
    cancelled: bool,
}

impl Spawner {
    pub fn new(kind: EntityKind, period_ms: u32) -> Self {
        Self {
            kind,
            period_ticks: ms_to_ticks(period_ms),
            elapsed_ticks: 0,
            cancelled: false,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn period_ticks(&self) -> u32 {
        self.period_ticks
    }

    /// Due-check for one tick. The first spawn lands a full period after the
    /// run starts; nothing fires once the game is over or after `cancel`.
    pub fn poll_due(&mut self, game_over: bool) -> bool {
        if self.cancelled || game_over {
            return false;
        }
        self.elapsed_ticks += 1;
        if self.elapsed_ticks >= self.period_ticks {
            self.elapsed_ticks = 0;
            true
        } else {
            false
        }
    }

    /// Stop this spawner for good
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Where the next entity goes: a uniformly chosen lane, `spawn_distance`
    /// ahead of the player
    pub fn placement<R: Rng + ?Sized>(&self, player_z: f32, tuning: &Tuning, rng: &mut R) -> Vec3 {
        let lanes = tuning.lanes();
        let x = lanes[rng.random_range(0..lanes.len())];
        Vec3::new(x, self.kind.spawn_height(), player_z - tuning.spawn_distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_fires_once_per_period() {
        let mut spawner = Spawner::new(EntityKind::Obstacle, OBSTACLE_PERIOD_MS);
        let fired: Vec<u32> = (1..=360).filter(|_| spawner.poll_due(false)).collect();
        assert_eq!(fired, vec![120, 240, 360]);
    }

    #[test]
    fn test_coin_period() {
        let mut spawner = Spawner::new(EntityKind::Coin, COIN_PERIOD_MS);
        let fired = (1..=270).filter(|_| spawner.poll_due(false)).count();
        assert_eq!(fired, 3);
    }

    #[test]
    fn test_game_over_guard_and_cancel() {
        let mut spawner = Spawner::new(EntityKind::Coin, COIN_PERIOD_MS);
        assert!(!(0..500).any(|_| spawner.poll_due(true)));

        let mut spawner = Spawner::new(EntityKind::Coin, COIN_PERIOD_MS);
        spawner.cancel();
        assert!(spawner.is_cancelled());
        assert!(!(0..500).any(|_| spawner.poll_due(false)));
    }

    #[test]
    fn test_placement_lanes_and_heights() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(11);
        let obstacles = Spawner::new(EntityKind::Obstacle, OBSTACLE_PERIOD_MS);
        let coins = Spawner::new(EntityKind::Coin, COIN_PERIOD_MS);

        let mut seen = [false; 3];
        for _ in 0..200 {
            let pos = obstacles.placement(-4.0, &tuning, &mut rng);
            let lane = LANES.iter().position(|&x| x == pos.x).unwrap();
            seen[lane] = true;
            assert_eq!(pos.y, OBSTACLE_HEIGHT);
            assert!((pos.z - (-24.0)).abs() < 1e-5);

            let pos = coins.placement(-4.0, &tuning, &mut rng);
            assert!(LANES.contains(&pos.x));
            assert_eq!(pos.y, COIN_HEIGHT);
        }
        assert_eq!(seen, [true; 3], "every lane should come up");
    }
}
