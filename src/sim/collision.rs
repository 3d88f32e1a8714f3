//! Obstacle collisions and coin pickups
//!
//! Both use plain 3D Euclidean distance between the player and the entity.
//! Obstacles only count once they have reached or passed the player along
//! the track; coins count from any side.

use glam::Vec3;

use super::registry::EntityRegistry;
use super::state::Player;
use crate::tuning::Tuning;

/// Outcome of one evaluation pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    /// First obstacle the player ran into, if any
    pub obstacle_hit: Option<u32>,
    /// Coins picked up (already removed from the registry)
    pub collected: Vec<u32>,
}

/// True if two points are closer than `radius`
#[inline]
pub fn touches(a: Vec3, b: Vec3, radius: f32) -> bool {
    a.distance(b) < radius
}

/// Advance every live entity toward the player, then test for hits.
///
/// An obstacle hit ends evaluation for this tick: coins still drift but
/// nothing is collected, so the score cannot change on the frame the run ends.
pub fn evaluate(player: &Player, registry: &mut EntityRegistry, tuning: &Tuning) -> Evaluation {
    let mut result = Evaluation::default();

    for obstacle in registry.obstacles_mut() {
        obstacle.advance(tuning.closing_speed);
        if result.obstacle_hit.is_none()
            && obstacle.pos.z >= player.pos.z
            && touches(obstacle.pos, player.pos, tuning.hit_radius)
        {
            result.obstacle_hit = Some(obstacle.id);
        }
    }

    let game_over = result.obstacle_hit.is_some();
    for coin in registry.coins_mut() {
        coin.advance(tuning.closing_speed);
        if !game_over && touches(coin.pos, player.pos, tuning.hit_radius) {
            result.collected.push(coin.id);
        }
    }

    // Pickup and removal happen in the same pass, so a coin is counted once
    registry.remove_coins(&result.collected);
    result
}
