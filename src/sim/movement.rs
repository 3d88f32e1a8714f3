//! Player movement: forward run, lane-clamped strafing, and the jump arc
//!
//! All three advance by fixed per-tick steps, so a run is reproducible tick
//! for tick regardless of the display's frame rate.

use super::state::{Intents, JumpPhase, LaneIntent, Player};
use crate::tuning::Tuning;

/// Advance the player by one tick
pub fn step(player: &mut Player, intents: &Intents, tuning: &Tuning) {
    player.intent = LaneIntent {
        move_left: intents.move_left,
        move_right: intents.move_right,
    };

    player.pos.z -= tuning.forward_speed;
    strafe(player, tuning);
    step_jump(player, intents.jump, tuning);
}

fn strafe(player: &mut Player, tuning: &Tuning) {
    let limit = tuning.lane_limit;
    if player.intent.move_left && player.pos.x > -limit {
        player.pos.x = (player.pos.x - tuning.lateral_step).max(-limit);
    }
    if player.intent.move_right && player.pos.x < limit {
        player.pos.x = (player.pos.x + tuning.lateral_step).min(limit);
    }
}

/// Jump arc. A held or pressed jump only matters while grounded; mid-arc
/// input is ignored until the player lands.
fn step_jump(player: &mut Player, jump: bool, tuning: &Tuning) {
    if jump && player.jump.is_grounded() {
        player.jump = JumpPhase::Ascending { ascended: 0.0 };
    }

    player.jump = match player.jump {
        JumpPhase::Grounded => JumpPhase::Grounded,
        JumpPhase::Ascending { ascended } => {
            player.pos.y += tuning.jump_step;
            let ascended = ascended + tuning.jump_step;
            if ascended >= tuning.jump_apex {
                JumpPhase::Descending
            } else {
                JumpPhase::Ascending { ascended }
            }
        }
        JumpPhase::Descending => {
            player.pos.y -= tuning.jump_step;
            if player.pos.y <= 0.0 {
                player.pos.y = 0.0;
                JumpPhase::Grounded
            } else {
                JumpPhase::Descending
            }
        }
    };
}
