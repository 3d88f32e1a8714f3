//! Data-driven game balance
//!
//! Every gameplay constant the simulation reads lives here so a run can be
//! rebalanced from JSON without a rebuild. Defaults match `crate::consts`.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum TuningError {
    /// The document is not valid tuning JSON
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is outside the range the simulation can run with
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Gameplay balance knobs (per-tick distances, millisecond periods)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub forward_speed: f32,
    pub closing_speed: f32,
    pub lateral_step: f32,
    pub jump_step: f32,
    pub jump_apex: f32,
    pub lane_limit: f32,
    pub obstacle_period_ms: u32,
    pub coin_period_ms: u32,
    pub spawn_distance: f32,
    pub hit_radius: f32,
    pub coin_value: u64,
    pub cull_distance: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            forward_speed: FORWARD_SPEED,
            closing_speed: CLOSING_SPEED,
            lateral_step: LATERAL_STEP,
            jump_step: JUMP_STEP,
            jump_apex: JUMP_APEX,
            lane_limit: LANE_LIMIT,
            obstacle_period_ms: OBSTACLE_PERIOD_MS,
            coin_period_ms: COIN_PERIOD_MS,
            spawn_distance: SPAWN_DISTANCE,
            hit_radius: HIT_RADIUS,
            coin_value: COIN_VALUE,
            cull_distance: CULL_DISTANCE,
        }
    }
}

impl Tuning {
    /// Parse and validate a tuning document. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Lane centers, left to right
    pub fn lanes(&self) -> [f32; 3] {
        [-self.lane_limit, 0.0, self.lane_limit]
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would stall a jump arc or break the lane clamp
    pub fn validate(&self) -> Result<(), TuningError> {
        let positive = [
            ("jump_step", self.jump_step),
            ("jump_apex", self.jump_apex),
            ("lane_limit", self.lane_limit),
            ("hit_radius", self.hit_radius),
            ("cull_distance", self.cull_distance),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(TuningError::Invalid {
                    field,
                    reason: "must be finite and greater than zero",
                });
            }
        }

        let non_negative = [
            ("forward_speed", self.forward_speed),
            ("closing_speed", self.closing_speed),
            ("lateral_step", self.lateral_step),
            ("spawn_distance", self.spawn_distance),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(TuningError::Invalid {
                    field,
                    reason: "must be finite and non-negative",
                });
            }
        }

        if self.obstacle_period_ms == 0 {
            return Err(TuningError::Invalid {
                field: "obstacle_period_ms",
                reason: "must be at least 1",
            });
        }
        if self.coin_period_ms == 0 {
            return Err(TuningError::Invalid {
                field: "coin_period_ms",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}
