//! Keyboard and touch normalization
//!
//! Platform code forwards raw events here; the frame driver reads the
//! resulting `Intents` once per tick. Keyboard and swipe intents are tracked
//! separately so a swipe timing out never cancels a held arrow key.

use crate::sim::Intents;

/// Minimum horizontal travel for a swipe to count as a lane change
pub const SWIPE_THRESHOLD_PX: f32 = 50.0;
/// Swipe lane-change intents auto-release after this long
pub const SWIPE_RELEASE_MS: f64 = 200.0;

/// A game control bound to a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Left,
    Right,
    Jump,
}

impl Control {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" => Some(Control::Left),
            "ArrowRight" => Some(Control::Right),
            "ArrowUp" => Some(Control::Jump),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputSource {
    key_left: bool,
    key_right: bool,
    key_jump: bool,
    /// A jump press that has not been seen by a tick yet
    jump_latched: bool,
    touch_jump: bool,
    swipe_left: bool,
    swipe_right: bool,
    swipe_release_at: Option<f64>,
    touch_start_x: Option<f32>,
}

impl InputSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the key is bound
    pub fn key_down(&mut self, key: &str) -> bool {
        match Control::from_key(key) {
            Some(Control::Left) => self.key_left = true,
            Some(Control::Right) => self.key_right = true,
            Some(Control::Jump) => {
                self.key_jump = true;
                self.jump_latched = true;
            }
            None => return false,
        }
        true
    }

    pub fn key_up(&mut self, key: &str) -> bool {
        match Control::from_key(key) {
            Some(Control::Left) => self.key_left = false,
            Some(Control::Right) => self.key_right = false,
            Some(Control::Jump) => self.key_jump = false,
            None => return false,
        }
        true
    }

    /// A finger went down. Two fingers at once is a jump.
    pub fn touch_start(&mut self, screen_x: f32, touch_count: u32) {
        self.touch_start_x = Some(screen_x);
        if touch_count == 2 {
            self.touch_jump = true;
            self.jump_latched = true;
        }
    }

    /// A finger lifted. A long enough horizontal drag engages a lane change
    /// that releases on its own after `SWIPE_RELEASE_MS`.
    pub fn touch_end(&mut self, screen_x: f32, now_ms: f64) {
        if let Some(start) = self.touch_start_x.take() {
            let diff = screen_x - start;
            if diff > SWIPE_THRESHOLD_PX {
                self.swipe_right = true;
            } else if diff < -SWIPE_THRESHOLD_PX {
                self.swipe_left = true;
            }
        }
        self.swipe_release_at = Some(now_ms + SWIPE_RELEASE_MS);
        self.touch_jump = false;
    }

    /// Expire swipe intents; call once per frame before reading intents
    pub fn update(&mut self, now_ms: f64) {
        if let Some(at) = self.swipe_release_at {
            if now_ms >= at {
                self.swipe_left = false;
                self.swipe_right = false;
                self.swipe_release_at = None;
            }
        }
    }

    pub fn intents(&self) -> Intents {
        Intents {
            move_left: self.key_left || self.swipe_left,
            move_right: self.key_right || self.swipe_right,
            jump: self.key_jump || self.touch_jump || self.jump_latched,
        }
    }

    /// A tick has seen the current intents; drop one-shot presses
    pub fn consume_presses(&mut self) {
        self.jump_latched = false;
    }

    /// Release everything (window blur)
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
