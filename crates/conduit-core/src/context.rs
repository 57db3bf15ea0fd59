//! Simulation context.
//!
//! Process-wide tick state lives here instead of in globals: whether the
//! world has finished loading, the wrapping tick counter used for gating,
//! and the tick-speed divisor. The host creates one per world and passes
//! it to every tick handler.

use serde::{Deserialize, Serialize};

use crate::fixed::Ticks;

pub const DEFAULT_TICK_SPEED: u64 = 10;
pub const DEFAULT_TICK_WRAP: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimContext {
    world_loaded: bool,
    /// Wraps at `tick_wrap`; only used for gating.
    tick_count: u64,
    tick_speed: u64,
    tick_wrap: u64,
    /// Monotonic ticks since construction; drives the scheduler.
    elapsed: Ticks,
}

impl Default for SimContext {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_SPEED, DEFAULT_TICK_WRAP)
    }
}

impl SimContext {
    /// Zero divisors are raised to 1.
    pub fn new(tick_speed: u64, tick_wrap: u64) -> Self {
        Self {
            world_loaded: false,
            tick_count: 0,
            tick_speed: tick_speed.max(1),
            tick_wrap: tick_wrap.max(1),
            elapsed: 0,
        }
    }

    pub fn is_world_loaded(&self) -> bool {
        self.world_loaded
    }

    pub fn mark_world_loaded(&mut self) {
        self.world_loaded = true;
    }

    /// Teardown on world unload. The monotonic clock keeps running so
    /// already-scheduled tasks stay ordered.
    pub fn unload(&mut self) {
        self.world_loaded = false;
        self.tick_count = 0;
    }

    /// Advance one game tick.
    pub fn advance(&mut self) {
        self.elapsed += 1;
        self.tick_count = (self.tick_count + 1) % self.tick_wrap;
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn elapsed(&self) -> Ticks {
        self.elapsed
    }

    pub fn tick_speed(&self) -> u64 {
        self.tick_speed
    }

    pub fn set_tick_speed(&mut self, speed: u64) {
        self.tick_speed = speed.max(1);
    }

    /// Whether gated sources act this tick.
    pub fn should_act(&self, forced: bool) -> bool {
        forced || self.tick_count % self.tick_speed == 0
    }

    /// A per-tick rate scaled to one gated activation.
    pub fn scaled_rate(&self, per_tick: u64) -> u64 {
        per_tick.saturating_mul(self.tick_speed)
    }
}
