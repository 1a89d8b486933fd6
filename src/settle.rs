//! Time and settle policy.
//!
//! Routers give no acknowledgment when a publish takes effect, so the run
//! waits fixed amounts of time instead: between publish commands, and after
//! a batch before polling starts. All of that waiting goes through
//! [`SettlePolicy`] and [`Clock`] so it can be replaced by an event-driven
//! wait without touching allocation or monitoring.

use crate::config::TimingConfig;
use crate::monitor::Phase;
use std::time::{Duration, Instant};

/// Monotonic time source
pub trait Clock: Sync {
    /// Time elapsed since the clock was created
    fn now(&self) -> Duration;

    fn sleep(&self, duration: Duration);
}

/// Wall-clock implementation backed by `Instant` and `thread::sleep`
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Where the run waits for effects it cannot observe directly
pub trait SettlePolicy: Sync {
    /// Pause between two publish commands of the same batch
    fn between_items(&self, phase: &Phase, clock: &dyn Clock);

    /// Pause after a batch, before the phase's first poll tick
    fn after_injection(&self, phase: &Phase, clock: &dyn Clock);
}

/// Fixed delays, separate for the cyclic phases and the second phase
#[derive(Debug, Clone)]
pub struct FixedDelays {
    pub per_item: Duration,
    pub second_phase_item: Duration,
    pub cycle_settle: Duration,
    pub second_phase_settle: Duration,
}

impl FixedDelays {
    pub fn from_timing(timing: &TimingConfig) -> Self {
        Self {
            per_item: timing.per_item_delay,
            second_phase_item: timing.second_phase_item_delay,
            cycle_settle: timing.cycle_settle,
            second_phase_settle: timing.second_phase_settle,
        }
    }

    /// No waiting at all
    pub fn none() -> Self {
        Self {
            per_item: Duration::ZERO,
            second_phase_item: Duration::ZERO,
            cycle_settle: Duration::ZERO,
            second_phase_settle: Duration::ZERO,
        }
    }
}

impl SettlePolicy for FixedDelays {
    fn between_items(&self, phase: &Phase, clock: &dyn Clock) {
        match phase {
            Phase::SecondPhase => clock.sleep(self.second_phase_item),
            _ => clock.sleep(self.per_item),
        }
    }

    fn after_injection(&self, phase: &Phase, clock: &dyn Clock) {
        let delay = match phase {
            Phase::SecondPhase => self.second_phase_settle,
            _ => self.cycle_settle,
        };
        log::info!("Waiting {:?} for {} injections to settle", delay, phase);
        clock.sleep(delay);
    }
}
