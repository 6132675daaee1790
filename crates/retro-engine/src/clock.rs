//! Time Sources
//!
//! Budgets read time through [`Clock`] so scans can be driven by a fake clock.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Millisecond time source
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin; never decreases
    fn now_ms(&self) -> f64;
}

/// Wall clock over [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Clock that advances by a fixed step on every read, modelling a constant
/// cost per unit of work. Clones share the same time.
#[derive(Debug, Clone)]
pub struct SteppingClock {
    now: Rc<Cell<f64>>,
    step_ms: f64,
}

impl SteppingClock {
    pub fn new(step_ms: f64) -> Self {
        Self { now: Rc::new(Cell::new(0.0)), step_ms }
    }

    /// Current time without advancing
    pub fn peek(&self) -> f64 {
        self.now.get()
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for SteppingClock {
    fn now_ms(&self) -> f64 {
        let now = self.now.get();
        self.now.set(now + self.step_ms);
        now
    }
}

/// Elapsed-time allowance started at construction
pub struct Budget<'a> {
    clock: &'a dyn Clock,
    start: f64,
    limit_ms: f64,
}

impl<'a> Budget<'a> {
    pub fn start(clock: &'a dyn Clock, limit_ms: f64) -> Self {
        Self { clock, start: clock.now_ms(), limit_ms }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.clock.now_ms() - self.start
    }

    pub fn exhausted(&self) -> bool {
        self.elapsed_ms() >= self.limit_ms
    }
}
