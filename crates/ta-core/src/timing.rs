//! Wall-clock counters for the hot evaluation paths of a run.
//!
//! Newton solves, residuals and Jacobian solves each feed one counter.
//! Nothing is recorded unless collection is switched on with
//! [`enable_timing`] or the `TA_TIMING` environment variable.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering::Relaxed};
use std::time::{Duration, Instant};

static COLLECT: AtomicBool = AtomicBool::new(false);

pub fn enable_timing() {
    COLLECT.store(true, Relaxed);
}

pub fn is_enabled() -> bool {
    COLLECT.load(Relaxed) || std::env::var_os("TA_TIMING").is_some()
}

/// Sum and number of the durations recorded under one label.
pub struct AccumulatingTimer {
    label: &'static str,
    nanos: AtomicU64,
    calls: AtomicU64,
}

impl AccumulatingTimer {
    pub const fn new(label: &'static str) -> Self {
        Self {
            label,
            nanos: AtomicU64::new(0),
            calls: AtomicU64::new(0),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn record(&self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(nanos, Relaxed);
        self.calls.fetch_add(1, Relaxed);
    }

    /// Start a scope; the elapsed time is recorded when the guard drops.
    pub fn scope(&'static self) -> ScopeTimer {
        ScopeTimer {
            timer: self,
            start: is_enabled().then(Instant::now),
        }
    }

    /// Seconds accumulated so far.
    pub fn total_seconds(&self) -> f64 {
        Duration::from_nanos(self.nanos.load(Relaxed)).as_secs_f64()
    }

    pub fn count(&self) -> u64 {
        self.calls.load(Relaxed)
    }

    /// Mean seconds per call, zero before the first call.
    pub fn average_seconds(&self) -> f64 {
        match self.count() {
            0 => 0.0,
            n => self.total_seconds() / n as f64,
        }
    }

    pub fn reset(&self) {
        self.nanos.store(0, Relaxed);
        self.calls.store(0, Relaxed);
    }
}

/// Guard returned by [`AccumulatingTimer::scope`].
pub struct ScopeTimer {
    timer: &'static AccumulatingTimer,
    start: Option<Instant>,
}

impl Drop for ScopeTimer {
    fn drop(&mut self) {
        if let Some(start) = self.start {
            self.timer.record(start.elapsed());
        }
    }
}

/// Timers for the stochastic step path.
pub mod ams_timing {
    use super::AccumulatingTimer;

    pub static NEWTON: AccumulatingTimer = AccumulatingTimer::new("AMS: Newton");
    pub static TIME_STEP: AccumulatingTimer = AccumulatingTimer::new("AMS: Time step");
    pub static RESIDUAL: AccumulatingTimer = AccumulatingTimer::new("AMS: F");
    pub static JACOBIAN_SOLVE: AccumulatingTimer =
        AccumulatingTimer::new("AMS: Jacobian solve");

    pub fn all() -> [&'static AccumulatingTimer; 4] {
        [&NEWTON, &TIME_STEP, &RESIDUAL, &JACOBIAN_SOLVE]
    }

    /// One `info!` line per counter that saw at least one call.
    pub fn log_summary() {
        if !super::is_enabled() {
            return;
        }
        for timer in all().into_iter().filter(|t| t.count() > 0) {
            tracing::info!(
                calls = timer.count(),
                total_s = timer.total_seconds(),
                avg_ms = timer.average_seconds() * 1e3,
                "{}",
                timer.label()
            );
        }
    }
}
