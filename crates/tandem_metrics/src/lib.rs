//! Tandem Metrics - bookkeeping for the bridging hot path
//!
//! Named event counters and per-phase timers used by the context bridge to
//! report how often it bootstraps, bridges, and exports. Everything here
//! vanishes when the `metrics` feature is off.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable metrics collection (default: disabled)
//!
//! # Usage
//!
//! ```ignore
//! use tandem_metrics::{Counter, PhaseTimer};
//!
//! let mut counter = Counter::new();
//! let mut phases = PhaseTimer::new();
//! phases.time("bridge", || counter.increment("bridge.contexts", 1));
//! assert_eq!(counter.get("bridge.contexts"), 1);
//! ```

#[cfg(feature = "metrics")]
mod counter;
#[cfg(feature = "metrics")]
mod phase_timer;

#[cfg(feature = "metrics")]
pub use counter::Counter;
#[cfg(feature = "metrics")]
pub use phase_timer::{PhaseStats, PhaseTimer};

// ============================================================================
// Macros for conditional compilation
// ============================================================================

/// Execute code only when metrics are enabled
#[macro_export]
macro_rules! metrics {
    ($($tt:tt)*) => {
        #[cfg(feature = "metrics")]
        {
            $($tt)*
        }
    };
}

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default, Clone)]
pub struct Counter;

#[cfg(not(feature = "metrics"))]
impl Counter {
    pub fn new() -> Self { Self }
    pub fn increment(&mut self, _name: &'static str, _value: u64) {}
    pub fn get(&self, _name: &str) -> u64 { 0 }
    pub fn snapshot(&self) -> Vec<(&'static str, u64)> { Vec::new() }
}

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PhaseStats {
    pub runs: u64,
    pub total: std::time::Duration,
}

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default, Clone)]
pub struct PhaseTimer;

#[cfg(not(feature = "metrics"))]
impl PhaseTimer {
    pub fn new() -> Self { Self }
    pub fn time<F, R>(&mut self, _phase: &'static str, f: F) -> R where F: FnOnce() -> R { f() }
    pub fn stats(&self, _phase: &str) -> PhaseStats { PhaseStats::default() }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_compiles_in_either_mode() {
        let mut counter = super::Counter::new();
        counter.increment("events", 2);
        let mut phases = super::PhaseTimer::new();
        let value = phases.time("phase", || 7);
        assert_eq!(value, 7);
    }
}
