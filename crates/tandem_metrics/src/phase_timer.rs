//! Wall-clock timing of named phases (bootstrap, bridge, export)

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Accumulated timing for one phase.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PhaseStats {
    pub runs: u64,
    pub total: Duration,
}

#[derive(Debug, Default, Clone)]
pub struct PhaseTimer {
    phases: BTreeMap<&'static str, PhaseStats>,
}

impl PhaseTimer {
    pub fn new() -> Self {
        Self {
            phases: BTreeMap::new(),
        }
    }

    /// Run `f`, charging its elapsed time to `phase`.
    pub fn time<F, R>(&mut self, phase: &'static str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        let stats = self.phases.entry(phase).or_default();
        stats.runs += 1;
        stats.total += start.elapsed();
        result
    }

    pub fn stats(&self, phase: &str) -> PhaseStats {
        self.phases.get(phase).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_are_counted_per_phase() {
        let mut timer = PhaseTimer::new();
        timer.time("bootstrap", || ());
        timer.time("bridge", || ());
        timer.time("bridge", || ());

        assert_eq!(timer.stats("bootstrap").runs, 1);
        assert_eq!(timer.stats("bridge").runs, 2);
        assert_eq!(timer.stats("export"), PhaseStats::default());
    }
}
