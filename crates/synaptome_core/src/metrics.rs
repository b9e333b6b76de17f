//! Performance metrics for the transition engine.
//!
//! Round and per-phase timings are kept in atomics so they can be read while
//! a simulation runs on another thread.

use crate::engine::Phase;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Rounds between info-level progress lines.
const ROUND_LOG_INTERVAL: u64 = 100;

/// Counters collected by a [`TransitionEngine`](crate::engine::TransitionEngine).
#[derive(Debug)]
pub struct EngineMetrics {
    rounds: AtomicU64,
    round_nanos: AtomicU64,
    phase_nanos: [AtomicU64; Phase::ALL.len()],
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rounds: AtomicU64::new(0),
            round_nanos: AtomicU64::new(0),
            phase_nanos: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }

    pub fn record_phase(&self, phase: Phase, duration: Duration) {
        self.phase_nanos[phase.index()].fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Records a finished round.
    pub fn record_round(&self, time_step: u64, duration: Duration) {
        let rounds = self.rounds.fetch_add(1, Ordering::Relaxed) + 1;
        self.round_nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);

        tracing::debug!(
            time_step,
            duration_us = duration.as_micros() as u64,
            "Round finished"
        );
        if rounds.is_multiple_of(ROUND_LOG_INTERVAL) {
            tracing::info!(
                rounds,
                mean_round_us = self.mean_round().as_micros() as u64,
                "Simulation progress"
            );
        }
    }

    #[must_use]
    pub fn rounds(&self) -> u64 {
        self.rounds.load(Ordering::Relaxed)
    }

    /// Time spent in `phase` over all rounds.
    #[must_use]
    pub fn phase_total(&self, phase: Phase) -> Duration {
        Duration::from_nanos(self.phase_nanos[phase.index()].load(Ordering::Relaxed))
    }

    #[must_use]
    pub fn mean_round(&self) -> Duration {
        let rounds = self.rounds();
        if rounds == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(self.round_nanos.load(Ordering::Relaxed) / rounds)
    }

    /// Per-phase totals, in phase order.
    pub fn phase_breakdown(&self) -> Vec<(Phase, Duration)> {
        Phase::ALL
            .iter()
            .map(|&phase| (phase, self.phase_total(phase)))
            .collect()
    }
}

/// Installs a fmt subscriber filtered by `RUST_LOG`, defaulting to `info`.
/// Safe to call more than once; only the first call takes effect.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = EngineMetrics::new();
        assert_eq!(metrics.rounds(), 0);
        assert_eq!(metrics.mean_round(), Duration::ZERO);
    }

    #[test]
    fn test_record_round_and_phase() {
        let metrics = EngineMetrics::new();
        metrics.record_phase(Phase::Signalling, Duration::from_micros(30));
        metrics.record_phase(Phase::Signalling, Duration::from_micros(12));
        metrics.record_round(0, Duration::from_millis(2));
        metrics.record_round(1, Duration::from_millis(4));
        assert_eq!(metrics.rounds(), 2);
        assert_eq!(metrics.phase_total(Phase::Signalling), Duration::from_micros(42));
        assert_eq!(metrics.phase_total(Phase::Cells), Duration::ZERO);
        assert_eq!(metrics.mean_round(), Duration::from_millis(3));
    }

    #[test]
    fn test_init_logging_twice() {
        init_logging();
        init_logging();
    }
}
