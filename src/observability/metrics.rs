//! Dispatch metrics collection and reporting

use crate::filters::DispatchReport;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Point-in-time copy of the dispatch counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    /// Total dispatches started
    pub dispatches: u64,

    /// Dispatches halted by a before or around filter
    pub halted: u64,

    /// Dispatches in which the action body ran
    pub actions_performed: u64,

    /// Filters invoked across all dispatches
    pub filters_invoked: u64,

    /// Dispatches that returned an error
    pub errors: u64,

    /// Share of dispatches halted before the action
    pub halt_rate: f64,

    /// Uptime in seconds
    pub uptime_secs: u64,
}

/// Counters shared by every chain holding the same handle
pub struct DispatchMetrics {
    start_time: Instant,
    dispatches: AtomicU64,
    halted: AtomicU64,
    actions_performed: AtomicU64,
    filters_invoked: AtomicU64,
    errors: AtomicU64,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            dispatches: AtomicU64::new(0),
            halted: AtomicU64::new(0),
            actions_performed: AtomicU64::new(0),
            filters_invoked: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    /// Record the outcome of one dispatch
    pub fn record(&self, report: &DispatchReport, ok: bool) {
        self.dispatches.fetch_add(1, Ordering::Relaxed);
        self.filters_invoked
            .fetch_add(report.filters_invoked as u64, Ordering::Relaxed);

        if report.is_halted() {
            self.halted.fetch_add(1, Ordering::Relaxed);
        }
        if report.action_performed {
            self.actions_performed.fetch_add(1, Ordering::Relaxed);
        }
        if !ok {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let dispatches = self.dispatches.load(Ordering::Relaxed);
        let halted = self.halted.load(Ordering::Relaxed);

        let halt_rate = if dispatches > 0 {
            halted as f64 / dispatches as f64
        } else {
            0.0
        };

        MetricsSnapshot {
            dispatches,
            halted,
            actions_performed: self.actions_performed.load(Ordering::Relaxed),
            filters_invoked: self.filters_invoked.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            halt_rate,
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }

    /// Export metrics in Prometheus format
    pub fn export_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        let counters = [
            (
                "action_filters_dispatches_total",
                "Total number of dispatches",
                snapshot.dispatches,
            ),
            (
                "action_filters_halted_total",
                "Dispatches halted before the action ran",
                snapshot.halted,
            ),
            (
                "action_filters_actions_performed_total",
                "Dispatches that ran the action body",
                snapshot.actions_performed,
            ),
            (
                "action_filters_filters_invoked_total",
                "Filters invoked across all phases",
                snapshot.filters_invoked,
            ),
            (
                "action_filters_errors_total",
                "Dispatches that returned an error",
                snapshot.errors,
            ),
        ];

        let mut output = String::new();
        for (name, help, value) in counters {
            output.push_str(&format!("# HELP {} {}\n", name, help));
            output.push_str(&format!("# TYPE {} counter\n", name));
            output.push_str(&format!("{} {}\n", name, value));
        }

        output.push_str("# HELP action_filters_uptime_seconds Uptime in seconds\n");
        output.push_str("# TYPE action_filters_uptime_seconds gauge\n");
        output.push_str(&format!("action_filters_uptime_seconds {}\n", snapshot.uptime_secs));

        output
    }
}

impl Default for DispatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{DispatchState, HaltPoint, Phase};

    fn report(halted: bool, performed: bool, invoked: usize) -> DispatchReport {
        DispatchReport {
            action: "index".to_string(),
            halted: halted.then(|| HaltPoint {
                phase: Phase::Before,
                filter: "auth".to_string(),
            }),
            action_performed: performed,
            filters_invoked: invoked,
            after_skipped: halted,
            transitions: vec![DispatchState::Idle, DispatchState::Done],
        }
    }

    #[test]
    fn test_record_counts_outcomes() {
        let metrics = DispatchMetrics::new();
        metrics.record(&report(false, true, 3), true);
        metrics.record(&report(true, false, 1), true);
        metrics.record(&report(false, true, 2), false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.dispatches, 3);
        assert_eq!(snapshot.halted, 1);
        assert_eq!(snapshot.actions_performed, 2);
        assert_eq!(snapshot.filters_invoked, 6);
        assert_eq!(snapshot.errors, 1);
        assert!((snapshot.halt_rate - 1.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = DispatchMetrics::default().snapshot();
        assert_eq!(snapshot.dispatches, 0);
        assert_eq!(snapshot.halt_rate, 0.0);
    }

    #[test]
    fn test_export_prometheus() {
        let metrics = DispatchMetrics::new();
        metrics.record(&report(true, false, 1), true);

        let output = metrics.export_prometheus();
        assert!(output.contains("# TYPE action_filters_dispatches_total counter"));
        assert!(output.contains("action_filters_dispatches_total 1\n"));
        assert!(output.contains("action_filters_halted_total 1\n"));
        assert!(output.contains("action_filters_uptime_seconds"));
    }
}
