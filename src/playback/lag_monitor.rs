//! Frame completion lag diagnostics
//!
//! Measures, for every completed frame, how late the completion event fired
//! relative to the frame's theoretical end on the device clock. The longer
//! the lag, the less time remains to schedule the next frame before the
//! in-flight one runs out.
//!
//! For instance, with a 4096-sample frame and a lag of 3000 samples, only
//! time equivalent to 1096 samples is left to schedule the following frame.
//!
//! Purely observational: lag never alters scheduling decisions.

use tracing::{trace, warn};

/// Tracks completion lag across a playback session.
pub struct LagMonitor {
    /// Frame length in samples; a lag of one full frame means the scheduling
    /// margin was completely consumed.
    frame_len: u32,

    completions: u64,
    late_completions: u64,
    last_lag_samples: i64,
    max_lag_samples: i64,
}

impl LagMonitor {
    pub fn new(frame_len: u32) -> Self {
        Self {
            frame_len,
            completions: 0,
            late_completions: 0,
            last_lag_samples: 0,
            max_lag_samples: 0,
        }
    }

    /// Record a completion event.
    ///
    /// `expected_end` is the frame's scheduled start plus its length;
    /// `completed_at` is the device clock reading when the event arrived.
    /// Returns the lag in samples (negative if the event arrived early, which
    /// a device reporting at period granularity can legitimately do).
    pub fn record(&mut self, expected_end: u64, completed_at: u64) -> i64 {
        let lag = completed_at as i64 - expected_end as i64;

        self.completions += 1;
        self.last_lag_samples = lag;
        if lag > self.max_lag_samples {
            self.max_lag_samples = lag;
        }

        if lag >= self.frame_len as i64 {
            self.late_completions += 1;
            warn!(
                lag_samples = lag,
                frame_len = self.frame_len,
                "completion event consumed the entire scheduling margin"
            );
        } else {
            trace!(lag_samples = lag, "frame completion lag");
        }

        lag
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> LagStats {
        LagStats {
            completions: self.completions,
            late_completions: self.late_completions,
            last_lag_samples: self.last_lag_samples,
            max_lag_samples: self.max_lag_samples,
        }
    }
}

/// Lag statistics snapshot
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct LagStats {
    /// Total completion events measured
    pub completions: u64,
    /// Completions whose lag reached a full frame length
    pub late_completions: u64,
    /// Lag of the most recent completion, in samples
    pub last_lag_samples: i64,
    /// Largest lag observed, in samples
    pub max_lag_samples: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lag_is_completion_minus_expected_end() {
        let mut monitor = LagMonitor::new(4096);

        // Frame scheduled at 0, ends at 4096, event arrives at 4196
        assert_eq!(monitor.record(4096, 4196), 100);
        let stats = monitor.stats();
        assert_eq!(stats.completions, 1);
        assert_eq!(stats.last_lag_samples, 100);
        assert_eq!(stats.max_lag_samples, 100);
        assert_eq!(stats.late_completions, 0);
    }

    #[test]
    fn test_early_completion_is_negative() {
        let mut monitor = LagMonitor::new(4096);
        assert_eq!(monitor.record(4096, 4000), -96);
        assert_eq!(monitor.stats().max_lag_samples, 0);
    }

    #[test]
    fn test_full_frame_lag_counts_as_late() {
        let mut monitor = LagMonitor::new(4096);
        monitor.record(4096, 4096 + 4096);
        assert_eq!(monitor.stats().late_completions, 1);
    }

    #[test]
    fn test_max_lag_tracks_worst_case() {
        let mut monitor = LagMonitor::new(1024);
        monitor.record(1024, 1124); // lag 100
        monitor.record(2048, 2548); // lag 500
        monitor.record(3072, 3082); // lag 10

        let stats = monitor.stats();
        assert_eq!(stats.completions, 3);
        assert_eq!(stats.max_lag_samples, 500);
        assert_eq!(stats.last_lag_samples, 10);
    }
}
