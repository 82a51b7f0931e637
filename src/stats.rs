//! Pipeline counters.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

/// Counts of what the reflector did with captured frames.
///
/// Updated from both the capture task and the forwarding worker, so every
/// counter is an atomic.
#[derive(Debug, Default)]
pub struct ReflectorStatistics {
    /// Frames read from the capture channel.
    pub frames_received: AtomicU64,
    /// Frames classified as mDNS.
    pub mdns_candidates: AtomicU64,
    /// mDNS frames sent by the reflector itself.
    pub dropped_loop: AtomicU64,
    /// mDNS frames with no configured destination.
    pub dropped_unpooled: AtomicU64,
    /// Rewritten frames handed to the interface.
    pub frames_injected: AtomicU64,
    /// Rewritten frames the interface refused.
    pub inject_errors: AtomicU64,
    /// Capture read errors other than timeouts.
    pub capture_errors: AtomicU64,
}

/// Point-in-time copy of [`ReflectorStatistics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatisticsSnapshot {
    pub frames_received: u64,
    pub mdns_candidates: u64,
    pub dropped_loop: u64,
    pub dropped_unpooled: u64,
    pub frames_injected: u64,
    pub inject_errors: u64,
    pub capture_errors: u64,
}

impl ReflectorStatistics {
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            mdns_candidates: self.mdns_candidates.load(Ordering::Relaxed),
            dropped_loop: self.dropped_loop.load(Ordering::Relaxed),
            dropped_unpooled: self.dropped_unpooled.load(Ordering::Relaxed),
            frames_injected: self.frames_injected.load(Ordering::Relaxed),
            inject_errors: self.inject_errors.load(Ordering::Relaxed),
            capture_errors: self.capture_errors.load(Ordering::Relaxed),
        }
    }

    /// Log current statistics in a structured format.
    pub fn log_stats(&self) {
        let s = self.snapshot();
        info!(
            received = s.frames_received,
            mdns = s.mdns_candidates,
            dropped_loop = s.dropped_loop,
            dropped_unpooled = s.dropped_unpooled,
            injected = s.frames_injected,
            inject_errors = s.inject_errors,
            capture_errors = s.capture_errors,
            "Reflector statistics"
        );
    }
}

impl std::fmt::Display for StatisticsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "frames_received {}", self.frames_received)?;
        writeln!(f, "mdns_candidates {}", self.mdns_candidates)?;
        writeln!(f, "dropped_loop {}", self.dropped_loop)?;
        writeln!(f, "dropped_unpooled {}", self.dropped_unpooled)?;
        writeln!(f, "frames_injected {}", self.frames_injected)?;
        writeln!(f, "inject_errors {}", self.inject_errors)?;
        writeln!(f, "capture_errors {}", self.capture_errors)
    }
}
