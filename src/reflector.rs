//! Main mDNS reflector orchestration logic.
//!
//! A blocking capture task classifies frames and queues mDNS candidates; a
//! single async worker drains the queue, resolves destination VLANs and
//! injects one rewritten copy per destination. The worker is the only
//! writer on the interface.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pnet::util::MacAddr;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use crate::error::{Error, Result};
use crate::mdns::{Frame, MessageKind, QUEUE_CAPACITY};
use crate::net::{FrameSink, FrameSource};
use crate::pool::PoolResolver;
use crate::stats::ReflectorStatistics;

/// Main mDNS reflector.
pub struct MdnsReflector {
    resolver: Arc<PoolResolver>,
    reflector_mac: MacAddr,
    dry_run: bool,
    stats: Arc<ReflectorStatistics>,
}

impl MdnsReflector {
    /// Create a reflector that injects frames sourced from `reflector_mac`.
    pub fn new(resolver: Arc<PoolResolver>, reflector_mac: MacAddr) -> Self {
        Self {
            resolver,
            reflector_mac,
            dry_run: false,
            stats: Arc::new(ReflectorStatistics::default()),
        }
    }

    /// Log reflections instead of injecting them.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn stats(&self) -> &Arc<ReflectorStatistics> {
        &self.stats
    }

    /// Check if a frame was injected by this reflector.
    pub fn is_own_frame(&self, frame: &Frame) -> bool {
        frame.src_mac() == self.reflector_mac
    }

    /// VLANs a frame should be reflected into, in resolver order.
    pub fn destinations(&self, frame: &Frame) -> &[u16] {
        match frame.kind() {
            MessageKind::Query => self.resolver.query_destinations(frame.vlan()),
            MessageKind::Response => self.resolver.response_destinations(frame.src_mac()),
        }
    }

    /// Build every reflected copy of a frame, paired with its VLAN.
    ///
    /// Returns nothing for our own frames and for frames without a
    /// configured destination.
    pub fn reflect(&self, frame: &Frame) -> Vec<(u16, Vec<u8>)> {
        if self.is_own_frame(frame) {
            ReflectorStatistics::incr(&self.stats.dropped_loop);
            return Vec::new();
        }

        let destinations = self.destinations(frame);
        if destinations.is_empty() {
            ReflectorStatistics::incr(&self.stats.dropped_unpooled);
            trace!(
                kind = %frame.kind(),
                vlan = frame.vlan_or_default(),
                src = %frame.src_mac(),
                "No destination"
            );
            return Vec::new();
        }

        destinations
            .iter()
            .map(|&vlan| (vlan, frame.retarget(vlan, self.reflector_mac)))
            .collect()
    }

    /// Reflect one frame into `sink`. Returns the number of frames sent.
    ///
    /// A failed injection is logged and does not affect the other copies.
    pub fn process<S: FrameSink + ?Sized>(&self, frame: &Frame, sink: &mut S) -> usize {
        let copies = self.reflect(frame);
        if copies.is_empty() {
            return 0;
        }

        let targets: Vec<u16> = copies.iter().map(|(vlan, _)| *vlan).collect();

        if self.dry_run {
            info!(
                "WOULD REFLECT: {} -> vlans {:?}",
                frame.format_summary(),
                targets
            );
            return 0;
        }

        debug!("REFLECT: {} -> vlans {:?}", frame.format_summary(), targets);

        let mut sent = 0;
        for (vlan, bytes) in copies {
            match sink.inject(&bytes) {
                Ok(()) => {
                    ReflectorStatistics::incr(&self.stats.frames_injected);
                    sent += 1;
                }
                Err(err) => {
                    ReflectorStatistics::incr(&self.stats.inject_errors);
                    error!(vlan, error = %err, "Injection failed");
                }
            }
        }
        sent
    }

    /// Run until `shutdown` is set and every queued frame has been handled.
    pub async fn run<R, S>(&self, source: R, mut sink: S, shutdown: Arc<AtomicBool>) -> Result<()>
    where
        R: FrameSource + 'static,
        S: FrameSink,
    {
        if self.dry_run {
            info!("DRY RUN MODE - frames will not actually be injected");
        }

        let (queue, mut frames) = mpsc::channel(QUEUE_CAPACITY);
        let stats = Arc::clone(&self.stats);
        let capture =
            tokio::task::spawn_blocking(move || capture_loop(source, queue, stats, shutdown));

        info!(mac = %self.reflector_mac, "Listening for mDNS frames...");

        while let Some(frame) = frames.recv().await {
            self.process(&frame, &mut sink);
        }

        capture
            .await
            .map_err(|err| Error::NetworkError(std::io::Error::other(err)))?;

        info!("Shutting down...");
        self.stats.log_stats();
        Ok(())
    }
}

/// Producer side: read, classify and queue until shutdown.
///
/// A full queue blocks the capture thread rather than dropping frames.
fn capture_loop<R: FrameSource>(
    mut source: R,
    queue: mpsc::Sender<Frame>,
    stats: Arc<ReflectorStatistics>,
    shutdown: Arc<AtomicBool>,
) {
    while !shutdown.load(Ordering::SeqCst) {
        let data = match source.next_frame() {
            Ok(Some(data)) => data,
            Ok(None) => continue,
            Err(err) => {
                ReflectorStatistics::incr(&stats.capture_errors);
                warn!("Capture error: {}", err);
                continue;
            }
        };
        ReflectorStatistics::incr(&stats.frames_received);

        let Some(frame) = Frame::classify(data) else {
            continue;
        };
        ReflectorStatistics::incr(&stats.mdns_candidates);
        trace!("{}", frame.format_summary());

        if queue.blocking_send(frame).is_err() {
            // Worker is gone; nothing left to feed.
            break;
        }
    }

    debug!("Capture stopped");
}
