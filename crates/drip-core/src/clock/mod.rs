//! Time sources for the streaming ledger.
//!
//! Balance math is a pure function of a stream record and a timestamp, so
//! the only clock requirement is a single shared source that never runs
//! backwards. [`Clock`] abstracts that source, [`MonotonicClock`] enforces
//! the never-backwards guarantee over any inner clock, and [`ManualClock`]
//! gives tests full control of logical time.
//!
//! Timestamps are `u64` whole time units; [`SystemClock`] interprets them
//! as seconds since the Unix epoch. Direct reads of the ambient clock
//! anywhere else in the crate are rejected by the workspace
//! `disallowed-methods` lint; this module holds the sanctioned call site.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A source of the current time, in whole time units.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> u64 {
        (**self).now()
    }
}

/// Wall-clock time in seconds since the Unix epoch.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[allow(clippy::disallowed_methods)] // Clock implementations are the sanctioned call sites.
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs())
    }
}

/// A manually driven clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Creates a clock reading `now`.
    #[must_use]
    pub fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    /// Moves the clock forward by `delta` units.
    pub fn advance(&self, delta: u64) {
        self.now.fetch_add(delta, Ordering::SeqCst);
    }

    /// Sets the clock to an absolute time.
    ///
    /// Moving backwards is permitted here; readers that must never observe
    /// a regression wrap this clock in [`MonotonicClock`].
    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Decorator that never reports a time earlier than one already observed.
///
/// Keeps a high-watermark of every value read from the inner clock via
/// `fetch_max`, so a regressing inner clock (an NTP step, a test rewinding
/// [`ManualClock`]) is clamped and all observers share one non-decreasing
/// view of time.
#[derive(Debug)]
pub struct MonotonicClock<C> {
    inner: C,
    watermark: AtomicU64,
}

impl<C: Clock> MonotonicClock<C> {
    /// Wraps an inner clock.
    #[must_use]
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            watermark: AtomicU64::new(0),
        }
    }
}

impl<C: Clock> Clock for MonotonicClock<C> {
    fn now(&self) -> u64 {
        let observed = self.inner.now();
        let previous = self.watermark.fetch_max(observed, Ordering::SeqCst);
        observed.max(previous)
    }
}
