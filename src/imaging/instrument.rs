//! Pixel-access instrumentation.
//!
//! Counting is opt-in: a [`PixelBuffer`](super::PixelBuffer) carries an
//! [`AccessCounter`] that is disabled unless the caller injects an enabled
//! one. Counters only observe; no result ever depends on them.
//!
//! [`Instrumentation`] bundles named counters with a wall-clock timer so a
//! driver can reset everything at a known point, run some operations, and
//! read back an [`InstrReport`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Shared handle to an access counter.
///
/// Clones share the same count, so one counter can be handed to many buffers
/// (and many rayon workers) at once.
#[derive(Debug, Clone, Default)]
pub struct AccessCounter(Option<Arc<AtomicU64>>);

impl AccessCounter {
    /// A live counter starting at zero.
    pub fn new() -> Self {
        Self(Some(Arc::new(AtomicU64::new(0))))
    }

    /// A counter that ignores every record. This is the default.
    pub fn disabled() -> Self {
        Self(None)
    }

    pub fn is_enabled(&self) -> bool {
        self.0.is_some()
    }

    #[inline]
    pub fn record(&self, accesses: u64) {
        if let Some(count) = &self.0 {
            count.fetch_add(accesses, Ordering::Relaxed);
        }
    }

    pub fn count(&self) -> u64 {
        self.0
            .as_ref()
            .map(|count| count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn reset(&self) {
        if let Some(count) = &self.0 {
            count.store(0, Ordering::Relaxed);
        }
    }
}

/// Named counters plus a timer.
#[derive(Debug)]
pub struct Instrumentation {
    started: Instant,
    counters: Vec<(&'static str, AccessCounter)>,
}

/// Name of the counter that tracks pixel memory accesses.
pub const PIXMEM: &str = "pixmem";

impl Instrumentation {
    /// Instrumentation with a single enabled `pixmem` counter.
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            counters: vec![(PIXMEM, AccessCounter::new())],
        }
    }

    /// The pixel memory counter, ready to inject into buffers.
    pub fn pixmem(&self) -> AccessCounter {
        self.counter(PIXMEM).unwrap_or_default()
    }

    pub fn counter(&self, name: &str) -> Option<AccessCounter> {
        self.counters
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, c)| c.clone())
    }

    /// Zero every counter and restart the clock.
    pub fn reset(&mut self) {
        for (_, counter) in &self.counters {
            counter.reset();
        }
        self.started = Instant::now();
    }

    pub fn report(&self) -> InstrReport {
        InstrReport {
            elapsed: self.started.elapsed(),
            counters: self
                .counters
                .iter()
                .map(|(name, counter)| (name.to_string(), counter.count()))
                .collect(),
        }
    }
}

impl Default for Instrumentation {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the counters at one point in time.
///
/// Batch runs with `--stats` store it in `manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrReport {
    pub elapsed: Duration,
    pub counters: Vec<(String, u64)>,
}

impl InstrReport {
    pub fn get(&self, name: &str) -> Option<u64> {
        self.counters
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, count)| *count)
    }
}

impl fmt::Display for InstrReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "time {:.6}s", self.elapsed.as_secs_f64())?;
        for (name, count) in &self.counters {
            write!(f, "  {name} {count}")?;
        }
        Ok(())
    }
}
