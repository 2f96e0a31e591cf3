//! Duration accounting across host and device clock domains.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Elapsed execution time for one strategy, normalized to microseconds.
///
/// Host and device measurements are kept distinct. A missing device
/// profiling record is `Unavailable`, which is not the same thing as a
/// measured zero on an empty workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "clock", content = "micros")]
pub enum StrategyDuration {
    /// Wall-clock window measured on the host's monotonic clock.
    HostTimed(u64),
    /// Span reported by the device's own profiling timestamps.
    DeviceTimed(u64),
    /// The device produced no usable profiling timestamps.
    Unavailable,
}

impl StrategyDuration {
    /// Close a host wall-clock window opened at `start`, truncating to
    /// whole microseconds.
    pub fn host_window(start: Instant) -> Self {
        StrategyDuration::HostTimed(start.elapsed().as_micros() as u64)
    }

    /// Convert a device tick span to microseconds.
    ///
    /// `period_ns_per_tick` is the length of one device clock tick. When
    /// several commands are chained the caller passes the first command's
    /// start and the last command's end, since commands may overlap
    /// on-device. Saturates if the device reports end before start.
    pub fn device_span(start_ticks: u64, end_ticks: u64, period_ns_per_tick: f32) -> Self {
        let ticks = end_ticks.saturating_sub(start_ticks);
        let nanos = ticks as f64 * period_ns_per_tick as f64;
        StrategyDuration::DeviceTimed((nanos / 1_000.0) as u64)
    }

    pub fn micros(&self) -> Option<u64> {
        match self {
            StrategyDuration::HostTimed(us) | StrategyDuration::DeviceTimed(us) => Some(*us),
            StrategyDuration::Unavailable => None,
        }
    }
}

impl fmt::Display for StrategyDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyDuration::HostTimed(us) => write!(f, "{} us (host)", us),
            StrategyDuration::DeviceTimed(us) => write!(f, "{} us (device)", us),
            StrategyDuration::Unavailable => write!(f, "unavailable"),
        }
    }
}
