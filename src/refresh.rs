//! Refresh driver (spec §4.6): picks a tick interval from a probed display
//! refresh rate and fans out `on_refresh` calls to the framebuffer and audio
//! channels at that cadence. Probing itself — a display-link query, a
//! modesetting enumeration — lives outside this crate (spec §1); this
//! module only defines the seam and two test doubles.

use std::time::Duration;

const MIN_INTERVAL_MS: u64 = 1;
const MAX_INTERVAL_MS: u64 = 100;
const FALLBACK_INTERVAL_MS: u64 = 8;

/// Platform-dependent refresh-rate probe. Implementations (a display-link
/// query, a KMS enumeration picking the shortest interval across active
/// outputs) are the embedding VMM's responsibility.
pub trait RefreshProbe {
    /// Return the probed refresh period, or `None` if probing is unavailable
    /// or failed.
    fn probe(&self) -> Option<Duration>;
}

/// Always reports "no probe available"; the driver falls back to 8 ms.
pub struct NoRefreshProbe;

impl RefreshProbe for NoRefreshProbe {
    fn probe(&self) -> Option<Duration> {
        None
    }
}

/// Reports a fixed interval, for tests and platforms with a static
/// configured refresh rate.
pub struct FixedRefreshProbe(pub Duration);

impl RefreshProbe for FixedRefreshProbe {
    fn probe(&self) -> Option<Duration> {
        Some(self.0)
    }
}

/// Holds the resolved refresh interval (spec §4.6: a present probe result
/// is clamped to [1, 100] ms; only the absence of a probe falls back to
/// 8 ms — an out-of-range probe result is not treated as a failed probe).
pub struct RefreshDriver {
    interval: Duration,
}

impl RefreshDriver {
    pub fn new(probe: &dyn RefreshProbe) -> RefreshDriver {
        let interval = probe
            .probe()
            .map(|d| {
                d.clamp(
                    Duration::from_millis(MIN_INTERVAL_MS),
                    Duration::from_millis(MAX_INTERVAL_MS),
                )
            })
            .unwrap_or_else(|| Duration::from_millis(FALLBACK_INTERVAL_MS));
        RefreshDriver { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
