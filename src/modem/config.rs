use crate::datatypes::Imei;
use std::time::Duration;

/// Simulated link behavior.
///
/// `Ideal` answers every signal-quality query instantly with full bars and
/// runs sessions with no added latency. `Degraded` models the real link for
/// test scenarios: fixed delays on query and session, and a signal roll that
/// only comes back strong with the configured probability.
#[derive(Debug, Clone, Copy)]
pub enum LinkQuality {
    Ideal,
    Degraded {
        /// Wait before answering `AT+CSQ`.
        csq_delay: Duration,
        /// Extra round-trip added to every SBD session.
        session_delay: Duration,
        /// Probability that a degraded signal roll reports full strength.
        good_signal_ratio: f64,
    },
}

impl LinkQuality {
    /// Degraded profile with the timings the flight tests were tuned
    /// against: 4 s CSQ answer, 20 s session round-trip, one roll in four
    /// reporting a usable signal.
    pub fn degraded() -> Self {
        LinkQuality::Degraded {
            csq_delay: Duration::from_secs(4),
            session_delay: Duration::from_secs(20),
            good_signal_ratio: 0.25,
        }
    }
}

/// Emulator configuration, threaded through the constructor.
#[derive(Debug, Clone)]
pub struct ModemConfig {
    /// Equipment identity stamped into every assembled MO header.
    pub imei: Imei,
    /// Interval between repeated `SBDRING` alerts while one is pending.
    pub ring_interval: Duration,
    pub link: LinkQuality,
}

impl ModemConfig {
    pub fn new(imei: Imei) -> Self {
        Self {
            imei,
            ring_interval: Duration::from_secs(1),
            link: LinkQuality::Ideal,
        }
    }

    pub fn with_ring_interval(mut self, interval: Duration) -> Self {
        self.ring_interval = interval;
        self
    }

    pub fn with_link(mut self, link: LinkQuality) -> Self {
        self.link = link;
        self
    }
}
