use std::time::{SystemTime, UNIX_EPOCH};

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(feature = "serde")] {
        use serde::{Deserialize, Serialize};
    }
}

/// Host-supplied time source, in whole seconds. One-second resolution is
/// all the expiry logic needs.
pub trait Clock {
    fn now(&self) -> u64;
}

/// Wall-clock seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Protocol parameters. The defaults are the wire-compatible values; tests
/// shrink them to exercise expiry and overflow quickly.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProtocolParams {
    /// Seconds a neighbour survives without a refresh.
    pub neighbour_expiry_secs: u64,
    /// Upper bound on the pending packet queue.
    pub queue_capacity: usize,
    /// Initial TTL stamped on originated DATA frames, 0..=31.
    pub data_ttl: u8,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            neighbour_expiry_secs: 30,
            queue_capacity: 50,
            data_ttl: 15,
        }
    }
}
