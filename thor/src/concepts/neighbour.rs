use std::collections::BTreeMap;

use cfg_if::cfg_if;

use crate::concepts::packet::{BROADCAST_ID, NO_HOP};

cfg_if! {
    if #[cfg(feature = "serde")] {
        use serde::{Deserialize, Serialize};
    }
}

/// Everything the engine knows about one peer. Never transmitted; the
/// host rebuilds it from beacon receptions and measured RSSI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NeighbourInfo {
    /// Host wall-clock seconds of the most recent beacon.
    pub last_seen: u64,
    /// Received signal strength in dBm, typically -100..0.
    pub rssi: i16,
    pub has_internet_direct: bool,
    pub has_internet_indirect: bool,
    /// Set when this neighbour is chosen as a next hop, cleared by the
    /// host on delivery evidence.
    pub visited: bool,
}

/// Peer metadata keyed by node id.
///
/// Iteration is ascending by id, which keeps hop selection deterministic
/// for a given table state.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NeighbourTable {
    entries: BTreeMap<u32, NeighbourInfo>,
}

impl NeighbourTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a neighbour, stamping `last_seen` with the given time.
    ///
    /// The reserved ids (0 and the broadcast id) are never stored.
    pub fn store(
        &mut self,
        id: u32,
        rssi: i16,
        has_internet_direct: bool,
        has_internet_indirect: bool,
        visited: bool,
        now: u64,
    ) {
        if id == NO_HOP || id == BROADCAST_ID {
            return;
        }
        self.entries.insert(
            id,
            NeighbourInfo {
                last_seen: now,
                rssi,
                has_internet_direct,
                has_internet_indirect,
                visited,
            },
        );
    }

    /// Drop every entry not refreshed within `expiry` seconds of `now`.
    pub fn remove_old(&mut self, now: u64, expiry: u64) {
        self.entries
            .retain(|_, info| now.saturating_sub(info.last_seen) <= expiry);
    }

    pub fn mark_visited(&mut self, id: u32, visited: bool) {
        if let Some(info) = self.entries.get_mut(&id) {
            info.visited = visited;
        }
    }

    pub fn get(&self, id: u32) -> Option<&NeighbourInfo> {
        self.entries.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u32, &NeighbourInfo)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
