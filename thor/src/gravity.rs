//! Internet Gravity: the next-hop scoring policy.
//!
//! Every neighbour gets a single integer score, the highest score wins,
//! and ties go to the lowest node id (the first one reached by the
//! table's ascending iteration). The policy pulls packets toward
//! internet connectivity: direct gateways beat indirect ones, indirect
//! ones beat unexplored peers, and already-visited peers are a last
//! resort. Link quality nudges the base either way.

use crate::concepts::neighbour::{NeighbourInfo, NeighbourTable};
use crate::concepts::packet::NO_HOP;

/// Base score for a neighbour with its own internet uplink.
pub const SCORE_DIRECT: i32 = 300;

/// Base score for a neighbour adjacent to a gateway (two-hop inference).
pub const SCORE_INDIRECT: i32 = 200;

/// Base score for an unexplored neighbour with no known uplink.
pub const SCORE_EXPLORE: i32 = 100;

/// Base score for a neighbour this node has already routed through.
pub const SCORE_VISITED: i32 = 10;

/// Adjustment for rssi above -50 dBm: suspiciously close, echo risk.
pub const RSSI_TOO_CLOSE: i32 = -50;

/// Adjustment for rssi in the ideal -80..=-50 dBm band.
pub const RSSI_IDEAL: i32 = 50;

/// Adjustment for rssi below -80 dBm: marginal link.
pub const RSSI_MARGINAL: i32 = -20;

/// Score a single neighbour.
pub fn score(info: &NeighbourInfo) -> i32 {
    let base = if info.has_internet_direct {
        SCORE_DIRECT
    } else if info.has_internet_indirect {
        SCORE_INDIRECT
    } else if info.visited {
        SCORE_VISITED
    } else {
        SCORE_EXPLORE
    };

    let adjust = if info.rssi > -50 {
        RSSI_TOO_CLOSE
    } else if info.rssi >= -80 {
        RSSI_IDEAL
    } else {
        RSSI_MARGINAL
    };

    base + adjust
}

/// Pick the best next hop out of the table, or [`NO_HOP`] if the table is
/// empty.
///
/// The running maximum starts below every reachable score (the worst
/// possible is a visited, marginal-link neighbour at 10 - 50 = -40), so a
/// lone neighbour is selected even when its own score is negative.
pub fn best_next_hop(table: &NeighbourTable) -> u32 {
    let mut best_id = NO_HOP;
    let mut max_score = i32::MIN;
    for (&id, info) in table.iter() {
        let current = score(info);
        if current > max_score {
            max_score = current;
            best_id = id;
        }
    }
    best_id
}
