use std::collections::VecDeque;

use cfg_if::cfg_if;
use log::{debug, trace};

use crate::concepts::neighbour::NeighbourTable;
use crate::concepts::packet::{Header, Packet, NO_HOP};
use crate::feedback::{DecodeError, EngineWarning};
use crate::framework::{Clock, ProtocolParams, SystemClock};
use crate::gravity;

cfg_if! {
    if #[cfg(feature = "serde")] {
        use serde::{Deserialize, Serialize};
    }
}

/// Warnings past this length push the oldest one out.
pub const MAX_WARN_LENGTH: usize = 64;

/// One node's routing state: neighbour table, pending queue and the
/// decision logic tying them together.
///
/// The engine performs no I/O. The host feeds received frames in, sends
/// whatever bytes come back out, drains [`inbox`](Self::inbox) for locally
/// delivered packets, and calls [`remove_old`](Self::remove_old) and
/// [`process_queue`](Self::process_queue) on a cadence it controls.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Engine<C: Clock + Default = SystemClock> {
    pub neighbours: NeighbourTable,
    queue: VecDeque<Packet>,
    /// Packets addressed to this node, for the host to drain.
    pub inbox: Vec<Packet>,
    pub params: ProtocolParams,
    #[cfg_attr(feature = "serde", serde(skip))]
    clock: C,
    /// Non-fatal events, drain this regularly.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub warnings: VecDeque<EngineWarning>,
}

impl Engine<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for Engine<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock + Default> Engine<C> {
    pub fn with_clock(clock: C) -> Self {
        Self::with_params(clock, ProtocolParams::default())
    }

    pub fn with_params(clock: C, params: ProtocolParams) -> Self {
        Self {
            neighbours: NeighbourTable::new(),
            queue: VecDeque::new(),
            inbox: Vec::new(),
            params,
            clock,
            warnings: VecDeque::new(),
        }
    }

    fn warn(&mut self, warning: EngineWarning) {
        if self.warnings.len() >= MAX_WARN_LENGTH {
            self.warnings.pop_front();
        }
        self.warnings.push_back(warning);
    }

    // region Control plane

    /// Serialize a HELLO beacon announcing this node's existence.
    pub fn create_hello(
        &self,
        destination_id: u32,
        sender_id: u32,
        origin_id: u32,
        sequence: u32,
    ) -> Vec<u8> {
        Header::hello(destination_id, sender_id, origin_id, sequence)
            .to_bytes()
            .to_vec()
    }

    /// Serialize an ACK beacon. `my_internet` advertises this node's own
    /// uplink, `int_neighbour` advertises a directly connected gateway
    /// neighbour (what the receiver turns into indirect-internet
    /// knowledge).
    pub fn create_ack(
        &self,
        destination_id: u32,
        sender_id: u32,
        origin_id: u32,
        next_hop_id: u32,
        sequence: u32,
        my_internet: bool,
        int_neighbour: bool,
    ) -> Vec<u8> {
        Header::ack(
            destination_id,
            sender_id,
            origin_id,
            next_hop_id,
            sequence,
            my_internet,
            int_neighbour,
        )
        .to_bytes()
        .to_vec()
    }

    /// Parse a received HELLO. The engine does not insert a neighbour on
    /// its own: capability bits and measured RSSI only exist at the radio
    /// layer, so the host follows up with [`neighbour_store`](Self::neighbour_store).
    pub fn handle_hello(&self, data: &[u8]) -> Result<Header, DecodeError> {
        Header::from_bytes(data)
    }

    /// Parse a received ACK. The host reads `my_internet` and
    /// `int_neighbour` off the returned header and stores the neighbour
    /// with the matching direct/indirect booleans (two-hop inference).
    pub fn handle_ack(&self, data: &[u8]) -> Result<Header, DecodeError> {
        Header::from_bytes(data)
    }

    // endregion

    // region Neighbour lifecycle

    /// Upsert a neighbour with the current time. Reserved ids (0 and the
    /// broadcast id) are ignored.
    pub fn neighbour_store(
        &mut self,
        id: u32,
        rssi: i16,
        has_internet_direct: bool,
        has_internet_indirect: bool,
        visited: bool,
    ) {
        let now = self.clock.now();
        self.neighbours
            .store(id, rssi, has_internet_direct, has_internet_indirect, visited, now);
    }

    /// Expire neighbours not heard from within the configured window.
    pub fn remove_old(&mut self) {
        let before = self.neighbours.len();
        self.neighbours
            .remove_old(self.clock.now(), self.params.neighbour_expiry_secs);
        let expired = before - self.neighbours.len();
        if expired > 0 {
            trace!("expired {expired} stale neighbours, {} left", self.neighbours.len());
        }
    }

    /// The current Internet Gravity winner, or 0 when nothing qualifies.
    pub fn best_next_hop(&self) -> u32 {
        gravity::best_next_hop(&self.neighbours)
    }

    // endregion

    // region Data plane

    /// Originate a DATA packet. Returns the serialized frame to transmit,
    /// or empty bytes if no hop exists yet and the packet was queued (or
    /// dropped, when the queue is full).
    pub fn send_packet(
        &mut self,
        destination_id: u32,
        sender_id: u32,
        origin_id: u32,
        sequence: u32,
        payload: &[u8],
    ) -> Vec<u8> {
        let header = Header::data(destination_id, sender_id, origin_id, sequence, self.params.data_ttl);
        let packet = Packet {
            header,
            payload: payload.to_vec(),
        };
        self.route_or_queue(packet)
    }

    /// Handle a received DATA frame at this node.
    ///
    /// Undecodable frames and frames with no TTL left are dropped. Frames
    /// addressed to this node land in [`inbox`](Self::inbox). Anything
    /// else gets its TTL decremented and is forwarded to the gravity
    /// winner, or queued when there is none. `origin_id` is never
    /// rewritten; only the next hop, TTL and visited bit change on a
    /// forward.
    pub fn handle_data(&mut self, data: &[u8], my_node_id: u32) -> Vec<u8> {
        let mut packet = match Packet::decode(data) {
            Ok(packet) => packet,
            Err(err) => {
                debug!("rejected data frame: {err}");
                return Vec::new();
            }
        };

        if packet.header.flags.ttl() <= 1 {
            self.warn(EngineWarning::TtlExpired {
                origin_id: packet.header.origin_id,
                sequence: packet.header.sequence,
            });
            return Vec::new();
        }

        if packet.header.destination_id == my_node_id {
            trace!(
                "delivered packet origin={} seq={} locally",
                packet.header.origin_id,
                packet.header.sequence
            );
            self.inbox.push(packet);
            return Vec::new();
        }

        packet.header.flags.decrement_ttl();
        self.route_or_queue(packet)
    }

    /// Re-attempt every queued packet. One hop is selected for the whole
    /// batch; if none exists the queue is left untouched. Emission order
    /// is FIFO.
    pub fn process_queue(&mut self) -> Vec<Vec<u8>> {
        if self.queue.is_empty() {
            return Vec::new();
        }
        let hop = gravity::best_next_hop(&self.neighbours);
        if hop == NO_HOP {
            return Vec::new();
        }

        self.neighbours.mark_visited(hop, true);
        trace!("flushing {} queued packets via {hop}", self.queue.len());

        let mut batch = Vec::with_capacity(self.queue.len());
        for mut packet in self.queue.drain(..) {
            packet.header.next_hop_id = hop;
            packet.header.flags.set_visited(true);
            batch.push(packet.encode());
        }
        batch
    }

    /// Number of packets waiting for a viable hop.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Stamp the packet with the gravity winner and serialize it, or park
    /// it in the queue when no hop qualifies.
    fn route_or_queue(&mut self, mut packet: Packet) -> Vec<u8> {
        let hop = gravity::best_next_hop(&self.neighbours);
        if hop != NO_HOP {
            self.neighbours.mark_visited(hop, true);
            packet.header.next_hop_id = hop;
            packet.header.flags.set_visited(true);
            trace!(
                "routing packet origin={} seq={} via {hop}",
                packet.header.origin_id,
                packet.header.sequence
            );
            return packet.encode();
        }

        if self.queue.len() < self.params.queue_capacity {
            trace!(
                "no viable hop, queued packet origin={} seq={} ({} pending)",
                packet.header.origin_id,
                packet.header.sequence,
                self.queue.len() + 1
            );
            self.queue.push_back(packet);
        } else {
            self.warn(EngineWarning::QueueOverflow {
                origin_id: packet.header.origin_id,
                sequence: packet.header.sequence,
            });
        }
        Vec::new()
    }

    // endregion
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concepts::packet::PacketType;

    #[test]
    fn hello_roundtrip_through_handler() {
        let engine = Engine::new();
        let bytes = engine.create_hello(0, 2, 2, 10);
        let header = engine.handle_hello(&bytes).unwrap();
        assert_eq!(header.packet_type, PacketType::Hello);
        assert_eq!(header.sender_id, 2);
        assert_eq!(header.sequence, 10);
    }

    #[test]
    fn ack_roundtrip_carries_inference_bits() {
        let engine = Engine::new();
        let bytes = engine.create_ack(1, 2, 2, 1, 11, false, true);
        let header = engine.handle_ack(&bytes).unwrap();
        assert_eq!(header.packet_type, PacketType::Ack);
        assert!(header.flags.int_neighbour());
        assert!(!header.flags.my_internet());
    }

    #[test]
    fn beacon_handlers_propagate_decode_errors() {
        let engine = Engine::new();
        assert!(engine.handle_hello(&[1, 2, 3]).is_err());
        let mut bytes = engine.create_hello(0, 2, 2, 10);
        bytes[0] = 0;
        assert!(engine.handle_ack(&bytes).is_err());
    }

    #[test]
    fn warnings_are_bounded() {
        let mut engine = Engine::new();
        for seq in 0..(MAX_WARN_LENGTH as u32 + 10) {
            engine.warn(EngineWarning::TtlExpired {
                origin_id: 1,
                sequence: seq,
            });
        }
        assert_eq!(engine.warnings.len(), MAX_WARN_LENGTH);
        // the oldest entries were pushed out
        assert_eq!(
            engine.warnings.front(),
            Some(&EngineWarning::TtlExpired {
                origin_id: 1,
                sequence: 10
            })
        );
    }

    #[test]
    fn send_without_neighbours_queues() {
        let mut engine = Engine::new();
        let bytes = engine.send_packet(9999, 1, 1, 1, b"Help Me");
        assert!(bytes.is_empty());
        assert_eq!(engine.queued(), 1);
    }

    #[test]
    fn send_with_neighbour_stamps_route() {
        let mut engine = Engine::new();
        engine.neighbour_store(2, -65, false, true, false);
        let bytes = engine.send_packet(9999, 1, 1, 1, b"Help Me");

        let packet = Packet::decode(&bytes).unwrap();
        assert_eq!(packet.header.next_hop_id, 2);
        assert!(packet.header.flags.visited());
        assert_eq!(packet.header.flags.ttl(), 15);
        assert_eq!(packet.payload, b"Help Me");
        // the chosen hop is now deprioritized
        assert!(engine.neighbours.get(2).unwrap().visited);
    }
}
