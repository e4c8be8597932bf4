use std::cell::Cell;
use std::rc::Rc;

use thor::engine::Engine;
use thor::framework::Clock;

/// Test clock shared between a node's engine and the harness.
#[derive(Clone, Default)]
pub struct ManualClock(Rc<Cell<u64>>);

impl ManualClock {
    pub fn advance(&self, secs: u64) {
        self.0.set(self.0.get() + secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.0.get()
    }
}

pub struct MeshNode {
    pub id: u32,
    pub engine: Engine<ManualClock>,
    pub clock: ManualClock,
    /// Whether this node has its own uplink (a gateway).
    pub has_internet: bool,
    seq: u32,
}

impl MeshNode {
    fn next_seq(&mut self) -> u32 {
        self.seq += 1;
        self.seq
    }

    /// Does this node know a directly connected gateway? That is the bit
    /// it advertises as `intneighbour` in its ACKs.
    fn knows_gateway(&self) -> bool {
        self.engine
            .neighbours
            .iter()
            .any(|(_, info)| info.has_internet_direct)
    }
}

/// A handful of engines wired together by the test, playing the radio
/// host for all of them: links carry a measured RSSI, beacons are
/// exchanged pairwise, and DATA frames are delivered by hand.
pub struct VirtualMesh {
    pub nodes: Vec<MeshNode>,
    /// Undirected links as (a, b, rssi measured at either end).
    pub links: Vec<(u32, u32, i16)>,
}

impl VirtualMesh {
    pub fn create(nodes: &[(u32, bool)], links: &[(u32, u32, i16)]) -> VirtualMesh {
        let nodes = nodes
            .iter()
            .map(|&(id, has_internet)| {
                let clock = ManualClock::default();
                MeshNode {
                    id,
                    engine: Engine::with_clock(clock.clone()),
                    clock,
                    has_internet,
                    seq: 0,
                }
            })
            .collect();
        VirtualMesh {
            nodes,
            links: links.to_vec(),
        }
    }

    pub fn node(&mut self, id: u32) -> &mut MeshNode {
        self.nodes
            .iter_mut()
            .find(|n| n.id == id)
            .unwrap_or_else(|| panic!("no node {id} in mesh"))
    }

    fn node_index(&self, id: u32) -> usize {
        self.nodes
            .iter()
            .position(|n| n.id == id)
            .unwrap_or_else(|| panic!("no node {id} in mesh"))
    }

    /// Neighbours of `id` with the link RSSI.
    fn peers_of(&self, id: u32) -> Vec<(u32, i16)> {
        self.links
            .iter()
            .filter_map(|&(a, b, rssi)| {
                if a == id {
                    Some((b, rssi))
                } else if b == id {
                    Some((a, rssi))
                } else {
                    None
                }
            })
            .collect()
    }

    /// One full beacon exchange: every node HELLOs its peers, every peer
    /// answers with an ACK carrying its capability bits, and the receiver
    /// stores what the ACK taught it. Two-hop knowledge needs a second
    /// round to propagate, exactly like on air.
    pub fn beacon_round(&mut self) {
        let ids: Vec<u32> = self.nodes.iter().map(|n| n.id).collect();
        for &id in &ids {
            for (peer_id, rssi) in self.peers_of(id) {
                // peer announces itself to us
                let (hello, ack) = {
                    let peer_index = self.node_index(peer_id);
                    let peer = &mut self.nodes[peer_index];
                    let seq = peer.next_seq();
                    let hello = peer.engine.create_hello(0, peer.id, peer.id, seq);
                    let ack_seq = peer.next_seq();
                    let ack = peer.engine.create_ack(
                        id,
                        peer.id,
                        peer.id,
                        id,
                        ack_seq,
                        peer.has_internet,
                        peer.knows_gateway(),
                    );
                    (hello, ack)
                };

                let me = self.node(id);
                me.engine.handle_hello(&hello).expect("well-formed hello");
                let header = me.engine.handle_ack(&ack).expect("well-formed ack");

                // A gateway ACK is delivery evidence: re-arm the visited
                // flag. Otherwise keep whatever mark we already hold.
                let visited = if header.flags.my_internet() {
                    false
                } else {
                    me.engine
                        .neighbours
                        .get(peer_id)
                        .map(|info| info.visited)
                        .unwrap_or(false)
                };
                me.engine.neighbour_store(
                    peer_id,
                    rssi,
                    header.flags.my_internet(),
                    header.flags.int_neighbour(),
                    visited,
                );
            }
        }
    }

    pub fn beacon_rounds(&mut self, times: usize) {
        for _ in 0..times {
            self.beacon_round();
        }
    }

    /// Hand a received DATA frame to `id`, returning whatever it wants
    /// transmitted next.
    pub fn deliver_data(&mut self, id: u32, frame: &[u8]) -> Vec<u8> {
        let node = self.node(id);
        node.engine.handle_data(frame, id)
    }

    /// Advance every node's clock.
    pub fn tick(&mut self, secs: u64) {
        for node in &self.nodes {
            node.clock.advance(secs);
        }
    }
}
