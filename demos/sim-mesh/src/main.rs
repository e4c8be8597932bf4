//! Three nodes, one payload, no infrastructure.
//!
//! Node 1 (the victim) wants "Help Me" delivered to the internet sink.
//! Node 2 is a mule with no uplink of its own. Node 3 is a gateway. The
//! walk below plays the radio host for all three engines: it moves the
//! beacon and data bytes between them and feeds the neighbour tables,
//! which is exactly the contract a BLE layer would fulfil.

use anyhow::Result;
use log::info;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use thor::concepts::packet::Packet;
use thor::engine::Engine;

/// Application-level id of the internet sink.
const SINK: u32 = 9999;

fn hex(frame: &[u8]) -> String {
    frame
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn step(name: &str) {
    info!("========== {name} ==========");
}

fn main() -> Result<()> {
    TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let mut victim = Engine::new();
    let mut mule = Engine::new();
    let gateway = Engine::new();

    step("1: the victim has a payload and nobody in range");
    let first_attempt = victim.send_packet(SINK, 1, 1, 1, b"Help Me");
    anyhow::ensure!(first_attempt.is_empty(), "nothing should be routable yet");
    info!("victim queued the packet ({} pending)", victim.queued());

    step("2: the mule appears and says HELLO");
    let hello = mule.create_hello(0, 2, 2, 10);
    let header = victim.handle_hello(&hello)?;
    victim.neighbour_store(header.sender_id, -65, false, false, false);
    info!("victim now knows the mule (rssi -65, no uplink)");

    step("3: the mule discovers the gateway");
    let hello = gateway.create_hello(0, 3, 3, 20);
    let header = mule.handle_hello(&hello)?;
    mule.neighbour_store(header.sender_id, -72, true, false, false);
    info!("mule now knows the gateway (rssi -72, direct uplink)");

    step("4: the mule ACKs the victim, advertising its gateway neighbour");
    let ack = mule.create_ack(1, 2, 2, 1, 11, false, true);
    let header = victim.handle_ack(&ack)?;
    victim.neighbour_store(
        header.sender_id,
        -65,
        header.flags.my_internet(),
        header.flags.int_neighbour(),
        false,
    );
    info!("two-hop inference: the mule is indirect-internet now");

    step("5: the victim flushes its queue toward the mule");
    let batch = victim.process_queue();
    anyhow::ensure!(batch.len() == 1, "the queue should drain");
    info!("victim -> mule: [{}]", hex(&batch[0]));

    step("6: the mule forwards along the gravity well");
    let forwarded = mule.handle_data(&batch[0], 2);
    anyhow::ensure!(!forwarded.is_empty(), "the mule should forward");
    let packet = Packet::decode(&forwarded)?;
    info!(
        "mule -> gateway: next_hop={} ttl={} [{}]",
        packet.header.next_hop_id,
        packet.header.flags.ttl(),
        hex(&forwarded)
    );

    step("7: the gateway ACKs with myInternet, re-arming the path");
    let ack = gateway.create_ack(1, 3, 3, 2, 30, true, false);
    let header = mule.handle_ack(&ack)?;
    anyhow::ensure!(header.flags.my_internet());
    mule.neighbour_store(header.sender_id, -72, true, false, false);
    info!("mule cleared the gateway's visited mark after delivery");

    step("done: payload is one radio hop from the sink");
    Ok(())
}
