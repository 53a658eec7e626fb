//! Art-Net scenarios: console traffic in, sink and peer-table effects out

use std::net::Ipv4Addr;

use lumen_artnet::{ArtNetNode, ArtNetNodeConfig, MergeMode, NodeIdentity};
use lumen_core::{Millis, Universe, ARTNET_POLL_STALE_MILLIS};
use lumen_wire::{ArtDmx, ArtPacket, ArtPoll, ArtPollReply, ArtSync};

use crate::sink::RecordingSink;

fn node_on_universe(universe_switch: u8) -> (ArtNetNode, RecordingSink) {
    let identity = NodeIdentity {
        ip: Ipv4Addr::new(10, 0, 0, 10),
        broadcast: Ipv4Addr::new(10, 0, 0, 255),
        mac: [2, 0, 0, 1, 2, 3],
        ..Default::default()
    };
    let mut node = ArtNetNode::new(identity, ArtNetNodeConfig::default());
    let sink = RecordingSink::new();
    node.set_output(Box::new(sink.clone()));
    node.set_universe_switch(0, universe_switch).unwrap();
    node.start(Millis::new(1000));
    while node.pop_outgoing().is_some() {}
    (node, sink)
}

fn console_dmx(universe: u16, sequence: u8, data: &[u8]) -> Vec<u8> {
    ArtDmx {
        sequence,
        physical: 0,
        port_address: Universe::new(universe),
        data: data.to_vec(),
    }
    .to_bytes()
}

#[test]
fn console_drives_node_output() {
    let (mut node, sink) = node_on_universe(1);
    let console = Ipv4Addr::new(10, 0, 0, 1);

    for (i, level) in [0u8, 64, 128, 255].into_iter().enumerate() {
        let frame = console_dmx(1, i as u8, &[level, level]);
        node.handle_packet(&frame, console, Millis::new(2000 + i as u32 * 25));
    }

    assert_eq!(sink.started(), vec![0]);
    let frames = sink.frames();
    assert_eq!(frames.len(), 4);
    assert_eq!(frames.last().unwrap().1, vec![255, 255]);
}

#[test]
fn two_consoles_merge_and_synchronize() {
    let (mut node, sink) = node_on_universe(1);
    let console_a = Ipv4Addr::new(10, 0, 0, 1);
    let console_b = Ipv4Addr::new(10, 0, 0, 2);

    node.handle_packet(&console_dmx(1, 0, &[10, 200, 0]), console_a, Millis::new(2000));
    node.handle_packet(&console_dmx(1, 0, &[50, 5, 255]), console_b, Millis::new(2005));
    assert_eq!(sink.last_frame(0).unwrap(), vec![50, 200, 255]);

    // The console enables synchronous mode; frames buffer until the next sync
    node.handle_packet(&ArtSync::default().to_bytes(), console_a, Millis::new(2010));
    node.handle_packet(&console_dmx(1, 1, &[0, 0, 0]), console_a, Millis::new(2020));
    node.handle_packet(&console_dmx(1, 1, &[0, 0, 10]), console_b, Millis::new(2021));
    assert_eq!(sink.last_frame(0).unwrap(), vec![50, 200, 255]);

    node.handle_packet(&ArtSync::default().to_bytes(), console_a, Millis::new(2030));
    assert_eq!(sink.last_frame(0).unwrap(), vec![0, 0, 10]);
}

#[test]
fn poll_reply_crosses_the_wire_into_a_peer_table() {
    let (mut node, _sink) = node_on_universe(3);
    let console = Ipv4Addr::new(10, 0, 0, 1);

    // A console polls; the node answers on the wire
    node.handle_packet(&ArtPoll::default().to_bytes(), console, Millis::new(2000));
    let (reply_bytes, _) = node.pop_outgoing().expect("poll reply");

    // A second Lumen instance receives those bytes and learns the peer
    let (mut observer, _observer_sink) = node_on_universe(5);
    observer.handle_packet(&reply_bytes, node.identity().ip, Millis::new(3000));

    let table = observer.poll_table();
    assert_eq!(table.len(), 1);
    assert_eq!(table.nodes()[0].ip, Ipv4Addr::new(10, 0, 0, 10));
    let subscribers = table.get_ip_addresses(Universe::new(3));
    assert_eq!(subscribers, &[Ipv4Addr::new(10, 0, 0, 10)]);

    // Without further replies the peer eventually ages out
    let mut now = Millis::new(3000 + ARTNET_POLL_STALE_MILLIS + 1);
    for _ in 0..64 {
        observer.tick(now);
        now = now.add_millis(10);
    }
    assert!(observer.poll_table().is_empty());
}

#[test]
fn ltp_node_follows_latest_console() {
    let (mut node, sink) = node_on_universe(1);
    node.set_merge_mode(0, MergeMode::Ltp).unwrap();
    let console_a = Ipv4Addr::new(10, 0, 0, 1);
    let console_b = Ipv4Addr::new(10, 0, 0, 2);

    node.handle_packet(&console_dmx(1, 0, &[100]), console_a, Millis::new(2000));
    node.handle_packet(&console_dmx(1, 0, &[200]), console_b, Millis::new(2050));
    node.handle_packet(&console_dmx(1, 1, &[150]), console_a, Millis::new(2100));

    let frames: Vec<Vec<u8>> = sink.frames().into_iter().map(|(_, d)| d).collect();
    assert_eq!(frames, vec![vec![100], vec![200], vec![150]]);
}

#[test]
fn reply_bytes_parse_as_valid_poll_reply() {
    let (mut node, _sink) = node_on_universe(1);
    node.handle_packet(
        &ArtPoll::default().to_bytes(),
        Ipv4Addr::new(10, 0, 0, 1),
        Millis::new(2000),
    );
    let (bytes, _) = node.pop_outgoing().unwrap();

    match ArtPacket::parse(&bytes).unwrap() {
        ArtPacket::PollReply(reply) => {
            assert_eq!(reply.ip, Ipv4Addr::new(10, 0, 0, 10));
            assert_eq!(reply.num_ports, 1);
        }
        other => panic!("expected poll reply, got {:?}", other.opcode()),
    }

    // And a mangled copy is rejected outright
    let mut mangled = bytes.clone();
    mangled[5] = b'x';
    assert!(ArtPollReply::parse(&mangled).is_err());
}
