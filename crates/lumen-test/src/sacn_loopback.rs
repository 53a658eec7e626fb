//! sACN scenarios: controller output re-parsed as a receiver would see it

use lumen_core::{Millis, Universe, DMX_UNIVERSE_SIZE, E131_DISCOVERY_INTERVAL_MILLIS};
use lumen_sacn::{E131Controller, E131ControllerConfig};
use lumen_wire::{E131DataPacket, E131DiscoveryPacket, E131SyncPacket};

fn controller() -> E131Controller {
    let mut controller = E131Controller::new(E131ControllerConfig {
        cid: Some([0xAB; 16]),
        synchronization_universe: Some(Universe::new(7999)),
        source_name: "loopback source".into(),
        ..Default::default()
    });
    controller.start();
    controller
}

fn drain(controller: &mut E131Controller) -> Vec<Vec<u8>> {
    let mut out = Vec::new();
    while let Some((bytes, _)) = controller.pop_outgoing() {
        out.push(bytes);
    }
    out
}

#[test]
fn receiver_sees_contiguous_sequences() {
    let mut controller = controller();

    // Enough frames to wrap the 8-bit counter
    for i in 0..300u16 {
        controller.handle_dmx_out(Universe::new(1), &[(i % 256) as u8; 8]);
    }

    let mut previous: Option<u8> = None;
    for bytes in drain(&mut controller) {
        let packet = E131DataPacket::parse(&bytes).unwrap();
        assert_eq!(packet.universe, Universe::new(1));
        assert_eq!(packet.source_name_str(), "loopback source");
        assert_eq!(packet.synchronization_address, 7999);
        if let Some(previous) = previous {
            assert_eq!(packet.sequence, previous.wrapping_add(1));
        }
        previous = Some(packet.sequence);
    }
}

#[test]
fn interleaved_universes_keep_independent_sequences() {
    let mut controller = controller();
    for _ in 0..5 {
        controller.handle_dmx_out(Universe::new(1), &[1]);
        controller.handle_dmx_out(Universe::new(2), &[2]);
        controller.handle_dmx_out(Universe::new(2), &[2]);
    }

    let mut seq_u1 = Vec::new();
    let mut seq_u2 = Vec::new();
    for bytes in drain(&mut controller) {
        let packet = E131DataPacket::parse(&bytes).unwrap();
        match packet.universe.0 {
            1 => seq_u1.push(packet.sequence),
            2 => seq_u2.push(packet.sequence),
            other => panic!("unexpected universe {other}"),
        }
    }
    assert_eq!(seq_u1, vec![0, 1, 2, 3, 4]);
    assert_eq!(seq_u2, (0..10).collect::<Vec<u8>>());
}

#[test]
fn blackout_then_sync_covers_active_set() {
    let mut controller = controller();
    controller.handle_dmx_out(Universe::new(4), &[255; 64]);
    controller.handle_dmx_out(Universe::new(9), &[255; 64]);
    drain(&mut controller);

    controller.handle_blackout();
    let packets = drain(&mut controller);
    assert_eq!(packets.len(), 3);

    for bytes in &packets[..2] {
        let packet = E131DataPacket::parse(bytes).unwrap();
        assert_eq!(packet.data.len(), DMX_UNIVERSE_SIZE);
        assert!(packet.data.iter().all(|&b| b == 0));
    }
    let sync = E131SyncPacket::parse(&packets[2]).unwrap();
    assert_eq!(sync.synchronization_address, 7999);
}

#[test]
fn discovery_advertises_what_we_transmit() {
    let mut controller = controller();
    for universe in [20u16, 5, 11] {
        controller.handle_dmx_out(Universe::new(universe), &[1]);
    }
    drain(&mut controller);

    controller.run(Millis::new(5000));
    let packets = drain(&mut controller);
    assert_eq!(packets.len(), 1);

    let discovery = E131DiscoveryPacket::parse(&packets[0]).unwrap();
    assert_eq!(discovery.universes, vec![5, 11, 20]);
    assert_eq!(discovery.cid, [0xAB; 16]);

    // A new universe shows up in the next interval's broadcast
    controller.handle_dmx_out(Universe::new(2), &[1]);
    drain(&mut controller);
    controller.run(Millis::new(5000 + E131_DISCOVERY_INTERVAL_MILLIS));
    let packets = drain(&mut controller);
    let discovery = E131DiscoveryPacket::parse(&packets[0]).unwrap();
    assert_eq!(discovery.universes, vec![2, 5, 11, 20]);
}
