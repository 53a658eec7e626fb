//! Runner scenarios over real sockets
//!
//! These bind the fixed protocol ports, so they skip quietly when the
//! environment already has an Art-Net service running.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use lumen_artnet::{ArtNetNode, NodeIdentity};
use lumen_core::ARTNET_UDP_PORT;
use lumen_runtime::{Runner, RuntimeConfig};
use lumen_transport::UdpTransport;
use lumen_wire::{ArtDmx, ArtPoll};

use crate::sink::RecordingSink;

async fn bind_runner(sink: RecordingSink) -> Option<Runner> {
    let config = RuntimeConfig::from_json(
        r#"{ "node": { "ports": [ { "universe_switch": 1 } ] } }"#,
    )
    .unwrap();
    // Loopback identity keeps the poll reply routable inside the test
    let identity = NodeIdentity {
        ip: Ipv4Addr::LOCALHOST,
        broadcast: Ipv4Addr::LOCALHOST,
        ..Default::default()
    };
    let mut node = ArtNetNode::new(identity, config.node.node_config());
    node.set_output(Box::new(sink));
    Runner::bind(&config, node).await.ok()
}

#[tokio::test]
async fn runner_pumps_packets_from_socket_to_sink() {
    let sink = RecordingSink::new();
    let Some(mut runner) = bind_runner(sink.clone()).await else {
        eprintln!("Art-Net port unavailable, skipping");
        return;
    };
    runner.start();

    let console = UdpTransport::bind(0).await.unwrap();
    let dest = SocketAddr::from(SocketAddrV4::new(Ipv4Addr::LOCALHOST, ARTNET_UDP_PORT));

    let dmx = ArtDmx {
        port_address: lumen_core::Universe::new(1),
        data: vec![1, 2, 3, 4],
        ..Default::default()
    };
    console.send_to(&dmx.to_bytes(), dest).await.unwrap();
    console.send_to(&ArtPoll::default().to_bytes(), dest).await.unwrap();

    // Let the datagrams land, then run a few ticks
    for _ in 0..20 {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        let now = runner.now();
        runner.tick_once(now).await;
        if !sink.frames().is_empty() {
            break;
        }
    }

    assert!(runner.stats().packets_in >= 2);
    assert_eq!(sink.last_frame(0), Some(vec![1, 2, 3, 4]));
    // The ArtPoll produced an outbound reply
    assert!(runner.stats().packets_out >= 1);
}
