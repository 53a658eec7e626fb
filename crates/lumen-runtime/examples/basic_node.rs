//! Minimal Art-Net node: one output port on universe 1, logging sink.
//!
//! Run with `RUST_LOG=debug cargo run --example basic_node`, then point a
//! lighting console (or another Lumen instance) at this host.

use lumen_artnet::{ArtNetNode, NodeIdentity};
use lumen_runtime::{LoggingLightSet, Runner, RuntimeConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = RuntimeConfig::from_json(
        r#"{
            "node": {
                "short_name": "lumen demo",
                "long_name": "Lumen demo node, universe 1",
                "ports": [ { "universe_switch": 1 } ]
            }
        }"#,
    )?;

    let identity = NodeIdentity {
        ip: local_ip(),
        ..Default::default()
    };
    let mut node = ArtNetNode::new(identity, config.node.node_config());
    node.set_output(Box::new(LoggingLightSet));

    let mut runner = Runner::bind(&config, node).await?;
    runner.run().await?;
    Ok(())
}

fn local_ip() -> std::net::Ipv4Addr {
    // Good enough for a demo; real deployments resolve the interface
    std::net::Ipv4Addr::UNSPECIFIED
}
