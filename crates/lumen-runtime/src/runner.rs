//! The cooperative tick loop
//!
//! One iteration: drain the Art-Net socket into the node, advance both
//! cores' timers, drain their outgoing queues back to the sockets, then
//! sleep until the next tick. Exactly one logical tick is ever in flight,
//! so the cores need no locking; every mutation a peer can observe
//! happens between two suspension points.

use std::net::IpAddr;
use std::time::{Duration, Instant};

use bytes::BytesMut;
use tracing::{info, warn};

use lumen_artnet::{ArtNetNode, LightSet};
use lumen_core::{LumenResult, Millis, ARTNET_UDP_PORT, E131_UDP_PORT};
use lumen_sacn::E131Controller;
use lumen_transport::UdpTransport;

use crate::config::RuntimeConfig;

/// Loop health counters
#[derive(Clone, Debug, Default)]
pub struct RunnerStats {
    pub ticks: u64,
    pub packets_in: u64,
    pub packets_out: u64,
    pub recv_errors: u64,
    pub send_errors: u64,
}

/// Owns the sockets and drives the cores
pub struct Runner {
    node: ArtNetNode,
    controller: Option<E131Controller>,
    artnet: UdpTransport,
    sacn: Option<UdpTransport>,
    tick_interval: Duration,
    epoch: Instant,
    recv_buf: BytesMut,
    stats: RunnerStats,
}

impl Runner {
    /// Bind the protocol sockets and assemble the runner. The node keeps
    /// its identity and injected collaborators; set them before calling
    /// this. Port settings from the config are applied here.
    pub async fn bind(config: &RuntimeConfig, mut node: ArtNetNode) -> LumenResult<Self> {
        let artnet = UdpTransport::bind_broadcast(ARTNET_UDP_PORT).await?;
        info!(addr = %artnet.local_addr(), "Art-Net socket bound");

        let controller = match &config.controller {
            Some(settings) => Some(E131Controller::new(settings.controller_config())),
            None => None,
        };
        let sacn = if controller.is_some() {
            let transport = UdpTransport::bind(E131_UDP_PORT).await?;
            info!(addr = %transport.local_addr(), "sACN socket bound");
            Some(transport)
        } else {
            None
        };

        for (port, settings) in config.node.ports.iter().enumerate() {
            node.set_universe_switch(port, settings.universe_switch)?;
            node.set_merge_mode(port, settings.merge_mode.into())?;
        }

        Ok(Runner {
            node,
            controller,
            artnet,
            sacn,
            tick_interval: Duration::from_millis(config.tick_interval_millis),
            epoch: Instant::now(),
            recv_buf: BytesMut::new(),
            stats: RunnerStats::default(),
        })
    }

    /// Milliseconds since the runner was built, offset so the epoch never
    /// collides with the "vacant slot" timestamp.
    pub fn now(&self) -> Millis {
        Millis::new(1000 + self.epoch.elapsed().as_millis() as u32)
    }

    pub fn start(&mut self) {
        let now = self.now();
        self.node.start(now);
        if let Some(controller) = self.controller.as_mut() {
            controller.start();
        }
    }

    pub fn stop(&mut self) {
        self.node.stop();
        if let Some(controller) = self.controller.as_mut() {
            controller.stop();
        }
    }

    /// Run until `stop` is called (from a collaborator or signal task via
    /// the mutable accessors between ticks).
    pub async fn run(&mut self) -> LumenResult<()> {
        self.start();
        let mut interval = tokio::time::interval(self.tick_interval);
        while self.node.is_running() {
            interval.tick().await;
            let now = self.now();
            self.tick_once(now).await;
        }
        Ok(())
    }

    /// One full scheduler iteration at the given timestamp
    pub async fn tick_once(&mut self, now: Millis) {
        self.stats.ticks += 1;

        // Inbound: drain without blocking
        loop {
            match self.artnet.try_recv_from(&mut self.recv_buf) {
                Ok(Some(from)) => {
                    self.stats.packets_in += 1;
                    if let IpAddr::V4(ip) = from.ip() {
                        self.node.handle_packet(&self.recv_buf, ip, now);
                    }
                }
                Ok(None) => break,
                Err(error) => {
                    self.stats.recv_errors += 1;
                    warn!(%error, "Art-Net receive failed");
                    break;
                }
            }
        }

        // Timers
        self.node.tick(now);
        if let Some(controller) = self.controller.as_mut() {
            controller.run(now);
        }

        // Outbound
        while let Some((bytes, dest)) = self.node.pop_outgoing() {
            match self.artnet.send_to(&bytes, dest).await {
                Ok(()) => self.stats.packets_out += 1,
                Err(error) => {
                    self.stats.send_errors += 1;
                    warn!(%error, %dest, "Art-Net send failed");
                }
            }
        }
        if let (Some(controller), Some(transport)) = (self.controller.as_mut(), self.sacn.as_ref())
        {
            while let Some((bytes, dest)) = controller.pop_outgoing() {
                match transport.send_to(&bytes, dest).await {
                    Ok(()) => self.stats.packets_out += 1,
                    Err(error) => {
                        self.stats.send_errors += 1;
                        warn!(%error, %dest, "sACN send failed");
                    }
                }
            }
        }
    }

    pub fn node(&self) -> &ArtNetNode {
        &self.node
    }

    pub fn node_mut(&mut self) -> &mut ArtNetNode {
        &mut self.node
    }

    pub fn controller(&self) -> Option<&E131Controller> {
        self.controller.as_ref()
    }

    pub fn controller_mut(&mut self) -> Option<&mut E131Controller> {
        self.controller.as_mut()
    }

    pub fn stats(&self) -> &RunnerStats {
        &self.stats
    }
}

/// A sink that only logs, for bring-up before real output hardware is wired
pub struct LoggingLightSet;

impl LightSet for LoggingLightSet {
    fn start(&mut self, port: usize) {
        info!(port, "output started");
    }

    fn stop(&mut self, port: usize) {
        info!(port, "output stopped");
    }

    fn set_data(&mut self, port: usize, data: &[u8]) {
        tracing::trace!(port, channels = data.len(), "frame");
    }
}
