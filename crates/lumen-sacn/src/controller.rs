//! E1.31 source controller
//!
//! Emits data packets to per-universe multicast groups, an optional
//! synchronization stream, blackout frames across every active universe,
//! and the rate-limited universe discovery broadcast. Like the Art-Net
//! core, this is synchronous: packets are queued and drained by the
//! embedder through `pop_outgoing`.

use std::collections::VecDeque;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use tracing::{debug, info, warn};

use lumen_core::{
    DiagCounters, Millis, Universe, DMX_UNIVERSE_SIZE, E131_DISCOVERY_INTERVAL_MILLIS,
    E131_DISCOVERY_UNIVERSE, E131_UDP_PORT,
};
use lumen_wire::{
    E131DataPacket, E131DiscoveryPacket, E131SyncPacket, E131_CID_LENGTH,
    E131_DISCOVERY_UNIVERSES_MAX, E131_PRIORITY_DEFAULT,
};

use crate::registry::{SequenceRegistry, SEQUENCE_REGISTRY_DEFAULT_CAPACITY};

const MAX_OUTGOING_PACKETS: usize = 600;

/// Controller configuration
#[derive(Clone, Debug)]
pub struct E131ControllerConfig {
    pub source_name: String,
    pub priority: u8,
    /// Source CID; generated randomly when not pinned
    pub cid: Option<[u8; E131_CID_LENGTH]>,
    /// Universe carrying synchronization packets; None disables sync
    pub synchronization_universe: Option<Universe>,
    pub registry_capacity: usize,
}

impl Default for E131ControllerConfig {
    fn default() -> Self {
        E131ControllerConfig {
            source_name: "Lumen sACN source".into(),
            priority: E131_PRIORITY_DEFAULT,
            cid: None,
            synchronization_universe: None,
            registry_capacity: SEQUENCE_REGISTRY_DEFAULT_CAPACITY,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct SyncState {
    universe: Universe,
    multicast: Ipv4Addr,
    sequence: u8,
}

/// The sACN source core
pub struct E131Controller {
    cid: [u8; E131_CID_LENGTH],
    source_name: String,
    priority: u8,
    registry: SequenceRegistry,
    sync: Option<SyncState>,
    discovery_multicast: Ipv4Addr,
    last_discovery: Option<Millis>,
    running: bool,
    outgoing: VecDeque<(Vec<u8>, SocketAddr)>,
    counters: DiagCounters,
}

impl E131Controller {
    pub fn new(config: E131ControllerConfig) -> Self {
        let cid = config.cid.unwrap_or_else(rand::random);
        E131Controller {
            cid,
            source_name: config.source_name,
            priority: config.priority,
            registry: SequenceRegistry::with_capacity(config.registry_capacity),
            sync: config.synchronization_universe.map(|universe| SyncState {
                universe,
                multicast: universe.multicast_group(),
                sequence: 0,
            }),
            discovery_multicast: Universe::new(E131_DISCOVERY_UNIVERSE).multicast_group(),
            last_discovery: None,
            running: false,
            outgoing: VecDeque::new(),
            counters: DiagCounters::new(),
        }
    }

    pub fn start(&mut self) {
        self.running = true;
        match self.sync {
            Some(sync) => info!(
                source_name = %self.source_name,
                synchronization_universe = sync.universe.0,
                "sACN controller started"
            ),
            None => info!(
                source_name = %self.source_name,
                "sACN controller started, synchronization disabled"
            ),
        }
    }

    /// Safe to call mid-tick; suppresses all further sends
    pub fn stop(&mut self) {
        self.running = false;
        info!("sACN controller stopped");
    }

    pub fn set_source_name(&mut self, name: &str) {
        self.source_name = name.into();
    }

    pub fn set_priority(&mut self, priority: u8) {
        self.priority = priority;
    }

    pub fn set_synchronization_universe(&mut self, universe: Option<Universe>) {
        self.sync = universe.map(|universe| SyncState {
            universe,
            multicast: universe.multicast_group(),
            sequence: 0,
        });
    }

    /// Send one universe of level data to its multicast group
    pub fn handle_dmx_out(&mut self, universe: Universe, data: &[u8]) {
        if !self.running {
            return;
        }
        let (sequence, multicast) = match self.registry.next(universe) {
            Ok(result) => result,
            Err(error) => {
                self.counters.sequence_registry_full += 1;
                warn!(%universe, %error, "frame dropped");
                return;
            }
        };

        let length = data.len().min(DMX_UNIVERSE_SIZE);
        let mut packet = E131DataPacket {
            cid: self.cid,
            priority: self.priority,
            synchronization_address: self.sync.map_or(0, |s| s.universe.0),
            sequence,
            universe,
            data: data[..length].to_vec(),
            ..Default::default()
        };
        packet.set_source_name(&self.source_name);

        self.queue(packet.to_bytes(), multicast);
    }

    /// Send a synchronization packet, when a sync universe is configured
    pub fn handle_sync(&mut self) {
        if !self.running {
            return;
        }
        let Some(sync) = self.sync.as_mut() else {
            return;
        };
        let packet = E131SyncPacket {
            cid: self.cid,
            sequence: sync.sequence,
            synchronization_address: sync.universe.0,
        };
        sync.sequence = sync.sequence.wrapping_add(1);
        let multicast = sync.multicast;
        self.queue(packet.to_bytes(), multicast);
    }

    /// Zero every active universe in one pass, then synchronize
    pub fn handle_blackout(&mut self) {
        if !self.running {
            return;
        }
        let universes: Vec<Universe> = self.registry.active_universes().collect();
        debug!(universes = universes.len(), "blackout");

        for universe in universes {
            // Registered universes cannot fail the lookup
            let Ok((sequence, multicast)) = self.registry.next(universe) else {
                continue;
            };
            let mut packet = E131DataPacket {
                cid: self.cid,
                priority: self.priority,
                synchronization_address: self.sync.map_or(0, |s| s.universe.0),
                sequence,
                universe,
                data: vec![0; DMX_UNIVERSE_SIZE],
                ..Default::default()
            };
            packet.set_source_name(&self.source_name);
            self.queue(packet.to_bytes(), multicast);
        }

        if self.sync.is_some() {
            self.handle_sync();
        }
    }

    /// Periodic work: the universe discovery broadcast on its fixed
    /// interval. Call once per scheduler tick.
    pub fn run(&mut self, now: Millis) {
        if !self.running {
            return;
        }
        let due = match self.last_discovery {
            None => true,
            Some(last) => now.elapsed_since(last) >= E131_DISCOVERY_INTERVAL_MILLIS,
        };
        if due {
            self.last_discovery = Some(now);
            self.send_discovery_packet();
        }
    }

    fn send_discovery_packet(&mut self) {
        let universes: Vec<u16> = self.registry.active_universes().map(|u| u.0).collect();
        let pages: Vec<&[u16]> = if universes.is_empty() {
            vec![&[]]
        } else {
            universes.chunks(E131_DISCOVERY_UNIVERSES_MAX).collect()
        };
        let last_page = (pages.len() - 1) as u8;

        let mut queued = Vec::with_capacity(pages.len());
        for (page, list) in pages.into_iter().enumerate() {
            let mut packet = E131DiscoveryPacket {
                cid: self.cid,
                page: page as u8,
                last_page,
                universes: list.to_vec(),
                ..Default::default()
            };
            packet.set_source_name(&self.source_name);
            queued.push(packet.to_bytes());
        }
        for bytes in queued {
            self.queue(bytes, self.discovery_multicast);
        }
        debug!("universe discovery sent");
    }

    fn queue(&mut self, bytes: Vec<u8>, multicast: Ipv4Addr) {
        if self.outgoing.len() < MAX_OUTGOING_PACKETS {
            self.outgoing
                .push_back((bytes, SocketAddr::from(SocketAddrV4::new(multicast, E131_UDP_PORT))));
        } else {
            self.counters.send_errors += 1;
        }
    }

    pub fn pop_outgoing(&mut self) -> Option<(Vec<u8>, SocketAddr)> {
        self.outgoing.pop_front()
    }

    pub fn cid(&self) -> &[u8; E131_CID_LENGTH] {
        &self.cid
    }

    pub fn registry(&self) -> &SequenceRegistry {
        &self.registry
    }

    pub fn synchronization_universe(&self) -> Option<Universe> {
        self.sync.map(|s| s.universe)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn counters(&self) -> &DiagCounters {
        &self.counters
    }
}
