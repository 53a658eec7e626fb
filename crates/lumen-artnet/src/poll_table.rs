//! Registry of remote Art-Net nodes learned from ArtPollReply
//!
//! Two tables are maintained together:
//! - the node table, sorted ascending by the numeric (big-endian) value of
//!   the node IP, each entry carrying a bounded list of universes with
//!   last-seen timestamps
//! - the universe registry, sorted ascending by universe number, mapping
//!   each universe to the set of node IPs currently serving it
//!
//! Capacity is fixed at construction. A full table drops the newcomer and
//! counts the drop; existing entries are never disturbed. Aging happens in
//! [`PollTable::clean`], a round-robin sweep that inspects one universe
//! slot per call so a single tick never pays for the whole table.

use std::net::Ipv4Addr;

use tracing::{debug, warn};

use lumen_core::{DiagCounters, Millis, Universe, ARTNET_MAX_PORTS, ARTNET_POLL_STALE_MILLIS};
use lumen_wire::{ArtPollReply, LONG_NAME_LENGTH, MAC_SIZE, PORT_TYPE_OUTPUT, SHORT_NAME_LENGTH};

pub const POLL_TABLE_DEFAULT_NODES: usize = 255;
pub const POLL_TABLE_DEFAULT_UNIVERSES: usize = 64;
pub const POLL_TABLE_DEFAULT_NODE_UNIVERSES: usize = 16;

/// One universe served by a remote node.
/// `last_update == Millis::ZERO` marks a slot that has aged out.
#[derive(Clone, Debug)]
pub struct NodeUniverse {
    pub universe: Universe,
    pub last_update: Millis,
}

/// One remote node, keyed by IP
#[derive(Clone)]
pub struct NodeEntry {
    pub ip: Ipv4Addr,
    pub mac: [u8; MAC_SIZE],
    pub short_name: [u8; SHORT_NAME_LENGTH],
    pub long_name: [u8; LONG_NAME_LENGTH],
    pub universes: Vec<NodeUniverse>,
}

impl NodeEntry {
    fn new(ip: Ipv4Addr) -> Self {
        NodeEntry {
            ip,
            mac: [0; MAC_SIZE],
            short_name: [0; SHORT_NAME_LENGTH],
            long_name: [0; LONG_NAME_LENGTH],
            universes: Vec::new(),
        }
    }
}

impl std::fmt::Debug for NodeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeEntry")
            .field("ip", &self.ip)
            .field("short_name", &lumen_wire::padded_str(&self.short_name))
            .field("universes", &self.universes)
            .finish_non_exhaustive()
    }
}

/// One universe in the global registry with its subscriber IPs
#[derive(Clone, Debug)]
pub struct UniverseEntry {
    pub universe: Universe,
    pub ips: Vec<Ipv4Addr>,
}

#[derive(Clone, Copy, Debug)]
struct CleanCursor {
    node_index: usize,
    slot_index: usize,
    /// True until a live universe slot is seen for the current node
    offline: bool,
}

/// Bounded registry of remote nodes and their universes
pub struct PollTable {
    nodes: Vec<NodeEntry>,
    universes: Vec<UniverseEntry>,
    max_nodes: usize,
    max_universes: usize,
    max_node_universes: usize,
    cursor: CleanCursor,
    counters: DiagCounters,
}

impl Default for PollTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PollTable {
    pub fn new() -> Self {
        Self::with_capacity(
            POLL_TABLE_DEFAULT_NODES,
            POLL_TABLE_DEFAULT_UNIVERSES,
            POLL_TABLE_DEFAULT_NODE_UNIVERSES,
        )
    }

    /// Capacities are fixed for the lifetime of the table
    pub fn with_capacity(max_nodes: usize, max_universes: usize, max_node_universes: usize) -> Self {
        PollTable {
            nodes: Vec::with_capacity(max_nodes),
            universes: Vec::with_capacity(max_universes),
            max_nodes,
            max_universes,
            max_node_universes,
            cursor: CleanCursor {
                node_index: 0,
                slot_index: 0,
                offline: true,
            },
            counters: DiagCounters::new(),
        }
    }

    /// Record a poll reply: upsert the node (sorted by big-endian IP) and
    /// refresh every output universe it advertises.
    pub fn add(&mut self, reply: &ArtPollReply, now: Millis) {
        let key = u32::from(reply.ip);
        let index = match self.nodes.binary_search_by_key(&key, |e| u32::from(e.ip)) {
            Ok(index) => index,
            Err(index) => {
                if self.nodes.len() == self.max_nodes {
                    self.counters.poll_table_full += 1;
                    warn!(ip = %reply.ip, "poll table full, node dropped");
                    return;
                }
                debug!(ip = %reply.ip, index, "new node");
                self.nodes.insert(index, NodeEntry::new(reply.ip));
                index
            }
        };

        // Identity fields come from the primary bind page only
        if reply.bind_index <= 1 {
            let node = &mut self.nodes[index];
            node.mac = reply.mac;
            node.short_name = reply.short_name;
            node.long_name = reply.long_name;
        }

        for port in 0..ARTNET_MAX_PORTS {
            if reply.port_types[port] & PORT_TYPE_OUTPUT == 0 {
                continue;
            }
            let universe =
                Universe::from_switches(reply.net_switch, reply.sub_switch, reply.sw_out[port]);

            let slot = self.nodes[index]
                .universes
                .iter()
                .position(|u| u.universe == universe);
            match slot {
                Some(slot) => {
                    if self.nodes[index].universes[slot].last_update == Millis::ZERO {
                        // The slot had aged out of the registry; re-announce
                        let ip = self.nodes[index].ip;
                        self.process_universe(ip, universe);
                    }
                    self.nodes[index].universes[slot].last_update = now;
                }
                None => {
                    if self.nodes[index].universes.len() == self.max_node_universes {
                        self.counters.node_universes_full += 1;
                        continue;
                    }
                    self.nodes[index].universes.push(NodeUniverse {
                        universe,
                        last_update: now,
                    });
                    let ip = self.nodes[index].ip;
                    self.process_universe(ip, universe);
                }
            }
        }
    }

    /// Add `ip` to the universe's subscriber set, creating the universe
    /// entry in sorted position when it is new.
    fn process_universe(&mut self, ip: Ipv4Addr, universe: Universe) {
        match self.universes.binary_search_by_key(&universe, |e| e.universe) {
            Ok(index) => {
                let entry = &mut self.universes[index];
                if !entry.ips.contains(&ip) {
                    entry.ips.push(ip);
                }
            }
            Err(index) => {
                if self.universes.len() == self.max_universes {
                    self.counters.universe_registry_full += 1;
                    warn!(%universe, "universe registry full, universe dropped");
                    return;
                }
                debug!(%universe, %ip, "new universe");
                self.universes.insert(
                    index,
                    UniverseEntry {
                        universe,
                        ips: vec![ip],
                    },
                );
            }
        }
    }

    /// Subscriber IPs for a universe; empty when the universe is unknown
    pub fn get_ip_addresses(&self, universe: Universe) -> &[Ipv4Addr] {
        match self.universes.binary_search_by_key(&universe, |e| e.universe) {
            Ok(index) => &self.universes[index].ips,
            Err(_) => &[],
        }
    }

    /// Remove `ip` from the universe's subscriber set; an emptied universe
    /// entry is compacted out, preserving sort order.
    pub fn remove_ip_address(&mut self, universe: Universe, ip: Ipv4Addr) {
        let Ok(index) = self.universes.binary_search_by_key(&universe, |e| e.universe) else {
            return;
        };
        let entry = &mut self.universes[index];
        if let Some(position) = entry.ips.iter().position(|&a| a == ip) {
            entry.ips.remove(position);
        }
        if entry.ips.is_empty() {
            debug!(%universe, "universe has no subscribers, removed");
            self.universes.remove(index);
        }
    }

    /// One round-robin aging step: inspect a single (node, universe slot)
    /// pair, mark it stale when it has outlived 1.5x the poll interval, and
    /// drop the whole node once a full sweep finds no live slot.
    pub fn clean(&mut self, now: Millis) {
        if self.nodes.is_empty() {
            return;
        }
        if self.cursor.node_index >= self.nodes.len() {
            self.cursor.node_index = 0;
        }
        if self.cursor.slot_index == 0 {
            self.cursor.offline = true;
        }

        let node_index = self.cursor.node_index;
        if let Some(slot) = self.nodes[node_index].universes.get(self.cursor.slot_index) {
            let universe = slot.universe;
            let last_update = slot.last_update;
            if last_update != Millis::ZERO {
                if now.elapsed_since(last_update) > ARTNET_POLL_STALE_MILLIS {
                    let ip = self.nodes[node_index].ip;
                    self.nodes[node_index].universes[self.cursor.slot_index].last_update =
                        Millis::ZERO;
                    debug!(%universe, %ip, "universe stale");
                    self.remove_ip_address(universe, ip);
                } else {
                    self.cursor.offline = false;
                }
            }
        }

        self.cursor.slot_index += 1;
        if self.cursor.slot_index == self.max_node_universes {
            if self.cursor.offline {
                let removed = self.nodes.remove(self.cursor.node_index);
                debug!(ip = %removed.ip, "node offline, removed");
                // The successor shifted into this index; sweep it next
            } else {
                self.cursor.node_index += 1;
            }
            self.cursor.slot_index = 0;
            self.cursor.offline = true;
            if self.cursor.node_index >= self.nodes.len() {
                self.cursor.node_index = 0;
            }
        }
    }

    pub fn nodes(&self) -> &[NodeEntry] {
        &self.nodes
    }

    pub fn universe_entries(&self) -> &[UniverseEntry] {
        &self.universes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn counters(&self) -> &DiagCounters {
        &self.counters
    }
}
