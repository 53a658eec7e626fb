//! Art-Net node state machine
//!
//! A synchronous protocol core: the embedder feeds raw datagrams into
//! [`ArtNetNode::handle_packet`], advances timers with [`ArtNetNode::tick`]
//! once per scheduler iteration, and drains outbound packets with
//! [`ArtNetNode::pop_outgoing`]. All collaborators (DMX sink, config
//! store, opcode handlers) are injected; nothing global.

use std::collections::VecDeque;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use tracing::{debug, info, trace, warn};

use lumen_core::{
    DiagCounters, Millis, Universe, ARTNET_MAX_PORTS, ARTNET_UDP_PORT, ARTSYNC_TIMEOUT_MILLIS,
    DMX_UNIVERSE_SIZE, NETWORK_DATA_LOSS_TIMEOUT_MILLIS,
};
use lumen_wire::{
    padded_str, port_command, ArtAddress, ArtDmx, ArtPacket, ArtPoll, ArtPollReply, ArtTimeCode,
    ArtTodData, ArtTodRequest, ArtTrigger, copy_padded, ArtTodControl, ART_TOD_DATA_MAX_UIDS,
    GOOD_OUTPUT_DATA_IS_BEING_TRANSMITTED, GOOD_OUTPUT_MERGE_MODE_LTP, GOOD_OUTPUT_MERGING,
    MAC_SIZE, PORT_TYPE_INPUT, PORT_TYPE_OUTPUT, STYLE_NODE, TOD_CONTROL_FLUSH,
};

use crate::handlers::{ArtNetStore, IpProgHandler, LightSet, RdmHandler, TimeCodeHandler, TriggerHandler};
use crate::poll_table::PollTable;
use crate::port::{DmxIngest, MergeMode, OutputPort};

/// Outbound packets queued per node before the embedder drains them
const MAX_OUTGOING_PACKETS: usize = 64;

/// NodeReport codes carried in ArtPollReply
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum ReportCode {
    Debug = 0x0000,
    PowerOk = 0x0001,
    PowerFail = 0x0002,
    ParseFail = 0x0004,
    ShortNameOk = 0x0006,
    LongNameOk = 0x0007,
    DmxError = 0x0008,
}

/// Network identity of this node, resolved by the embedder
#[derive(Clone, Copy, Debug)]
pub struct NodeIdentity {
    pub ip: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub broadcast: Ipv4Addr,
    pub mac: [u8; MAC_SIZE],
}

impl Default for NodeIdentity {
    fn default() -> Self {
        NodeIdentity {
            ip: Ipv4Addr::UNSPECIFIED,
            netmask: Ipv4Addr::new(255, 255, 255, 0),
            broadcast: Ipv4Addr::BROADCAST,
            mac: [0; MAC_SIZE],
        }
    }
}

/// Static node configuration; names and switches can be reprogrammed at
/// runtime via ArtAddress.
#[derive(Clone, Debug)]
pub struct ArtNetNodeConfig {
    pub short_name: String,
    pub long_name: String,
    pub oem: u16,
    pub esta_manufacturer: u16,
    pub firmware_version: u16,
    pub net_switch: u8,
    pub sub_switch: u8,
    pub network_data_loss_timeout_millis: u32,
    pub disable_merge_timeout: bool,
}

impl Default for ArtNetNodeConfig {
    fn default() -> Self {
        ArtNetNodeConfig {
            short_name: "Lumen".into(),
            long_name: "Lumen Art-Net node".into(),
            oem: 0x00FF,
            esta_manufacturer: 0x7FF0,
            firmware_version: 0x0200,
            net_switch: 0,
            sub_switch: 0,
            network_data_loss_timeout_millis: NETWORK_DATA_LOSS_TIMEOUT_MILLIS,
            disable_merge_timeout: false,
        }
    }
}

/// Input port descriptor, reported in ArtPollReply only (DMX capture is
/// hardware-side, behind the sink boundary)
#[derive(Clone, Copy, Debug, Default)]
pub struct InputPortConfig {
    pub enabled: bool,
    pub universe_switch: u8,
}

struct NodeState {
    report_code: ReportCode,
    poll_reply_count: u32,
    poll_addr: Option<Ipv4Addr>,
    reply_on_change: bool,
    synchronous_mode: bool,
    last_sync: Millis,
    receiving_dmx: bool,
    last_dmx: Millis,
    running: bool,
}

impl Default for NodeState {
    fn default() -> Self {
        NodeState {
            report_code: ReportCode::PowerOk,
            poll_reply_count: 0,
            poll_addr: None,
            reply_on_change: false,
            synchronous_mode: false,
            last_sync: Millis::ZERO,
            receiving_dmx: false,
            last_dmx: Millis::ZERO,
            running: false,
        }
    }
}

/// The Art-Net node core
pub struct ArtNetNode {
    identity: NodeIdentity,
    config: ArtNetNodeConfig,
    ports: [OutputPort; ARTNET_MAX_PORTS],
    input_ports: [InputPortConfig; ARTNET_MAX_PORTS],
    started: [bool; ARTNET_MAX_PORTS],
    poll_table: PollTable,
    state: NodeState,
    sink: Option<Box<dyn LightSet>>,
    store: Option<Box<dyn ArtNetStore>>,
    time_code: Option<Box<dyn TimeCodeHandler>>,
    trigger: Option<Box<dyn TriggerHandler>>,
    ip_prog: Option<Box<dyn IpProgHandler>>,
    rdm: Option<Box<dyn RdmHandler>>,
    outgoing: VecDeque<(Vec<u8>, SocketAddr)>,
    counters: DiagCounters,
}

impl ArtNetNode {
    pub fn new(identity: NodeIdentity, config: ArtNetNodeConfig) -> Self {
        ArtNetNode {
            identity,
            config,
            ports: std::array::from_fn(|_| OutputPort::default()),
            input_ports: [InputPortConfig::default(); ARTNET_MAX_PORTS],
            started: [false; ARTNET_MAX_PORTS],
            poll_table: PollTable::new(),
            state: NodeState::default(),
            sink: None,
            store: None,
            time_code: None,
            trigger: None,
            ip_prog: None,
            rdm: None,
            outgoing: VecDeque::new(),
            counters: DiagCounters::new(),
        }
    }

    pub fn set_output(&mut self, sink: Box<dyn LightSet>) {
        self.sink = Some(sink);
    }

    pub fn set_store(&mut self, store: Box<dyn ArtNetStore>) {
        self.store = Some(store);
    }

    pub fn set_time_code_handler(&mut self, handler: Box<dyn TimeCodeHandler>) {
        self.time_code = Some(handler);
    }

    pub fn set_trigger_handler(&mut self, handler: Box<dyn TriggerHandler>) {
        self.trigger = Some(handler);
    }

    pub fn set_ip_prog_handler(&mut self, handler: Box<dyn IpProgHandler>) {
        self.ip_prog = Some(handler);
    }

    pub fn set_rdm_handler(&mut self, handler: Box<dyn RdmHandler>) {
        self.rdm = Some(handler);
    }

    /// Enable an output port on the given universe switch (low nibble of
    /// the Port-Address; Net and Sub-Net come from the node config).
    pub fn set_universe_switch(&mut self, port: usize, switch: u8) -> lumen_core::LumenResult<()> {
        if port >= ARTNET_MAX_PORTS {
            return Err(lumen_core::LumenError::InvalidPortIndex(port));
        }
        self.ports[port].enabled = true;
        self.ports[port].universe_switch = switch & 0x0F;
        self.refresh_port_addresses();
        Ok(())
    }

    /// Report an input port in poll replies
    pub fn set_input_universe_switch(&mut self, port: usize, switch: u8) -> lumen_core::LumenResult<()> {
        if port >= ARTNET_MAX_PORTS {
            return Err(lumen_core::LumenError::InvalidPortIndex(port));
        }
        self.input_ports[port] = InputPortConfig {
            enabled: true,
            universe_switch: switch & 0x0F,
        };
        Ok(())
    }

    pub fn set_merge_mode(&mut self, port: usize, mode: MergeMode) -> lumen_core::LumenResult<()> {
        if port >= ARTNET_MAX_PORTS {
            return Err(lumen_core::LumenError::InvalidPortIndex(port));
        }
        self.ports[port].merge_mode = mode;
        if let Some(store) = self.store.as_mut() {
            store.save_merge_mode(port, mode);
        }
        Ok(())
    }

    pub fn set_short_name(&mut self, name: &str) {
        self.config.short_name = name.into();
        if let Some(store) = self.store.as_mut() {
            store.save_short_name(name);
        }
    }

    pub fn set_long_name(&mut self, name: &str) {
        self.config.long_name = name.into();
        if let Some(store) = self.store.as_mut() {
            store.save_long_name(name);
        }
    }

    pub fn start(&mut self, now: Millis) {
        self.state.running = true;
        self.state.report_code = ReportCode::PowerOk;
        self.state.last_dmx = now;
        info!(ip = %self.identity.ip, "Art-Net node started");
        // Announce ourselves without waiting for the first poll
        self.send_poll_reply();
    }

    /// Safe to call mid-tick; suppresses all further dispatch and sends
    pub fn stop(&mut self) {
        self.state.running = false;
        for index in 0..ARTNET_MAX_PORTS {
            if self.started[index] {
                if let Some(sink) = self.sink.as_mut() {
                    sink.stop(index);
                }
                self.started[index] = false;
            }
        }
        info!("Art-Net node stopped");
    }

    /// Dispatch one inbound datagram. Malformed packets are counted and
    /// discarded before any state is touched.
    pub fn handle_packet(&mut self, buf: &[u8], from: Ipv4Addr, now: Millis) {
        if !self.state.running {
            return;
        }
        let packet = match ArtPacket::parse(buf) {
            Ok(packet) => packet,
            Err(error) => {
                self.counters.malformed_packets += 1;
                self.state.report_code = ReportCode::ParseFail;
                trace!(%from, %error, "discarded malformed datagram");
                return;
            }
        };

        match packet {
            ArtPacket::Poll(poll) => self.handle_poll(&poll, from),
            ArtPacket::PollReply(reply) => self.poll_table.add(&reply, now),
            ArtPacket::Dmx(dmx) => self.handle_dmx(&dmx, from, now),
            ArtPacket::Sync(_) => self.handle_sync(now),
            ArtPacket::Address(address) => self.handle_address(&address),
            ArtPacket::TimeCode(time_code) => {
                if let Some(handler) = self.time_code.as_mut() {
                    handler.handle_time_code(&time_code);
                }
            }
            ArtPacket::Trigger(trigger) => self.handle_trigger(&trigger),
            ArtPacket::IpProg(prog) => {
                if let Some(handler) = self.ip_prog.as_mut() {
                    let reply = handler.handle_ip_prog(&prog);
                    self.queue(reply.to_bytes(), SocketAddr::from(SocketAddrV4::new(from, ARTNET_UDP_PORT)));
                }
            }
            ArtPacket::TodRequest(request) => self.handle_tod_request(&request),
            ArtPacket::TodControl(control) => self.handle_tod_control(&control),
            // We are the gateway; these are peer output, not input
            ArtPacket::TodData(_) | ArtPacket::IpProgReply(_) => {}
        }
    }

    /// Advance timers: merge timeouts, synchronous-mode expiry, network
    /// data loss, and one poll-table aging step.
    pub fn tick(&mut self, now: Millis) {
        if !self.state.running {
            return;
        }

        if !self.config.disable_merge_timeout {
            for index in 0..ARTNET_MAX_PORTS {
                if !self.ports[index].enabled {
                    continue;
                }
                if self.ports[index].expire_sources(now, self.config.network_data_loss_timeout_millis) {
                    debug!(port = index, "merge source timed out");
                    if self.ports[index].compute() && !self.state.synchronous_mode {
                        self.flush_port(index);
                    }
                }
            }
        }

        if self.state.synchronous_mode
            && now.elapsed_since(self.state.last_sync) > ARTSYNC_TIMEOUT_MILLIS
        {
            debug!("no ArtSync within timeout, leaving synchronous mode");
            self.state.synchronous_mode = false;
            self.flush_pending();
        }

        if self.state.receiving_dmx
            && now.elapsed_since(self.state.last_dmx) > self.config.network_data_loss_timeout_millis
        {
            self.set_network_data_loss_condition();
        }

        self.poll_table.clean(now);
    }

    pub fn pop_outgoing(&mut self) -> Option<(Vec<u8>, SocketAddr)> {
        self.outgoing.pop_front()
    }

    fn queue(&mut self, bytes: Vec<u8>, dest: SocketAddr) {
        if self.outgoing.len() < MAX_OUTGOING_PACKETS {
            self.outgoing.push_back((bytes, dest));
        } else {
            self.counters.send_errors += 1;
        }
    }

    fn broadcast_addr(&self) -> SocketAddr {
        SocketAddr::from(SocketAddrV4::new(self.identity.broadcast, ARTNET_UDP_PORT))
    }

    fn handle_poll(&mut self, poll: &ArtPoll, from: Ipv4Addr) {
        self.state.poll_addr = Some(from);
        self.state.reply_on_change = poll.reply_on_change();
        trace!(%from, talk_to_me = poll.talk_to_me, "poll");
        self.send_poll_reply();
    }

    fn send_poll_reply(&mut self) {
        self.state.poll_reply_count = self.state.poll_reply_count.wrapping_add(1);

        let mut reply = ArtPollReply {
            ip: self.identity.ip,
            version_info: self.config.firmware_version,
            net_switch: self.config.net_switch,
            sub_switch: self.config.sub_switch,
            oem: self.config.oem,
            esta_manufacturer: self.config.esta_manufacturer,
            style: STYLE_NODE,
            mac: self.identity.mac,
            bind_ip: self.identity.ip,
            bind_index: 1,
            // 15-bit Port-Address capable
            status2: 0x08,
            ..Default::default()
        };
        reply.set_short_name(&self.config.short_name);
        reply.set_long_name(&self.config.long_name);

        let report = format!(
            "#{:04x} [{}] Lumen AP",
            self.state.report_code as u16, self.state.poll_reply_count
        );
        copy_padded(&mut reply.node_report, &report);

        let mut outputs = 0u16;
        let mut inputs = 0u16;
        for index in 0..ARTNET_MAX_PORTS {
            let port = &self.ports[index];
            if port.enabled {
                outputs += 1;
                reply.port_types[index] |= PORT_TYPE_OUTPUT;
                reply.sw_out[index] = port.universe_switch;
                let mut good = 0u8;
                if port.length > 0 {
                    good |= GOOD_OUTPUT_DATA_IS_BEING_TRANSMITTED;
                }
                if port.is_merging {
                    good |= GOOD_OUTPUT_MERGING;
                }
                if port.merge_mode == MergeMode::Ltp {
                    good |= GOOD_OUTPUT_MERGE_MODE_LTP;
                }
                reply.good_output[index] = good;
            }
            if self.input_ports[index].enabled {
                inputs += 1;
                reply.port_types[index] |= PORT_TYPE_INPUT;
                reply.sw_in[index] = self.input_ports[index].universe_switch;
            }
        }
        reply.num_ports = outputs.max(inputs);

        self.queue(reply.to_bytes(), self.broadcast_addr());
    }

    fn handle_dmx(&mut self, dmx: &ArtDmx, from: Ipv4Addr, now: Millis) {
        self.state.receiving_dmx = true;
        self.state.last_dmx = now;

        for index in 0..ARTNET_MAX_PORTS {
            if !self.ports[index].enabled || self.ports[index].address != dmx.port_address {
                continue;
            }

            let timeout = self.config.network_data_loss_timeout_millis;
            let timeout_disabled = self.config.disable_merge_timeout;
            if !timeout_disabled && self.ports[index].expire_sources(now, timeout) {
                debug!(port = index, "merge source timed out");
            }

            let was_merging = self.ports[index].is_merging;
            match self.ports[index].ingest(from, &dmx.data, now, timeout, timeout_disabled) {
                DmxIngest::Dropped => {
                    self.counters.merge_collisions_dropped += 1;
                    debug!(port = index, %from, "both merge slots bound, frame dropped");
                    continue;
                }
                DmxIngest::Accepted { merging } => {
                    if merging != was_merging && self.state.reply_on_change {
                        self.send_poll_reply();
                    }
                }
            }

            let changed = self.ports[index].compute();
            if self.state.synchronous_mode {
                self.ports[index].data_pending = true;
            } else if changed {
                self.flush_port(index);
            }
        }
    }

    fn handle_sync(&mut self, now: Millis) {
        if !self.state.synchronous_mode {
            debug!("entering synchronous mode");
        }
        self.state.synchronous_mode = true;
        self.state.last_sync = now;
        self.flush_pending();
    }

    /// Flush every port held back by synchronous mode in one pass
    fn flush_pending(&mut self) {
        for index in 0..ARTNET_MAX_PORTS {
            if self.ports[index].data_pending {
                self.ports[index].data_pending = false;
                self.flush_port(index);
            }
        }
    }

    fn flush_port(&mut self, index: usize) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        if !self.started[index] {
            sink.start(index);
            self.started[index] = true;
        }
        let port = &self.ports[index];
        sink.set_data(index, &port.data[..port.length]);
    }

    fn handle_address(&mut self, address: &ArtAddress) {
        if address.short_name[0] != 0 {
            let name = padded_str(&address.short_name);
            debug!(%name, "short name programmed");
            self.config.short_name = name.clone();
            if let Some(store) = self.store.as_mut() {
                store.save_short_name(&name);
            }
            self.state.report_code = ReportCode::ShortNameOk;
        }
        if address.long_name[0] != 0 {
            let name = padded_str(&address.long_name);
            debug!(%name, "long name programmed");
            self.config.long_name = name.clone();
            if let Some(store) = self.store.as_mut() {
                store.save_long_name(&name);
            }
            self.state.report_code = ReportCode::LongNameOk;
        }

        if let Some(net) = program_switch(address.net_switch) {
            self.config.net_switch = net & 0x7F;
            if let Some(store) = self.store.as_mut() {
                store.save_net_switch(net & 0x7F);
            }
        }
        if let Some(sub) = program_switch(address.sub_switch) {
            self.config.sub_switch = sub & 0x0F;
            if let Some(store) = self.store.as_mut() {
                store.save_sub_switch(sub & 0x0F);
            }
        }
        for index in 0..ARTNET_MAX_PORTS {
            if let Some(universe) = program_switch(address.sw_out[index]) {
                if self.ports[index].enabled {
                    self.ports[index].universe_switch = universe & 0x0F;
                    if let Some(store) = self.store.as_mut() {
                        store.save_universe_switch(index, universe & 0x0F);
                    }
                }
            }
        }
        self.refresh_port_addresses();

        let command = address.command;
        match command {
            port_command::NONE => {}
            port_command::CANCEL_MERGE => {
                for port in self.ports.iter_mut() {
                    port.cancel_merge();
                }
            }
            c if (port_command::MERGE_LTP..port_command::MERGE_LTP + 4).contains(&c) => {
                let _ = self.set_merge_mode((c - port_command::MERGE_LTP) as usize, MergeMode::Ltp);
            }
            c if (port_command::MERGE_HTP..port_command::MERGE_HTP + 4).contains(&c) => {
                let _ = self.set_merge_mode((c - port_command::MERGE_HTP) as usize, MergeMode::Htp);
            }
            c if (port_command::CLEAR_OP..port_command::CLEAR_OP + 4).contains(&c) => {
                let index = (c - port_command::CLEAR_OP) as usize;
                if self.ports[index].enabled {
                    self.ports[index].clear();
                    // A full blackout frame goes downstream
                    self.ports[index].length = DMX_UNIVERSE_SIZE;
                    self.flush_port(index);
                }
            }
            other => trace!(command = other, "unsupported ArtAddress command"),
        }

        // ArtAddress always triggers an immediate reply
        self.send_poll_reply();
    }

    fn handle_trigger(&mut self, trigger: &ArtTrigger) {
        if trigger.oem != ArtTrigger::OEM_BROADCAST && trigger.oem != self.config.oem {
            return;
        }
        if let Some(handler) = self.trigger.as_mut() {
            handler.handle_trigger(trigger);
        }
    }

    fn handle_tod_request(&mut self, request: &ArtTodRequest) {
        if self.rdm.is_none() {
            return;
        }
        for index in 0..ARTNET_MAX_PORTS {
            if !self.ports[index].enabled {
                continue;
            }
            let address = self.ports[index].address;
            if address.net() != request.net {
                continue;
            }
            let low = (address.0 & 0xFF) as u8;
            if request.addresses.is_empty() || request.addresses.contains(&low) {
                self.send_tod(index);
            }
        }
    }

    fn handle_tod_control(&mut self, control: &ArtTodControl) {
        if control.command != TOD_CONTROL_FLUSH {
            return;
        }
        for index in 0..ARTNET_MAX_PORTS {
            if !self.ports[index].enabled {
                continue;
            }
            let address = self.ports[index].address;
            if address.net() != control.net || (address.0 & 0xFF) as u8 != control.address {
                continue;
            }
            if let Some(rdm) = self.rdm.as_mut() {
                rdm.flush(address);
            }
            self.send_tod(index);
        }
    }

    fn send_tod(&mut self, index: usize) {
        let address = self.ports[index].address;
        let Some(rdm) = self.rdm.as_mut() else {
            return;
        };
        let uids = rdm.tod(address);
        let total = uids.len() as u16;

        let mut blocks: Vec<Vec<[u8; 6]>> = uids
            .chunks(ART_TOD_DATA_MAX_UIDS)
            .map(|chunk| chunk.to_vec())
            .collect();
        if blocks.is_empty() {
            blocks.push(Vec::new());
        }

        for (block, chunk) in blocks.into_iter().enumerate() {
            let tod = ArtTodData {
                rdm_version: 1,
                port: (index + 1) as u8,
                bind_index: 1,
                net: address.net(),
                command_response: 0,
                address: (address.0 & 0xFF) as u8,
                uid_total: total,
                block_count: block as u8,
                uids: chunk,
            };
            let dest = self.broadcast_addr();
            self.queue(tod.to_bytes(), dest);
        }
    }

    /// Broadcast a timecode packet (node-originated output path)
    pub fn send_time_code(&mut self, time_code: &ArtTimeCode) {
        if !self.state.running {
            return;
        }
        let dest = self.broadcast_addr();
        self.queue(time_code.to_bytes(), dest);
    }

    fn set_network_data_loss_condition(&mut self) {
        warn!("DMX reception lost, failing over");
        self.state.receiving_dmx = false;
        self.state.report_code = ReportCode::DmxError;
        for index in 0..ARTNET_MAX_PORTS {
            if !self.ports[index].enabled {
                continue;
            }
            self.ports[index].clear();
            if self.started[index] {
                if let Some(sink) = self.sink.as_mut() {
                    sink.stop(index);
                }
                self.started[index] = false;
            }
        }
    }

    fn refresh_port_addresses(&mut self) {
        for port in self.ports.iter_mut() {
            port.address = Universe::from_switches(
                self.config.net_switch,
                self.config.sub_switch,
                port.universe_switch,
            );
        }
    }

    pub fn short_name(&self) -> &str {
        &self.config.short_name
    }

    pub fn long_name(&self) -> &str {
        &self.config.long_name
    }

    pub fn output_port(&self, index: usize) -> Option<&OutputPort> {
        self.ports.get(index)
    }

    pub fn active_output_ports(&self) -> usize {
        self.ports.iter().filter(|p| p.enabled).count()
    }

    pub fn is_synchronous_mode(&self) -> bool {
        self.state.synchronous_mode
    }

    /// The controller that polled us most recently
    pub fn last_poll_source(&self) -> Option<Ipv4Addr> {
        self.state.poll_addr
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn report_code(&self) -> ReportCode {
        self.state.report_code
    }

    pub fn poll_table(&self) -> &PollTable {
        &self.poll_table
    }

    pub fn counters(&self) -> &DiagCounters {
        &self.counters
    }

    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }
}

/// ArtAddress switch programming: bit 7 selects programming, the bottom
/// seven bits carry the value; anything else leaves the switch alone.
fn program_switch(value: u8) -> Option<u8> {
    if value & 0x80 != 0 {
        Some(value & 0x7F)
    } else {
        None
    }
}
