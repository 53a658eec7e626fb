//! Collaborator traits injected into the node
//!
//! The node core never touches hardware or persistent storage directly;
//! everything downstream of the protocol is behind one of these traits.

use lumen_core::Universe;
use lumen_wire::{ArtIpProg, ArtIpProgReply, ArtTimeCode, ArtTrigger};

use crate::port::MergeMode;

/// Downstream DMX sink, one instance drives all ports
pub trait LightSet {
    /// The port is about to carry live data
    fn start(&mut self, port: usize);
    /// The port lost its sources; output should fail over
    fn stop(&mut self, port: usize);
    /// One merged/pass-through frame is ready
    fn set_data(&mut self, port: usize, data: &[u8]);
}

/// Persistence hooks for remotely programmed configuration.
/// Implementations treat the values as opaque and durable.
pub trait ArtNetStore {
    fn save_short_name(&mut self, name: &str);
    fn save_long_name(&mut self, name: &str);
    fn save_net_switch(&mut self, net: u8);
    fn save_sub_switch(&mut self, sub: u8);
    fn save_universe_switch(&mut self, port: usize, address: u8);
    fn save_merge_mode(&mut self, port: usize, mode: MergeMode);
}

/// ArtTimeCode consumer
pub trait TimeCodeHandler {
    fn handle_time_code(&mut self, time_code: &ArtTimeCode);
}

/// ArtTrigger consumer (only triggers matching our OEM, or the broadcast
/// OEM, are delivered)
pub trait TriggerHandler {
    fn handle_trigger(&mut self, trigger: &ArtTrigger);
}

/// ArtIpProg executor; returns the reply describing the active configuration
pub trait IpProgHandler {
    fn handle_ip_prog(&mut self, prog: &ArtIpProg) -> ArtIpProgReply;
}

/// RDM responder backing the ArtTod* opcodes
pub trait RdmHandler {
    /// Current table of devices for the given Port-Address
    fn tod(&mut self, port_address: Universe) -> Vec<[u8; 6]>;
    /// Flush and rediscover (ArtTodControl AtcFlush)
    fn flush(&mut self, port_address: Universe);
}
