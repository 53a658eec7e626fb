//! Art-Net packet layouts
//!
//! Every Art-Net datagram starts with the 8-byte packet id `"Art-Net\0"`
//! followed by a little-endian u16 opcode. All other multi-byte fields are
//! big-endian unless the protocol says otherwise (the poll-reply UDP port
//! and the ESTA manufacturer code are little-endian).

use std::net::Ipv4Addr;

use lumen_core::{LumenError, LumenResult, Universe, DMX_UNIVERSE_SIZE};

use crate::{copy_padded, padded_str};

/// 8-byte packet id present in every Art-Net datagram
pub const ARTNET_PACKET_ID: [u8; 8] = *b"Art-Net\0";

/// Protocol revision carried after the opcode (not present in ArtPollReply)
pub const PROTOCOL_REVISION: u16 = 14;

pub const SHORT_NAME_LENGTH: usize = 18;
pub const LONG_NAME_LENGTH: usize = 64;
pub const REPORT_LENGTH: usize = 64;
pub const MAC_SIZE: usize = 6;

/// PortTypes bit: port can output DMX onto the wire
pub const PORT_TYPE_OUTPUT: u8 = 0x80;
/// PortTypes bit: port can input DMX from the wire
pub const PORT_TYPE_INPUT: u8 = 0x40;

/// GoodOutput bit: data is being merged from two sources
pub const GOOD_OUTPUT_MERGING: u8 = 0x08;
/// GoodOutput bit: DMX is being transmitted
pub const GOOD_OUTPUT_DATA_IS_BEING_TRANSMITTED: u8 = 0x80;
/// GoodOutput bit: merge mode is LTP
pub const GOOD_OUTPUT_MERGE_MODE_LTP: u8 = 0x02;

/// ArtPoll TalkToMe flag bits
pub mod talk_to_me {
    /// Send ArtPollReply whenever node conditions change
    pub const REPLY_ON_CHANGE: u8 = 0x02;
    /// Send diagnostics messages
    pub const SEND_DIAG: u8 = 0x04;
    /// Diagnostics are unicast (otherwise broadcast)
    pub const DIAG_UNICAST: u8 = 0x08;
}

/// ArtAddress command byte values (Table: Node configuration commands)
pub mod port_command {
    pub const NONE: u8 = 0x00;
    pub const CANCEL_MERGE: u8 = 0x01;
    pub const LED_NORMAL: u8 = 0x02;
    pub const LED_MUTE: u8 = 0x03;
    pub const LED_LOCATE: u8 = 0x04;
    pub const RESET_RX_FLAGS: u8 = 0x05;
    /// Base of the per-port "merge LTP" range (`MERGE_LTP + port`, 4 ports)
    pub const MERGE_LTP: u8 = 0x10;
    /// Base of the per-port "merge HTP" range
    pub const MERGE_HTP: u8 = 0x50;
    /// Base of the per-port "clear output" range
    pub const CLEAR_OP: u8 = 0x90;
}

/// Style code: a DMX <-> Art-Net device
pub const STYLE_NODE: u8 = 0x00;
/// Style code: a lighting console
pub const STYLE_CONTROLLER: u8 = 0x01;

/// Opcodes understood by this stack
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum OpCode {
    Poll = 0x2000,
    PollReply = 0x2100,
    Dmx = 0x5000,
    Sync = 0x5200,
    Address = 0x6000,
    TodRequest = 0x8000,
    TodData = 0x8100,
    TodControl = 0x8200,
    TimeCode = 0x9700,
    Trigger = 0x9900,
    IpProg = 0xF800,
    IpProgReply = 0xF900,
}

impl OpCode {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x2000 => Some(OpCode::Poll),
            0x2100 => Some(OpCode::PollReply),
            0x5000 => Some(OpCode::Dmx),
            0x5200 => Some(OpCode::Sync),
            0x6000 => Some(OpCode::Address),
            0x8000 => Some(OpCode::TodRequest),
            0x8100 => Some(OpCode::TodData),
            0x8200 => Some(OpCode::TodControl),
            0x9700 => Some(OpCode::TimeCode),
            0x9900 => Some(OpCode::Trigger),
            0xF800 => Some(OpCode::IpProg),
            0xF900 => Some(OpCode::IpProgReply),
            _ => None,
        }
    }
}

pub const ART_POLL_SIZE: usize = 14;
pub const ART_POLL_REPLY_SIZE: usize = 239;
pub const ART_DMX_HEADER_SIZE: usize = 18;
pub const ART_DMX_MAX_SIZE: usize = ART_DMX_HEADER_SIZE + DMX_UNIVERSE_SIZE;
pub const ART_SYNC_SIZE: usize = 14;
pub const ART_ADDRESS_SIZE: usize = 107;
pub const ART_TIME_CODE_SIZE: usize = 19;
pub const ART_TRIGGER_SIZE: usize = 530;
pub const ART_IP_PROG_SIZE: usize = 34;
pub const ART_IP_PROG_REPLY_SIZE: usize = 34;
pub const ART_TOD_REQUEST_SIZE: usize = 56;
pub const ART_TOD_CONTROL_SIZE: usize = 24;
pub const ART_TOD_DATA_HEADER_SIZE: usize = 28;
/// UIDs per ArtTodData block
pub const ART_TOD_DATA_MAX_UIDS: usize = 200;

fn ensure_len(buf: &[u8], expected: usize) -> LumenResult<()> {
    if buf.len() < expected {
        return Err(LumenError::BufferTooShort {
            expected,
            actual: buf.len(),
        });
    }
    Ok(())
}

fn check_id_opcode(buf: &[u8], opcode: OpCode) -> LumenResult<()> {
    ensure_len(buf, 10)?;
    if buf[..8] != ARTNET_PACKET_ID {
        return Err(LumenError::InvalidPacketId);
    }
    let value = u16::from_le_bytes([buf[8], buf[9]]);
    if value != opcode as u16 {
        return Err(LumenError::UnknownOpCode(value));
    }
    Ok(())
}

fn check_protocol(buf: &[u8]) -> LumenResult<()> {
    ensure_len(buf, 12)?;
    let revision = u16::from_be_bytes([buf[10], buf[11]]);
    if revision < PROTOCOL_REVISION {
        return Err(LumenError::UnsupportedProtocolRevision(revision));
    }
    Ok(())
}

fn write_header(buf: &mut [u8], opcode: OpCode) {
    buf[..8].copy_from_slice(&ARTNET_PACKET_ID);
    buf[8..10].copy_from_slice(&(opcode as u16).to_le_bytes());
    buf[10..12].copy_from_slice(&PROTOCOL_REVISION.to_be_bytes());
}

/// ArtPoll - controller discovery request
#[derive(Clone, Copy, Debug, Default)]
pub struct ArtPoll {
    /// TalkToMe behaviour flags, see [`talk_to_me`]
    pub talk_to_me: u8,
    /// Lowest diagnostics priority the controller wants to receive
    pub priority: u8,
}

impl ArtPoll {
    pub fn parse(buf: &[u8]) -> LumenResult<Self> {
        check_id_opcode(buf, OpCode::Poll)?;
        check_protocol(buf)?;
        ensure_len(buf, ART_POLL_SIZE)?;

        Ok(ArtPoll {
            talk_to_me: buf[12],
            priority: buf[13],
        })
    }

    pub fn serialize(&self, buf: &mut [u8]) -> LumenResult<usize> {
        ensure_len(buf, ART_POLL_SIZE)?;
        write_header(buf, OpCode::Poll);
        buf[12] = self.talk_to_me;
        buf[13] = self.priority;
        Ok(ART_POLL_SIZE)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; ART_POLL_SIZE];
        self.serialize(&mut buf).unwrap();
        buf
    }

    #[inline]
    pub fn reply_on_change(&self) -> bool {
        self.talk_to_me & talk_to_me::REPLY_ON_CHANGE != 0
    }

    #[inline]
    pub fn send_diag(&self) -> bool {
        self.talk_to_me & talk_to_me::SEND_DIAG != 0
    }

    #[inline]
    pub fn diag_unicast(&self) -> bool {
        self.talk_to_me & talk_to_me::DIAG_UNICAST != 0
    }
}

/// ArtPollReply - node discovery response (239 bytes, no protocol revision)
#[derive(Clone)]
pub struct ArtPollReply {
    pub ip: Ipv4Addr,
    /// Always 6454, little-endian on the wire
    pub port: u16,
    pub version_info: u16,
    pub net_switch: u8,
    pub sub_switch: u8,
    pub oem: u16,
    pub ubea_version: u8,
    pub status1: u8,
    /// Little-endian on the wire
    pub esta_manufacturer: u16,
    pub short_name: [u8; SHORT_NAME_LENGTH],
    pub long_name: [u8; LONG_NAME_LENGTH],
    pub node_report: [u8; REPORT_LENGTH],
    pub num_ports: u16,
    pub port_types: [u8; 4],
    pub good_input: [u8; 4],
    pub good_output: [u8; 4],
    pub sw_in: [u8; 4],
    pub sw_out: [u8; 4],
    pub style: u8,
    pub mac: [u8; MAC_SIZE],
    pub bind_ip: Ipv4Addr,
    pub bind_index: u8,
    pub status2: u8,
}

impl Default for ArtPollReply {
    fn default() -> Self {
        ArtPollReply {
            ip: Ipv4Addr::UNSPECIFIED,
            port: lumen_core::ARTNET_UDP_PORT,
            version_info: 0,
            net_switch: 0,
            sub_switch: 0,
            oem: 0,
            ubea_version: 0,
            status1: 0,
            esta_manufacturer: 0,
            short_name: [0; SHORT_NAME_LENGTH],
            long_name: [0; LONG_NAME_LENGTH],
            node_report: [0; REPORT_LENGTH],
            num_ports: 0,
            port_types: [0; 4],
            good_input: [0; 4],
            good_output: [0; 4],
            sw_in: [0; 4],
            sw_out: [0; 4],
            style: STYLE_NODE,
            mac: [0; MAC_SIZE],
            bind_ip: Ipv4Addr::UNSPECIFIED,
            bind_index: 0,
            status2: 0,
        }
    }
}

impl ArtPollReply {
    pub fn parse(buf: &[u8]) -> LumenResult<Self> {
        check_id_opcode(buf, OpCode::PollReply)?;
        ensure_len(buf, ART_POLL_REPLY_SIZE)?;

        let mut reply = ArtPollReply {
            // Bytes 10-13: node IP
            ip: Ipv4Addr::new(buf[10], buf[11], buf[12], buf[13]),
            // Bytes 14-15: UDP port (LE)
            port: u16::from_le_bytes([buf[14], buf[15]]),
            // Bytes 16-17: firmware version
            version_info: u16::from_be_bytes([buf[16], buf[17]]),
            // Bytes 18-19: address switches
            net_switch: buf[18],
            sub_switch: buf[19],
            // Bytes 20-21: OEM code
            oem: u16::from_be_bytes([buf[20], buf[21]]),
            ubea_version: buf[22],
            status1: buf[23],
            // Bytes 24-25: ESTA manufacturer (LE)
            esta_manufacturer: u16::from_le_bytes([buf[24], buf[25]]),
            ..Default::default()
        };

        // Bytes 26-171: names and report
        reply.short_name.copy_from_slice(&buf[26..44]);
        reply.long_name.copy_from_slice(&buf[44..108]);
        reply.node_report.copy_from_slice(&buf[108..172]);

        // Bytes 172-173: active port count
        reply.num_ports = u16::from_be_bytes([buf[172], buf[173]]);
        reply.port_types.copy_from_slice(&buf[174..178]);
        reply.good_input.copy_from_slice(&buf[178..182]);
        reply.good_output.copy_from_slice(&buf[182..186]);
        reply.sw_in.copy_from_slice(&buf[186..190]);
        reply.sw_out.copy_from_slice(&buf[190..194]);

        // Bytes 194-196 (SwVideo/SwMacro/SwRemote) and 197-199 (spare) are
        // deprecated, skipped on decode
        reply.style = buf[200];
        reply.mac.copy_from_slice(&buf[201..207]);
        reply.bind_ip = Ipv4Addr::new(buf[207], buf[208], buf[209], buf[210]);
        reply.bind_index = buf[211];
        reply.status2 = buf[212];
        // Bytes 213-238: filler

        Ok(reply)
    }

    pub fn serialize(&self, buf: &mut [u8]) -> LumenResult<usize> {
        ensure_len(buf, ART_POLL_REPLY_SIZE)?;
        buf[..ART_POLL_REPLY_SIZE].fill(0);

        buf[..8].copy_from_slice(&ARTNET_PACKET_ID);
        buf[8..10].copy_from_slice(&(OpCode::PollReply as u16).to_le_bytes());
        buf[10..14].copy_from_slice(&self.ip.octets());
        buf[14..16].copy_from_slice(&self.port.to_le_bytes());
        buf[16..18].copy_from_slice(&self.version_info.to_be_bytes());
        buf[18] = self.net_switch;
        buf[19] = self.sub_switch;
        buf[20..22].copy_from_slice(&self.oem.to_be_bytes());
        buf[22] = self.ubea_version;
        buf[23] = self.status1;
        buf[24..26].copy_from_slice(&self.esta_manufacturer.to_le_bytes());
        buf[26..44].copy_from_slice(&self.short_name);
        buf[44..108].copy_from_slice(&self.long_name);
        buf[108..172].copy_from_slice(&self.node_report);
        buf[172..174].copy_from_slice(&self.num_ports.to_be_bytes());
        buf[174..178].copy_from_slice(&self.port_types);
        buf[178..182].copy_from_slice(&self.good_input);
        buf[182..186].copy_from_slice(&self.good_output);
        buf[186..190].copy_from_slice(&self.sw_in);
        buf[190..194].copy_from_slice(&self.sw_out);
        buf[200] = self.style;
        buf[201..207].copy_from_slice(&self.mac);
        buf[207..211].copy_from_slice(&self.bind_ip.octets());
        buf[211] = self.bind_index;
        buf[212] = self.status2;

        Ok(ART_POLL_REPLY_SIZE)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; ART_POLL_REPLY_SIZE];
        self.serialize(&mut buf).unwrap();
        buf
    }

    pub fn set_short_name(&mut self, name: &str) {
        copy_padded(&mut self.short_name, name);
    }

    pub fn set_long_name(&mut self, name: &str) {
        copy_padded(&mut self.long_name, name);
    }

    pub fn short_name_str(&self) -> String {
        padded_str(&self.short_name)
    }

    pub fn long_name_str(&self) -> String {
        padded_str(&self.long_name)
    }
}

impl std::fmt::Debug for ArtPollReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtPollReply")
            .field("ip", &self.ip)
            .field("short_name", &self.short_name_str())
            .field("num_ports", &self.num_ports)
            .field("sw_out", &self.sw_out)
            .field("bind_index", &self.bind_index)
            .finish_non_exhaustive()
    }
}

/// ArtDmx - one universe of level data
#[derive(Clone, Debug, Default)]
pub struct ArtDmx {
    pub sequence: u8,
    pub physical: u8,
    /// 15-bit Port-Address, little-endian on the wire (SubUni low, Net high)
    pub port_address: Universe,
    pub data: Vec<u8>,
}

impl ArtDmx {
    pub fn parse(buf: &[u8]) -> LumenResult<Self> {
        check_id_opcode(buf, OpCode::Dmx)?;
        check_protocol(buf)?;
        ensure_len(buf, ART_DMX_HEADER_SIZE)?;

        let length = u16::from_be_bytes([buf[16], buf[17]]) as usize;
        if length == 0 || length > DMX_UNIVERSE_SIZE {
            return Err(LumenError::InvalidDmxLength(length));
        }
        ensure_len(buf, ART_DMX_HEADER_SIZE + length)?;

        Ok(ArtDmx {
            sequence: buf[12],
            physical: buf[13],
            port_address: Universe(u16::from_le_bytes([buf[14], buf[15]])),
            data: buf[ART_DMX_HEADER_SIZE..ART_DMX_HEADER_SIZE + length].to_vec(),
        })
    }

    pub fn serialize(&self, buf: &mut [u8]) -> LumenResult<usize> {
        let length = self.data.len();
        if length == 0 || length > DMX_UNIVERSE_SIZE {
            return Err(LumenError::InvalidDmxLength(length));
        }
        let total = ART_DMX_HEADER_SIZE + length;
        ensure_len(buf, total)?;

        write_header(buf, OpCode::Dmx);
        buf[12] = self.sequence;
        buf[13] = self.physical;
        buf[14..16].copy_from_slice(&self.port_address.0.to_le_bytes());
        buf[16..18].copy_from_slice(&(length as u16).to_be_bytes());
        buf[ART_DMX_HEADER_SIZE..total].copy_from_slice(&self.data);

        Ok(total)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; ART_DMX_HEADER_SIZE + self.data.len()];
        self.serialize(&mut buf).unwrap();
        buf
    }
}

/// ArtSync - flush signal for synchronous mode
#[derive(Clone, Copy, Debug, Default)]
pub struct ArtSync {
    pub aux1: u8,
    pub aux2: u8,
}

impl ArtSync {
    pub fn parse(buf: &[u8]) -> LumenResult<Self> {
        check_id_opcode(buf, OpCode::Sync)?;
        check_protocol(buf)?;
        ensure_len(buf, ART_SYNC_SIZE)?;

        Ok(ArtSync {
            aux1: buf[12],
            aux2: buf[13],
        })
    }

    pub fn serialize(&self, buf: &mut [u8]) -> LumenResult<usize> {
        ensure_len(buf, ART_SYNC_SIZE)?;
        write_header(buf, OpCode::Sync);
        buf[12] = self.aux1;
        buf[13] = self.aux2;
        Ok(ART_SYNC_SIZE)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; ART_SYNC_SIZE];
        self.serialize(&mut buf).unwrap();
        buf
    }
}

/// ArtAddress - remote programming of switches, names and merge modes
#[derive(Clone)]
pub struct ArtAddress {
    /// Bit 7 set = program bottom 7 bits; 0x00 = no change
    pub net_switch: u8,
    pub bind_index: u8,
    /// First byte 0 = no change
    pub short_name: [u8; SHORT_NAME_LENGTH],
    pub long_name: [u8; LONG_NAME_LENGTH],
    pub sw_in: [u8; 4],
    pub sw_out: [u8; 4],
    pub sub_switch: u8,
    /// See [`port_command`]
    pub command: u8,
}

impl Default for ArtAddress {
    fn default() -> Self {
        ArtAddress {
            net_switch: 0,
            bind_index: 0,
            short_name: [0; SHORT_NAME_LENGTH],
            long_name: [0; LONG_NAME_LENGTH],
            sw_in: [0; 4],
            sw_out: [0; 4],
            sub_switch: 0,
            command: port_command::NONE,
        }
    }
}

impl ArtAddress {
    pub fn parse(buf: &[u8]) -> LumenResult<Self> {
        check_id_opcode(buf, OpCode::Address)?;
        check_protocol(buf)?;
        ensure_len(buf, ART_ADDRESS_SIZE)?;

        let mut address = ArtAddress {
            net_switch: buf[12],
            bind_index: buf[13],
            ..Default::default()
        };
        address.short_name.copy_from_slice(&buf[14..32]);
        address.long_name.copy_from_slice(&buf[32..96]);
        address.sw_in.copy_from_slice(&buf[96..100]);
        address.sw_out.copy_from_slice(&buf[100..104]);
        address.sub_switch = buf[104];
        // Byte 105: SwVideo, deprecated
        address.command = buf[106];

        Ok(address)
    }

    pub fn serialize(&self, buf: &mut [u8]) -> LumenResult<usize> {
        ensure_len(buf, ART_ADDRESS_SIZE)?;
        buf[..ART_ADDRESS_SIZE].fill(0);

        write_header(buf, OpCode::Address);
        buf[12] = self.net_switch;
        buf[13] = self.bind_index;
        buf[14..32].copy_from_slice(&self.short_name);
        buf[32..96].copy_from_slice(&self.long_name);
        buf[96..100].copy_from_slice(&self.sw_in);
        buf[100..104].copy_from_slice(&self.sw_out);
        buf[104] = self.sub_switch;
        buf[106] = self.command;

        Ok(ART_ADDRESS_SIZE)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; ART_ADDRESS_SIZE];
        self.serialize(&mut buf).unwrap();
        buf
    }
}

impl std::fmt::Debug for ArtAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtAddress")
            .field("net_switch", &self.net_switch)
            .field("sub_switch", &self.sub_switch)
            .field("sw_out", &self.sw_out)
            .field("command", &self.command)
            .finish_non_exhaustive()
    }
}

/// SMPTE timecode types carried by ArtTimeCode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum TimeCodeType {
    /// 24 fps
    Film = 0,
    /// 25 fps
    Ebu = 1,
    /// 29.97 fps
    DropFrame = 2,
    /// 30 fps
    Smpte = 3,
}

impl TimeCodeType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(TimeCodeType::Film),
            1 => Some(TimeCodeType::Ebu),
            2 => Some(TimeCodeType::DropFrame),
            3 => Some(TimeCodeType::Smpte),
            _ => None,
        }
    }
}

/// ArtTimeCode - timecode distribution
#[derive(Clone, Copy, Debug)]
pub struct ArtTimeCode {
    pub frames: u8,
    pub seconds: u8,
    pub minutes: u8,
    pub hours: u8,
    pub tc_type: TimeCodeType,
}

impl ArtTimeCode {
    pub fn parse(buf: &[u8]) -> LumenResult<Self> {
        check_id_opcode(buf, OpCode::TimeCode)?;
        check_protocol(buf)?;
        ensure_len(buf, ART_TIME_CODE_SIZE)?;

        let tc_type = TimeCodeType::from_u8(buf[18])
            .ok_or(LumenError::InvalidWireField("timecode type"))?;
        if buf[14] > 29 || buf[15] > 59 || buf[16] > 59 || buf[17] > 23 {
            return Err(LumenError::InvalidWireField("timecode range"));
        }

        Ok(ArtTimeCode {
            frames: buf[14],
            seconds: buf[15],
            minutes: buf[16],
            hours: buf[17],
            tc_type,
        })
    }

    pub fn serialize(&self, buf: &mut [u8]) -> LumenResult<usize> {
        ensure_len(buf, ART_TIME_CODE_SIZE)?;
        write_header(buf, OpCode::TimeCode);
        buf[12] = 0;
        buf[13] = 0;
        buf[14] = self.frames;
        buf[15] = self.seconds;
        buf[16] = self.minutes;
        buf[17] = self.hours;
        buf[18] = self.tc_type as u8;
        Ok(ART_TIME_CODE_SIZE)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; ART_TIME_CODE_SIZE];
        self.serialize(&mut buf).unwrap();
        buf
    }
}

/// ArtTrigger - show-control macro trigger
#[derive(Clone)]
pub struct ArtTrigger {
    pub oem: u16,
    pub key: u8,
    pub sub_key: u8,
    pub data: [u8; 512],
}

impl Default for ArtTrigger {
    fn default() -> Self {
        ArtTrigger {
            oem: 0xFFFF,
            key: 0,
            sub_key: 0,
            data: [0; 512],
        }
    }
}

impl ArtTrigger {
    /// OEM value addressing every device
    pub const OEM_BROADCAST: u16 = 0xFFFF;

    pub fn parse(buf: &[u8]) -> LumenResult<Self> {
        check_id_opcode(buf, OpCode::Trigger)?;
        check_protocol(buf)?;
        ensure_len(buf, ART_TRIGGER_SIZE)?;

        let mut trigger = ArtTrigger {
            oem: u16::from_be_bytes([buf[14], buf[15]]),
            key: buf[16],
            sub_key: buf[17],
            ..Default::default()
        };
        trigger.data.copy_from_slice(&buf[18..530]);

        Ok(trigger)
    }

    pub fn serialize(&self, buf: &mut [u8]) -> LumenResult<usize> {
        ensure_len(buf, ART_TRIGGER_SIZE)?;
        write_header(buf, OpCode::Trigger);
        buf[12] = 0;
        buf[13] = 0;
        buf[14..16].copy_from_slice(&self.oem.to_be_bytes());
        buf[16] = self.key;
        buf[17] = self.sub_key;
        buf[18..530].copy_from_slice(&self.data);
        Ok(ART_TRIGGER_SIZE)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; ART_TRIGGER_SIZE];
        self.serialize(&mut buf).unwrap();
        buf
    }
}

impl std::fmt::Debug for ArtTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtTrigger")
            .field("oem", &format_args!("{:#06x}", self.oem))
            .field("key", &self.key)
            .field("sub_key", &self.sub_key)
            .finish_non_exhaustive()
    }
}

/// ArtIpProg command bits
pub mod ip_prog_command {
    /// Enable any programming at all
    pub const ENABLE: u8 = 0x80;
    /// Enable DHCP
    pub const DHCP: u8 = 0x40;
    /// Return all parameters to default
    pub const DEFAULT: u8 = 0x08;
    pub const PROGRAM_IP: u8 = 0x04;
    pub const PROGRAM_SUBNET: u8 = 0x02;
    pub const PROGRAM_PORT: u8 = 0x01;
}

/// ArtIpProg - remote IP configuration request
#[derive(Clone, Copy, Debug)]
pub struct ArtIpProg {
    pub command: u8,
    pub prog_ip: Ipv4Addr,
    pub prog_subnet: Ipv4Addr,
    pub prog_port: u16,
}

impl Default for ArtIpProg {
    fn default() -> Self {
        ArtIpProg {
            command: 0,
            prog_ip: Ipv4Addr::UNSPECIFIED,
            prog_subnet: Ipv4Addr::UNSPECIFIED,
            prog_port: 0,
        }
    }
}

impl ArtIpProg {
    pub fn parse(buf: &[u8]) -> LumenResult<Self> {
        check_id_opcode(buf, OpCode::IpProg)?;
        check_protocol(buf)?;
        ensure_len(buf, ART_IP_PROG_SIZE)?;

        Ok(ArtIpProg {
            command: buf[14],
            prog_ip: Ipv4Addr::new(buf[16], buf[17], buf[18], buf[19]),
            prog_subnet: Ipv4Addr::new(buf[20], buf[21], buf[22], buf[23]),
            prog_port: u16::from_be_bytes([buf[24], buf[25]]),
        })
    }

    pub fn serialize(&self, buf: &mut [u8]) -> LumenResult<usize> {
        ensure_len(buf, ART_IP_PROG_SIZE)?;
        buf[..ART_IP_PROG_SIZE].fill(0);
        write_header(buf, OpCode::IpProg);
        buf[14] = self.command;
        buf[16..20].copy_from_slice(&self.prog_ip.octets());
        buf[20..24].copy_from_slice(&self.prog_subnet.octets());
        buf[24..26].copy_from_slice(&self.prog_port.to_be_bytes());
        Ok(ART_IP_PROG_SIZE)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; ART_IP_PROG_SIZE];
        self.serialize(&mut buf).unwrap();
        buf
    }
}

/// ArtIpProgReply status bit: DHCP is enabled
pub const IP_PROG_REPLY_DHCP_ENABLED: u8 = 0x40;

/// ArtIpProgReply - node's current IP configuration
#[derive(Clone, Copy, Debug)]
pub struct ArtIpProgReply {
    pub prog_ip: Ipv4Addr,
    pub prog_subnet: Ipv4Addr,
    pub prog_port: u16,
    pub status: u8,
}

impl Default for ArtIpProgReply {
    fn default() -> Self {
        ArtIpProgReply {
            prog_ip: Ipv4Addr::UNSPECIFIED,
            prog_subnet: Ipv4Addr::UNSPECIFIED,
            prog_port: 0,
            status: 0,
        }
    }
}

impl ArtIpProgReply {
    pub fn parse(buf: &[u8]) -> LumenResult<Self> {
        check_id_opcode(buf, OpCode::IpProgReply)?;
        check_protocol(buf)?;
        ensure_len(buf, ART_IP_PROG_REPLY_SIZE)?;

        Ok(ArtIpProgReply {
            prog_ip: Ipv4Addr::new(buf[16], buf[17], buf[18], buf[19]),
            prog_subnet: Ipv4Addr::new(buf[20], buf[21], buf[22], buf[23]),
            prog_port: u16::from_be_bytes([buf[24], buf[25]]),
            status: buf[26],
        })
    }

    pub fn serialize(&self, buf: &mut [u8]) -> LumenResult<usize> {
        ensure_len(buf, ART_IP_PROG_REPLY_SIZE)?;
        buf[..ART_IP_PROG_REPLY_SIZE].fill(0);
        write_header(buf, OpCode::IpProgReply);
        buf[16..20].copy_from_slice(&self.prog_ip.octets());
        buf[20..24].copy_from_slice(&self.prog_subnet.octets());
        buf[24..26].copy_from_slice(&self.prog_port.to_be_bytes());
        buf[26] = self.status;
        Ok(ART_IP_PROG_REPLY_SIZE)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; ART_IP_PROG_REPLY_SIZE];
        self.serialize(&mut buf).unwrap();
        buf
    }
}

/// ArtTodRequest - ask output gateways for their RDM table of devices
#[derive(Clone, Debug, Default)]
pub struct ArtTodRequest {
    pub net: u8,
    pub command: u8,
    /// Low bytes of the Port-Addresses being queried (up to 32)
    pub addresses: Vec<u8>,
}

impl ArtTodRequest {
    pub fn parse(buf: &[u8]) -> LumenResult<Self> {
        check_id_opcode(buf, OpCode::TodRequest)?;
        check_protocol(buf)?;
        ensure_len(buf, ART_TOD_REQUEST_SIZE)?;

        let count = (buf[23] as usize).min(32);
        Ok(ArtTodRequest {
            net: buf[21],
            command: buf[22],
            addresses: buf[24..24 + count].to_vec(),
        })
    }

    pub fn serialize(&self, buf: &mut [u8]) -> LumenResult<usize> {
        if self.addresses.len() > 32 {
            return Err(LumenError::InvalidWireField("tod request address count"));
        }
        ensure_len(buf, ART_TOD_REQUEST_SIZE)?;
        buf[..ART_TOD_REQUEST_SIZE].fill(0);
        write_header(buf, OpCode::TodRequest);
        buf[21] = self.net;
        buf[22] = self.command;
        buf[23] = self.addresses.len() as u8;
        buf[24..24 + self.addresses.len()].copy_from_slice(&self.addresses);
        Ok(ART_TOD_REQUEST_SIZE)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; ART_TOD_REQUEST_SIZE];
        self.serialize(&mut buf).unwrap();
        buf
    }
}

/// ArtTodControl command: flush the TOD and rediscover
pub const TOD_CONTROL_FLUSH: u8 = 0x01;

/// ArtTodControl - RDM discovery control
#[derive(Clone, Copy, Debug, Default)]
pub struct ArtTodControl {
    pub net: u8,
    pub command: u8,
    /// Low byte of the Port-Address
    pub address: u8,
}

impl ArtTodControl {
    pub fn parse(buf: &[u8]) -> LumenResult<Self> {
        check_id_opcode(buf, OpCode::TodControl)?;
        check_protocol(buf)?;
        ensure_len(buf, ART_TOD_CONTROL_SIZE)?;

        Ok(ArtTodControl {
            net: buf[21],
            command: buf[22],
            address: buf[23],
        })
    }

    pub fn serialize(&self, buf: &mut [u8]) -> LumenResult<usize> {
        ensure_len(buf, ART_TOD_CONTROL_SIZE)?;
        buf[..ART_TOD_CONTROL_SIZE].fill(0);
        write_header(buf, OpCode::TodControl);
        buf[21] = self.net;
        buf[22] = self.command;
        buf[23] = self.address;
        Ok(ART_TOD_CONTROL_SIZE)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; ART_TOD_CONTROL_SIZE];
        self.serialize(&mut buf).unwrap();
        buf
    }
}

/// ArtTodData - RDM table of devices
#[derive(Clone, Debug, Default)]
pub struct ArtTodData {
    pub rdm_version: u8,
    pub port: u8,
    pub bind_index: u8,
    pub net: u8,
    pub command_response: u8,
    /// Low byte of the Port-Address
    pub address: u8,
    pub uid_total: u16,
    pub block_count: u8,
    pub uids: Vec<[u8; 6]>,
}

impl ArtTodData {
    pub fn parse(buf: &[u8]) -> LumenResult<Self> {
        check_id_opcode(buf, OpCode::TodData)?;
        check_protocol(buf)?;
        ensure_len(buf, ART_TOD_DATA_HEADER_SIZE)?;

        let count = buf[27] as usize;
        ensure_len(buf, ART_TOD_DATA_HEADER_SIZE + count * 6)?;

        let mut uids = Vec::with_capacity(count);
        for chunk in buf[ART_TOD_DATA_HEADER_SIZE..ART_TOD_DATA_HEADER_SIZE + count * 6].chunks_exact(6) {
            let mut uid = [0u8; 6];
            uid.copy_from_slice(chunk);
            uids.push(uid);
        }

        Ok(ArtTodData {
            rdm_version: buf[12],
            port: buf[13],
            bind_index: buf[20],
            net: buf[21],
            command_response: buf[22],
            address: buf[23],
            uid_total: u16::from_be_bytes([buf[24], buf[25]]),
            block_count: buf[26],
            uids,
        })
    }

    pub fn serialize(&self, buf: &mut [u8]) -> LumenResult<usize> {
        if self.uids.len() > ART_TOD_DATA_MAX_UIDS {
            return Err(LumenError::InvalidWireField("tod data uid count"));
        }
        let total = ART_TOD_DATA_HEADER_SIZE + self.uids.len() * 6;
        ensure_len(buf, total)?;
        buf[..total].fill(0);

        write_header(buf, OpCode::TodData);
        buf[12] = self.rdm_version;
        buf[13] = self.port;
        buf[20] = self.bind_index;
        buf[21] = self.net;
        buf[22] = self.command_response;
        buf[23] = self.address;
        buf[24..26].copy_from_slice(&self.uid_total.to_be_bytes());
        buf[26] = self.block_count;
        buf[27] = self.uids.len() as u8;
        for (i, uid) in self.uids.iter().enumerate() {
            let offset = ART_TOD_DATA_HEADER_SIZE + i * 6;
            buf[offset..offset + 6].copy_from_slice(uid);
        }

        Ok(total)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; ART_TOD_DATA_HEADER_SIZE + self.uids.len() * 6];
        self.serialize(&mut buf).unwrap();
        buf
    }
}

/// A parsed Art-Net datagram
#[derive(Clone, Debug)]
pub enum ArtPacket {
    Poll(ArtPoll),
    PollReply(Box<ArtPollReply>),
    Dmx(ArtDmx),
    Sync(ArtSync),
    Address(Box<ArtAddress>),
    TimeCode(ArtTimeCode),
    Trigger(Box<ArtTrigger>),
    IpProg(ArtIpProg),
    IpProgReply(ArtIpProgReply),
    TodRequest(ArtTodRequest),
    TodData(ArtTodData),
    TodControl(ArtTodControl),
}

impl ArtPacket {
    /// Parse any known Art-Net datagram, dispatching on the opcode.
    /// The packet id is validated before the opcode is read; an unknown
    /// opcode is an error, not a panic.
    pub fn parse(buf: &[u8]) -> LumenResult<Self> {
        ensure_len(buf, 10)?;
        if buf[..8] != ARTNET_PACKET_ID {
            return Err(LumenError::InvalidPacketId);
        }
        let value = u16::from_le_bytes([buf[8], buf[9]]);
        let opcode = OpCode::from_u16(value).ok_or(LumenError::UnknownOpCode(value))?;

        match opcode {
            OpCode::Poll => Ok(ArtPacket::Poll(ArtPoll::parse(buf)?)),
            OpCode::PollReply => Ok(ArtPacket::PollReply(Box::new(ArtPollReply::parse(buf)?))),
            OpCode::Dmx => Ok(ArtPacket::Dmx(ArtDmx::parse(buf)?)),
            OpCode::Sync => Ok(ArtPacket::Sync(ArtSync::parse(buf)?)),
            OpCode::Address => Ok(ArtPacket::Address(Box::new(ArtAddress::parse(buf)?))),
            OpCode::TimeCode => Ok(ArtPacket::TimeCode(ArtTimeCode::parse(buf)?)),
            OpCode::Trigger => Ok(ArtPacket::Trigger(Box::new(ArtTrigger::parse(buf)?))),
            OpCode::IpProg => Ok(ArtPacket::IpProg(ArtIpProg::parse(buf)?)),
            OpCode::IpProgReply => Ok(ArtPacket::IpProgReply(ArtIpProgReply::parse(buf)?)),
            OpCode::TodRequest => Ok(ArtPacket::TodRequest(ArtTodRequest::parse(buf)?)),
            OpCode::TodData => Ok(ArtPacket::TodData(ArtTodData::parse(buf)?)),
            OpCode::TodControl => Ok(ArtPacket::TodControl(ArtTodControl::parse(buf)?)),
        }
    }

    pub fn opcode(&self) -> OpCode {
        match self {
            ArtPacket::Poll(_) => OpCode::Poll,
            ArtPacket::PollReply(_) => OpCode::PollReply,
            ArtPacket::Dmx(_) => OpCode::Dmx,
            ArtPacket::Sync(_) => OpCode::Sync,
            ArtPacket::Address(_) => OpCode::Address,
            ArtPacket::TimeCode(_) => OpCode::TimeCode,
            ArtPacket::Trigger(_) => OpCode::Trigger,
            ArtPacket::IpProg(_) => OpCode::IpProg,
            ArtPacket::IpProgReply(_) => OpCode::IpProgReply,
            ArtPacket::TodRequest(_) => OpCode::TodRequest,
            ArtPacket::TodData(_) => OpCode::TodData,
            ArtPacket::TodControl(_) => OpCode::TodControl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_poll_roundtrip() {
        let poll = ArtPoll {
            talk_to_me: talk_to_me::REPLY_ON_CHANGE | talk_to_me::SEND_DIAG,
            priority: 0x10,
        };

        let bytes = poll.to_bytes();
        assert_eq!(bytes.len(), ART_POLL_SIZE);
        assert_eq!(&bytes[..8], b"Art-Net\0");
        // Opcode 0x2000 little-endian
        assert_eq!(bytes[8], 0x00);
        assert_eq!(bytes[9], 0x20);
        // Protocol revision big-endian
        assert_eq!(bytes[10], 0);
        assert_eq!(bytes[11], 14);

        let parsed = ArtPoll::parse(&bytes).unwrap();
        assert!(parsed.reply_on_change());
        assert!(parsed.send_diag());
        assert!(!parsed.diag_unicast());
        assert_eq!(parsed.priority, 0x10);
    }

    #[test]
    fn test_dmx_roundtrip() {
        let dmx = ArtDmx {
            sequence: 7,
            physical: 1,
            port_address: Universe::new(3),
            data: (1..=10).collect(),
        };

        let bytes = dmx.to_bytes();
        assert_eq!(bytes.len(), ART_DMX_HEADER_SIZE + 10);
        // Length is big-endian
        assert_eq!(bytes[16], 0);
        assert_eq!(bytes[17], 10);
        // Port-Address is little-endian
        assert_eq!(bytes[14], 3);
        assert_eq!(bytes[15], 0);

        let parsed = ArtDmx::parse(&bytes).unwrap();
        assert_eq!(parsed.port_address, Universe::new(3));
        assert_eq!(parsed.data, (1..=10).collect::<Vec<u8>>());
        assert_eq!(parsed.sequence, 7);
    }

    #[test]
    fn test_dmx_rejects_bad_length() {
        let dmx = ArtDmx {
            data: vec![0; 600],
            ..Default::default()
        };
        assert!(matches!(
            dmx.serialize(&mut [0u8; 1024]),
            Err(LumenError::InvalidDmxLength(600))
        ));

        // A claimed length beyond the datagram is rejected
        let mut bytes = ArtDmx {
            data: vec![1, 2, 3, 4],
            ..Default::default()
        }
        .to_bytes();
        bytes[17] = 200;
        assert!(matches!(
            ArtDmx::parse(&bytes),
            Err(LumenError::BufferTooShort { .. })
        ));
    }

    #[test]
    fn test_poll_reply_roundtrip() {
        let mut reply = ArtPollReply {
            ip: Ipv4Addr::new(192, 168, 1, 20),
            version_info: 0x0102,
            net_switch: 1,
            sub_switch: 2,
            oem: 0x2828,
            num_ports: 2,
            port_types: [PORT_TYPE_OUTPUT, PORT_TYPE_OUTPUT, 0, 0],
            sw_out: [0, 1, 0, 0],
            mac: [0x02, 0x00, 0x00, 0xAA, 0xBB, 0xCC],
            bind_index: 1,
            ..Default::default()
        };
        reply.set_short_name("lumen node");
        reply.set_long_name("lumen dmx ethernet node");

        let bytes = reply.to_bytes();
        assert_eq!(bytes.len(), ART_POLL_REPLY_SIZE);
        // Port 6454 little-endian
        assert_eq!(bytes[14], 0x36);
        assert_eq!(bytes[15], 0x19);

        let parsed = ArtPollReply::parse(&bytes).unwrap();
        assert_eq!(parsed.ip, reply.ip);
        assert_eq!(parsed.short_name_str(), "lumen node");
        assert_eq!(parsed.long_name_str(), "lumen dmx ethernet node");
        assert_eq!(parsed.num_ports, 2);
        assert_eq!(parsed.sw_out, [0, 1, 0, 0]);
        assert_eq!(parsed.mac, reply.mac);
        assert_eq!(parsed.bind_index, 1);
    }

    #[test]
    fn test_address_roundtrip() {
        let mut address = ArtAddress {
            net_switch: 0x80 | 5,
            sub_switch: 0x80 | 3,
            sw_out: [0x80, 0x81, 0, 0],
            command: port_command::MERGE_LTP + 1,
            ..Default::default()
        };
        copy_padded(&mut address.short_name, "renamed");

        let bytes = address.to_bytes();
        assert_eq!(bytes.len(), ART_ADDRESS_SIZE);

        let parsed = ArtAddress::parse(&bytes).unwrap();
        assert_eq!(parsed.net_switch, 0x85);
        assert_eq!(parsed.sub_switch, 0x83);
        assert_eq!(parsed.sw_out, [0x80, 0x81, 0, 0]);
        assert_eq!(parsed.command, 0x11);
        assert_eq!(padded_str(&parsed.short_name), "renamed");
    }

    #[test]
    fn test_time_code_roundtrip() {
        let tc = ArtTimeCode {
            frames: 24,
            seconds: 59,
            minutes: 59,
            hours: 23,
            tc_type: TimeCodeType::Ebu,
        };

        let bytes = tc.to_bytes();
        let parsed = ArtTimeCode::parse(&bytes).unwrap();
        assert_eq!(parsed.frames, 24);
        assert_eq!(parsed.hours, 23);
        assert_eq!(parsed.tc_type, TimeCodeType::Ebu);
    }

    #[test]
    fn test_time_code_rejects_out_of_range() {
        let tc = ArtTimeCode {
            frames: 10,
            seconds: 0,
            minutes: 0,
            hours: 0,
            tc_type: TimeCodeType::Smpte,
        };
        let mut bytes = tc.to_bytes();
        bytes[17] = 25; // hours
        assert!(ArtTimeCode::parse(&bytes).is_err());
        bytes[17] = 0;
        bytes[18] = 9; // type
        assert!(ArtTimeCode::parse(&bytes).is_err());
    }

    #[test]
    fn test_trigger_roundtrip() {
        let mut trigger = ArtTrigger {
            oem: 0x1234,
            key: 2,
            sub_key: 9,
            ..Default::default()
        };
        trigger.data[0] = 0xAB;
        trigger.data[511] = 0xCD;

        let bytes = trigger.to_bytes();
        assert_eq!(bytes.len(), ART_TRIGGER_SIZE);
        // OEM is big-endian
        assert_eq!(bytes[14], 0x12);
        assert_eq!(bytes[15], 0x34);

        let parsed = ArtTrigger::parse(&bytes).unwrap();
        assert_eq!(parsed.oem, 0x1234);
        assert_eq!(parsed.data[0], 0xAB);
        assert_eq!(parsed.data[511], 0xCD);
    }

    #[test]
    fn test_ip_prog_roundtrip() {
        let prog = ArtIpProg {
            command: ip_prog_command::ENABLE | ip_prog_command::PROGRAM_IP,
            prog_ip: Ipv4Addr::new(10, 0, 0, 99),
            prog_subnet: Ipv4Addr::new(255, 0, 0, 0),
            prog_port: 6454,
        };
        let parsed = ArtIpProg::parse(&prog.to_bytes()).unwrap();
        assert_eq!(parsed.command, prog.command);
        assert_eq!(parsed.prog_ip, prog.prog_ip);
        assert_eq!(parsed.prog_subnet, prog.prog_subnet);
        assert_eq!(parsed.prog_port, 6454);

        let reply = ArtIpProgReply {
            prog_ip: Ipv4Addr::new(10, 0, 0, 99),
            prog_subnet: Ipv4Addr::new(255, 0, 0, 0),
            prog_port: 6454,
            status: IP_PROG_REPLY_DHCP_ENABLED,
        };
        let parsed = ArtIpProgReply::parse(&reply.to_bytes()).unwrap();
        assert_eq!(parsed.status, IP_PROG_REPLY_DHCP_ENABLED);
        assert_eq!(parsed.prog_ip, reply.prog_ip);
    }

    #[test]
    fn test_tod_data_roundtrip() {
        let tod = ArtTodData {
            rdm_version: 1,
            port: 1,
            bind_index: 1,
            net: 0,
            command_response: 0,
            address: 3,
            uid_total: 2,
            block_count: 0,
            uids: vec![[0x41, 0x4C, 1, 2, 3, 4], [0x41, 0x4C, 5, 6, 7, 8]],
        };

        let bytes = tod.to_bytes();
        assert_eq!(bytes.len(), ART_TOD_DATA_HEADER_SIZE + 12);

        let parsed = ArtTodData::parse(&bytes).unwrap();
        assert_eq!(parsed.uid_total, 2);
        assert_eq!(parsed.uids.len(), 2);
        assert_eq!(parsed.uids[1], [0x41, 0x4C, 5, 6, 7, 8]);
    }

    #[test]
    fn test_packet_dispatch() {
        let dmx = ArtDmx {
            data: vec![1, 2, 3],
            ..Default::default()
        };
        match ArtPacket::parse(&dmx.to_bytes()).unwrap() {
            ArtPacket::Dmx(d) => assert_eq!(d.data, vec![1, 2, 3]),
            other => panic!("wrong packet: {:?}", other.opcode()),
        }

        let sync = ArtSync::default();
        assert!(matches!(
            ArtPacket::parse(&sync.to_bytes()).unwrap(),
            ArtPacket::Sync(_)
        ));
    }

    #[test]
    fn test_rejects_bad_id() {
        let mut bytes = ArtSync::default().to_bytes();
        bytes[0] = b'X';
        assert!(matches!(
            ArtPacket::parse(&bytes),
            Err(LumenError::InvalidPacketId)
        ));
    }

    #[test]
    fn test_rejects_unknown_opcode() {
        let mut bytes = ArtSync::default().to_bytes();
        bytes[8] = 0x00;
        bytes[9] = 0x42;
        assert!(matches!(
            ArtPacket::parse(&bytes),
            Err(LumenError::UnknownOpCode(0x4200))
        ));
    }

    #[test]
    fn test_rejects_old_protocol() {
        let mut bytes = ArtSync::default().to_bytes();
        bytes[11] = 13;
        assert!(matches!(
            ArtPacket::parse(&bytes),
            Err(LumenError::UnsupportedProtocolRevision(13))
        ));
    }

    proptest! {
        #[test]
        fn prop_dmx_roundtrip(seq in any::<u8>(), address in 0u16..0x8000, data in proptest::collection::vec(any::<u8>(), 1..=512)) {
            let dmx = ArtDmx {
                sequence: seq,
                physical: 0,
                port_address: Universe::new(address),
                data: data.clone(),
            };
            let parsed = ArtDmx::parse(&dmx.to_bytes()).unwrap();
            prop_assert_eq!(parsed.sequence, seq);
            prop_assert_eq!(parsed.port_address.0, address);
            prop_assert_eq!(parsed.data, data);
        }

        #[test]
        fn prop_parse_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..600)) {
            let _ = ArtPacket::parse(&bytes);
        }
    }
}
