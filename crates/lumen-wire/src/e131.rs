//! E1.31 (sACN) packet layouts
//!
//! Every E1.31 packet nests three layers:
//! - Root layer: preamble/postamble sizes, the 12-byte ACN packet
//!   identifier, flags+length, vector, source CID
//! - Framing layer: vector plus per-packet fields
//! - A payload layer (DMP for data, universe-discovery for discovery)
//!
//! All multi-byte fields are big-endian. Every flags+length field carries
//! 0x7 in the top nibble and the byte count from that field to the end of
//! the packet in the bottom 12 bits.

use lumen_core::{LumenError, LumenResult, Universe, DMX_UNIVERSE_SIZE};

use crate::{copy_padded, padded_str};

/// RLP preamble size, constant for UDP carriage
pub const E131_PREAMBLE_SIZE: u16 = 0x0010;
/// RLP postamble size, always zero
pub const E131_POSTAMBLE_SIZE: u16 = 0x0000;
/// ACN packet identifier (E1.17)
pub const ACN_PACKET_IDENTIFIER: [u8; 12] = *b"ASC-E1.17\x00\x00\x00";

pub const E131_CID_LENGTH: usize = 16;
pub const E131_SOURCE_NAME_LENGTH: usize = 64;
pub const E131_PRIORITY_DEFAULT: u8 = 100;

/// Root layer vector: RLP data packet
pub const VECTOR_ROOT_DATA: u32 = 0x0000_0004;
/// Root layer vector: RLP extended packet (sync, discovery)
pub const VECTOR_ROOT_EXTENDED: u32 = 0x0000_0008;
/// Framing vector: DMX data packet
pub const VECTOR_DATA_PACKET: u32 = 0x0000_0002;
/// Framing vector: synchronization packet
pub const VECTOR_EXTENDED_SYNCHRONIZATION: u32 = 0x0000_0001;
/// Framing vector: universe discovery packet
pub const VECTOR_EXTENDED_DISCOVERY: u32 = 0x0000_0002;
/// Universe discovery layer vector: universe list
pub const VECTOR_UNIVERSE_DISCOVERY_LIST: u32 = 0x0000_0001;
/// DMP vector: set property
pub const VECTOR_DMP_SET_PROPERTY: u8 = 0x02;

/// Framing options bit: preview data, not for live output
pub const OPTIONS_PREVIEW_DATA: u8 = 0x80;
/// Framing options bit: source is terminating this universe
pub const OPTIONS_STREAM_TERMINATED: u8 = 0x40;
/// Framing options bit: hold output until a synchronization packet
pub const OPTIONS_FORCE_SYNCHRONIZATION: u8 = 0x20;

/// Data packet bytes before the channel levels (through the start code)
pub const E131_DATA_HEADER_SIZE: usize = 126;
pub const E131_DATA_PACKET_MAX: usize = E131_DATA_HEADER_SIZE + DMX_UNIVERSE_SIZE;
pub const E131_SYNC_PACKET_SIZE: usize = 49;
pub const E131_DISCOVERY_HEADER_SIZE: usize = 120;
/// Universes per discovery page
pub const E131_DISCOVERY_UNIVERSES_MAX: usize = 512;

fn ensure_len(buf: &[u8], expected: usize) -> LumenResult<()> {
    if buf.len() < expected {
        return Err(LumenError::BufferTooShort {
            expected,
            actual: buf.len(),
        });
    }
    Ok(())
}

#[inline]
fn flags_length(length: usize) -> [u8; 2] {
    ((0x7 << 12) | (length as u16 & 0x0FFF)).to_be_bytes()
}

fn parse_flags_length(buf: &[u8], offset: usize) -> LumenResult<u16> {
    let raw = u16::from_be_bytes([buf[offset], buf[offset + 1]]);
    if raw >> 12 != 0x7 {
        return Err(LumenError::InvalidWireField("flags nibble"));
    }
    Ok(raw & 0x0FFF)
}

/// Validate the root layer: preamble block, ACN identifier, flags nibble
/// and the expected vector. Bytes 0-15 are fixed for every E1.31 packet.
fn check_root(buf: &[u8], expected_vector: u32) -> LumenResult<()> {
    ensure_len(buf, 38)?;
    if u16::from_be_bytes([buf[0], buf[1]]) != E131_PREAMBLE_SIZE
        || u16::from_be_bytes([buf[2], buf[3]]) != E131_POSTAMBLE_SIZE
    {
        return Err(LumenError::InvalidPacketId);
    }
    if buf[4..16] != ACN_PACKET_IDENTIFIER {
        return Err(LumenError::InvalidPacketId);
    }
    parse_flags_length(buf, 16)?;
    let vector = u32::from_be_bytes([buf[18], buf[19], buf[20], buf[21]]);
    if vector != expected_vector {
        return Err(LumenError::InvalidVector(vector));
    }
    Ok(())
}

/// Write the 38-byte root layer. `length` is the root layer length
/// (packet size minus the 16-byte RLP preamble block).
fn write_root(buf: &mut [u8], length: usize, vector: u32, cid: &[u8; E131_CID_LENGTH]) {
    buf[0..2].copy_from_slice(&E131_PREAMBLE_SIZE.to_be_bytes());
    buf[2..4].copy_from_slice(&E131_POSTAMBLE_SIZE.to_be_bytes());
    buf[4..16].copy_from_slice(&ACN_PACKET_IDENTIFIER);
    buf[16..18].copy_from_slice(&flags_length(length));
    buf[18..22].copy_from_slice(&vector.to_be_bytes());
    buf[22..38].copy_from_slice(cid);
}

/// E1.31 Data Packet - root + framing + DMP layers
#[derive(Clone)]
pub struct E131DataPacket {
    pub cid: [u8; E131_CID_LENGTH],
    pub source_name: [u8; E131_SOURCE_NAME_LENGTH],
    pub priority: u8,
    /// Universe on which sync packets will be sent, 0 = unsynchronized
    pub synchronization_address: u16,
    pub sequence: u8,
    pub options: u8,
    pub universe: Universe,
    pub start_code: u8,
    /// Channel levels, excluding the start code
    pub data: Vec<u8>,
}

impl Default for E131DataPacket {
    fn default() -> Self {
        E131DataPacket {
            cid: [0; E131_CID_LENGTH],
            source_name: [0; E131_SOURCE_NAME_LENGTH],
            priority: E131_PRIORITY_DEFAULT,
            synchronization_address: 0,
            sequence: 0,
            options: 0,
            universe: Universe::ZERO,
            start_code: 0,
            data: Vec::new(),
        }
    }
}

impl E131DataPacket {
    /// Property value count: start code plus channel data
    #[inline]
    fn property_count(&self) -> usize {
        1 + self.data.len()
    }

    pub fn size(&self) -> usize {
        E131_DATA_HEADER_SIZE + self.data.len()
    }

    pub fn parse(buf: &[u8]) -> LumenResult<Self> {
        check_root(buf, VECTOR_ROOT_DATA)?;
        ensure_len(buf, E131_DATA_HEADER_SIZE)?;

        // Framing layer, bytes 38-114
        parse_flags_length(buf, 38)?;
        let framing_vector = u32::from_be_bytes([buf[40], buf[41], buf[42], buf[43]]);
        if framing_vector != VECTOR_DATA_PACKET {
            return Err(LumenError::InvalidVector(framing_vector));
        }

        // DMP layer, bytes 115 onward
        parse_flags_length(buf, 115)?;
        if buf[117] != VECTOR_DMP_SET_PROPERTY {
            return Err(LumenError::InvalidVector(buf[117] as u32));
        }
        if buf[118] != 0xa1 {
            return Err(LumenError::InvalidWireField("dmp address/data type"));
        }

        let count = u16::from_be_bytes([buf[123], buf[124]]) as usize;
        if count == 0 || count > 1 + DMX_UNIVERSE_SIZE {
            return Err(LumenError::InvalidDmxLength(count));
        }
        ensure_len(buf, 125 + count)?;

        let mut packet = E131DataPacket {
            priority: buf[108],
            synchronization_address: u16::from_be_bytes([buf[109], buf[110]]),
            sequence: buf[111],
            options: buf[112],
            universe: Universe(u16::from_be_bytes([buf[113], buf[114]])),
            start_code: buf[125],
            data: buf[126..125 + count].to_vec(),
            ..Default::default()
        };
        packet.cid.copy_from_slice(&buf[22..38]);
        packet.source_name.copy_from_slice(&buf[44..108]);

        Ok(packet)
    }

    pub fn serialize(&self, buf: &mut [u8]) -> LumenResult<usize> {
        if self.data.len() > DMX_UNIVERSE_SIZE {
            return Err(LumenError::InvalidDmxLength(self.data.len()));
        }
        let total = self.size();
        ensure_len(buf, total)?;

        let count = self.property_count();

        // Root layer: length covers bytes 16..end = 109 + count
        write_root(buf, 109 + count, VECTOR_ROOT_DATA, &self.cid);

        // Framing layer: length covers bytes 38..end = 87 + count
        buf[38..40].copy_from_slice(&flags_length(87 + count));
        buf[40..44].copy_from_slice(&VECTOR_DATA_PACKET.to_be_bytes());
        buf[44..108].copy_from_slice(&self.source_name);
        buf[108] = self.priority;
        buf[109..111].copy_from_slice(&self.synchronization_address.to_be_bytes());
        buf[111] = self.sequence;
        buf[112] = self.options;
        buf[113..115].copy_from_slice(&self.universe.to_be_bytes());

        // DMP layer: length covers bytes 115..end = 10 + count
        buf[115..117].copy_from_slice(&flags_length(10 + count));
        buf[117] = VECTOR_DMP_SET_PROPERTY;
        buf[118] = 0xa1;
        buf[119..121].copy_from_slice(&0x0000u16.to_be_bytes());
        buf[121..123].copy_from_slice(&0x0001u16.to_be_bytes());
        buf[123..125].copy_from_slice(&(count as u16).to_be_bytes());
        buf[125] = self.start_code;
        buf[126..total].copy_from_slice(&self.data);

        Ok(total)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; self.size()];
        self.serialize(&mut buf).unwrap();
        buf
    }

    pub fn set_source_name(&mut self, name: &str) {
        copy_padded(&mut self.source_name, name);
    }

    pub fn source_name_str(&self) -> String {
        padded_str(&self.source_name)
    }
}

impl std::fmt::Debug for E131DataPacket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("E131DataPacket")
            .field("universe", &self.universe)
            .field("sequence", &self.sequence)
            .field("priority", &self.priority)
            .field("channels", &self.data.len())
            .finish_non_exhaustive()
    }
}

/// E1.31 Synchronization Packet (49 bytes)
#[derive(Clone, Debug)]
pub struct E131SyncPacket {
    pub cid: [u8; E131_CID_LENGTH],
    pub sequence: u8,
    pub synchronization_address: u16,
}

impl E131SyncPacket {
    pub fn parse(buf: &[u8]) -> LumenResult<Self> {
        check_root(buf, VECTOR_ROOT_EXTENDED)?;
        ensure_len(buf, E131_SYNC_PACKET_SIZE)?;

        parse_flags_length(buf, 38)?;
        let framing_vector = u32::from_be_bytes([buf[40], buf[41], buf[42], buf[43]]);
        if framing_vector != VECTOR_EXTENDED_SYNCHRONIZATION {
            return Err(LumenError::InvalidVector(framing_vector));
        }

        let mut packet = E131SyncPacket {
            cid: [0; E131_CID_LENGTH],
            sequence: buf[44],
            synchronization_address: u16::from_be_bytes([buf[45], buf[46]]),
        };
        packet.cid.copy_from_slice(&buf[22..38]);

        Ok(packet)
    }

    pub fn serialize(&self, buf: &mut [u8]) -> LumenResult<usize> {
        ensure_len(buf, E131_SYNC_PACKET_SIZE)?;
        buf[..E131_SYNC_PACKET_SIZE].fill(0);

        // Root layer length 33, framing layer length 11
        write_root(buf, 33, VECTOR_ROOT_EXTENDED, &self.cid);
        buf[38..40].copy_from_slice(&flags_length(11));
        buf[40..44].copy_from_slice(&VECTOR_EXTENDED_SYNCHRONIZATION.to_be_bytes());
        buf[44] = self.sequence;
        buf[45..47].copy_from_slice(&self.synchronization_address.to_be_bytes());
        // Bytes 47-48 reserved

        Ok(E131_SYNC_PACKET_SIZE)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; E131_SYNC_PACKET_SIZE];
        self.serialize(&mut buf).unwrap();
        buf
    }
}

/// E1.31 Universe Discovery Packet
#[derive(Clone)]
pub struct E131DiscoveryPacket {
    pub cid: [u8; E131_CID_LENGTH],
    pub source_name: [u8; E131_SOURCE_NAME_LENGTH],
    pub page: u8,
    pub last_page: u8,
    /// Ascending list of universes this source transmits on
    pub universes: Vec<u16>,
}

impl Default for E131DiscoveryPacket {
    fn default() -> Self {
        E131DiscoveryPacket {
            cid: [0; E131_CID_LENGTH],
            source_name: [0; E131_SOURCE_NAME_LENGTH],
            page: 0,
            last_page: 0,
            universes: Vec::new(),
        }
    }
}

impl E131DiscoveryPacket {
    pub fn size(&self) -> usize {
        E131_DISCOVERY_HEADER_SIZE + self.universes.len() * 2
    }

    pub fn parse(buf: &[u8]) -> LumenResult<Self> {
        check_root(buf, VECTOR_ROOT_EXTENDED)?;
        ensure_len(buf, E131_DISCOVERY_HEADER_SIZE)?;

        parse_flags_length(buf, 38)?;
        let framing_vector = u32::from_be_bytes([buf[40], buf[41], buf[42], buf[43]]);
        if framing_vector != VECTOR_EXTENDED_DISCOVERY {
            return Err(LumenError::InvalidVector(framing_vector));
        }

        let udl_length = parse_flags_length(buf, 112)? as usize;
        let discovery_vector = u32::from_be_bytes([buf[114], buf[115], buf[116], buf[117]]);
        if discovery_vector != VECTOR_UNIVERSE_DISCOVERY_LIST {
            return Err(LumenError::InvalidVector(discovery_vector));
        }
        if udl_length < 8 || (udl_length - 8) % 2 != 0 {
            return Err(LumenError::InvalidWireField("discovery layer length"));
        }

        let count = (udl_length - 8) / 2;
        ensure_len(buf, E131_DISCOVERY_HEADER_SIZE + count * 2)?;

        let mut packet = E131DiscoveryPacket {
            page: buf[118],
            last_page: buf[119],
            ..Default::default()
        };
        packet.cid.copy_from_slice(&buf[22..38]);
        packet.source_name.copy_from_slice(&buf[44..108]);
        packet.universes = buf[120..120 + count * 2]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();

        Ok(packet)
    }

    pub fn serialize(&self, buf: &mut [u8]) -> LumenResult<usize> {
        if self.universes.len() > E131_DISCOVERY_UNIVERSES_MAX {
            return Err(LumenError::InvalidWireField("discovery universe count"));
        }
        let total = self.size();
        ensure_len(buf, total)?;
        let n2 = self.universes.len() * 2;

        // Root 104 + 2N, framing 82 + 2N, discovery layer 8 + 2N
        write_root(buf, 104 + n2, VECTOR_ROOT_EXTENDED, &self.cid);
        buf[38..40].copy_from_slice(&flags_length(82 + n2));
        buf[40..44].copy_from_slice(&VECTOR_EXTENDED_DISCOVERY.to_be_bytes());
        buf[44..108].copy_from_slice(&self.source_name);
        buf[108..112].fill(0); // reserved
        buf[112..114].copy_from_slice(&flags_length(8 + n2));
        buf[114..118].copy_from_slice(&VECTOR_UNIVERSE_DISCOVERY_LIST.to_be_bytes());
        buf[118] = self.page;
        buf[119] = self.last_page;
        for (i, universe) in self.universes.iter().enumerate() {
            let offset = 120 + i * 2;
            buf[offset..offset + 2].copy_from_slice(&universe.to_be_bytes());
        }

        Ok(total)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; self.size()];
        self.serialize(&mut buf).unwrap();
        buf
    }

    pub fn set_source_name(&mut self, name: &str) {
        copy_padded(&mut self.source_name, name);
    }
}

impl std::fmt::Debug for E131DiscoveryPacket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("E131DiscoveryPacket")
            .field("page", &self.page)
            .field("last_page", &self.last_page)
            .field("universes", &self.universes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cid() -> [u8; 16] {
        [
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E,
            0x0F, 0x10,
        ]
    }

    #[test]
    fn test_data_packet_layout() {
        let mut packet = E131DataPacket {
            cid: cid(),
            universe: Universe::new(1),
            sequence: 42,
            data: vec![255; 512],
            ..Default::default()
        };
        packet.set_source_name("lumen source");

        let bytes = packet.to_bytes();
        assert_eq!(bytes.len(), 638);

        // Root layer
        assert_eq!(&bytes[0..2], &[0x00, 0x10]);
        assert_eq!(&bytes[2..4], &[0x00, 0x00]);
        assert_eq!(&bytes[4..16], b"ASC-E1.17\0\0\0");
        // Root flags+length: 0x7000 | 622
        assert_eq!(u16::from_be_bytes([bytes[16], bytes[17]]), 0x7000 | 622);
        // Framing flags+length: 0x7000 | 600
        assert_eq!(u16::from_be_bytes([bytes[38], bytes[39]]), 0x7000 | 600);
        // DMP flags+length: 0x7000 | 523
        assert_eq!(u16::from_be_bytes([bytes[115], bytes[116]]), 0x7000 | 523);
        // Property count 513, start code zero
        assert_eq!(u16::from_be_bytes([bytes[123], bytes[124]]), 513);
        assert_eq!(bytes[125], 0);
    }

    #[test]
    fn test_data_packet_roundtrip() {
        let mut packet = E131DataPacket {
            cid: cid(),
            universe: Universe::new(7),
            sequence: 3,
            priority: 120,
            synchronization_address: 7999,
            data: vec![1, 2, 3, 4, 5],
            ..Default::default()
        };
        packet.set_source_name("roundtrip");

        let parsed = E131DataPacket::parse(&packet.to_bytes()).unwrap();
        assert_eq!(parsed.universe, Universe::new(7));
        assert_eq!(parsed.sequence, 3);
        assert_eq!(parsed.priority, 120);
        assert_eq!(parsed.synchronization_address, 7999);
        assert_eq!(parsed.cid, cid());
        assert_eq!(parsed.source_name_str(), "roundtrip");
        assert_eq!(parsed.start_code, 0);
        assert_eq!(parsed.data, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_data_packet_rejects_bad_identifier() {
        let packet = E131DataPacket {
            data: vec![0; 16],
            ..Default::default()
        };
        let mut bytes = packet.to_bytes();
        bytes[4] = b'X';
        assert!(matches!(
            E131DataPacket::parse(&bytes),
            Err(LumenError::InvalidPacketId)
        ));
    }

    #[test]
    fn test_data_packet_rejects_bad_vector() {
        let packet = E131DataPacket {
            data: vec![0; 16],
            ..Default::default()
        };
        let mut bytes = packet.to_bytes();
        bytes[21] = 0x09;
        assert!(matches!(
            E131DataPacket::parse(&bytes),
            Err(LumenError::InvalidVector(9))
        ));
    }

    #[test]
    fn test_data_packet_rejects_bad_flags() {
        let packet = E131DataPacket {
            data: vec![0; 16],
            ..Default::default()
        };
        let mut bytes = packet.to_bytes();
        bytes[16] = 0x50; // flags nibble must be 0x7
        assert!(E131DataPacket::parse(&bytes).is_err());
    }

    #[test]
    fn test_sync_packet() {
        let packet = E131SyncPacket {
            cid: cid(),
            sequence: 9,
            synchronization_address: 7999,
        };

        let bytes = packet.to_bytes();
        assert_eq!(bytes.len(), E131_SYNC_PACKET_SIZE);
        // Root layer length 33, framing length 11
        assert_eq!(u16::from_be_bytes([bytes[16], bytes[17]]), 0x7000 | 33);
        assert_eq!(u16::from_be_bytes([bytes[38], bytes[39]]), 0x7000 | 11);

        let parsed = E131SyncPacket::parse(&bytes).unwrap();
        assert_eq!(parsed.sequence, 9);
        assert_eq!(parsed.synchronization_address, 7999);
        assert_eq!(parsed.cid, cid());
    }

    #[test]
    fn test_discovery_packet() {
        let mut packet = E131DiscoveryPacket {
            cid: cid(),
            universes: vec![1, 2, 7, 42],
            ..Default::default()
        };
        packet.set_source_name("discovery");

        let bytes = packet.to_bytes();
        assert_eq!(bytes.len(), E131_DISCOVERY_HEADER_SIZE + 8);
        assert_eq!(u16::from_be_bytes([bytes[16], bytes[17]]), 0x7000 | 112);
        assert_eq!(u16::from_be_bytes([bytes[112], bytes[113]]), 0x7000 | 16);

        let parsed = E131DiscoveryPacket::parse(&bytes).unwrap();
        assert_eq!(parsed.universes, vec![1, 2, 7, 42]);
        assert_eq!(parsed.page, 0);
        assert_eq!(parsed.last_page, 0);
    }

    #[test]
    fn test_sync_vs_discovery_dispatch() {
        // Both are extended-root packets; the framing vector separates them
        let sync = E131SyncPacket {
            cid: cid(),
            sequence: 0,
            synchronization_address: 1,
        };
        assert!(E131DiscoveryPacket::parse(&sync.to_bytes()).is_err());

        let discovery = E131DiscoveryPacket {
            cid: cid(),
            ..Default::default()
        };
        assert!(E131SyncPacket::parse(&discovery.to_bytes()).is_err());
    }

    proptest! {
        #[test]
        fn prop_data_roundtrip(universe in 1u16..=63999, seq in any::<u8>(), data in proptest::collection::vec(any::<u8>(), 1..=512)) {
            let packet = E131DataPacket {
                cid: cid(),
                universe: Universe::new(universe),
                sequence: seq,
                data: data.clone(),
                ..Default::default()
            };
            let parsed = E131DataPacket::parse(&packet.to_bytes()).unwrap();
            prop_assert_eq!(parsed.universe.0, universe);
            prop_assert_eq!(parsed.sequence, seq);
            prop_assert_eq!(parsed.data, data);
        }

        #[test]
        fn prop_parse_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..700)) {
            let _ = E131DataPacket::parse(&bytes);
            let _ = E131SyncPacket::parse(&bytes);
            let _ = E131DiscoveryPacket::parse(&bytes);
        }
    }
}
