//! Protocol constants shared across the stack

/// Channels in a full DMX512 frame
pub const DMX_UNIVERSE_SIZE: usize = 512;

/// Null start code for dimmer data
pub const DMX_START_CODE: u8 = 0x00;

/// Physical DMX ports per Art-Net node
pub const ARTNET_MAX_PORTS: usize = 4;

/// Art-Net UDP port (0x1936)
pub const ARTNET_UDP_PORT: u16 = 6454;

/// E1.31 (sACN) UDP port
pub const E131_UDP_PORT: u16 = 5568;

/// Interval at which controllers are expected to re-poll the network
pub const ARTNET_POLL_INTERVAL_MILLIS: u32 = 2500;

/// A discovered universe goes stale when it has not been refreshed
/// within 1.5x the poll interval.
pub const ARTNET_POLL_STALE_MILLIS: u32 = ARTNET_POLL_INTERVAL_MILLIS + ARTNET_POLL_INTERVAL_MILLIS / 2;

/// Merge sources and DMX reception time out after this long without data
pub const NETWORK_DATA_LOSS_TIMEOUT_MILLIS: u32 = 10_000;

/// Synchronous mode ends when no ArtSync arrives within this window
pub const ARTSYNC_TIMEOUT_MILLIS: u32 = 4_000;

/// E1.31 universe discovery interval
pub const E131_DISCOVERY_INTERVAL_MILLIS: u32 = 10_000;

/// Reserved universe for E1.31 universe discovery packets
pub const E131_DISCOVERY_UNIVERSE: u16 = 64214;
