//! Output port merge state
//!
//! Each output port can be fed by up to two sources (A and B), keyed by
//! source IP. The first frame binds slot A, a second IP binds slot B and
//! starts a merge. A third IP is dropped unless one of the bound sources
//! has gone stale past the merge timeout, in which case it evicts the
//! older stale slot.

use std::net::Ipv4Addr;

use lumen_core::{Millis, Universe, DMX_UNIVERSE_SIZE};

/// DMX merge policy for two simultaneous sources
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MergeMode {
    /// Highest takes precedence: per-channel max of A and B
    #[default]
    Htp,
    /// Latest takes precedence: the most recently updated source wins
    Ltp,
}

/// One bound DMX source
#[derive(Clone)]
pub struct SourceSlot {
    pub ip: Option<Ipv4Addr>,
    pub data: [u8; DMX_UNIVERSE_SIZE],
    pub length: usize,
    pub millis: Millis,
}

impl Default for SourceSlot {
    fn default() -> Self {
        SourceSlot {
            ip: None,
            data: [0; DMX_UNIVERSE_SIZE],
            length: 0,
            millis: Millis::ZERO,
        }
    }
}

impl SourceSlot {
    fn bind(&mut self, ip: Ipv4Addr, data: &[u8], now: Millis) {
        let length = data.len().min(DMX_UNIVERSE_SIZE);
        self.ip = Some(ip);
        self.data[..length].copy_from_slice(&data[..length]);
        if length < self.length {
            self.data[length..self.length].fill(0);
        }
        self.length = length;
        self.millis = now;
    }

    fn clear(&mut self) {
        self.ip = None;
        self.length = 0;
        self.millis = Millis::ZERO;
    }

    #[inline]
    fn is_bound(&self) -> bool {
        self.ip.is_some()
    }
}

/// Outcome of feeding one ArtDmx frame into a port
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DmxIngest {
    /// Frame stored; `merging` is true when both slots are now bound
    Accepted { merging: bool },
    /// Both slots bound to other live sources, frame dropped
    Dropped,
}

/// Merge state for one output port
#[derive(Clone)]
pub struct OutputPort {
    pub enabled: bool,
    /// 15-bit Port-Address this port listens on
    pub address: Universe,
    /// Low nibble as set by the universe switch
    pub universe_switch: u8,
    pub merge_mode: MergeMode,
    pub source_a: SourceSlot,
    pub source_b: SourceSlot,
    /// Last data handed downstream (or held pending in synchronous mode)
    pub data: [u8; DMX_UNIVERSE_SIZE],
    pub length: usize,
    /// Data arrived while synchronous mode held it back
    pub data_pending: bool,
    pub is_merging: bool,
}

impl Default for OutputPort {
    fn default() -> Self {
        OutputPort {
            enabled: false,
            address: Universe::ZERO,
            universe_switch: 0,
            merge_mode: MergeMode::default(),
            source_a: SourceSlot::default(),
            source_b: SourceSlot::default(),
            data: [0; DMX_UNIVERSE_SIZE],
            length: 0,
            data_pending: false,
            is_merging: false,
        }
    }
}

impl OutputPort {
    /// Feed one frame from `from` into the A/B slots.
    ///
    /// `merge_timeout` only matters for the collision path: when both slots
    /// are bound to other IPs, a stale slot (no update within the timeout)
    /// may be evicted. With `merge_timeout_disabled` collisions are always
    /// dropped.
    pub fn ingest(
        &mut self,
        from: Ipv4Addr,
        data: &[u8],
        now: Millis,
        merge_timeout: u32,
        merge_timeout_disabled: bool,
    ) -> DmxIngest {
        if self.source_a.ip == Some(from) {
            self.source_a.bind(from, data, now);
        } else if self.source_b.ip == Some(from) {
            self.source_b.bind(from, data, now);
        } else if !self.source_a.is_bound() {
            self.source_a.bind(from, data, now);
        } else if !self.source_b.is_bound() {
            self.source_b.bind(from, data, now);
        } else {
            if merge_timeout_disabled {
                return DmxIngest::Dropped;
            }
            let stale_a = now.elapsed_since(self.source_a.millis) > merge_timeout;
            let stale_b = now.elapsed_since(self.source_b.millis) > merge_timeout;
            let evict_a = match (stale_a, stale_b) {
                (false, false) => return DmxIngest::Dropped,
                (true, false) => true,
                (false, true) => false,
                // Both stale: evict the older binding, B on an exact tie
                (true, true) => {
                    now.elapsed_since(self.source_a.millis) > now.elapsed_since(self.source_b.millis)
                }
            };
            if evict_a {
                self.source_a.bind(from, data, now);
            } else {
                self.source_b.bind(from, data, now);
            }
        }

        self.is_merging = self.source_a.is_bound() && self.source_b.is_bound();
        DmxIngest::Accepted {
            merging: self.is_merging,
        }
    }

    /// Drop sources that have not sent within `timeout`.
    /// Returns true when a bound source was expired.
    pub fn expire_sources(&mut self, now: Millis, timeout: u32) -> bool {
        let mut expired = false;
        if self.source_a.is_bound() && now.elapsed_since(self.source_a.millis) > timeout {
            self.source_a.clear();
            expired = true;
        }
        if self.source_b.is_bound() && now.elapsed_since(self.source_b.millis) > timeout {
            self.source_b.clear();
            expired = true;
        }
        if expired {
            // A lone surviving source lives in slot A
            if !self.source_a.is_bound() && self.source_b.is_bound() {
                self.source_a = std::mem::take(&mut self.source_b);
            }
            self.is_merging = self.source_a.is_bound() && self.source_b.is_bound();
        }
        expired
    }

    /// Recompute the output buffer from the bound sources.
    /// Returns true when the output bytes actually changed.
    pub fn compute(&mut self) -> bool {
        let mut merged = [0u8; DMX_UNIVERSE_SIZE];
        let length = match (self.source_a.is_bound(), self.source_b.is_bound()) {
            (true, true) => match self.merge_mode {
                MergeMode::Htp => {
                    let length = self.source_a.length.max(self.source_b.length);
                    for i in 0..length {
                        merged[i] = self.source_a.data[i].max(self.source_b.data[i]);
                    }
                    length
                }
                MergeMode::Ltp => {
                    // Most recent update wins wholesale; A on an exact tie
                    let winner = if self.source_b.millis.elapsed_since(self.source_a.millis)
                        < u32::MAX / 2
                        && self.source_b.millis != self.source_a.millis
                    {
                        &self.source_b
                    } else {
                        &self.source_a
                    };
                    merged[..winner.length].copy_from_slice(&winner.data[..winner.length]);
                    winner.length
                }
            },
            (true, false) => {
                merged[..self.source_a.length].copy_from_slice(&self.source_a.data[..self.source_a.length]);
                self.source_a.length
            }
            (false, true) => {
                merged[..self.source_b.length].copy_from_slice(&self.source_b.data[..self.source_b.length]);
                self.source_b.length
            }
            (false, false) => return false,
        };

        let changed = length != self.length || merged[..length] != self.data[..length];
        if changed {
            self.data = merged;
            self.length = length;
        }
        changed
    }

    /// Drop the second source and end the merge (ArtAddress cancel-merge)
    pub fn cancel_merge(&mut self) {
        self.source_b = SourceSlot::default();
        self.is_merging = false;
    }

    /// Clear the output and both source bindings (ArtAddress clear / data loss)
    pub fn clear(&mut self) {
        self.source_a.clear();
        self.source_b.clear();
        self.data = [0; DMX_UNIVERSE_SIZE];
        self.length = 0;
        self.data_pending = false;
        self.is_merging = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: u32 = 10_000;

    fn ip(last: u8) -> Ipv4Addr {
        Ipv4Addr::new(10, 0, 0, last)
    }

    #[test]
    fn test_single_source_passthrough() {
        let mut port = OutputPort::default();
        let result = port.ingest(ip(1), &[1, 2, 3], Millis::new(100), TIMEOUT, false);
        assert_eq!(result, DmxIngest::Accepted { merging: false });
        assert!(port.compute());
        assert_eq!(&port.data[..3], &[1, 2, 3]);
        assert_eq!(port.length, 3);

        // Identical frame: no change reported
        port.ingest(ip(1), &[1, 2, 3], Millis::new(200), TIMEOUT, false);
        assert!(!port.compute());
    }

    #[test]
    fn test_htp_merge() {
        let mut port = OutputPort::default();
        port.ingest(ip(1), &[10, 200, 0], Millis::new(100), TIMEOUT, false);
        let result = port.ingest(ip(2), &[50, 5, 255], Millis::new(110), TIMEOUT, false);
        assert_eq!(result, DmxIngest::Accepted { merging: true });
        assert!(port.compute());
        assert_eq!(&port.data[..3], &[50, 200, 255]);
    }

    #[test]
    fn test_htp_merge_unequal_lengths() {
        let mut port = OutputPort::default();
        port.ingest(ip(1), &[1, 1], Millis::new(100), TIMEOUT, false);
        port.ingest(ip(2), &[0, 0, 9, 9], Millis::new(110), TIMEOUT, false);
        port.compute();
        assert_eq!(port.length, 4);
        assert_eq!(&port.data[..4], &[1, 1, 9, 9]);
    }

    #[test]
    fn test_ltp_merge_latest_wins() {
        let mut port = OutputPort {
            merge_mode: MergeMode::Ltp,
            ..Default::default()
        };
        port.ingest(ip(1), &[1, 1, 1], Millis::new(100), TIMEOUT, false);
        port.ingest(ip(2), &[2, 2, 2], Millis::new(150), TIMEOUT, false);
        port.compute();
        assert_eq!(&port.data[..3], &[2, 2, 2]);

        // A sends again, now A is latest
        port.ingest(ip(1), &[3, 3, 3], Millis::new(200), TIMEOUT, false);
        assert!(port.compute());
        assert_eq!(&port.data[..3], &[3, 3, 3]);
    }

    #[test]
    fn test_third_source_dropped_when_both_live() {
        let mut port = OutputPort::default();
        port.ingest(ip(1), &[1], Millis::new(100), TIMEOUT, false);
        port.ingest(ip(2), &[2], Millis::new(100), TIMEOUT, false);
        let result = port.ingest(ip(3), &[3], Millis::new(200), TIMEOUT, false);
        assert_eq!(result, DmxIngest::Dropped);
        assert_eq!(port.source_a.ip, Some(ip(1)));
        assert_eq!(port.source_b.ip, Some(ip(2)));
    }

    #[test]
    fn test_third_source_evicts_stale_slot() {
        let mut port = OutputPort::default();
        port.ingest(ip(1), &[1], Millis::new(100), TIMEOUT, false);
        port.ingest(ip(2), &[2], Millis::new(11_000), TIMEOUT, false);

        // A is stale (last update 100), B is fresh
        let result = port.ingest(ip(3), &[3], Millis::new(12_000), TIMEOUT, false);
        assert_eq!(result, DmxIngest::Accepted { merging: true });
        assert_eq!(port.source_a.ip, Some(ip(3)));
        assert_eq!(port.source_b.ip, Some(ip(2)));
    }

    #[test]
    fn test_third_source_evicts_older_when_both_stale() {
        let mut port = OutputPort::default();
        port.ingest(ip(1), &[1], Millis::new(100), TIMEOUT, false);
        port.ingest(ip(2), &[2], Millis::new(500), TIMEOUT, false);

        let result = port.ingest(ip(3), &[3], Millis::new(50_000), TIMEOUT, false);
        assert_eq!(result, DmxIngest::Accepted { merging: true });
        // A was older, so A was evicted
        assert_eq!(port.source_a.ip, Some(ip(3)));
        assert_eq!(port.source_b.ip, Some(ip(2)));
    }

    #[test]
    fn test_collision_dropped_when_timeout_disabled() {
        let mut port = OutputPort::default();
        port.ingest(ip(1), &[1], Millis::new(100), TIMEOUT, true);
        port.ingest(ip(2), &[2], Millis::new(100), TIMEOUT, true);
        let result = port.ingest(ip(3), &[3], Millis::new(90_000), TIMEOUT, true);
        assert_eq!(result, DmxIngest::Dropped);
    }

    #[test]
    fn test_expire_drops_silent_source() {
        let mut port = OutputPort::default();
        port.ingest(ip(1), &[9, 9], Millis::new(100), TIMEOUT, false);
        port.ingest(ip(2), &[1, 1], Millis::new(11_000), TIMEOUT, false);
        assert!(port.is_merging);

        assert!(port.expire_sources(Millis::new(12_000), TIMEOUT));
        assert!(!port.is_merging);
        // Survivor moved into slot A
        assert_eq!(port.source_a.ip, Some(ip(2)));
        assert!(!port.source_b.is_bound());

        port.compute();
        assert_eq!(&port.data[..2], &[1, 1]);
    }

    #[test]
    fn test_shorter_frame_zeroes_tail() {
        let mut port = OutputPort::default();
        port.ingest(ip(1), &[5, 5, 5, 5], Millis::new(100), TIMEOUT, false);
        port.compute();
        port.ingest(ip(1), &[7, 7], Millis::new(200), TIMEOUT, false);
        assert!(port.compute());
        assert_eq!(port.length, 2);
        assert_eq!(&port.data[..2], &[7, 7]);
    }
}
