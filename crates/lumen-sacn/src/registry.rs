//! Per-universe sequence numbers and multicast destinations
//!
//! A sorted array keyed by universe number. Lookup is a binary search;
//! a miss inserts in sorted position (shifting the suffix) so iteration
//! always yields ascending universes - the order the discovery packet
//! needs. Capacity is fixed: the active-universe set feeds blackout and
//! discovery, so overflow must surface as an error instead of silently
//! forgetting a universe.

use std::net::Ipv4Addr;

use lumen_core::{LumenError, LumenResult, Universe};

/// Maximum simultaneously active universes for one source
pub const SEQUENCE_REGISTRY_DEFAULT_CAPACITY: usize = 512;

/// One active universe
#[derive(Clone, Copy, Debug)]
pub struct SequenceEntry {
    pub universe: Universe,
    pub sequence: u8,
    pub multicast: Ipv4Addr,
}

/// Sorted bounded universe -> sequence/multicast map
pub struct SequenceRegistry {
    entries: Vec<SequenceEntry>,
    capacity: usize,
}

impl Default for SequenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceRegistry {
    pub fn new() -> Self {
        Self::with_capacity(SEQUENCE_REGISTRY_DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        SequenceRegistry {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Sequence number and multicast destination for the next packet on
    /// `universe`. An unknown universe is registered (starting at
    /// sequence 0, multicast 239.255.hi.lo); a known one increments its
    /// 8-bit counter, wrapping naturally.
    pub fn next(&mut self, universe: Universe) -> LumenResult<(u8, Ipv4Addr)> {
        match self.entries.binary_search_by_key(&universe, |e| e.universe) {
            Ok(index) => {
                let entry = &mut self.entries[index];
                entry.sequence = entry.sequence.wrapping_add(1);
                Ok((entry.sequence, entry.multicast))
            }
            Err(index) => {
                if self.entries.len() == self.capacity {
                    return Err(LumenError::SequenceRegistryFull {
                        universe: universe.0,
                    });
                }
                let multicast = universe.multicast_group();
                self.entries.insert(
                    index,
                    SequenceEntry {
                        universe,
                        sequence: 0,
                        multicast,
                    },
                );
                Ok((0, multicast))
            }
        }
    }

    /// Active universes in ascending order
    pub fn active_universes(&self) -> impl Iterator<Item = Universe> + '_ {
        self.entries.iter().map(|e| e.universe)
    }

    pub fn entries(&self) -> &[SequenceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
