//! Diagnostics counters for non-fatal drop conditions
//!
//! Dropped frames and evicted peers are invisible to the data path; these
//! counters are the only place they surface. Capacity and parse failures
//! increment, they never halt the loop.

/// Per-core drop/diagnostic counters
#[derive(Clone, Debug, Default)]
pub struct DiagCounters {
    /// Datagrams rejected before any state mutation (bad id, version, size)
    pub malformed_packets: u64,
    /// Poll-reply sources dropped because the node table was at capacity
    pub poll_table_full: u64,
    /// Universes dropped because the universe registry was at capacity
    pub universe_registry_full: u64,
    /// Per-node universe slots exhausted, extra universes dropped
    pub node_universes_full: u64,
    /// sACN universes rejected because the sequence registry was at capacity
    pub sequence_registry_full: u64,
    /// ArtDmx frames dropped because both merge slots were bound and live
    pub merge_collisions_dropped: u64,
    /// Transport send failures (operation skipped for that tick)
    pub send_errors: u64,
}

impl DiagCounters {
    pub fn new() -> Self {
        DiagCounters::default()
    }
}
