//! Lumen sACN - E1.31 source controller
//!
//! This crate implements the sending side of E1.31:
//! - [`SequenceRegistry`]: sorted universe -> (sequence, multicast group)
//!   map with bounded capacity
//! - [`E131Controller`]: data/synchronization/blackout packet emission and
//!   rate-limited universe discovery

pub mod controller;
pub mod registry;

pub use controller::*;
pub use registry::*;
