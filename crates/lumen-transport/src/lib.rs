//! Lumen Transport - UDP sockets for the protocol cores
//!
//! The cores are synchronous; this crate owns the async sockets and keeps
//! the receive path non-blocking so the cooperative tick loop never parks
//! inside a subsystem.

pub mod udp;

pub use udp::*;
