//! Lumen Art-Net - node state machine and peer liveness tables
//!
//! This crate implements the Art-Net side of the stack:
//! - [`PollTable`]: bounded sorted registry of remote nodes and the
//!   universes they serve, with round-robin age-out
//! - [`ArtNetNode`]: the per-opcode protocol state machine with two-source
//!   DMX merging, synchronous mode and poll-reply construction
//!
//! The node is a synchronous core: datagrams are handed in with
//! `handle_packet`, timers advance in `tick`, and outbound packets are
//! drained through `pop_outgoing`. The embedder owns the sockets.

pub mod handlers;
pub mod node;
pub mod poll_table;
pub mod port;

pub use handlers::*;
pub use node::*;
pub use poll_table::*;
pub use port::*;
