//! Lumen Test - cross-crate integration harness
//!
//! Scenario tests that exercise whole paths through the stack: wire bytes
//! in, table/merge/sink effects out. Unit-level behavior lives with each
//! crate; this harness covers the seams between them.

pub mod sink;

#[cfg(test)]
mod artnet_loopback;
#[cfg(test)]
mod runtime_loopback;
#[cfg(test)]
mod sacn_loopback;
