//! Error types for the Lumen stack

use thiserror::Error;

/// Errors shared across the Lumen crates
#[derive(Error, Debug)]
pub enum LumenError {
    // Wire errors
    #[error("Buffer too short: expected {expected}, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },

    #[error("Invalid packet identifier")]
    InvalidPacketId,

    #[error("Unsupported protocol revision: {0}")]
    UnsupportedProtocolRevision(u16),

    #[error("Unknown opcode: {0:#06x}")]
    UnknownOpCode(u16),

    #[error("Invalid layer vector: {0:#010x}")]
    InvalidVector(u32),

    #[error("Invalid wire field: {0}")]
    InvalidWireField(&'static str),

    #[error("DMX payload length out of range: {0}")]
    InvalidDmxLength(usize),

    // Table errors
    #[error("Poll table full")]
    PollTableFull,

    #[error("Universe registry full")]
    UniverseRegistryFull,

    #[error("Sequence registry full, universe {universe} rejected")]
    SequenceRegistryFull { universe: u16 },

    #[error("Invalid port index: {0}")]
    InvalidPortIndex(usize),

    // Transport errors
    #[error("Transport error: {0}")]
    Transport(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for Lumen operations
pub type LumenResult<T> = Result<T, LumenError>;
