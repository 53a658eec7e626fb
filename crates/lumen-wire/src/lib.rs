//! Lumen Wire - Binary packet formats
//!
//! This crate implements the wire formats spoken by the stack:
//! - Art-Net: 8-byte packet id, little-endian opcode, per-opcode layouts
//! - E1.31 (sACN): ACN root/framing/DMP layers with big-endian
//!   flags+length fields
//!
//! Every structure offers `parse` (validating magic and version before any
//! field is interpreted), `serialize` into a caller-provided buffer, and a
//! `to_bytes` convenience sized exactly to the packet. Parsers never
//! mutate state on failure; encoders never write past the fixed maximum
//! for their opcode.

pub mod artnet;
pub mod e131;

pub use artnet::*;
pub use e131::*;

/// Copy a string into a fixed-width NUL-padded field, truncating silently
/// when the input exceeds the field. The last byte always stays NUL.
pub fn copy_padded(dst: &mut [u8], src: &str) {
    dst.fill(0);
    let n = src.len().min(dst.len().saturating_sub(1));
    dst[..n].copy_from_slice(&src.as_bytes()[..n]);
}

/// Read a fixed-width NUL-padded field back into a string, dropping the
/// padding and any trailing garbage after the first NUL.
pub fn padded_str(src: &[u8]) -> String {
    let end = src.iter().position(|&b| b == 0).unwrap_or(src.len());
    String::from_utf8_lossy(&src[..end]).into_owned()
}
