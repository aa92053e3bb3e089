//! OpenRover command-link protocol: wire packet encoding and decoding.
//!
//! This crate is intentionally I/O-free and allocation-free. It provides pure
//! functions and types that can be tested and fuzzed without a socket or a
//! vehicle on the other end. The transport is best-effort UDP: one packet per
//! control cycle, no handshake, no retransmission.

#![deny(static_mut_refs)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod packet;

pub use packet::{CommandPacket, DecodeError, FLAG_ENABLE, MAGIC, PACKET_LEN};
