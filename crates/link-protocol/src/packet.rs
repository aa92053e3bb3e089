//! Command packet layout and codec.
//!
//! One datagram is sent per control cycle. The layout is fixed at 16 bytes,
//! network byte order. This format is compatibility-bearing: the vehicle
//! daemon is an independently updated program, so every field width and
//! offset here is load-bearing.
//!
//! | Offset | Field            | Type    | Notes                          |
//! |--------|------------------|---------|--------------------------------|
//! | 0      | magic            | 4 bytes | ASCII `IRL1`                   |
//! | 4      | sequence         | u32     | wraps at 2^32                  |
//! | 8      | `steer_permille` | i16     | [-1000, 1000]                  |
//! | 10     | `power_permille` | i16     | [-1000, 1000]                  |
//! | 12     | flags            | u16     | bit 0 = enable, rest reserved  |
//! | 14     | reserved         | u16     | always 0 on encode             |

use thiserror::Error;

/// Protocol magic marker, the first four bytes of every packet.
pub const MAGIC: [u8; 4] = *b"IRL1";

/// Total packet length in bytes.
pub const PACKET_LEN: usize = 16;

/// Flag bit 0: drive outputs enabled.
pub const FLAG_ENABLE: u16 = 0x0001;

/// A single control command as it travels on the wire.
///
/// The reserved trailing u16 is not represented here; [`CommandPacket::encode`]
/// always writes it as zero and [`CommandPacket::decode`] ignores it, matching
/// the vehicle daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandPacket {
    /// Monotonically increasing, wraps at 2^32.
    pub sequence: u32,
    /// Steering in permille, negative = left.
    pub steer_permille: i16,
    /// Signed power in permille; braking and reverse share the negative range.
    pub power_permille: i16,
    /// Bit 0 = enable; remaining bits must be zero.
    pub flags: u16,
}

/// Errors produced by [`CommandPacket::decode`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Buffer shorter than [`PACKET_LEN`].
    #[error("packet too short: {len} bytes, expected at least {PACKET_LEN}")]
    TooShort {
        /// Length of the rejected buffer.
        len: usize,
    },
    /// First four bytes were not [`MAGIC`].
    #[error("bad magic {found:02x?}")]
    BadMagic {
        /// The four bytes found in place of the magic marker.
        found: [u8; 4],
    },
}

impl CommandPacket {
    /// Builds a packet with the enable flag mapped onto flag bit 0.
    pub fn new(sequence: u32, steer_permille: i16, power_permille: i16, enabled: bool) -> Self {
        Self {
            sequence,
            steer_permille,
            power_permille,
            flags: if enabled { FLAG_ENABLE } else { 0 },
        }
    }

    /// Whether the enable bit is set.
    pub fn enabled(&self) -> bool {
        self.flags & FLAG_ENABLE != 0
    }

    /// Encodes into the fixed 16-byte wire representation.
    ///
    /// Pure and total: every in-range packet encodes, there is no error path.
    pub fn encode(&self) -> [u8; PACKET_LEN] {
        let mut buf = [0u8; PACKET_LEN];
        buf[0..4].copy_from_slice(&MAGIC);
        buf[4..8].copy_from_slice(&self.sequence.to_be_bytes());
        buf[8..10].copy_from_slice(&self.steer_permille.to_be_bytes());
        buf[10..12].copy_from_slice(&self.power_permille.to_be_bytes());
        buf[12..14].copy_from_slice(&self.flags.to_be_bytes());
        // bytes 14..16 stay zero: reserved
        buf
    }

    /// Decodes the first [`PACKET_LEN`] bytes of `data`.
    ///
    /// Trailing bytes beyond the packet are ignored, as the vehicle daemon
    /// does with oversized datagrams.
    ///
    /// # Errors
    ///
    /// [`DecodeError::TooShort`] if fewer than 16 bytes are present,
    /// [`DecodeError::BadMagic`] if the marker does not match.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < PACKET_LEN {
            return Err(DecodeError::TooShort { len: data.len() });
        }
        let found = [data[0], data[1], data[2], data[3]];
        if found != MAGIC {
            return Err(DecodeError::BadMagic { found });
        }
        Ok(Self {
            sequence: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            steer_permille: i16::from_be_bytes([data[8], data[9]]),
            power_permille: i16::from_be_bytes([data[10], data[11]]),
            flags: u16::from_be_bytes([data[12], data[13]]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_known_bytes() {
        let pkt = CommandPacket {
            sequence: 1,
            steer_permille: -1000,
            power_permille: 500,
            flags: FLAG_ENABLE,
        };
        let bytes = pkt.encode();
        assert_eq!(&bytes[0..4], b"IRL1");
        assert_eq!(&bytes[4..8], &[0x00, 0x00, 0x00, 0x01]);
        // -1000 = 0xFC18 big-endian
        assert_eq!(&bytes[8..10], &[0xFC, 0x18]);
        assert_eq!(&bytes[10..12], &[0x01, 0xF4]);
        assert_eq!(&bytes[12..14], &[0x00, 0x01]);
        assert_eq!(&bytes[14..16], &[0x00, 0x00]);
    }

    #[test]
    fn test_round_trip_representative() {
        for pkt in [
            CommandPacket::new(0, 0, 0, false),
            CommandPacket::new(42, -1000, 1000, true),
            CommandPacket::new(7, 1000, -1000, false),
            CommandPacket::new(u32::MAX, i16::MIN, i16::MAX, true),
        ] {
            let decoded = CommandPacket::decode(&pkt.encode()).expect("decode");
            assert_eq!(decoded, pkt);
        }
    }

    #[test]
    fn test_sequence_wraparound() {
        let pkt = CommandPacket::new(u32::MAX, 0, 0, true);
        let decoded = CommandPacket::decode(&pkt.encode()).expect("decode");
        assert_eq!(decoded.sequence, u32::MAX);
        assert_eq!(decoded.sequence.wrapping_add(1), 0);
    }

    #[test]
    fn test_decode_too_short() {
        let result = CommandPacket::decode(&[0u8; 15]);
        assert_eq!(result, Err(DecodeError::TooShort { len: 15 }));
    }

    #[test]
    fn test_decode_bad_magic() {
        let mut bytes = CommandPacket::new(1, 0, 0, false).encode();
        bytes[0] = b'X';
        let result = CommandPacket::decode(&bytes);
        assert!(matches!(result, Err(DecodeError::BadMagic { .. })));
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let mut data = CommandPacket::new(9, 100, -100, true).encode().to_vec();
        data.extend_from_slice(&[0xDE, 0xAD]);
        let decoded = CommandPacket::decode(&data).expect("decode");
        assert_eq!(decoded.sequence, 9);
    }

    #[test]
    fn test_enable_flag_mapping() {
        assert_eq!(CommandPacket::new(0, 0, 0, true).flags & FLAG_ENABLE, 1);
        assert_eq!(CommandPacket::new(0, 0, 0, false).flags & FLAG_ENABLE, 0);
        assert!(CommandPacket::new(0, 0, 0, true).enabled());
        assert!(!CommandPacket::new(0, 0, 0, false).enabled());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(500))]

        #[test]
        fn prop_round_trip(
            sequence in any::<u32>(),
            steer in -1000i16..=1000i16,
            power in -1000i16..=1000i16,
            flags in any::<u16>(),
        ) {
            let pkt = CommandPacket { sequence, steer_permille: steer, power_permille: power, flags };
            let decoded = CommandPacket::decode(&pkt.encode());
            prop_assert_eq!(decoded, Ok(pkt));
        }

        #[test]
        fn prop_encode_is_fixed_length_with_magic(
            sequence in any::<u32>(),
            steer in any::<i16>(),
            power in any::<i16>(),
            enabled in any::<bool>(),
        ) {
            let bytes = CommandPacket::new(sequence, steer, power, enabled).encode();
            prop_assert_eq!(bytes.len(), PACKET_LEN);
            prop_assert_eq!(&bytes[0..4], &MAGIC[..]);
            prop_assert_eq!(&bytes[14..16], &[0u8, 0u8][..]);
        }

        #[test]
        fn prop_short_buffers_rejected(len in 0usize..PACKET_LEN) {
            let data = vec![0u8; len];
            prop_assert_eq!(CommandPacket::decode(&data), Err(DecodeError::TooShort { len }));
        }
    }
}
