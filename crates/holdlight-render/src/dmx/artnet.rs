//! Art-Net protocol encoding (Art-Net 4, OpDmx)
//!
//! Art-Net is a UDP-based protocol for transmitting DMX512 over Ethernet.

use std::collections::HashMap;

use crate::buffer::UniverseData;

/// Default Art-Net UDP port
pub const ARTNET_PORT: u16 = 6454;

const HEADER_LEN: usize = 18;
const OP_DMX: u16 = 0x5000;
const PROTOCOL_VERSION: u16 = 14;

/// Build an Art-Net DMX packet (OpDmx) for one universe.
pub fn build_packet(universe: u16, sequence: u8, channels: &UniverseData) -> Vec<u8> {
    let mut packet = vec![0u8; HEADER_LEN + channels.len()];

    // Header: "Art-Net\0"
    packet[0..8].copy_from_slice(b"Art-Net\0");

    // OpCode (little-endian)
    packet[8..10].copy_from_slice(&OP_DMX.to_le_bytes());

    // Protocol version (big-endian)
    packet[10..12].copy_from_slice(&PROTOCOL_VERSION.to_be_bytes());

    packet[12] = sequence;

    // Physical port (0)
    packet[13] = 0;

    // Port-Address (little-endian)
    packet[14..16].copy_from_slice(&universe.to_le_bytes());

    // Data length (big-endian)
    packet[16..18].copy_from_slice(&(channels.len() as u16).to_be_bytes());

    packet[HEADER_LEN..].copy_from_slice(channels);
    packet
}

/// Per-universe sequence tracking for Art-Net output
#[derive(Debug, Default)]
pub struct ArtNetCodec {
    sequences: HashMap<u16, u8>,
}

impl ArtNetCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode the next packet for `universe`. Sequence numbers run 1..=255;
    /// 0 would tell receivers to disable reordering.
    pub fn encode(&mut self, universe: u16, channels: &UniverseData) -> Vec<u8> {
        let sequence = self.sequences.entry(universe).or_insert(0);
        *sequence = if *sequence == u8::MAX { 1 } else { *sequence + 1 };
        build_packet(universe, *sequence, channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdlight_core::DMX_UNIVERSE_SIZE;

    #[test]
    fn test_artnet_packet_structure() {
        let mut channels = [0u8; DMX_UNIVERSE_SIZE];
        channels[0] = 0xAB;
        let packet = build_packet(0x0102, 7, &channels);

        assert_eq!(&packet[0..8], b"Art-Net\0");

        // OpCode (little-endian)
        assert_eq!(packet[8], 0x00);
        assert_eq!(packet[9], 0x50);

        // Protocol version (big-endian)
        assert_eq!(packet[10], 0);
        assert_eq!(packet[11], 14);

        assert_eq!(packet[12], 7);
        assert_eq!(&packet[14..16], &[0x02, 0x01]);

        // Length (big-endian)
        assert_eq!(packet[16], 0x02);
        assert_eq!(packet[17], 0x00);

        assert_eq!(packet[18], 0xAB);
        assert_eq!(packet.len(), 18 + 512);
    }

    #[test]
    fn test_sequence_per_universe() {
        let mut codec = ArtNetCodec::new();
        let channels = [0u8; DMX_UNIVERSE_SIZE];

        assert_eq!(codec.encode(0, &channels)[12], 1);
        assert_eq!(codec.encode(0, &channels)[12], 2);
        assert_eq!(codec.encode(1, &channels)[12], 1);
    }

    #[test]
    fn test_sequence_skips_zero() {
        let mut codec = ArtNetCodec::new();
        codec.sequences.insert(0, 254);
        let channels = [0u8; DMX_UNIVERSE_SIZE];

        assert_eq!(codec.encode(0, &channels)[12], 255);
        assert_eq!(codec.encode(0, &channels)[12], 1);
    }
}
