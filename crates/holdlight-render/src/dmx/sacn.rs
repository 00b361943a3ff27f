//! sACN (E1.31) protocol encoding
//!
//! sACN (Streaming ACN) transmits DMX512 over IP multicast. E1.31 universes
//! start at 1, so panel universe `u` is sent as sACN universe `u + 1`.

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use uuid::Uuid;

use crate::{
    buffer::UniverseData,
    error::{RenderError, Result},
};

/// sACN UDP port
pub const SACN_PORT: u16 = 5568;

/// Largest E1.31 universe number
pub const MAX_SACN_UNIVERSE: u16 = 63999;

const PACKET_LEN: usize = 638;
const ACN_PACKET_IDENTIFIER: [u8; 12] = [
    0x41, 0x53, 0x43, 0x2d, 0x45, 0x31, 0x2e, 0x31, 0x37, 0x00, 0x00, 0x00,
];
const DEFAULT_PRIORITY: u8 = 100;

/// Multicast group for an E1.31 universe: 239.255.hi.lo
pub fn multicast_addr(wire_universe: u16) -> SocketAddr {
    let [hi, lo] = wire_universe.to_be_bytes();
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(239, 255, hi, lo), SACN_PORT))
}

/// Map a panel universe to its E1.31 universe number.
pub fn wire_universe(universe: u16) -> Result<u16> {
    match universe.checked_add(1) {
        Some(wire) if wire <= MAX_SACN_UNIVERSE => Ok(wire),
        _ => Err(RenderError::Validation(format!(
            "universe {} exceeds the sACN range",
            universe
        ))),
    }
}

/// Stateful sACN encoder: component id, source name, priority and
/// per-universe sequence numbers.
#[derive(Debug)]
pub struct SacnCodec {
    cid: [u8; 16],
    source_name: String,
    priority: u8,
    sequences: HashMap<u16, u8>,
}

impl SacnCodec {
    pub fn new(source_name: &str) -> Self {
        Self {
            cid: *Uuid::new_v4().as_bytes(),
            source_name: source_name.to_string(),
            priority: DEFAULT_PRIORITY,
            sequences: HashMap::new(),
        }
    }

    /// Set the priority (0-200, default 100)
    pub fn set_priority(&mut self, priority: u8) {
        self.priority = priority.min(200);
    }

    /// Encode the next packet for a panel universe.
    pub fn encode(&mut self, universe: u16, channels: &UniverseData) -> Result<Vec<u8>> {
        let wire = wire_universe(universe)?;
        let slot = self.sequences.entry(wire).or_insert(0);
        *slot = slot.wrapping_add(1);
        let sequence = *slot;
        Ok(self.build_packet(wire, sequence, channels))
    }

    fn build_packet(&self, wire_universe: u16, sequence: u8, channels: &UniverseData) -> Vec<u8> {
        let mut packet = vec![0u8; PACKET_LEN];

        // Root Layer
        let mut offset = 0;

        // Preamble Size
        packet[offset..offset + 2].copy_from_slice(&0x0010u16.to_be_bytes());
        offset += 2;

        // Post-amble Size
        packet[offset..offset + 2].copy_from_slice(&0x0000u16.to_be_bytes());
        offset += 2;

        packet[offset..offset + 12].copy_from_slice(&ACN_PACKET_IDENTIFIER);
        offset += 12;

        // Flags and Length
        let root_length = (PACKET_LEN - 16) as u16;
        packet[offset..offset + 2].copy_from_slice(&(0x7000u16 | root_length).to_be_bytes());
        offset += 2;

        // VECTOR_ROOT_E131_DATA
        packet[offset..offset + 4].copy_from_slice(&0x00000004u32.to_be_bytes());
        offset += 4;

        packet[offset..offset + 16].copy_from_slice(&self.cid);
        offset += 16;

        // Framing Layer
        let framing_length = (PACKET_LEN - 38) as u16;
        packet[offset..offset + 2].copy_from_slice(&(0x7000u16 | framing_length).to_be_bytes());
        offset += 2;

        // VECTOR_E131_DATA_PACKET
        packet[offset..offset + 4].copy_from_slice(&0x00000002u32.to_be_bytes());
        offset += 4;

        // Source Name (64 bytes, null-terminated)
        let source_bytes = self.source_name.as_bytes();
        let copy_len = source_bytes.len().min(63);
        packet[offset..offset + copy_len].copy_from_slice(&source_bytes[..copy_len]);
        offset += 64;

        packet[offset] = self.priority;
        offset += 1;

        // Synchronization Address (none)
        packet[offset..offset + 2].copy_from_slice(&0x0000u16.to_be_bytes());
        offset += 2;

        packet[offset] = sequence;
        offset += 1;

        // Options
        packet[offset] = 0;
        offset += 1;

        packet[offset..offset + 2].copy_from_slice(&wire_universe.to_be_bytes());
        offset += 2;

        // DMP Layer
        let dmp_length = (PACKET_LEN - 115) as u16;
        packet[offset..offset + 2].copy_from_slice(&(0x7000u16 | dmp_length).to_be_bytes());
        offset += 2;

        // VECTOR_DMP_SET_PROPERTY
        packet[offset] = 0x02;
        offset += 1;

        // Address Type & Data Type
        packet[offset] = 0xa1;
        offset += 1;

        // First Property Address
        packet[offset..offset + 2].copy_from_slice(&0x0000u16.to_be_bytes());
        offset += 2;

        // Address Increment
        packet[offset..offset + 2].copy_from_slice(&0x0001u16.to_be_bytes());
        offset += 2;

        // Property value count: start code + 512 channels
        packet[offset..offset + 2].copy_from_slice(&513u16.to_be_bytes());
        offset += 2;

        // DMX Start Code
        packet[offset] = 0x00;
        offset += 1;

        packet[offset..offset + channels.len()].copy_from_slice(channels);

        packet
    }
}
