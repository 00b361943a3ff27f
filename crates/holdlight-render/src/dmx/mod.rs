//! DMX-over-IP packet encoding
//!
//! ## Art-Net
//!
//! UDP to a configured target (often broadcast `255.255.255.255:6454`),
//! 32768 universes, sequence numbering.
//!
//! ## sACN (E1.31)
//!
//! UDP multicast to `239.255.hi.lo:5568` per universe (or a unicast target),
//! priority and sequence numbering.

pub mod artnet;
pub mod sacn;

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

pub use artnet::ArtNetCodec;
pub use sacn::SacnCodec;

use crate::{buffer::UniverseData, error::Result};

/// Which DMX-over-IP protocol a network renderer speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DmxProtocol {
    #[default]
    ArtNet,
    Sacn,
}

/// Protocol state plus destination resolution
#[derive(Debug)]
pub enum PacketCodec {
    ArtNet {
        codec: ArtNetCodec,
        target: SocketAddr,
    },
    Sacn {
        codec: SacnCodec,
        /// Unicast destination; multicast per universe when `None`
        target: Option<SocketAddr>,
    },
}

impl PacketCodec {
    pub fn artnet(target: SocketAddr) -> Self {
        Self::ArtNet {
            codec: ArtNetCodec::new(),
            target,
        }
    }

    pub fn sacn(source_name: &str, target: Option<SocketAddr>) -> Self {
        Self::Sacn {
            codec: SacnCodec::new(source_name),
            target,
        }
    }

    pub fn protocol(&self) -> DmxProtocol {
        match self {
            Self::ArtNet { .. } => DmxProtocol::ArtNet,
            Self::Sacn { .. } => DmxProtocol::Sacn,
        }
    }

    /// Encode one universe and pick where it goes.
    pub fn encode(&mut self, universe: u16, channels: &UniverseData) -> Result<(Vec<u8>, SocketAddr)> {
        match self {
            Self::ArtNet { codec, target } => Ok((codec.encode(universe, channels), *target)),
            Self::Sacn { codec, target } => {
                let packet = codec.encode(universe, channels)?;
                let destination = match target {
                    Some(target) => *target,
                    None => sacn::multicast_addr(sacn::wire_universe(universe)?),
                };
                Ok((packet, destination))
            }
        }
    }
}
