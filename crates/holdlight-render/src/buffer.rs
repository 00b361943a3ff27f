//! Persistent per-universe DMX byte buffers
//!
//! DMX transports send whole universes. Buffers survive across frames so a
//! pixel that is not live this frame keeps the last value written for it.

use std::collections::BTreeMap;

use holdlight_core::{Panel, DMX_UNIVERSE_SIZE};

/// One universe worth of channel values
pub type UniverseData = [u8; DMX_UNIVERSE_SIZE];

#[derive(Debug, Clone, Default)]
pub struct UniverseBuffers {
    buffers: BTreeMap<u16, UniverseData>,
}

impl UniverseBuffers {
    /// Preallocate zeroed buffers for universes `0..universes`.
    pub fn new(universes: u16) -> Self {
        Self {
            buffers: (0..universes)
                .map(|u| (u, [0u8; DMX_UNIVERSE_SIZE]))
                .collect(),
        }
    }

    /// Write red/green/blue of every live pixel at channel, channel+1,
    /// channel+2. A universe seen for the first time starts zeroed.
    pub fn fill(&mut self, panel: &Panel) {
        for (_, pixel) in panel.live_pixels() {
            let address = pixel.address();
            let Some(channel) = address.channel() else {
                continue;
            };
            if !address.fits_rgb() {
                continue;
            }
            let start = channel as usize;
            let buffer = self
                .buffers
                .entry(address.universe)
                .or_insert([0u8; DMX_UNIVERSE_SIZE]);
            buffer[start..start + 3].copy_from_slice(&[
                pixel.color.red,
                pixel.color.green,
                pixel.color.blue,
            ]);
        }
    }

    pub fn get(&self, universe: u16) -> Option<&UniverseData> {
        self.buffers.get(&universe)
    }

    /// Buffers in ascending universe order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &UniverseData)> + '_ {
        self.buffers.iter().map(|(u, data)| (*u, data))
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}
