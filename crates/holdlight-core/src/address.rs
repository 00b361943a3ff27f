//! Transport address of a pixel (universe + channel offset)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of channels in one DMX universe
pub const DMX_UNIVERSE_SIZE: usize = 512;

/// Stored in place of an out-of-range channel
pub const INVALID_CHANNEL: i16 = -1;

/// Bytes a pixel occupies in its universe (red, green, blue)
pub const RGB_FOOTPRINT: usize = 3;

/// A universe/channel pair. Out-of-range channels are not an error: the
/// address stores [`INVALID_CHANNEL`] and reports itself as invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    pub universe: u16,
    channel: i16,
}

impl Address {
    /// Create an address, storing the sentinel if `channel` is outside `0..512`.
    pub fn new(universe: u16, channel: i32) -> Self {
        let mut address = Self {
            universe,
            channel: INVALID_CHANNEL,
        };
        address.set_channel(channel);
        address
    }

    /// An address that is never rendered.
    pub const fn invalid(universe: u16) -> Self {
        Self {
            universe,
            channel: INVALID_CHANNEL,
        }
    }

    pub fn set_channel(&mut self, channel: i32) {
        self.channel = if (0..DMX_UNIVERSE_SIZE as i32).contains(&channel) {
            channel as i16
        } else {
            INVALID_CHANNEL
        };
    }

    /// Raw stored channel, including the sentinel.
    pub fn raw_channel(&self) -> i16 {
        self.channel
    }

    /// Channel offset, or `None` for an invalid address.
    pub fn channel(&self) -> Option<u16> {
        self.is_valid().then_some(self.channel as u16)
    }

    pub fn is_valid(&self) -> bool {
        self.channel != INVALID_CHANNEL
    }

    /// True when all three color bytes fit inside the universe.
    pub fn fits_rgb(&self) -> bool {
        self.channel()
            .is_some_and(|channel| channel as usize + RGB_FOOTPRINT <= DMX_UNIVERSE_SIZE)
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::invalid(0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.universe, self.channel)
    }
}
