//! Bit-banged WS2812 output
//!
//! Each live pixel becomes a 24-bit GRB word sent most significant bit
//! first. A bit is a HIGH pulse followed by a LOW gap whose widths encode
//! 0 or 1; after the last pixel on a pin the line is held LOW long enough
//! for the strip to latch.
//!
//! Pulse widths are a few hundred nanoseconds, so the frame is emitted from
//! a prepared word list with no logging or allocation between the first and
//! the last pulse.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use holdlight_core::{Color, Panel};

use crate::{
    error::{RenderError, Result},
    Renderer,
};

const TRANSPORT: &str = "ws2812";
const BITS_PER_PIXEL: u32 = 24;

/// Pulse widths in nanoseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ws2812Timing {
    pub zero_high_ns: u32,
    pub zero_low_ns: u32,
    pub one_high_ns: u32,
    pub one_low_ns: u32,
    pub reset_ns: u32,
}

impl Default for Ws2812Timing {
    fn default() -> Self {
        Self {
            zero_high_ns: 350,
            zero_low_ns: 800,
            one_high_ns: 700,
            one_low_ns: 600,
            reset_ns: 55_000,
        }
    }
}

/// Pack a color as `(green << 16) | (red << 8) | blue`.
pub fn encode_grb(color: Color) -> u32 {
    ((color.green as u32) << 16) | ((color.red as u32) << 8) | color.blue as u32
}

/// Pins a panel's universe-0 channels name, for when none are configured.
pub fn panel_pins(panel: &Panel) -> Vec<u16> {
    panel
        .addresses_by_universe()
        .remove(&0)
        .unwrap_or_default()
}

/// Busy-waiting delay. Sleeping would hand the thread back to the
/// scheduler, whose wakeup latency is far longer than a pulse.
///
/// Spinning only covers timer granularity. The kernel can still preempt the
/// runner thread mid-pixel, and a gap longer than the reset window latches a
/// partial frame. For clean output run under a real-time policy on an
/// isolated core, e.g. `chrt -f 80 taskset -c 3 holdlight run`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpinDelay;

impl DelayNs for SpinDelay {
    fn delay_ns(&mut self, ns: u32) {
        let deadline = Instant::now() + Duration::from_nanos(ns as u64);
        while Instant::now() < deadline {
            std::hint::spin_loop();
        }
    }
}

pub struct Ws2812Renderer<P, D> {
    pins: BTreeMap<u16, P>,
    words: BTreeMap<u16, Vec<u32>>,
    delay: D,
    timing: Ws2812Timing,
}

impl<P, D> Ws2812Renderer<P, D>
where
    P: OutputPin + Send,
    D: DelayNs + Send,
{
    /// `pins` maps GPIO numbers (the pixel channel) to output pins.
    pub fn new(
        pins: impl IntoIterator<Item = (u16, P)>,
        delay: D,
        timing: Ws2812Timing,
    ) -> Result<Self> {
        let pins: BTreeMap<u16, P> = pins.into_iter().collect();
        if pins.is_empty() {
            return Err(RenderError::Validation(
                "WS2812 renderer needs at least one pin".to_string(),
            ));
        }
        let words = pins.keys().map(|&pin| (pin, Vec::new())).collect();
        tracing::info!(
            "WS2812 renderer on GPIO {:?}",
            pins.keys().collect::<Vec<_>>()
        );
        Ok(Self {
            pins,
            words,
            delay,
            timing,
        })
    }

    pub fn timing(&self) -> &Ws2812Timing {
        &self.timing
    }

    /// Validate the frame and queue one word per live pixel on its pin.
    fn prepare(&mut self, panel: &Panel) -> Result<()> {
        for queue in self.words.values_mut() {
            queue.clear();
        }
        for (location, pixel) in panel.live_pixels() {
            let address = pixel.address();
            if address.universe != 0 {
                return Err(RenderError::InvalidUniverseAccess {
                    universe: address.universe,
                    location,
                });
            }
            let pin = address.channel().unwrap_or_default();
            let Some(queue) = self.words.get_mut(&pin) else {
                return Err(RenderError::ChannelOutOfRange {
                    channel: pin,
                    available: self.pins.len(),
                });
            };
            queue.push(encode_grb(pixel.color));
        }
        Ok(())
    }
}

/// Pulse out pre-encoded words. No allocation, locking or logging in here.
fn emit<P: OutputPin, D: DelayNs>(
    pin: &mut P,
    delay: &mut D,
    timing: &Ws2812Timing,
    words: &[u32],
) -> std::result::Result<(), P::Error> {
    for word in words {
        for bit in (0..BITS_PER_PIXEL).rev() {
            let (high, low) = if (word >> bit) & 1 == 1 {
                (timing.one_high_ns, timing.one_low_ns)
            } else {
                (timing.zero_high_ns, timing.zero_low_ns)
            };
            pin.set_high()?;
            delay.delay_ns(high);
            pin.set_low()?;
            delay.delay_ns(low);
        }
    }
    pin.set_low()?;
    delay.delay_ns(timing.reset_ns);
    Ok(())
}

impl<P, D> Renderer for Ws2812Renderer<P, D>
where
    P: OutputPin + Send,
    D: DelayNs + Send,
{
    fn render(&mut self, panel: &Panel) -> Result<()> {
        self.prepare(panel)?;

        let Self {
            pins,
            words,
            delay,
            timing,
        } = self;
        for (number, pin) in pins.iter_mut() {
            let queue = match words.get(number) {
                Some(queue) if !queue.is_empty() => queue,
                _ => continue,
            };
            emit(pin, delay, timing, queue).map_err(|e| RenderError::hardware(TRANSPORT, e))?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        TRANSPORT
    }
}
