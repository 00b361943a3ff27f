//! Holdlight Render - Pixel Transports
//!
//! Turns a [`Panel`] snapshot into output on one transport:
//! - **Network DMX**: Art-Net or sACN over UDP
//! - **Serial DMX**: DMX512 framing on a UART
//! - **GPIO PWM**: three PWM outputs per pixel
//! - **WS2812**: bit-banged single-wire LED strips
//! - **Text**: terminal preview
//!
//! Every transport implements [`Renderer`], so the frame loop is written once
//! and the transport is picked from configuration.

#![allow(missing_docs)]

pub mod buffer;
pub mod dmx;
pub mod error;
pub mod network;
pub mod pwm;
#[cfg(feature = "rpi")]
pub mod rpi;
pub mod serial;
pub mod text;
pub mod ws2812;

use holdlight_core::Panel;

pub use buffer::{UniverseBuffers, UniverseData};
pub use dmx::{DmxProtocol, PacketCodec};
pub use error::{RenderError, Result};
pub use network::NetworkDmxRenderer;
pub use pwm::GpioPwmRenderer;
pub use serial::{SerialDmxRenderer, SerialLine, SerialSettings};
pub use text::TextRenderer;
pub use ws2812::{SpinDelay, Ws2812Renderer, Ws2812Timing};

/// Output stage of the frame loop.
///
/// `render` reads the panel and must not change it. It returns once the
/// frame has been handed to the transport; an error means the frame is lost
/// and is never retried here.
pub trait Renderer: Send {
    fn render(&mut self, panel: &Panel) -> Result<()>;

    /// Short transport name for logs
    fn name(&self) -> &'static str;
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn render(&mut self, panel: &Panel) -> Result<()> {
        (**self).render(panel)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
