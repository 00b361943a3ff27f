//! DMX over a serial line
//!
//! A DMX frame on a plain UART: the break is produced by writing one zero
//! byte at half the baud rate, then the start code (zero) and the 512 data
//! bytes go out at full rate. The line is 8 data bits, no parity, two stop
//! bits.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use holdlight_core::Panel;

use crate::{
    buffer::{UniverseBuffers, UniverseData},
    error::{RenderError, Result},
    Renderer,
};

const TRANSPORT: &str = "serial-dmx";

/// DMX512 line rate
pub const DMX_BAUD_RATE: u32 = 250_000;
pub const DATA_BITS: u8 = 8;
pub const STOP_BITS: u8 = 2;

const BREAK: [u8; 1] = [0];
const START_CODE: [u8; 1] = [0];

/// The operations the DMX framing needs from a serial port.
pub trait SerialLine: Send {
    fn set_baud_rate(&mut self, baud_rate: u32) -> io::Result<()>;
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Serial port parameters, fixed for a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    pub device: PathBuf,
    pub baud_rate: u32,
    pub timeout_ms: u64,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            device: PathBuf::from("/dev/ttyAMA0"),
            baud_rate: DMX_BAUD_RATE,
            timeout_ms: 3000,
        }
    }
}

impl SerialSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

pub struct SerialDmxRenderer<L: SerialLine> {
    line: L,
    baud_rate: u32,
    buffers: UniverseBuffers,
}

impl<L: SerialLine> SerialDmxRenderer<L> {
    pub fn new(line: L, baud_rate: u32, universes: u16) -> Result<Self> {
        if baud_rate < 2 {
            return Err(RenderError::Validation(format!(
                "baud rate {} is too low for a DMX break",
                baud_rate
            )));
        }
        Ok(Self {
            line,
            baud_rate,
            buffers: UniverseBuffers::new(universes),
        })
    }

    pub fn line(&self) -> &L {
        &self.line
    }

    pub fn buffers(&self) -> &UniverseBuffers {
        &self.buffers
    }
}

fn send_frame<L: SerialLine>(line: &mut L, baud_rate: u32, data: &UniverseData) -> io::Result<()> {
    line.set_baud_rate(baud_rate / 2)?;
    line.write_all(&BREAK)?;
    line.set_baud_rate(baud_rate)?;
    line.write_all(&START_CODE)?;
    line.write_all(data)?;
    line.flush()
}

impl<L: SerialLine> Renderer for SerialDmxRenderer<L> {
    fn render(&mut self, panel: &Panel) -> Result<()> {
        self.buffers.fill(panel);
        for (universe, data) in self.buffers.iter() {
            send_frame(&mut self.line, self.baud_rate, data)
                .map_err(|e| RenderError::transport(TRANSPORT, e))?;
            tracing::trace!("Wrote DMX frame for universe {}", universe);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        TRANSPORT
    }
}

#[cfg(feature = "serial")]
mod port {
    use super::*;
    use serialport::{DataBits, Parity, SerialPort, StopBits};

    /// A real serial device opened with the DMX line settings
    pub struct SerialPortLine(Box<dyn SerialPort>);

    impl SerialLine for SerialPortLine {
        fn set_baud_rate(&mut self, baud_rate: u32) -> io::Result<()> {
            self.0.set_baud_rate(baud_rate).map_err(io::Error::from)
        }

        fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
            io::Write::write_all(&mut self.0, bytes)
        }

        fn flush(&mut self) -> io::Result<()> {
            io::Write::flush(&mut self.0)
        }
    }

    /// Open the configured device. Failure here is a startup error.
    pub fn open(settings: &SerialSettings, universes: u16) -> Result<SerialDmxRenderer<SerialPortLine>> {
        let path = settings.device.to_string_lossy();
        let port = serialport::new(path.as_ref(), settings.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::Two)
            .timeout(settings.timeout())
            .open()
            .map_err(|e| RenderError::transport(TRANSPORT, io::Error::from(e)))?;
        tracing::info!("Opened serial DMX port {} at {} baud", path, settings.baud_rate);
        SerialDmxRenderer::new(SerialPortLine(port), settings.baud_rate, universes)
    }
}

#[cfg(feature = "serial")]
pub use port::{open, SerialPortLine};
