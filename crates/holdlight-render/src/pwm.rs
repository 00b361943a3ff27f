//! GPIO PWM output
//!
//! One pixel drives three consecutive PWM outputs (red, green, blue) whose
//! duty cycle is `value / 255`. Only universe 0 exists on this transport.

use embedded_hal::pwm::SetDutyCycle;

use holdlight_core::Panel;

use crate::{
    error::{RenderError, Result},
    Renderer,
};

const TRANSPORT: &str = "gpio-pwm";

/// Default PWM frequency for the Raspberry Pi software backend
pub const DEFAULT_FREQUENCY_HZ: f64 = 50.0;

pub struct GpioPwmRenderer<P> {
    outputs: Vec<P>,
}

impl<P: SetDutyCycle + Send> GpioPwmRenderer<P> {
    pub fn new(outputs: Vec<P>) -> Result<Self> {
        if outputs.is_empty() {
            return Err(RenderError::Validation(
                "PWM renderer needs at least one output".to_string(),
            ));
        }
        tracing::info!("PWM renderer driving {} output(s)", outputs.len());
        Ok(Self { outputs })
    }

    pub fn outputs(&self) -> &[P] {
        &self.outputs
    }

    /// Reject pixels this transport cannot show. Runs before any output
    /// is touched so a bad frame leaves the hardware as it was.
    fn check(&self, panel: &Panel) -> Result<()> {
        for (location, pixel) in panel.live_pixels() {
            let address = pixel.address();
            if address.universe != 0 {
                return Err(RenderError::InvalidUniverseAccess {
                    universe: address.universe,
                    location,
                });
            }
            let channel = address.channel().unwrap_or_default();
            if channel as usize + 2 >= self.outputs.len() {
                return Err(RenderError::ChannelOutOfRange {
                    channel: channel + 2,
                    available: self.outputs.len(),
                });
            }
        }
        Ok(())
    }
}

impl<P: SetDutyCycle + Send> Renderer for GpioPwmRenderer<P> {
    fn render(&mut self, panel: &Panel) -> Result<()> {
        self.check(panel)?;

        for (_, pixel) in panel.live_pixels() {
            let channel = pixel.address().channel().unwrap_or_default() as usize;
            let (red, green, blue, _) = pixel.color.rgba();
            for (output, value) in self.outputs[channel..channel + 3]
                .iter_mut()
                .zip([red, green, blue])
            {
                output
                    .set_duty_cycle_fraction(value as u16, u8::MAX as u16)
                    .map_err(|e| RenderError::hardware(TRANSPORT, e))?;
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        TRANSPORT
    }
}
