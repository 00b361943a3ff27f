//! Raspberry Pi GPIO backends
//!
//! Opens BCM pins through `rppal`. PWM outputs use rppal's software PWM, so
//! any GPIO can carry a color channel.

use embedded_hal::pwm::{ErrorKind, ErrorType, SetDutyCycle};
use rppal::gpio::{Gpio, OutputPin};

use crate::error::{RenderError, Result};

const TRANSPORT: &str = "rpi-gpio";
const DUTY_RESOLUTION: u16 = 10_000;

#[derive(Debug)]
pub struct SoftPwmError(rppal::gpio::Error);

impl embedded_hal::pwm::Error for SoftPwmError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// A GPIO pin driven by software PWM at a fixed frequency
pub struct SoftPwm {
    pin: OutputPin,
    frequency_hz: f64,
}

impl ErrorType for SoftPwm {
    type Error = SoftPwmError;
}

impl SetDutyCycle for SoftPwm {
    fn max_duty_cycle(&self) -> u16 {
        DUTY_RESOLUTION
    }

    fn set_duty_cycle(&mut self, duty: u16) -> std::result::Result<(), Self::Error> {
        let fraction = duty.min(DUTY_RESOLUTION) as f64 / DUTY_RESOLUTION as f64;
        self.pin
            .set_pwm_frequency(self.frequency_hz, fraction)
            .map_err(SoftPwmError)
    }
}

fn output(gpio: &Gpio, number: u16) -> Result<OutputPin> {
    let bcm = u8::try_from(number)
        .map_err(|_| RenderError::Validation(format!("GPIO {} does not exist", number)))?;
    let pin = gpio
        .get(bcm)
        .map_err(|e| RenderError::hardware(TRANSPORT, e))?;
    Ok(pin.into_output_low())
}

/// Open `pins` (BCM numbering) as software PWM outputs.
pub fn open_pwm_outputs(pins: &[u16], frequency_hz: f64) -> Result<Vec<SoftPwm>> {
    let gpio = Gpio::new().map_err(|e| RenderError::hardware(TRANSPORT, e))?;
    let outputs = pins
        .iter()
        .map(|&number| {
            output(&gpio, number).map(|pin| SoftPwm { pin, frequency_hz })
        })
        .collect::<Result<Vec<_>>>()?;
    tracing::info!("Opened {} PWM pin(s) at {} Hz", outputs.len(), frequency_hz);
    Ok(outputs)
}

/// Open `pins` (BCM numbering) as plain outputs keyed by GPIO number.
pub fn open_output_pins(pins: &[u16]) -> Result<Vec<(u16, OutputPin)>> {
    let gpio = Gpio::new().map_err(|e| RenderError::hardware(TRANSPORT, e))?;
    pins.iter()
        .map(|&number| output(&gpio, number).map(|pin| (number, pin)))
        .collect()
}
