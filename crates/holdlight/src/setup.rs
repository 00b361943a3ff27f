//! Builds the panel and renderer a config describes

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::net::SocketAddr;
use tracing::info;

use holdlight_core::{layout, Panel};
use holdlight_render::dmx::{artnet::ARTNET_PORT, SacnCodec};
use holdlight_render::{DmxProtocol, NetworkDmxRenderer, PacketCodec, Renderer, TextRenderer};

use crate::config::{PanelSource, RendererConfig};

pub fn build_panel(source: &PanelSource) -> Result<Panel> {
    let panel = match source {
        PanelSource::File { path, panel_id } => match panel_id {
            Some(id) => layout::load_panel(path, *id),
            None => layout::load(path),
        }
        .with_context(|| format!("Failed to load layout {:?}", path))?,
        PanelSource::Random {
            width,
            height,
            pixels,
            live,
            seed,
        } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(*seed),
                None => StdRng::from_os_rng(),
            };
            Panel::random(*width, *height, *pixels, *live, &mut rng)
                .context("Failed to build random panel")?
        }
        PanelSource::Blank { width, height } => {
            Panel::blank(*width, *height).context("Failed to build blank panel")?
        }
    };
    info!(
        "Panel ready: {} pixels, {}x{}",
        panel.len(),
        panel.width(),
        panel.height()
    );
    Ok(panel)
}

/// Open the configured transport. Must run outside any tokio runtime: the
/// network renderer brings its own.
pub fn build_renderer(config: &RendererConfig, panel: &Panel) -> Result<Box<dyn Renderer>> {
    let renderer: Box<dyn Renderer> = match config {
        RendererConfig::Network {
            protocol,
            target,
            bind,
            universes,
            source_name,
            priority,
        } => {
            let codec = match protocol {
                DmxProtocol::ArtNet => PacketCodec::artnet(
                    target.unwrap_or(SocketAddr::from(([255, 255, 255, 255], ARTNET_PORT))),
                ),
                DmxProtocol::Sacn => {
                    let mut codec = SacnCodec::new(source_name);
                    codec.set_priority(*priority);
                    PacketCodec::Sacn {
                        codec,
                        target: *target,
                    }
                }
            };
            Box::new(
                NetworkDmxRenderer::new(codec, *universes, *bind)
                    .context("Failed to open network DMX output")?,
            )
        }
        RendererConfig::Serial { port, universes } => hardware::serial(port, *universes)?,
        RendererConfig::GpioPwm { pins, frequency_hz } => hardware::pwm(pins, *frequency_hz)?,
        RendererConfig::Ws2812 { pins, timing } => {
            let pins = match pins {
                Some(pins) => pins.clone(),
                None => holdlight_render::ws2812::panel_pins(panel),
            };
            hardware::ws2812(&pins, *timing)?
        }
        RendererConfig::Text { debug } => Box::new(TextRenderer::new(std::io::stdout(), *debug)),
    };
    info!("Using {} renderer", renderer.name());
    Ok(renderer)
}

mod hardware {
    use super::*;
    use holdlight_render::{SerialSettings, Ws2812Timing};

    #[cfg(feature = "serial")]
    pub fn serial(port: &SerialSettings, universes: u16) -> Result<Box<dyn Renderer>> {
        let renderer = holdlight_render::serial::open(port, universes)
            .with_context(|| format!("Failed to open serial port {:?}", port.device))?;
        Ok(Box::new(renderer))
    }

    #[cfg(not(feature = "serial"))]
    pub fn serial(_port: &SerialSettings, _universes: u16) -> Result<Box<dyn Renderer>> {
        anyhow::bail!("serial output needs a build with the `serial` feature")
    }

    #[cfg(feature = "rpi")]
    pub fn pwm(pins: &[u16], frequency_hz: f64) -> Result<Box<dyn Renderer>> {
        let outputs = holdlight_render::rpi::open_pwm_outputs(pins, frequency_hz)
            .context("Failed to open PWM pins")?;
        Ok(Box::new(holdlight_render::GpioPwmRenderer::new(outputs)?))
    }

    #[cfg(not(feature = "rpi"))]
    pub fn pwm(_pins: &[u16], _frequency_hz: f64) -> Result<Box<dyn Renderer>> {
        anyhow::bail!("GPIO PWM output needs a build with the `rpi` feature")
    }

    #[cfg(feature = "rpi")]
    pub fn ws2812(pins: &[u16], timing: Ws2812Timing) -> Result<Box<dyn Renderer>> {
        if pins.is_empty() {
            anyhow::bail!("WS2812 output needs at least one pin");
        }
        let outputs =
            holdlight_render::rpi::open_output_pins(pins).context("Failed to open WS2812 pins")?;
        Ok(Box::new(holdlight_render::Ws2812Renderer::new(
            outputs,
            holdlight_render::SpinDelay,
            timing,
        )?))
    }

    #[cfg(not(feature = "rpi"))]
    pub fn ws2812(_pins: &[u16], _timing: Ws2812Timing) -> Result<Box<dyn Renderer>> {
        anyhow::bail!("WS2812 output needs a build with the `rpi` feature")
    }
}
