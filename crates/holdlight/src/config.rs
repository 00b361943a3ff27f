//! TOML configuration
//!
//! ```toml
//! [log]
//! level = "debug"
//!
//! [runner]
//! interval_ms = 30
//!
//! [panel]
//! source = "file"
//! path = "wall.txt"
//!
//! [renderer]
//! kind = "network"
//! protocol = "sacn"
//! universes = 2
//!
//! [fill]
//! kind = "cycle_hue"
//! step = 20.0
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use holdlight_control::{FillKind, RunnerConfig};
use holdlight_core::LogConfig;
use holdlight_render::{DmxProtocol, SerialSettings, Ws2812Timing};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log: LogConfig,
    pub runner: RunnerConfig,
    pub panel: PanelSource,
    pub renderer: RendererConfig,
    pub fill: FillKind,
}

impl AppConfig {
    /// Read a config file. A missing file is an error, not a default config.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::parse(&text).with_context(|| format!("Invalid config file {:?}", path))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Where the panel comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum PanelSource {
    File {
        path: PathBuf,
        #[serde(default)]
        panel_id: Option<i32>,
    },
    Random {
        #[serde(default = "default_side")]
        width: i32,
        #[serde(default = "default_side")]
        height: i32,
        #[serde(default = "default_pixels")]
        pixels: usize,
        #[serde(default = "default_true")]
        live: bool,
        #[serde(default)]
        seed: Option<u64>,
    },
    Blank {
        #[serde(default = "default_side")]
        width: i32,
        #[serde(default = "default_side")]
        height: i32,
    },
}

impl Default for PanelSource {
    fn default() -> Self {
        Self::Random {
            width: default_side(),
            height: default_side(),
            pixels: default_pixels(),
            live: true,
            seed: None,
        }
    }
}

/// Transport and its session-fixed parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RendererConfig {
    Network {
        #[serde(default)]
        protocol: DmxProtocol,
        /// Unicast/broadcast destination. Art-Net defaults to broadcast,
        /// sACN to per-universe multicast.
        #[serde(default)]
        target: Option<SocketAddr>,
        #[serde(default = "default_bind")]
        bind: SocketAddr,
        #[serde(default = "default_universes")]
        universes: u16,
        #[serde(default = "default_source_name")]
        source_name: String,
        #[serde(default = "default_priority")]
        priority: u8,
    },
    Serial {
        #[serde(default)]
        port: SerialSettings,
        #[serde(default = "default_universes")]
        universes: u16,
    },
    GpioPwm {
        pins: Vec<u16>,
        #[serde(default = "default_frequency")]
        frequency_hz: f64,
    },
    Ws2812 {
        /// GPIO numbers; taken from the panel's universe-0 channels if unset
        #[serde(default)]
        pins: Option<Vec<u16>>,
        #[serde(default)]
        timing: Ws2812Timing,
    },
    Text {
        #[serde(default)]
        debug: bool,
    },
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self::Text { debug: false }
    }
}

fn default_side() -> i32 {
    10
}

fn default_pixels() -> usize {
    20
}

fn default_true() -> bool {
    true
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 0))
}

fn default_universes() -> u16 {
    1
}

fn default_source_name() -> String {
    "holdlight".to_string()
}

fn default_priority() -> u8 {
    100
}

fn default_frequency() -> f64 {
    holdlight_render::pwm::DEFAULT_FREQUENCY_HZ
}
