//! Holdlight Core - Pixel Data Model
//!
//! This crate contains the data model shared by every transport:
//! - **Color**: saturating RGBA with an HSV view
//! - **Address**: universe + channel, with an invalid sentinel
//! - **Pixel**: color, address, liveness and group
//! - **Panel**: pixels keyed by wall location, with a kd-tree for
//!   nearest-neighbor queries and per-universe channel usage
//! - **Layout**: the line-oriented panel file format
//! - **Logging**: log settings shared with the binary

#![allow(missing_docs)]

pub mod address;
pub mod color;
pub mod error;
pub mod layout;
pub mod logging;
pub mod panel;
pub mod pixel;
pub mod spatial;

pub use address::{Address, DMX_UNIVERSE_SIZE, INVALID_CHANNEL};
pub use color::{clamp_channel, Color};
pub use error::{CoreError, Result};
pub use logging::LogConfig;
pub use panel::{Location, Panel};
pub use pixel::Pixel;
