//! Panel layout file format
//!
//! One pixel per line, whitespace-separated integers:
//!
//! ```text
//! # universe channel x y
//! 0 0 10 3
//! # universe channel x y panel_id group_id
//! 0 3 10 2 1 0
//! ```
//!
//! The 4-field form is the legacy layout and belongs to panel 0. Blank lines
//! and lines starting with `#` are skipped. Every loaded pixel is live and
//! starts black.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::{
    address::Address,
    color::Color,
    error::{CoreError, Result},
    panel::{Location, Panel},
    pixel::Pixel,
};

const LEGACY_FIELDS: usize = 4;
const EXTENDED_FIELDS: usize = 6;

/// One parsed layout line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutEntry {
    pub universe: u16,
    pub channel: i32,
    pub location: Location,
    pub panel_id: i32,
    pub group: i32,
}

impl LayoutEntry {
    /// Parse a single non-comment line.
    pub fn parse(line: &str) -> Result<Self> {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.len() != LEGACY_FIELDS && words.len() != EXTENDED_FIELDS {
            return Err(CoreError::validation(format!(
                "expected {} or {} fields, found {}",
                LEGACY_FIELDS,
                EXTENDED_FIELDS,
                words.len()
            )));
        }

        let universe = field(&words, 0, "universe")?;
        let channel = field(&words, 1, "channel")?;
        let x = field(&words, 2, "x")?;
        let y = field(&words, 3, "y")?;
        let (panel_id, group) = if words.len() == EXTENDED_FIELDS {
            (field(&words, 4, "panel id")?, field(&words, 5, "group")?)
        } else {
            (0, 0)
        };

        Ok(Self {
            universe,
            channel,
            location: Location::new(x, y),
            panel_id,
            group,
        })
    }

    fn into_pixel(self) -> Result<Pixel> {
        Pixel::new(
            Color::BLACK,
            Address::new(self.universe, self.channel),
            true,
            self.group,
        )
    }
}

fn field<T: FromStr>(words: &[&str], index: usize, name: &str) -> Result<T> {
    words[index]
        .parse()
        .map_err(|_| CoreError::validation(format!("invalid {} '{}'", name, words[index])))
}

/// Parse layout text. With `panel_id`, only lines for that panel are kept.
pub fn parse(text: &str, panel_id: Option<i32>) -> Result<Panel> {
    let mut panel = Panel::new();
    for (number, line) in text.lines().enumerate() {
        let number = number + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let entry = LayoutEntry::parse(trimmed).map_err(|e| e.with_line(number))?;
        if panel_id.is_some_and(|id| id != entry.panel_id) {
            continue;
        }
        let pixel = entry.into_pixel().map_err(|e| e.with_line(number))?;
        if panel.contains(entry.location) {
            return Err(CoreError::at_line(
                number,
                format!("duplicate location {}", entry.location),
            ));
        }
        panel.set(entry.location, pixel);
    }
    Ok(panel)
}

/// Load every pixel in a layout file.
pub fn load(path: impl AsRef<Path>) -> Result<Panel> {
    load_filtered(path.as_ref(), None)
}

/// Load the pixels of one panel from a multi-panel layout file.
pub fn load_panel(path: impl AsRef<Path>, panel_id: i32) -> Result<Panel> {
    load_filtered(path.as_ref(), Some(panel_id))
}

fn load_filtered(path: &Path, panel_id: Option<i32>) -> Result<Panel> {
    let text = fs::read_to_string(path)?;
    let panel = parse(&text, panel_id)?;
    tracing::info!("Loaded {} pixels from {:?}", panel.len(), path);
    Ok(panel)
}

/// Render a panel in the 6-field form, in insertion order.
///
/// Unaddressed pixels have no line in the format and are left out.
pub fn format(panel: &Panel, panel_id: i32) -> String {
    let mut out = String::new();
    for (location, pixel) in panel.iter() {
        let address = pixel.address();
        if !address.is_valid() {
            continue;
        }
        let _ = writeln!(
            out,
            "{} {} {} {} {} {}",
            address.universe,
            address.raw_channel(),
            location.x,
            location.y,
            panel_id,
            pixel.group
        );
    }
    out
}

/// Write a panel to a layout file.
pub fn write(panel: &Panel, path: impl AsRef<Path>, panel_id: i32) -> Result<()> {
    fs::write(path.as_ref(), format(panel, panel_id))?;
    tracing::debug!("Wrote {} pixels to {:?}", panel.len(), path.as_ref());
    Ok(())
}
