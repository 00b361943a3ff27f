//! Panel: pixels keyed by 2-D location
//!
//! A panel owns every pixel on a climbing wall. Besides the location map it
//! keeps a kd-tree over the location set (for nearest-neighbor queries) and
//! derives the per-universe channel usage that hardware transports need.
//!
//! Insertion order is part of the model: rendering walks pixels in insertion
//! order and nearest-neighbor ties are broken by it.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::{
    address::{Address, DMX_UNIVERSE_SIZE, RGB_FOOTPRINT},
    color::Color,
    error::{CoreError, Result},
    pixel::Pixel,
    spatial::KdTree,
};

/// Integer wall coordinate
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Location {
    pub x: i32,
    pub y: i32,
}

impl Location {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance, exact over the whole `i32` plane.
    pub fn distance_sq(self, other: Location) -> u128 {
        let dx = (self.x as i64 - other.x as i64).unsigned_abs() as u128;
        let dy = (self.y as i64 - other.y as i64).unsigned_abs() as u128;
        dx * dx + dy * dy
    }
}

impl From<(i32, i32)> for Location {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Collection of pixels for one wall
#[derive(Debug, Clone, Default)]
pub struct Panel {
    entries: Vec<(Location, Pixel)>,
    index: HashMap<Location, usize>,
    tree: KdTree,
}

impl Panel {
    /// Empty panel
    pub fn new() -> Self {
        Self::default()
    }

    /// `width` x `height` grid of dark, unaddressed pixels.
    pub fn blank(width: i32, height: i32) -> Result<Self> {
        check_dimensions(width, height)?;
        let mut panel = Self::new();
        for x in 0..width {
            for y in 0..height {
                panel.set(Location::new(x, y), Pixel::unaddressed(Color::BLACK));
            }
        }
        Ok(panel)
    }

    /// `count` randomly colored pixels at distinct random locations inside
    /// `width` x `height`.
    ///
    /// Pixel `i` is addressed at byte offset `3 * i`, spilling into the next
    /// universe every 170 pixels.
    pub fn random<R: Rng + ?Sized>(
        width: i32,
        height: i32,
        count: usize,
        live: bool,
        rng: &mut R,
    ) -> Result<Self> {
        check_dimensions(width, height)?;
        let slots = width as usize * height as usize;
        if count > slots {
            return Err(CoreError::validation(format!(
                "{} pixels do not fit in a {}x{} panel",
                count, width, height
            )));
        }

        let per_universe = DMX_UNIVERSE_SIZE - DMX_UNIVERSE_SIZE % RGB_FOOTPRINT;
        let mut panel = Self::new();
        for (i, slot) in rand::seq::index::sample(rng, slots, count)
            .into_iter()
            .enumerate()
        {
            let offset = RGB_FOOTPRINT * i;
            let universe = u16::try_from(offset / per_universe)
                .map_err(|_| CoreError::validation("too many pixels for the universe range"))?;
            let address = Address::new(universe, (offset % per_universe) as i32);
            let location = Location::new(
                (slot / height as usize) as i32,
                (slot % height as usize) as i32,
            );
            let pixel = Pixel::new(Color::random(rng), address, live, 0)?;
            panel.set(location, pixel);
        }
        Ok(panel)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, location: Location) -> bool {
        self.index.contains_key(&location)
    }

    pub fn get(&self, location: Location) -> Result<&Pixel> {
        self.index
            .get(&location)
            .map(|&i| &self.entries[i].1)
            .ok_or(CoreError::NotFound(location))
    }

    pub fn get_mut(&mut self, location: Location) -> Result<&mut Pixel> {
        match self.index.get(&location) {
            Some(&i) => Ok(&mut self.entries[i].1),
            None => Err(CoreError::NotFound(location)),
        }
    }

    /// Insert or overwrite. Returns the previous pixel at `location`.
    ///
    /// A new location is added to the spatial index before returning;
    /// overwriting keeps the original insertion rank.
    pub fn set(&mut self, location: Location, pixel: Pixel) -> Option<Pixel> {
        if let Some(&i) = self.index.get(&location) {
            return Some(std::mem::replace(&mut self.entries[i].1, pixel));
        }
        let rank = self.entries.len();
        self.entries.push((location, pixel));
        self.index.insert(location, rank);
        self.tree.insert(location, rank);
        None
    }

    /// Remove a pixel; the spatial index is rebuilt.
    pub fn remove(&mut self, location: Location) -> Result<Pixel> {
        let i = self
            .index
            .remove(&location)
            .ok_or(CoreError::NotFound(location))?;
        let (_, pixel) = self.entries.remove(i);
        for (rank, (location, _)) in self.entries.iter().enumerate().skip(i) {
            self.index.insert(*location, rank);
        }
        self.rebuild_index();
        Ok(pixel)
    }

    fn rebuild_index(&mut self) {
        self.tree = KdTree::build(
            self.entries
                .iter()
                .enumerate()
                .map(|(rank, (location, _))| (*location, rank)),
        );
    }

    /// The `k` locations closest to `location`, nearest first.
    ///
    /// Equidistant pixels come back in insertion order. Asking for more
    /// pixels than the panel holds returns all of them.
    pub fn nearest(&self, location: Location, k: usize) -> Result<Vec<Location>> {
        if self.tree.is_empty() {
            return Err(CoreError::EmptyPanel);
        }
        Ok(self.tree.nearest(location, k))
    }

    /// Channels in use per universe, ascending and deduplicated.
    ///
    /// Every pixel with a valid address counts, live or not.
    pub fn addresses_by_universe(&self) -> BTreeMap<u16, Vec<u16>> {
        let mut map: BTreeMap<u16, Vec<u16>> = BTreeMap::new();
        for (_, pixel) in &self.entries {
            let address = pixel.address();
            if let Some(channel) = address.channel() {
                map.entry(address.universe).or_default().push(channel);
            }
        }
        for channels in map.values_mut() {
            channels.sort_unstable();
            channels.dedup();
        }
        map
    }

    /// Locations grouped by pixel group id.
    pub fn groups(&self) -> BTreeMap<i32, Vec<Location>> {
        let mut groups: BTreeMap<i32, Vec<Location>> = BTreeMap::new();
        for (location, pixel) in &self.entries {
            groups.entry(pixel.group).or_default().push(*location);
        }
        groups
    }

    /// One past the largest x coordinate (0 when empty, saturating at `i32::MAX`).
    pub fn width(&self) -> i32 {
        self.entries
            .iter()
            .map(|(location, _)| location.x.saturating_add(1))
            .max()
            .unwrap_or(0)
    }

    /// One past the largest y coordinate (0 when empty, saturating at `i32::MAX`).
    pub fn height(&self) -> i32 {
        self.entries
            .iter()
            .map(|(location, _)| location.y.saturating_add(1))
            .max()
            .unwrap_or(0)
    }

    pub fn locations(&self) -> impl Iterator<Item = Location> + '_ {
        self.entries.iter().map(|(location, _)| *location)
    }

    /// Pixels in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Location, &Pixel)> + '_ {
        self.entries.iter().map(|(location, pixel)| (*location, pixel))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Location, &mut Pixel)> + '_ {
        self.entries
            .iter_mut()
            .map(|(location, pixel)| (*location, pixel))
    }

    /// Live pixels in insertion order.
    pub fn live_pixels(&self) -> impl Iterator<Item = (Location, &Pixel)> + '_ {
        self.iter().filter(|(_, pixel)| pixel.is_live())
    }
}

fn check_dimensions(width: i32, height: i32) -> Result<()> {
    if width < 0 || height < 0 {
        return Err(CoreError::validation(format!(
            "panel dimensions must be non-negative, got {}x{}",
            width, height
        )));
    }
    Ok(())
}
