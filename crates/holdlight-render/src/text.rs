//! Terminal preview renderer
//!
//! Draws the panel as a character grid, one full frame per call. Useful for
//! running the animation loop without any lighting hardware attached.

use std::io::Write;

use holdlight_core::{Location, Panel};

use crate::{
    error::{RenderError, Result},
    Renderer,
};

const TRANSPORT: &str = "text";
const SHADES: &[u8] = b"-=+*#%@";
const DARK: char = '.';
const EMPTY: char = ' ';

pub struct TextRenderer<W> {
    out: W,
    debug: bool,
}

impl<W: Write + Send> TextRenderer<W> {
    /// With `debug`, each frame is followed by every pixel's address.
    pub fn new(out: W, debug: bool) -> Self {
        Self { out, debug }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self, panel: &Panel) -> std::io::Result<()> {
        for y in 0..panel.height() {
            let row: String = (0..panel.width())
                .map(|x| cell(panel, Location::new(x, y)))
                .collect();
            writeln!(self.out, "{}", row.trim_end())?;
        }
        if self.debug {
            for (location, pixel) in panel.iter() {
                let address = pixel.address();
                writeln!(
                    self.out,
                    "{} ({},{})",
                    location,
                    address.universe,
                    address.raw_channel()
                )?;
            }
        }
        writeln!(self.out)?;
        self.out.flush()
    }
}

fn cell(panel: &Panel, location: Location) -> char {
    match panel.get(location) {
        Ok(pixel) if pixel.is_live() => {
            let step = (pixel.color.luma() * (SHADES.len() - 1) as f64).round() as usize;
            SHADES[step.min(SHADES.len() - 1)] as char
        }
        Ok(_) => DARK,
        Err(_) => EMPTY,
    }
}

impl<W: Write + Send> Renderer for TextRenderer<W> {
    fn render(&mut self, panel: &Panel) -> Result<()> {
        self.draw(panel)
            .map_err(|e| RenderError::transport(TRANSPORT, e))
    }

    fn name(&self) -> &'static str {
        TRANSPORT
    }
}
