//! A single addressable light

use serde::{Deserialize, Serialize};

use crate::{
    address::Address,
    color::Color,
    error::{CoreError, Result},
};

/// Color, transport address, liveness and group membership of one light.
///
/// A live pixel always has a valid address whose three color bytes fit in
/// its universe; the constructor and setters enforce this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pixel {
    pub color: Color,
    address: Address,
    live: bool,
    pub group: i32,
}

impl Pixel {
    pub fn new(color: Color, address: Address, live: bool, group: i32) -> Result<Self> {
        check_live(address, live)?;
        Ok(Self {
            color,
            address,
            live,
            group,
        })
    }

    /// A non-live pixel with no transport address.
    pub fn unaddressed(color: Color) -> Self {
        Self {
            color,
            address: Address::default(),
            live: false,
            group: 0,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn set_live(&mut self, live: bool) -> Result<()> {
        check_live(self.address, live)?;
        self.live = live;
        Ok(())
    }

    pub fn set_address(&mut self, address: Address) -> Result<()> {
        check_live(address, self.live)?;
        self.address = address;
        Ok(())
    }
}

fn check_live(address: Address, live: bool) -> Result<()> {
    if !live {
        return Ok(());
    }
    if !address.is_valid() {
        return Err(CoreError::validation(format!(
            "live pixel needs a valid address, got {}",
            address
        )));
    }
    if !address.fits_rgb() {
        return Err(CoreError::validation(format!(
            "live pixel at {} would overrun the universe",
            address
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_pixel_requires_valid_address() {
        let err = Pixel::new(Color::BLACK, Address::new(0, 1000), true, 0).unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));

        let pixel = Pixel::new(Color::BLACK, Address::new(0, 12), true, 0).unwrap();
        assert!(pixel.is_live());
    }

    #[test]
    fn test_live_pixel_must_fit_universe() {
        assert!(Pixel::new(Color::BLACK, Address::new(0, 509), true, 0).is_ok());
        assert!(Pixel::new(Color::BLACK, Address::new(0, 510), true, 0).is_err());
    }

    #[test]
    fn test_dark_pixel_accepts_invalid_address() {
        let pixel = Pixel::new(Color::WHITE, Address::invalid(0), false, 4).unwrap();
        assert!(!pixel.is_live());
        assert_eq!(pixel.group, 4);
    }

    #[test]
    fn test_set_live_revalidates() {
        let mut pixel = Pixel::unaddressed(Color::BLACK);
        assert!(pixel.set_live(true).is_err());
        assert!(!pixel.is_live());

        pixel.set_address(Address::new(1, 3)).unwrap();
        pixel.set_live(true).unwrap();
        assert!(pixel.set_address(Address::invalid(1)).is_err());
        assert_eq!(pixel.address(), Address::new(1, 3));
    }
}
