//! Saturating RGBA color with an HSV view
//!
//! Every channel is stored as a `u8`. Writers accept wider integers and
//! saturate into `0..=255` instead of failing, so animation code can do
//! arithmetic on channels without range checks.
//!
//! HSV values use degrees for hue (`[0, 360)`) and `[0, 1]` for saturation
//! and value. Converting back to RGB rounds half away from zero.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Largest channel value
pub const CHANNEL_MAX: u8 = 255;

/// Hue wraps at this many degrees
pub const HUE_MAX: f64 = 360.0;

/// Saturates an integer into the `0..=255` channel range.
pub fn clamp_channel(value: i64) -> u8 {
    value.clamp(0, CHANNEL_MAX as i64) as u8
}

/// RGB color with alpha. Owned by a pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    /// Const constructor from raw bytes (alpha 0).
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: 0,
        }
    }

    /// Create a color, saturating each channel.
    pub fn new(red: i32, green: i32, blue: i32, alpha: i32) -> Self {
        let mut color = Self::default();
        color.set_rgb(red, green, blue, alpha);
        color
    }

    /// Create a color from HSV components.
    pub fn from_hsv(hue: f64, saturation: f64, value: f64) -> Self {
        let mut color = Self::default();
        color.set_hsv(hue, saturation, value);
        color
    }

    /// Random opaque RGB color.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            alpha: 255,
            ..Self::rgb(rng.random(), rng.random(), rng.random())
        }
    }

    /// Overwrite all four channels, saturating out-of-range values.
    pub fn set_rgb(&mut self, red: i32, green: i32, blue: i32, alpha: i32) {
        self.red = clamp_channel(red as i64);
        self.green = clamp_channel(green as i64);
        self.blue = clamp_channel(blue as i64);
        self.alpha = clamp_channel(alpha as i64);
    }

    /// Raw `(red, green, blue, alpha)` tuple.
    pub fn rgba(&self) -> (u8, u8, u8, u8) {
        (self.red, self.green, self.blue, self.alpha)
    }

    /// HSV view of the RGB channels.
    pub fn hsv(&self) -> (f64, f64, f64) {
        let max = CHANNEL_MAX as f64;
        let (r, g, b) = (
            self.red as f64 / max,
            self.green as f64 / max,
            self.blue as f64 / max,
        );

        let maxc = r.max(g).max(b);
        let minc = r.min(g).min(b);
        let value = maxc;
        if maxc == minc {
            return (0.0, 0.0, value);
        }

        let delta = maxc - minc;
        let saturation = delta / maxc;
        let rc = (maxc - r) / delta;
        let gc = (maxc - g) / delta;
        let bc = (maxc - b) / delta;

        let sector = if r == maxc {
            bc - gc
        } else if g == maxc {
            2.0 + rc - bc
        } else {
            4.0 + gc - rc
        };
        let hue = (sector / 6.0).rem_euclid(1.0) * HUE_MAX;

        (hue, saturation, value)
    }

    /// Overwrite RGB from HSV. Alpha is left untouched.
    ///
    /// Hue wraps modulo 360 degrees; saturation and value are clamped into
    /// `[0, 1]`. Channels round half away from zero.
    pub fn set_hsv(&mut self, hue: f64, saturation: f64, value: f64) {
        let h = hue.rem_euclid(HUE_MAX) / HUE_MAX;
        let s = saturation.clamp(0.0, 1.0);
        let v = value.clamp(0.0, 1.0);

        let (r, g, b) = if s == 0.0 {
            (v, v, v)
        } else {
            let sector = (h * 6.0).floor();
            let f = h * 6.0 - sector;
            let p = v * (1.0 - s);
            let q = v * (1.0 - s * f);
            let t = v * (1.0 - s * (1.0 - f));
            match sector as i64 % 6 {
                0 => (v, t, p),
                1 => (q, v, p),
                2 => (p, v, t),
                3 => (p, q, v),
                4 => (t, p, v),
                _ => (v, p, q),
            }
        };

        let max = CHANNEL_MAX as f64;
        self.red = clamp_channel((r * max).round() as i64);
        self.green = clamp_channel((g * max).round() as i64);
        self.blue = clamp_channel((b * max).round() as i64);
    }

    /// Perceived brightness in `[0, 1]` (Rec. 601 luma).
    pub fn luma(&self) -> f64 {
        (0.299 * self.red as f64 + 0.587 * self.green as f64 + 0.114 * self.blue as f64)
            / CHANNEL_MAX as f64
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((red, green, blue): (u8, u8, u8)) -> Self {
        Self::rgb(red, green, blue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_saturating_constructor() {
        let color = Color::new(300, -20, 128, 1000);
        assert_eq!(color.rgba(), (255, 0, 128, 255));
    }

    #[test]
    fn test_set_rgb_overwrites_alpha() {
        let mut color = Color::new(1, 2, 3, 4);
        color.set_rgb(10, 20, 30, 0);
        assert_eq!(color.rgba(), (10, 20, 30, 0));
    }

    #[test]
    fn test_primary_hues() {
        assert_eq!(Color::rgb(255, 0, 0).hsv(), (0.0, 1.0, 1.0));

        let (h, s, v) = Color::rgb(0, 255, 0).hsv();
        assert!((h - 120.0).abs() < 1e-9);
        assert_eq!((s, v), (1.0, 1.0));

        let (h, _, _) = Color::rgb(0, 0, 255).hsv();
        assert!((h - 240.0).abs() < 1e-9);
    }

    #[test]
    fn test_grey_has_zero_hue_and_saturation() {
        let (h, s, v) = Color::rgb(51, 51, 51).hsv();
        assert_eq!((h, s), (0.0, 0.0));
        assert!((v - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_red_round_trip() {
        let color = Color::rgb(255, 0, 0);
        let (h, s, v) = color.hsv();
        assert_eq!(Color::from_hsv(h, s, v), color);
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        // 0.5 * 255 = 127.5 exactly
        assert_eq!(Color::from_hsv(0.0, 1.0, 0.5).rgba(), (128, 0, 0, 0));
        assert_eq!(Color::from_hsv(0.0, 0.0, 0.5).rgba(), (128, 128, 128, 0));
    }

    #[test]
    fn test_hue_wraps_modulo_360() {
        assert_eq!(Color::from_hsv(360.0, 1.0, 1.0), Color::from_hsv(0.0, 1.0, 1.0));
        assert_eq!(Color::from_hsv(380.0, 1.0, 1.0), Color::from_hsv(20.0, 1.0, 1.0));
        assert_eq!(Color::from_hsv(-20.0, 1.0, 1.0), Color::from_hsv(340.0, 1.0, 1.0));
    }

    #[test]
    fn test_set_hsv_keeps_alpha() {
        let mut color = Color::new(0, 0, 0, 77);
        color.set_hsv(240.0, 1.0, 1.0);
        assert_eq!(color.rgba(), (0, 0, 255, 77));
    }

    #[test]
    fn test_hsv_out_of_range_saturates() {
        assert_eq!(Color::from_hsv(0.0, 2.0, 5.0), Color::rgb(255, 0, 0));
        assert_eq!(Color::from_hsv(0.0, -1.0, -1.0), Color::BLACK);
    }

    #[test]
    fn test_random_is_opaque() {
        use rand::{rngs::StdRng, SeedableRng};
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..16 {
            assert_eq!(Color::random(&mut rng).alpha, 255);
        }
    }

    proptest! {
        #[test]
        fn prop_clamp_channel(value in any::<i64>()) {
            let clamped = clamp_channel(value);
            prop_assert_eq!(clamped == 255, value >= 255);
            prop_assert_eq!(clamped == 0, value <= 0);
            if (0..=255).contains(&value) {
                prop_assert_eq!(clamped as i64, value);
            }
        }

        #[test]
        fn prop_rgb_hsv_round_trip(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
            let color = Color::rgb(r, g, b);
            let (h, s, v) = color.hsv();
            prop_assert!((0.0..360.0).contains(&h));
            prop_assert_eq!(Color::from_hsv(h, s, v), color);
        }
    }
}
