//! Animation steps run once per frame

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use holdlight_core::{Color, Panel};

/// Per-frame animation step.
///
/// `fill` rewrites pixel colors in place while the runner holds the panel
/// lock. `init` runs once, under the same lock, before the first frame.
pub trait Fill: Send {
    fn init(&mut self, _panel: &mut Panel) {}

    fn fill(&mut self, panel: &mut Panel);

    fn name(&self) -> &str;
}

/// Stock fills selectable from configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FillKind {
    CycleHue {
        #[serde(default = "default_hue_step")]
        step: f64,
    },
    ToggleColors,
}

fn default_hue_step() -> f64 {
    20.0
}

impl Default for FillKind {
    fn default() -> Self {
        Self::CycleHue {
            step: default_hue_step(),
        }
    }
}

impl FillKind {
    pub fn build(&self) -> Box<dyn Fill> {
        match self {
            Self::CycleHue { step } => Box::new(CycleHue::new(*step)),
            Self::ToggleColors => Box::new(ToggleColors::new()),
        }
    }
}

/// Rotates every live pixel's hue by `step` degrees per frame, wrapping at
/// 360.
#[derive(Debug, Clone)]
pub struct CycleHue {
    step: f64,
}

impl CycleHue {
    pub fn new(step: f64) -> Self {
        Self { step }
    }
}

impl Fill for CycleHue {
    /// Black pixels have no hue to rotate; spread fully saturated hues over
    /// them in panel order.
    fn init(&mut self, panel: &mut Panel) {
        for (index, (_, pixel)) in panel.iter_mut().enumerate() {
            if pixel.is_live() && pixel.color == Color::BLACK {
                let hue = (index as f64 * self.step).rem_euclid(360.0);
                pixel.color.set_hsv(hue, 1.0, 1.0);
            }
        }
    }

    fn fill(&mut self, panel: &mut Panel) {
        for (_, pixel) in panel.iter_mut() {
            if !pixel.is_live() {
                continue;
            }
            let (hue, saturation, value) = pixel.color.hsv();
            pixel
                .color
                .set_hsv((hue + self.step).rem_euclid(360.0), saturation, value);
        }
    }

    fn name(&self) -> &str {
        "CycleHue"
    }
}

/// Gives every live pixel a new random color each frame.
#[derive(Debug, Clone)]
pub struct ToggleColors {
    rng: StdRng,
}

impl ToggleColors {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for ToggleColors {
    fn default() -> Self {
        Self::new()
    }
}

impl Fill for ToggleColors {
    fn fill(&mut self, panel: &mut Panel) {
        for (_, pixel) in panel.iter_mut() {
            if pixel.is_live() {
                pixel.color = Color::random(&mut self.rng);
            }
        }
    }

    fn name(&self) -> &str {
        "ToggleColors"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdlight_core::{Address, Location, Pixel};
    use proptest::prelude::*;

    fn panel_with(color: Color, live: bool) -> Panel {
        let mut panel = Panel::new();
        panel.set(
            Location::new(0, 0),
            Pixel::new(color, Address::new(0, 0), live, 0).unwrap(),
        );
        panel
    }

    fn first(panel: &Panel) -> Color {
        panel.get(Location::new(0, 0)).unwrap().color
    }

    #[test]
    fn test_cycle_hue_wraps_modulo_360() {
        // hue 340 + 20 lands on 0 (red), not a clamp at 360
        let mut panel = panel_with(Color::from_hsv(340.0, 1.0, 1.0), true);
        let mut fill = CycleHue::new(20.0);
        fill.fill(&mut panel);
        assert_eq!(first(&panel), Color::rgb(255, 0, 0));

        fill.fill(&mut panel);
        let (hue, _, _) = first(&panel).hsv();
        assert!((hue - 20.0).abs() < 1.0);
    }

    #[test]
    fn test_cycle_hue_skips_dark_pixels() {
        let start = Color::rgb(0, 0, 255);
        let mut panel = panel_with(start, false);
        CycleHue::new(20.0).fill(&mut panel);
        assert_eq!(first(&panel), start);
    }

    #[test]
    fn test_cycle_hue_init_lights_black_pixels() {
        let mut panel = panel_with(Color::BLACK, true);
        CycleHue::new(20.0).init(&mut panel);
        assert_eq!(first(&panel), Color::rgb(255, 0, 0));
    }

    #[test]
    fn test_toggle_colors_is_seeded() {
        let mut a = panel_with(Color::BLACK, true);
        let mut b = panel_with(Color::BLACK, true);
        ToggleColors::with_seed(7).fill(&mut a);
        ToggleColors::with_seed(7).fill(&mut b);
        assert_eq!(first(&a), first(&b));
        assert_eq!(first(&a).alpha, 255);
    }

    #[test]
    fn test_fill_kind_from_toml_style_tag() {
        let kind: FillKind = serde_json::from_str(r#"{"kind":"cycle_hue"}"#).unwrap();
        assert_eq!(kind, FillKind::CycleHue { step: 20.0 });
        assert_eq!(kind.build().name(), "CycleHue");
        let kind: FillKind = serde_json::from_str(r#"{"kind":"toggle_colors"}"#).unwrap();
        assert_eq!(kind.build().name(), "ToggleColors");
    }

    proptest! {
        #[test]
        fn prop_hue_stays_in_range(h in 0.0f64..360.0, step in -720.0f64..720.0) {
            let mut panel = panel_with(Color::from_hsv(h, 1.0, 1.0), true);
            CycleHue::new(step).fill(&mut panel);
            let (hue, _, _) = first(&panel).hsv();
            prop_assert!((0.0..360.0).contains(&hue));
        }
    }
}
