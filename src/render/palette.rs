//! Perceptual colour ramps, sampled at a handful of stops and linearly
//! interpolated between them.

use plotters::style::RGBColor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ramp {
    Magma,
    Plasma,
    Mako,
}

const MAGMA: &[(u8, u8, u8)] = &[
    (0, 0, 4),
    (59, 15, 112),
    (140, 41, 129),
    (222, 73, 104),
    (254, 159, 109),
    (252, 253, 191),
];

const PLASMA: &[(u8, u8, u8)] = &[
    (13, 8, 135),
    (106, 0, 168),
    (177, 42, 144),
    (225, 100, 98),
    (252, 166, 54),
    (240, 249, 33),
];

const MAKO: &[(u8, u8, u8)] = &[
    (11, 4, 5),
    (46, 30, 60),
    (53, 66, 121),
    (52, 111, 159),
    (53, 156, 163),
    (84, 200, 159),
    (222, 245, 229),
];

/// Categorical colours for hue groups (modes).
pub const CATEGORY: [RGBColor; 6] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
];

impl Ramp {
    fn stops(self) -> &'static [(u8, u8, u8)] {
        match self {
            Self::Magma => MAGMA,
            Self::Plasma => PLASMA,
            Self::Mako => MAKO,
        }
    }

    /// Colour at position `t` in `[0, 1]` (clamped; NaN maps to the middle).
    pub fn at(self, t: f64) -> RGBColor {
        let t = if t.is_nan() { 0.5 } else { t.clamp(0.0, 1.0) };
        let stops = self.stops();
        let scaled = t * (stops.len() - 1) as f64;
        let lo = (scaled.floor() as usize).min(stops.len() - 2);
        let frac = scaled - lo as f64;

        let (r0, g0, b0) = stops[lo];
        let (r1, g1, b1) = stops[lo + 1];
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        RGBColor(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
    }

    /// `n` evenly spaced colours, skipping the extreme ends of the ramp so
    /// bars stay visible on both dark and light backgrounds.
    pub fn spread(self, n: usize) -> Vec<RGBColor> {
        match n {
            0 => Vec::new(),
            1 => vec![self.at(0.5)],
            _ => (0..n)
                .map(|i| self.at(0.15 + 0.7 * i as f64 / (n - 1) as f64))
                .collect(),
        }
    }
}

/// Relative luminance in `[0, 1]`, for picking readable annotation text.
pub fn luminance(c: RGBColor) -> f64 {
    (0.2126 * c.0 as f64 + 0.7152 * c.1 as f64 + 0.0722 * c.2 as f64) / 255.0
}
