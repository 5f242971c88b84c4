use serde::{Deserialize, Serialize};
use std::fmt;

/// An HSL color: hue in degrees, saturation and lightness in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl Hsl {
    pub const fn new(h: f64, s: f64, l: f64) -> Self {
        Self { h, s, l }
    }

    /// Canonical identity of the color, e.g. `"120,50,50"`.
    ///
    /// Two colors with equal keys are the same color to the naming service,
    /// whatever their position in a palette.
    pub fn key(&self) -> String {
        format!("{},{},{}", self.h, self.s, self.l)
    }

    /// Components rounded down to whole numbers.
    #[must_use]
    pub fn floor(self) -> Self {
        Self {
            h: self.h.floor(),
            s: self.s.floor(),
            l: self.l.floor(),
        }
    }

    /// sRGB components in `0.0..=1.0`.
    pub fn to_srgb(&self) -> (f64, f64, f64) {
        let s = (self.s / 100.0).clamp(0.0, 1.0);
        let l = (self.l / 100.0).clamp(0.0, 1.0);
        let h = self.h.rem_euclid(360.0);

        let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = chroma * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
        let m = l - chroma / 2.0;

        let (r, g, b) = match h {
            h if h < 60.0 => (chroma, x, 0.0),
            h if h < 120.0 => (x, chroma, 0.0),
            h if h < 180.0 => (0.0, chroma, x),
            h if h < 240.0 => (0.0, x, chroma),
            h if h < 300.0 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        (r + m, g + m, b + m)
    }

    /// Inverse of [`Hsl::to_srgb`]. Achromatic colors get hue 0.
    pub fn from_srgb(r: f64, g: f64, b: f64) -> Self {
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        let delta = max - min;

        if delta < 1e-12 {
            return Self::new(0.0, 0.0, l * 100.0);
        }

        let s = delta / (1.0 - (2.0 * l - 1.0).abs());
        let h = if max == r {
            60.0 * ((g - b) / delta).rem_euclid(6.0)
        } else if max == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };
        Self::new(h.rem_euclid(360.0), s * 100.0, l * 100.0)
    }

    pub fn to_rgb8(&self) -> [u8; 3] {
        let (r, g, b) = self.to_srgb();
        [to_u8(r), to_u8(g), to_u8(b)]
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(&self) -> String {
        let [r, g, b] = self.to_rgb8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hsl({}, {}%, {}%)", self.h, self.s, self.l)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn to_u8(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn key_uses_shortest_number_form() {
        assert_eq!(Hsl::new(120.0, 50.0, 50.0).key(), "120,50,50");
        assert_eq!(Hsl::new(0.0, 100.0, 12.5).key(), "0,100,12.5");
    }

    #[test]
    fn primaries_convert_to_expected_hex() {
        assert_eq!(Hsl::new(0.0, 100.0, 50.0).to_hex(), "#ff0000");
        assert_eq!(Hsl::new(120.0, 100.0, 25.0).to_hex(), "#008000");
        assert_eq!(Hsl::new(240.0, 100.0, 50.0).to_hex(), "#0000ff");
        assert_eq!(Hsl::new(0.0, 0.0, 50.0).to_rgb8(), [128, 128, 128]);
        assert_eq!(Hsl::new(300.0, 0.0, 100.0).to_hex(), "#ffffff");
    }

    #[test]
    fn srgb_round_trip_recovers_hsl() {
        let original = Hsl::new(200.0, 60.0, 40.0);
        let (r, g, b) = original.to_srgb();
        let back = Hsl::from_srgb(r, g, b);
        assert!((back.h - 200.0).abs() < 1e-9, "{back:?}");
        assert!((back.s - 60.0).abs() < 1e-9, "{back:?}");
        assert!((back.l - 40.0).abs() < 1e-9, "{back:?}");
    }

    #[test]
    fn gray_has_zero_hue_and_saturation() {
        let gray = Hsl::from_srgb(0.3, 0.3, 0.3);
        assert_eq!((gray.h, gray.s), (0.0, 0.0));
        assert!((gray.l - 30.0).abs() < 1e-9);
    }

    #[test]
    fn display_matches_css_notation() {
        assert_eq!(Hsl::new(12.0, 80.0, 40.0).to_string(), "hsl(12, 80%, 40%)");
    }
}
