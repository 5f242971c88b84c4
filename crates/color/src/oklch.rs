//! OKLCH ↔ sRGB conversion and gamut mapping.
//!
//! Pipeline: OKLCH ↔ Oklab ↔ linear sRGB ↔ sRGB. The Oklab matrices are
//! Björn Ottosson's.

#![allow(clippy::many_single_char_names)]

const GAMUT_EPSILON: f64 = 1e-7;
const GAMUT_SEARCH_STEPS: usize = 24;

/// A color in OKLCH: lightness `0..=1`, chroma `0..~0.37`, hue in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oklch {
    pub l: f64,
    pub c: f64,
    pub h: f64,
}

impl Oklch {
    pub const fn new(l: f64, c: f64, h: f64) -> Self {
        Self { l, c, h }
    }

    /// sRGB components, possibly outside `0.0..=1.0`.
    pub fn to_srgb_unclamped(self) -> (f64, f64, f64) {
        let (a, b) = oklch_to_oklab_ab(self.c, self.h);
        let (r, g, bl) = oklab_to_linear_srgb(self.l, a, b);
        (linear_to_srgb(r), linear_to_srgb(g), linear_to_srgb(bl))
    }

    /// sRGB components clamped into `0.0..=1.0`.
    pub fn to_srgb(self) -> (f64, f64, f64) {
        let (r, g, b) = self.to_srgb_unclamped();
        (r.clamp(0.0, 1.0), g.clamp(0.0, 1.0), b.clamp(0.0, 1.0))
    }

    pub fn from_srgb(r: f64, g: f64, b: f64) -> Self {
        let (l, a, b_ok) = linear_srgb_to_oklab(
            srgb_to_linear(r),
            srgb_to_linear(g),
            srgb_to_linear(b),
        );
        let (c, h) = oklab_ab_to_oklch(a, b_ok);
        Self { l, c, h }
    }

    pub fn in_srgb_gamut(self) -> bool {
        let (r, g, b) = self.to_srgb_unclamped();
        let range = -GAMUT_EPSILON..=1.0 + GAMUT_EPSILON;
        range.contains(&r) && range.contains(&g) && range.contains(&b)
    }

    /// Reduce chroma until the color fits in sRGB, keeping hue and
    /// lightness. Binary search for the largest in-gamut chroma.
    #[must_use]
    pub fn to_gamut(self) -> Self {
        if self.in_srgb_gamut() {
            return self;
        }

        let mut lo = 0.0;
        let mut hi = self.c;
        for _ in 0..GAMUT_SEARCH_STEPS {
            let mid = (lo + hi) * 0.5;
            let candidate = Self { c: mid, ..self };
            if candidate.in_srgb_gamut() {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        Self { c: lo, ..self }
    }
}

fn oklch_to_oklab_ab(c: f64, h: f64) -> (f64, f64) {
    let h_rad = h.to_radians();
    (c * h_rad.cos(), c * h_rad.sin())
}

fn oklab_ab_to_oklch(a: f64, b: f64) -> (f64, f64) {
    let c = a.hypot(b);
    if c < 1e-8 {
        // Achromatic: hue is undefined.
        return (c, 0.0);
    }
    (c, b.atan2(a).to_degrees().rem_euclid(360.0))
}

fn oklab_to_linear_srgb(l: f64, a: f64, b: f64) -> (f64, f64, f64) {
    let l_ = l + 0.396_337_777_4 * a + 0.215_803_757_3 * b;
    let m_ = l - 0.105_561_345_8 * a - 0.063_854_172_8 * b;
    let s_ = l - 0.089_484_177_5 * a - 1.291_485_548_0 * b;

    let l3 = l_ * l_ * l_;
    let m3 = m_ * m_ * m_;
    let s3 = s_ * s_ * s_;

    (
        4.076_741_662_1 * l3 - 3.307_711_591_3 * m3 + 0.230_969_929_2 * s3,
        -1.268_438_004_6 * l3 + 2.609_757_401_1 * m3 - 0.341_319_396_5 * s3,
        -0.004_196_086_3 * l3 - 0.703_418_614_7 * m3 + 1.707_614_701_0 * s3,
    )
}

fn linear_srgb_to_oklab(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let l = 0.412_221_470_8 * r + 0.536_332_536_3 * g + 0.051_445_992_9 * b;
    let m = 0.211_903_498_2 * r + 0.680_699_545_1 * g + 0.107_396_956_6 * b;
    let s = 0.088_302_461_9 * r + 0.281_718_837_6 * g + 0.629_978_700_5 * b;

    let l_ = l.cbrt();
    let m_ = m.cbrt();
    let s_ = s.cbrt();

    (
        0.210_454_255_3 * l_ + 0.793_617_785_0 * m_ - 0.004_072_046_8 * s_,
        1.977_998_495_1 * l_ - 2.428_592_205_0 * m_ + 0.450_593_709_9 * s_,
        0.025_904_037_1 * l_ + 0.782_771_766_2 * m_ - 0.808_675_766_0 * s_,
    )
}

/// Gamma-encode one linear sRGB component.
pub fn linear_to_srgb(c: f64) -> f64 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Remove sRGB gamma from one component.
pub fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() <= tolerance
    }

    #[test]
    fn srgb_red_has_known_oklch() {
        let red = Oklch::from_srgb(1.0, 0.0, 0.0);
        assert!(close(red.l, 0.628, 1e-3), "{red:?}");
        assert!(close(red.c, 0.2577, 1e-3), "{red:?}");
        assert!(close(red.h, 29.23, 0.05), "{red:?}");
    }

    #[test]
    fn white_is_achromatic() {
        let white = Oklch::from_srgb(1.0, 1.0, 1.0);
        assert!(close(white.l, 1.0, 1e-4), "{white:?}");
        assert!(white.c < 1e-4, "{white:?}");
    }

    #[test]
    fn round_trip_through_srgb() {
        let color = Oklch::new(0.7, 0.1, 200.0);
        assert!(color.in_srgb_gamut());
        let (r, g, b) = color.to_srgb();
        let back = Oklch::from_srgb(r, g, b);
        assert!(close(back.l, 0.7, 1e-6), "{back:?}");
        assert!(close(back.c, 0.1, 1e-6), "{back:?}");
        assert!(close(back.h, 200.0, 1e-4), "{back:?}");
    }

    #[test]
    fn gamut_mapping_reduces_only_chroma() {
        let vivid = Oklch::new(0.76, 0.37, 140.0);
        assert!(!vivid.in_srgb_gamut());
        let mapped = vivid.to_gamut();
        assert!(mapped.in_srgb_gamut());
        assert!(mapped.c < vivid.c);
        assert_eq!((mapped.l, mapped.h), (vivid.l, vivid.h));
    }

    #[test]
    fn transfer_functions_invert() {
        for v in [0.0, 0.002, 0.04, 0.2, 0.5, 1.0] {
            assert!(close(srgb_to_linear(linear_to_srgb(v)), v, 1e-9));
        }
    }
}
