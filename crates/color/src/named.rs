use serde::{Deserialize, Serialize};

use crate::hsl::Hsl;

/// Text color to draw on top of a swatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTone {
    White,
    Black,
}

/// A discovered color ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedColor {
    pub name: String,
    pub hsl: Hsl,
    pub rgb: [u8; 3],
    pub hex: String,
    pub text: TextTone,
}

impl NamedColor {
    pub fn new(name: impl Into<String>, hsl: Hsl) -> Self {
        Self {
            name: name.into(),
            hsl,
            rgb: hsl.to_rgb8(),
            hex: hsl.to_hex(),
            text: text_tone(&hsl),
        }
    }
}

// APCA 0.0.98G constants.
const APCA_RED: f64 = 0.212_672_9;
const APCA_GREEN: f64 = 0.715_152_2;
const APCA_BLUE: f64 = 0.072_175;
const APCA_GAMMA: f64 = 2.4;
const BLACK_THRESHOLD: f64 = 0.022;
const BLACK_CLAMP: f64 = 1.414;
const DELTA_Y_MIN: f64 = 0.0005;
const NORMAL_BG: f64 = 0.56;
const NORMAL_TEXT: f64 = 0.57;
const REVERSE_BG: f64 = 0.65;
const REVERSE_TEXT: f64 = 0.62;
const SCALE: f64 = 1.14;
const LOW_CLIP: f64 = 0.1;
const LOW_OFFSET: f64 = 0.027;

/// APCA screen luminance of an sRGB color, with the soft clamp near black.
pub fn apca_luminance(r: f64, g: f64, b: f64) -> f64 {
    let lin = |c: f64| c.signum() * c.abs().powf(APCA_GAMMA);
    let y = APCA_RED * lin(r) + APCA_GREEN * lin(g) + APCA_BLUE * lin(b);
    if y < BLACK_THRESHOLD {
        y + (BLACK_THRESHOLD - y).powf(BLACK_CLAMP)
    } else {
        y
    }
}

/// APCA lightness contrast `Lc` of text on a background, roughly
/// `-108..=106`. Positive for dark text on light, negative for light on dark.
pub fn apca_contrast(text_y: f64, background_y: f64) -> f64 {
    if (background_y - text_y).abs() < DELTA_Y_MIN {
        return 0.0;
    }

    let lc = if background_y > text_y {
        let sapc = (background_y.powf(NORMAL_BG) - text_y.powf(NORMAL_TEXT)) * SCALE;
        if sapc < LOW_CLIP {
            0.0
        } else {
            sapc - LOW_OFFSET
        }
    } else {
        let sapc = (background_y.powf(REVERSE_BG) - text_y.powf(REVERSE_TEXT)) * SCALE;
        if sapc > -LOW_CLIP {
            0.0
        } else {
            sapc + LOW_OFFSET
        }
    };
    lc * 100.0
}

/// Whichever of white or black text reads better on `background`: the one
/// with the larger APCA `|Lc|`, black on a tie.
pub fn text_tone(background: &Hsl) -> TextTone {
    let (r, g, b) = background.to_srgb();
    let bg = apca_luminance(r, g, b);
    let on_white = apca_contrast(apca_luminance(1.0, 1.0, 1.0), bg).abs();
    let on_black = apca_contrast(apca_luminance(0.0, 0.0, 0.0), bg).abs();
    if on_white > on_black {
        TextTone::White
    } else {
        TextTone::Black
    }
}
