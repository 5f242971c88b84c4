//! Color model for huename: HSL items, OKLCH gamut mapping, hue-wheel
//! palettes, share-link state and display enrichment.

mod error;
mod hsl;
mod named;
mod oklch;
mod palette;

pub use error::{ColorError, Result};
pub use hsl::Hsl;
pub use named::{apca_contrast, apca_luminance, text_tone, NamedColor, TextTone};
pub use oklch::{linear_to_srgb, srgb_to_linear, Oklch};
pub use palette::{
    generate_palette, ColorSpace, PaletteParams, CHROMA_TOLERANCE, HUE_STEPS,
    LIGHTNESS_TOLERANCE, OKLCH_MAX_CHROMA,
};
