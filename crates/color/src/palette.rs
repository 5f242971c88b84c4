use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ColorError, Result};
use crate::hsl::Hsl;
use crate::oklch::Oklch;

/// Number of hue steps around the wheel.
pub const HUE_STEPS: u16 = 360;

/// Largest chroma drift a gamut-mapped OKLCH hue may show before it is
/// dropped from the palette.
pub const CHROMA_TOLERANCE: f64 = 0.025;
/// Same, for lightness.
pub const LIGHTNESS_TOLERANCE: f64 = 0.2;

pub const OKLCH_MAX_CHROMA: f64 = 0.37;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    #[default]
    Hsl,
    Oklch,
}

impl ColorSpace {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hsl => "hsl",
            Self::Oklch => "oklch",
        }
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorSpace {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hsl" => Ok(Self::Hsl),
            "oklch" => Ok(Self::Oklch),
            other => Err(ColorError::UnknownSpace(other.to_string())),
        }
    }
}

/// Which slice of the hue wheel to name.
///
/// `saturation` and `lightness` are percentages for HSL; for OKLCH they are
/// chroma (`0..=0.37`) and lightness (`0..=1`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaletteParams {
    pub space: ColorSpace,
    pub saturation: f64,
    pub lightness: f64,
}

impl Default for PaletteParams {
    /// Vivid HSL wheel, used when nothing at all is specified.
    fn default() -> Self {
        Self {
            space: ColorSpace::Hsl,
            saturation: 100.0,
            lightness: 50.0,
        }
    }
}

impl PaletteParams {
    /// Defaults for an explicitly chosen space, or the overall default when
    /// no space was given.
    pub fn defaults_for(space: Option<ColorSpace>) -> Self {
        match space {
            None => Self::default(),
            Some(ColorSpace::Hsl) => Self {
                space: ColorSpace::Hsl,
                saturation: 50.0,
                lightness: 50.0,
            },
            Some(ColorSpace::Oklch) => Self {
                space: ColorSpace::Oklch,
                saturation: 0.15,
                lightness: 0.76,
            },
        }
    }

    /// Fill missing values from the space's defaults, then validate.
    pub fn resolve(
        space: Option<ColorSpace>,
        saturation: Option<f64>,
        lightness: Option<f64>,
    ) -> Result<Self> {
        let defaults = Self::defaults_for(space);
        let params = Self {
            saturation: saturation.unwrap_or(defaults.saturation),
            lightness: lightness.unwrap_or(defaults.lightness),
            ..defaults
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        let (saturation_name, saturation_max, lightness_max) = match self.space {
            ColorSpace::Hsl => ("saturation", 100.0, 100.0),
            ColorSpace::Oklch => ("chroma", OKLCH_MAX_CHROMA, 1.0),
        };
        check_range(self.space, saturation_name, self.saturation, saturation_max)?;
        check_range(self.space, "lightness", self.lightness, lightness_max)
    }

    /// Parse share-link state such as `colorspace=oklch&saturation=0.2`.
    ///
    /// A leading `?` is ignored and keys and values are percent-decoded.
    /// Unknown color spaces and values that are not numbers fall back to
    /// defaults; numbers out of range are an error.
    pub fn from_query(query: &str) -> Result<Self> {
        let mut space = None;
        let mut saturation = None;
        let mut lightness = None;

        let query = query.strip_prefix('?').unwrap_or(query);
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let (Some(key), Some(value)) = (decode_component(key), decode_component(value))
            else {
                continue;
            };
            match key.as_str() {
                "colorspace" => space = value.parse::<ColorSpace>().ok(),
                "saturation" => saturation = parse_number(&value),
                "lightness" => lightness = parse_number(&value),
                _ => {}
            }
        }
        Self::resolve(space, saturation, lightness)
    }

    pub fn to_query(&self) -> String {
        format!(
            "colorspace={}&saturation={}&lightness={}",
            self.space, self.saturation, self.lightness
        )
    }

    /// Link that reopens this palette, e.g.
    /// `https://example.com/?colorspace=hsl&saturation=50&lightness=50`.
    pub fn share_url(&self, origin: &str) -> String {
        format!("{}/?{}", origin.trim_end_matches('/'), self.to_query())
    }
}

/// Form-style decoding: `+` is a space, `%XX` a byte. Malformed escapes or
/// invalid UTF-8 give `None`.
fn decode_component(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hi = char::from(*bytes.get(i + 1)?).to_digit(16)?;
                let lo = char::from(*bytes.get(i + 2)?).to_digit(16)?;
                out.push(u8::try_from((hi << 4) | lo).ok()?);
                i += 3;
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out).ok()
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn check_range(space: ColorSpace, name: &'static str, value: f64, max: f64) -> Result<()> {
    if (0.0..=max).contains(&value) {
        return Ok(());
    }
    Err(ColorError::OutOfRange {
        space: space.as_str(),
        name,
        value,
        min: 0.0,
        max,
    })
}

/// The ordered hue wheel for `params`.
///
/// HSL yields all 360 hues. OKLCH yields only the hues that survive gamut
/// mapping close to the requested chroma and lightness, floored to whole
/// HSL components.
pub fn generate_palette(params: &PaletteParams) -> Vec<Hsl> {
    let hues = (0..HUE_STEPS).map(f64::from);
    match params.space {
        ColorSpace::Hsl => hues
            .map(|h| Hsl::new(h, params.saturation, params.lightness))
            .collect(),
        ColorSpace::Oklch => hues
            .filter_map(|h| oklch_hue(params.lightness, params.saturation, h))
            .collect(),
    }
}

fn oklch_hue(lightness: f64, chroma: f64, hue: f64) -> Option<Hsl> {
    let mapped = Oklch::new(lightness, chroma, hue).to_gamut();
    let (r, g, b) = mapped.to_srgb();
    let shown = Oklch::from_srgb(r, g, b);

    if (shown.c - chroma).abs() > CHROMA_TOLERANCE
        || (shown.l - lightness).abs() > LIGHTNESS_TOLERANCE
    {
        return None;
    }
    Some(Hsl::from_srgb(r, g, b).floor())
}
