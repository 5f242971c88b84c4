use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

pub const DEFAULT_STRIDE: usize = 10;
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

pub const MIN_STRIDE: usize = 2;
pub const MAX_STRIDE: usize = 4096;
pub const MAX_IN_FLIGHT_LIMIT: usize = 64;

pub const STRIDE_ENV: &str = "HUENAME_STRIDE";
pub const MAX_IN_FLIGHT_ENV: &str = "HUENAME_MAX_IN_FLIGHT";

/// Tuning knobs for one engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Distance between coarse sample indices
    pub stride: usize,

    /// Upper bound on simultaneously running classifier calls
    pub max_in_flight: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stride: DEFAULT_STRIDE,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

impl EngineConfig {
    /// Apply `HUENAME_STRIDE` / `HUENAME_MAX_IN_FLIGHT` as read by `lookup`
    /// (usually `std::env::var`). Empty or unparsable values keep the
    /// current setting; numbers are clamped into range.
    #[must_use]
    pub fn with_overrides_from(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let stride = lookup(STRIDE_ENV);
        let max_in_flight = lookup(MAX_IN_FLIGHT_ENV);
        Self {
            stride: parse_bounded(stride.as_deref(), self.stride, MIN_STRIDE, MAX_STRIDE),
            max_in_flight: parse_bounded(
                max_in_flight.as_deref(),
                self.max_in_flight,
                1,
                MAX_IN_FLIGHT_LIMIT,
            ),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.stride < MIN_STRIDE {
            return Err(EngineError::InvalidConfig(format!(
                "stride must be >= {MIN_STRIDE} (got {})",
                self.stride
            )));
        }

        if self.max_in_flight == 0 {
            return Err(EngineError::InvalidConfig(
                "max_in_flight must be > 0".to_string(),
            ));
        }

        if self.max_in_flight > MAX_IN_FLIGHT_LIMIT {
            return Err(EngineError::InvalidConfig(format!(
                "max_in_flight must be <= {MAX_IN_FLIGHT_LIMIT} (got {})",
                self.max_in_flight
            )));
        }

        Ok(())
    }
}

/// Parse an optional numeric setting, falling back to `default_value` and
/// clamping into `min..=max`.
pub fn parse_bounded(raw: Option<&str>, default_value: usize, min: usize, max: usize) -> usize {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default_value)
        .clamp(min, max)
}
