use thiserror::Error;

pub type Result<T> = std::result::Result<T, ColorError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ColorError {
    #[error("Unknown color space: {0} (expected hsl or oklch)")]
    UnknownSpace(String),

    #[error("{name} must be within {min}..={max} for {space} (got {value})")]
    OutOfRange {
        space: &'static str,
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{name} is not a number: {raw:?}")]
    NotANumber { name: &'static str, raw: String },
}
