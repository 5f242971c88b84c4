use thiserror::Error;

pub type Result<T> = std::result::Result<T, ColorApiError>;

#[derive(Error, Debug)]
pub enum ColorApiError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Unsupported HUENAME_CLASSIFIER_MODE '{0}' (expected 'http' or 'stub')")]
    UnsupportedMode(String),
}
