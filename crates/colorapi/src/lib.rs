//! Classifiers that name [`huename_color::Hsl`] colors: the thecolorapi
//! HTTP client and a deterministic offline stub.

mod error;
mod http;
mod mode;
mod stub;

pub use error::{ColorApiError, Result};
pub use http::{
    ColorApiClassifier, ColorApiConfig, API_BASE_ENV, DEFAULT_API_BASE, DEFAULT_TIMEOUT_SECS,
    TIMEOUT_ENV,
};
pub use mode::{ClassifierMode, NamingClassifier, CLASSIFIER_MODE_ENV};
pub use stub::{stub_name, StubClassifier};
