use async_trait::async_trait;
use huename_color::Hsl;
use huename_engine::{Classifier, ClassifierError};
use std::str::FromStr;

use crate::error::{ColorApiError, Result};
use crate::http::{ColorApiClassifier, ColorApiConfig};
use crate::stub::StubClassifier;

pub const CLASSIFIER_MODE_ENV: &str = "HUENAME_CLASSIFIER_MODE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassifierMode {
    #[default]
    Http,
    Stub,
}

impl ClassifierMode {
    /// Mode named by `HUENAME_CLASSIFIER_MODE` as read by `lookup`, if set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>> {
        match lookup(CLASSIFIER_MODE_ENV) {
            Some(raw) if !raw.trim().is_empty() => raw.parse().map(Some),
            _ => Ok(None),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Stub => "stub",
        }
    }
}

impl FromStr for ClassifierMode {
    type Err = ColorApiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "stub" => Ok(Self::Stub),
            other => Err(ColorApiError::UnsupportedMode(other.to_string())),
        }
    }
}

/// Whichever namer the current mode selects.
#[derive(Debug)]
pub enum NamingClassifier {
    Http(ColorApiClassifier),
    Stub(StubClassifier),
}

impl NamingClassifier {
    pub fn for_mode(mode: ClassifierMode, config: ColorApiConfig) -> Result<Self> {
        match mode {
            ClassifierMode::Http => Ok(Self::Http(ColorApiClassifier::new(config)?)),
            ClassifierMode::Stub => Ok(Self::Stub(StubClassifier::new())),
        }
    }

    pub fn mode(&self) -> ClassifierMode {
        match self {
            Self::Http(_) => ClassifierMode::Http,
            Self::Stub(_) => ClassifierMode::Stub,
        }
    }
}

#[async_trait]
impl Classifier for NamingClassifier {
    type Item = Hsl;
    type Key = String;
    type Label = String;

    fn key(&self, item: &Hsl) -> String {
        item.key()
    }

    async fn classify(&self, item: &Hsl) -> std::result::Result<String, ClassifierError> {
        match self {
            Self::Http(http) => http.classify(item).await,
            Self::Stub(stub) => stub.classify(item).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_known_values() {
        assert_eq!(" Stub ".parse::<ClassifierMode>().expect("mode"), ClassifierMode::Stub);
        assert_eq!("http".parse::<ClassifierMode>().expect("mode"), ClassifierMode::Http);
        let err = "fast".parse::<ClassifierMode>().unwrap_err();
        assert!(err.to_string().contains("fast"), "unexpected error: {err}");
    }

    #[test]
    fn unset_or_blank_mode_is_none() {
        assert_eq!(ClassifierMode::from_lookup(|_| None).expect("mode"), None);
        assert_eq!(
            ClassifierMode::from_lookup(|_| Some("  ".to_string())).expect("mode"),
            None
        );
        assert_eq!(
            ClassifierMode::from_lookup(|_| Some("stub".to_string())).expect("mode"),
            Some(ClassifierMode::Stub)
        );
    }

    #[test]
    fn stub_mode_needs_no_client() {
        let classifier =
            NamingClassifier::for_mode(ClassifierMode::Stub, ColorApiConfig::default())
                .expect("stub classifier");
        assert_eq!(classifier.mode(), ClassifierMode::Stub);
    }
}
