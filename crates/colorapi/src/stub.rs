use async_trait::async_trait;
use huename_color::Hsl;
use huename_engine::{Classifier, ClassifierError};
use std::sync::atomic::{AtomicUsize, Ordering};

const HUE_NAMES: [&str; 12] = [
    "Red",
    "Orange",
    "Yellow",
    "Chartreuse",
    "Green",
    "Spring Green",
    "Cyan",
    "Azure",
    "Blue",
    "Violet",
    "Magenta",
    "Rose",
];

/// Offline, deterministic namer: one name per 30° hue band, with tone
/// modifiers for very dark, very light or unsaturated colors.
#[derive(Debug, Default)]
pub struct StubClassifier {
    calls: AtomicUsize,
}

impl StubClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

/// The name [`StubClassifier`] gives `color`.
pub fn stub_name(color: &Hsl) -> String {
    if color.l <= 5.0 {
        return "Black".to_string();
    }
    if color.l >= 95.0 {
        return "White".to_string();
    }

    let base = if color.s < 15.0 {
        "Gray"
    } else {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let band = ((color.h + 15.0).rem_euclid(360.0) / 30.0) as usize;
        HUE_NAMES[band.min(HUE_NAMES.len() - 1)]
    };

    if color.l < 30.0 {
        format!("Dark {base}")
    } else if color.l > 70.0 {
        format!("Light {base}")
    } else {
        base.to_string()
    }
}

#[async_trait]
impl Classifier for StubClassifier {
    type Item = Hsl;
    type Key = String;
    type Label = String;

    fn key(&self, item: &Hsl) -> String {
        item.key()
    }

    async fn classify(&self, item: &Hsl) -> Result<String, ClassifierError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(stub_name(item))
    }
}
