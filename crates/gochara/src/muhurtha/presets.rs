use crate::ephemeris::Body;
use serde::{Deserialize, Serialize};

pub const CUSTOM_LABEL: &str = "Custom";

/// An activity and the karaka bodies rule 4 checks for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityPreset {
    pub label: String,
    pub karakas: Vec<Body>,
}

impl ActivityPreset {
    pub fn new(label: impl Into<String>, karakas: Vec<Body>) -> Self {
        Self {
            label: label.into(),
            karakas,
        }
    }

    /// The built-in activity list, in display order.
    pub fn builtin() -> Vec<ActivityPreset> {
        BUILTIN
            .iter()
            .map(|(label, karakas)| ActivityPreset::new(*label, karakas.to_vec()))
            .collect()
    }

    /// `presets` followed by a custom preset when `custom` is non-empty.
    pub fn with_custom(mut presets: Vec<ActivityPreset>, custom: &[Body]) -> Vec<ActivityPreset> {
        if !custom.is_empty() {
            presets.push(ActivityPreset::new(CUSTOM_LABEL, custom.to_vec()));
        }
        presets
    }
}

const BUILTIN: [(&str, &[Body]); 9] = [
    ("Travel", &[Body::Moon, Body::Mercury]),
    ("Finance / Investment", &[Body::Jupiter, Body::Venus]),
    ("Job Application", &[Body::Sun, Body::Mercury]),
    ("Hard Work / Toil", &[Body::Saturn]),
    ("Construction", &[Body::Saturn, Body::Mars]),
    ("Marriage", &[Body::Venus]),
    ("Health / Recovery", &[Body::Sun, Body::Moon]),
    ("Legal Matters", &[Body::Saturn, Body::Mars]),
    ("Education / Study", &[Body::Mercury, Body::Jupiter]),
];
