use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Geographic location coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lon: f64,
}

/// Bodies a chart can track.
///
/// `Rahu` is the mean lunar node. `Ketu` is never asked of the engine; it is
/// always Rahu + 180°.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Body {
    Sun,
    Moon,
    Mars,
    Mercury,
    Jupiter,
    Venus,
    Saturn,
    Rahu,
    Ketu,
    Uranus,
    Neptune,
}

impl Body {
    pub const ALL: [Body; 11] = [
        Body::Sun,
        Body::Moon,
        Body::Mars,
        Body::Mercury,
        Body::Jupiter,
        Body::Venus,
        Body::Saturn,
        Body::Rahu,
        Body::Ketu,
        Body::Uranus,
        Body::Neptune,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Body::Sun => "Sun",
            Body::Moon => "Moon",
            Body::Mars => "Mars",
            Body::Mercury => "Mercury",
            Body::Jupiter => "Jupiter",
            Body::Venus => "Venus",
            Body::Saturn => "Saturn",
            Body::Rahu => "Rahu",
            Body::Ketu => "Ketu",
            Body::Uranus => "Uranus",
            Body::Neptune => "Neptune",
        }
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Body {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        let wanted = match wanted.as_str() {
            "north_node" | "mean_node" => "rahu",
            "south_node" => "ketu",
            other => other,
        };
        Body::ALL
            .iter()
            .copied()
            .find(|body| body.name().to_lowercase() == wanted)
            .ok_or_else(|| format!("Unknown body: {}", s))
    }
}

/// House systems the adapter can ask for. Only Placidus is used for the
/// ascendant today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HouseSystem {
    Placidus,
    WholeSign,
    Equal,
}

impl HouseSystem {
    pub fn code(self) -> u8 {
        match self {
            HouseSystem::Placidus => b'P',
            HouseSystem::WholeSign => b'W',
            HouseSystem::Equal => b'E',
        }
    }
}

/// A user-facing reference frame ("ayanamsa") name with its ordered list of
/// engine constant names. The first constant the engine knows wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceFrame {
    pub name: String,
    pub candidates: Vec<String>,
}

pub const DEFAULT_FRAME: &str = "KP_old";

const BUILTIN_FRAMES: &[(&str, &[&str])] = &[
    (
        "KP_old",
        &[
            "SIDM_KP_OLD",
            "SIDM_KP",
            "SIDM_KRISHNAMURTI",
            "SE_SIDM_KP_OLD",
            "SE_SIDM_KP",
            "SE_SIDM_KRISHNAMURTI",
        ],
    ),
    (
        "Lahiri",
        &["SIDM_LAHIRI", "SIDM_DELUCE_LAHIRI", "SE_SIDM_LAHIRI", "SIDM_DEFAULT"],
    ),
    (
        "Fagan-Bradley",
        &["SIDM_FAGAN_BRADLEY", "SIDM_FAGAN", "SE_SIDM_FAGAN_BRADLEY"],
    ),
    ("Tropical", &["SIDM_0", "SIDM_TROPICAL", "SE_SIDM_TROPICAL"]),
];

/// Named reference frames known to this process.
#[derive(Debug, Clone)]
pub struct FrameCatalog {
    frames: BTreeMap<String, Vec<String>>,
}

impl Default for FrameCatalog {
    fn default() -> Self {
        let frames = BUILTIN_FRAMES
            .iter()
            .map(|(name, candidates)| {
                (
                    name.to_string(),
                    candidates.iter().map(|c| c.to_string()).collect(),
                )
            })
            .collect();
        Self { frames }
    }
}

impl FrameCatalog {
    /// Add or replace the candidate list for a frame name.
    pub fn insert(&mut self, name: impl Into<String>, candidates: Vec<String>) {
        self.frames.insert(name.into(), candidates);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.frames.keys().map(|k| k.as_str())
    }

    /// Resolve a frame by name. Unknown names come back with no candidates,
    /// so selecting them fails the same way an unavailable constant does.
    pub fn frame(&self, name: &str) -> ReferenceFrame {
        ReferenceFrame {
            name: name.to_string(),
            candidates: self.frames.get(name).cloned().unwrap_or_default(),
        }
    }
}

/// Outcome of selecting a frame at the start of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FrameSelection {
    /// `constant` is now the engine's active sidereal mode.
    Selected { frame: String, constant: String },
    /// Nothing was changed; queries run in whatever frame was active before.
    Unresolved { frame: String, reason: String },
}

impl FrameSelection {
    pub fn is_selected(&self) -> bool {
        matches!(self, FrameSelection::Selected { .. })
    }
}
