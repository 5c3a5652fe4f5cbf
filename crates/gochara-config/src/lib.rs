use gochara::chart::NATAL_BODIES;
use gochara::muhurtha::{DEFAULT_MIN_RULES, DEFAULT_MIN_SCORE, DEFAULT_TOP_N};
use gochara::{
    parse_utc_offset, ActivityPreset, Body, FrameCatalog, GeoLocation, RuleId, RuleSet, ScanSteps,
    StaticLocationResolver, TransitSettings, DEFAULT_FRAME,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct GocharaSettings {
    /// Directory holding Swiss Ephemeris data files, if not the library default.
    pub ephemeris_path: Option<PathBuf>,
    pub reference_frame: String,
    pub frames: FrameCatalog,
    pub transit: TransitSettings,
    pub muhurtha: MuhurthaSettings,
    pub places: StaticLocationResolver,
}

impl Default for GocharaSettings {
    fn default() -> Self {
        Self {
            ephemeris_path: None,
            reference_frame: DEFAULT_FRAME.to_string(),
            frames: FrameCatalog::default(),
            transit: TransitSettings::default(),
            muhurtha: MuhurthaSettings::default(),
            places: StaticLocationResolver::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MuhurthaSettings {
    pub min_rules: u8,
    pub min_score: u8,
    pub top_n: usize,
    /// Activity list for month scans, custom preset included.
    pub presets: Vec<ActivityPreset>,
    /// Karakas used by a day scan when none are given.
    pub custom: Vec<Body>,
}

impl Default for MuhurthaSettings {
    fn default() -> Self {
        Self {
            min_rules: DEFAULT_MIN_RULES,
            min_score: DEFAULT_MIN_SCORE,
            top_n: DEFAULT_TOP_N,
            presets: ActivityPreset::builtin(),
            custom: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct EphemerisToml {
    #[serde(default)]
    path: Option<PathBuf>,
    #[serde(default)]
    reference_frame: Option<String>,
    #[serde(default)]
    frames: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
struct TransitToml {
    #[serde(default = "default_coarse_step_secs")]
    coarse_step_secs: i64,
    #[serde(default = "default_refine_step_secs")]
    refine_step_secs: i64,
    #[serde(default = "default_orb")]
    orb: f64,
    #[serde(default = "default_true")]
    track_outer_bodies: bool,
    #[serde(default)]
    rules: BTreeMap<String, bool>,
}

impl Default for TransitToml {
    fn default() -> Self {
        Self {
            coarse_step_secs: default_coarse_step_secs(),
            refine_step_secs: default_refine_step_secs(),
            orb: default_orb(),
            track_outer_bodies: true,
            rules: BTreeMap::new(),
        }
    }
}

fn default_coarse_step_secs() -> i64 {
    3600
}

fn default_refine_step_secs() -> i64 {
    60
}

fn default_orb() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
struct PresetToml {
    label: String,
    karakas: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct MuhurthaToml {
    #[serde(default = "default_min_rules")]
    min_rules: u8,
    #[serde(default = "default_min_score")]
    min_score: u8,
    #[serde(default = "default_top_n")]
    top_n: usize,
    #[serde(default)]
    custom: Vec<String>,
    #[serde(default)]
    presets: Vec<PresetToml>,
}

impl Default for MuhurthaToml {
    fn default() -> Self {
        Self {
            min_rules: DEFAULT_MIN_RULES,
            min_score: DEFAULT_MIN_SCORE,
            top_n: DEFAULT_TOP_N,
            custom: Vec::new(),
            presets: Vec::new(),
        }
    }
}

fn default_min_rules() -> u8 {
    DEFAULT_MIN_RULES
}

fn default_min_score() -> u8 {
    DEFAULT_MIN_SCORE
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

#[derive(Debug, Clone, Deserialize)]
struct PlaceToml {
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    utc_offset: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RootConfigToml {
    #[serde(default)]
    ephemeris: EphemerisToml,
    #[serde(default)]
    transit: TransitToml,
    #[serde(default)]
    muhurtha: MuhurthaToml,
    #[serde(default)]
    places: Vec<PlaceToml>,
}

const CONFIG_PATHS: [&str; 2] = ["configs/gochara.toml", "../../configs/gochara.toml"];

/// Read `path`, or the first of the usual relative locations when `None`.
pub fn read_config_text(path: Option<&Path>) -> anyhow::Result<String> {
    if let Some(path) = path {
        return fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Could not read config {}: {e}", path.display()));
    }
    for p in &CONFIG_PATHS {
        if let Ok(c) = fs::read_to_string(p) {
            return Ok(c);
        }
    }
    anyhow::bail!("Could not load gochara.toml from {:?}", CONFIG_PATHS);
}

/// Load settings. An explicit path must exist; without one a missing file
/// means built-in defaults.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<GocharaSettings> {
    match read_config_text(path) {
        Ok(text) => parse_settings(&text),
        Err(e) if path.is_none() => {
            log::info!("{e}; using built-in defaults");
            Ok(GocharaSettings::default())
        }
        Err(e) => Err(e),
    }
}

pub fn parse_settings(text: &str) -> anyhow::Result<GocharaSettings> {
    let root: RootConfigToml =
        toml::from_str(text).map_err(|e| anyhow::anyhow!("Failed to parse gochara.toml: {e}"))?;
    let RootConfigToml {
        ephemeris,
        transit,
        muhurtha,
        places,
    } = root;

    let mut frames = FrameCatalog::default();
    for (name, candidates) in ephemeris.frames {
        if candidates.is_empty() {
            anyhow::bail!("ephemeris.frames.{name} has no candidate constants");
        }
        frames.insert(name, candidates);
    }
    let reference_frame = ephemeris
        .reference_frame
        .unwrap_or_else(|| DEFAULT_FRAME.to_string());

    Ok(GocharaSettings {
        ephemeris_path: ephemeris.path,
        reference_frame,
        frames,
        transit: transit_settings(transit)?,
        muhurtha: muhurtha_settings(muhurtha)?,
        places: place_table(places)?,
    })
}

fn transit_settings(cfg: TransitToml) -> anyhow::Result<TransitSettings> {
    let steps = ScanSteps::from_secs(cfg.coarse_step_secs, cfg.refine_step_secs)?;
    if !(cfg.orb.is_finite() && cfg.orb > 0.0) {
        anyhow::bail!("transit.orb must be a positive number of degrees, got {}", cfg.orb);
    }
    let mut rules = RuleSet::all();
    for (key, enabled) in cfg.rules {
        let rule: RuleId = key
            .parse()
            .map_err(|e| anyhow::anyhow!("transit.rules: {e}"))?;
        rules.set(rule, enabled);
    }
    let natal_bodies = NATAL_BODIES
        .iter()
        .copied()
        .filter(|b| cfg.track_outer_bodies || !matches!(b, Body::Uranus | Body::Neptune))
        .collect();
    Ok(TransitSettings {
        steps,
        orb: cfg.orb,
        rules,
        natal_bodies,
    })
}

fn parse_bodies(field: &str, names: &[String]) -> anyhow::Result<Vec<Body>> {
    names
        .iter()
        .map(|n| n.parse::<Body>().map_err(|e| anyhow::anyhow!("{field}: {e}")))
        .collect()
}

fn muhurtha_settings(cfg: MuhurthaToml) -> anyhow::Result<MuhurthaSettings> {
    if cfg.min_rules > 5 {
        anyhow::bail!("muhurtha.min_rules must be 0..=5, got {}", cfg.min_rules);
    }
    if cfg.min_score > 5 {
        anyhow::bail!("muhurtha.min_score must be 0..=5, got {}", cfg.min_score);
    }
    if cfg.top_n == 0 {
        anyhow::bail!("muhurtha.top_n must be at least 1");
    }
    let custom = parse_bodies("muhurtha.custom", &cfg.custom)?;
    let presets = if cfg.presets.is_empty() {
        ActivityPreset::builtin()
    } else {
        cfg.presets
            .iter()
            .map(|p| {
                let field = format!("muhurtha.presets[{}].karakas", p.label);
                Ok(ActivityPreset::new(p.label.clone(), parse_bodies(&field, &p.karakas)?))
            })
            .collect::<anyhow::Result<Vec<_>>>()?
    };
    Ok(MuhurthaSettings {
        min_rules: cfg.min_rules,
        min_score: cfg.min_score,
        top_n: cfg.top_n,
        presets: ActivityPreset::with_custom(presets, &custom),
        custom,
    })
}

fn place_table(places: Vec<PlaceToml>) -> anyhow::Result<StaticLocationResolver> {
    let mut table = StaticLocationResolver::new();
    for place in places {
        if !(-90.0..=90.0).contains(&place.lat) || !(-180.0..=180.0).contains(&place.lon) {
            anyhow::bail!(
                "places.{}: coordinates out of range ({}, {})",
                place.name,
                place.lat,
                place.lon
            );
        }
        let utc_offset = place
            .utc_offset
            .as_deref()
            .map(parse_utc_offset)
            .transpose()
            .map_err(|e| anyhow::anyhow!("places.{}: {e}", place.name))?;
        table.insert(
            place.name,
            GeoLocation {
                lat: place.lat,
                lon: place.lon,
            },
            utc_offset,
        );
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gochara::LocationResolver;
    use std::io::Write;

    const SAMPLE: &str = r#"
[ephemeris]
reference_frame = "Lahiri"

[ephemeris.frames]
Raman = ["SIDM_RAMAN"]

[transit]
coarse_step_secs = 1800
orb = 0.5
track_outer_bodies = false

[transit.rules]
money_4 = false
loss_4 = false

[muhurtha]
min_score = 3
custom = ["venus", "Saturn"]

[[muhurtha.presets]]
label = "Writing"
karakas = ["Mercury"]

[[places]]
name = "Chennai"
lat = 13.0827
lon = 80.2707
utc_offset = "+05:30"

[[places]]
name = "Nowhere"
lat = 0.0
lon = 0.0
"#;

    #[test]
    fn test_empty_config_is_defaults() {
        let settings = parse_settings("").unwrap();
        assert_eq!(settings.reference_frame, DEFAULT_FRAME);
        assert_eq!(settings.transit, TransitSettings::default());
        assert_eq!(settings.muhurtha, MuhurthaSettings::default());
        assert!(settings.places.is_empty());
    }

    #[test]
    fn test_sample_config() {
        let settings = parse_settings(SAMPLE).unwrap();
        assert_eq!(settings.reference_frame, "Lahiri");
        assert_eq!(settings.frames.frame("Raman").candidates, vec!["SIDM_RAMAN"]);

        let transit = &settings.transit;
        assert_eq!(transit.steps, ScanSteps::from_secs(1800, 60).unwrap());
        assert_eq!(transit.orb, 0.5);
        assert!(!transit.rules.is_enabled(RuleId::Money4));
        assert!(transit.rules.is_enabled(RuleId::Money1));
        assert_eq!(transit.natal_bodies.len(), 8);

        let muhurtha = &settings.muhurtha;
        assert_eq!(muhurtha.min_score, 3);
        assert_eq!(muhurtha.min_rules, DEFAULT_MIN_RULES);
        assert_eq!(muhurtha.custom, vec![Body::Venus, Body::Saturn]);
        let labels: Vec<&str> = muhurtha.presets.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["Writing", "Custom"]);

        let chennai = settings.places.resolve("chennai").unwrap();
        assert_eq!(chennai.utc_offset.local_minus_utc(), 19_800);
        assert!(settings.places.resolve("Nowhere").is_err());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(parse_settings("[transit]\ncoarse_step_secs = 30").is_err());
        assert!(parse_settings("[transit.rules]\nmoney_9 = true").is_err());
        assert!(parse_settings("[muhurtha]\ncustom = [\"Pluto\"]").is_err());
        assert!(parse_settings("[muhurtha]\nmin_rules = 6").is_err());
        assert!(parse_settings("[[places]]\nname = \"X\"\nlat = 95.0\nlon = 0.0").is_err());
        assert!(parse_settings("[[places]]\nname = \"X\"\nlat = 1.0\nlon = 0.0\nutc_offset = \"IST\"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let settings = load_settings(Some(file.path())).unwrap();
        assert_eq!(settings.places.len(), 2);

        let missing = file.path().with_extension("missing");
        assert!(load_settings(Some(&missing)).is_err());
    }
}
