use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::gender::{LEGACY_MEN_LABEL, LEGACY_WOMEN_LABEL, MEN_LABEL, WOMEN_LABEL};
use crate::group::{EmptyGroupPolicy, GroupingMode};

const DEFAULT_API_URL: &str = "https://www.stirnubuks.lv/api/";
const DEFAULT_TEST_YEAR: &str = "2024";
const DEFAULT_OUTPUT_DIR: &str = "output";
const DEFAULT_TOP_COUNT: usize = 30;
const MIN_POLL_SECS: u64 = 5;

/// Operator-supplied display override for one `"<dimension>_<gender>"` key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDisplay {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupConfig {
    entries: HashMap<String, GroupDisplay>,
}

impl GroupConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, display: GroupDisplay) {
        self.entries.insert(key.into(), display);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewrite `<dimension>_Sievietes` / `<dimension>_Vīrieši` keys to the
    /// `_Women` / `_Men` form the group builder looks up. An entry already
    /// stored under the current key wins over its legacy twin.
    pub fn with_canonical_keys(self) -> Self {
        let (legacy, current): (Vec<_>, Vec<_>) = self
            .entries
            .into_iter()
            .partition(|(key, _)| canonical_group_key(key).is_some());
        let mut entries: HashMap<String, GroupDisplay> = current.into_iter().collect();
        for (key, display) in legacy {
            if let Some(renamed) = canonical_group_key(&key) {
                entries.entry(renamed).or_insert(display);
            }
        }
        Self { entries }
    }

    /// Display name and image for `key`. Unconfigured keys (or a blank name)
    /// show the raw key; images default to empty.
    pub fn resolve(&self, key: &str) -> GroupDisplay {
        match self.entries.get(key) {
            Some(display) => GroupDisplay {
                name: if display.name.trim().is_empty() {
                    key.to_string()
                } else {
                    display.name.clone()
                },
                image: display.image.clone(),
            },
            None => GroupDisplay {
                name: key.to_string(),
                image: String::new(),
            },
        }
    }
}

fn canonical_group_key(key: &str) -> Option<String> {
    [(LEGACY_WOMEN_LABEL, WOMEN_LABEL), (LEGACY_MEN_LABEL, MEN_LABEL)]
        .into_iter()
        .find_map(|(legacy, current)| {
            let stem = key.strip_suffix(legacy)?.strip_suffix('_')?;
            Some(format!("{stem}_{current}"))
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistanceConfig {
    #[serde(default = "default_group_by")]
    pub group_by: GroupingMode,
    #[serde(default = "default_top_count")]
    pub top_count: usize,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            group_by: default_group_by(),
            top_count: DEFAULT_TOP_COUNT,
        }
    }
}

impl DistanceConfig {
    pub fn slot_count(&self) -> usize {
        self.top_count.max(1)
    }
}

fn default_group_by() -> GroupingMode {
    GroupingMode::ByDistanceGender
}

fn default_top_count() -> usize {
    DEFAULT_TOP_COUNT
}

/// Everything the operator configures once per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    #[serde(default)]
    pub groups: GroupConfig,
    #[serde(default)]
    pub distances: HashMap<String, DistanceConfig>,
    #[serde(default = "default_podium_titles")]
    pub podium_titles: HashMap<String, String>,
    #[serde(default = "default_podium_skip")]
    pub podium_skip: Vec<String>,
    #[serde(default)]
    pub empty_groups: EmptyGroupPolicy,
}

impl Default for Preset {
    fn default() -> Self {
        Self {
            groups: GroupConfig::default(),
            distances: HashMap::new(),
            podium_titles: default_podium_titles(),
            podium_skip: default_podium_skip(),
            empty_groups: EmptyGroupPolicy::default(),
        }
    }
}

impl Preset {
    pub fn distance(&self, distance: &str) -> DistanceConfig {
        self.distances.get(distance).copied().unwrap_or_default()
    }

    pub fn podium_title(&self, raw: &str) -> String {
        self.podium_titles
            .get(raw)
            .cloned()
            .unwrap_or_else(|| raw.to_string())
    }

    pub fn skips_podium_group(&self, raw: &str) -> bool {
        let upper = raw.to_uppercase();
        self.podium_skip
            .iter()
            .any(|skip| skip.to_uppercase() == upper)
    }
}

fn default_podium_titles() -> HashMap<String, String> {
    [
        ("VĀVERE", "STAR FM VĀVERE"),
        ("ZAĶIS", "KARTE VESELĪBA ZAĶIS"),
        ("SUSURS", "GARDU MUTI SUSURS"),
        ("VILKS", "GARMIN FĒNIX VILKS"),
        ("STIRNU BUKS", "VENDEN STIRNU BUKS"),
        ("SKOLU ČEMPIONĀTS", "LVM ČEMPIONĀTS SKOLU JAUNIEŠIEM"),
        ("LŪSIS", "GARMIN LŪSIS"),
    ]
    .into_iter()
    .map(|(raw, title)| (raw.to_string(), title.to_string()))
    .collect()
}

fn default_podium_skip() -> Vec<String> {
    vec!["KOMANDAS".to_string(), "SKOLAS".to_string()]
}

/// Parse a preset file body. Older presets are a bare `{key: {name, image}}`
/// map keyed `<distance>_Sievietes` / `<distance>_Vīrieši` and are read as the
/// `groups` section with current gender labels.
pub fn parse_preset_json(raw: &str) -> Result<Preset> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Preset::default());
    }
    if looks_like_legacy(trimmed) {
        let groups = serde_json::from_str::<GroupConfig>(trimmed).context("invalid group map")?;
        return Ok(Preset {
            groups: groups.with_canonical_keys(),
            ..Preset::default()
        });
    }
    let mut preset = serde_json::from_str::<Preset>(trimmed).context("invalid preset json")?;
    preset.groups = preset.groups.with_canonical_keys();
    Ok(preset)
}

// A legacy map has only group keys, none of the preset section names.
fn looks_like_legacy(raw: &str) -> bool {
    const SECTIONS: &[&str] = &[
        "groups",
        "distances",
        "podium_titles",
        "podium_skip",
        "empty_groups",
    ];
    let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(raw) else {
        return false;
    };
    !map.is_empty() && !map.keys().any(|k| SECTIONS.contains(&k.as_str()))
}

pub fn load_preset(path: &Path) -> Result<Preset> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read preset {}", path.display()))?;
    parse_preset_json(&raw).with_context(|| format!("parse preset {}", path.display()))
}

pub fn save_preset(path: &Path, preset: &Preset) -> Result<()> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(preset).context("serialize preset")?;
    fs::write(&tmp, json).context("write preset")?;
    fs::rename(&tmp, path).context("swap preset")?;
    Ok(())
}

/// Provider access and runtime knobs, read from the environment.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub api_url: String,
    pub auth_token: Option<String>,
    pub stage: String,
    pub distances: Vec<String>,
    pub test_mode: bool,
    pub test_year: String,
    pub poll_interval: Duration,
    pub fetch_parallelism: usize,
    pub output_dir: PathBuf,
    pub keep_history: bool,
    pub preset_path: Option<PathBuf>,
}

impl FeedConfig {
    pub fn from_env() -> Self {
        let api_url = opt_env("STIRNUBUKS_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let auth_token = opt_env("STIRNUBUKS_AUTH_TOKEN");
        let stage = opt_env("STIRNUBUKS_STAGE").unwrap_or_default();
        let distances = opt_env("STIRNUBUKS_DISTANCES")
            .map(|raw| parse_list(&raw))
            .unwrap_or_default();
        let test_mode = env_bool("STIRNUBUKS_TEST_MODE", false);
        let test_year =
            opt_env("STIRNUBUKS_TEST_YEAR").unwrap_or_else(|| DEFAULT_TEST_YEAR.to_string());
        let poll_secs = env::var("POLL_SECS")
            .ok()
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(30)
            .max(MIN_POLL_SECS);
        let fetch_parallelism = env::var("FETCH_PARALLELISM")
            .ok()
            .and_then(|val| val.trim().parse::<usize>().ok())
            .unwrap_or(4)
            .clamp(1, 16);
        let output_dir = opt_env("OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
        let keep_history = env_bool("KEEP_HISTORY", false);
        let preset_path = opt_env("PRESET_PATH").map(PathBuf::from);

        Self {
            api_url,
            auth_token,
            stage,
            distances,
            test_mode,
            test_year,
            poll_interval: Duration::from_secs(poll_secs),
            fetch_parallelism,
            output_dir,
            keep_history,
            preset_path,
        }
    }

    /// Stage, at least one distance and a token are needed before any fetch.
    pub fn missing_requirements(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.stage.trim().is_empty() {
            missing.push("STIRNUBUKS_STAGE");
        }
        if self.distances.is_empty() {
            missing.push("STIRNUBUKS_DISTANCES");
        }
        if self.auth_token.is_none() {
            missing.push("STIRNUBUKS_AUTH_TOKEN");
        }
        missing
    }

    pub fn load_preset(&self) -> Result<Preset> {
        match self.preset_path.as_deref() {
            Some(path) => load_preset(path),
            None => Ok(Preset::default()),
        }
    }
}

pub fn parse_list(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in raw.split([',', ';', ' ']) {
        let trimmed = part.trim();
        if trimmed.is_empty() || out.iter().any(|seen| seen == trimmed) {
            continue;
        }
        out.push(trimmed.to_string());
    }
    out
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DistanceConfig, GroupConfig, GroupDisplay, Preset, load_preset, parse_list,
        parse_preset_json, save_preset,
    };
    use crate::group::{EmptyGroupPolicy, GroupingMode};

    #[test]
    fn resolve_falls_back_to_raw_key() {
        let mut groups = GroupConfig::new();
        groups.insert(
            "buks_Women",
            GroupDisplay {
                name: "Stirnu buks sievietes".to_string(),
                image: "buks.png".to_string(),
            },
        );
        groups.insert(
            "buks_Men",
            GroupDisplay {
                name: " ".to_string(),
                image: "men.png".to_string(),
            },
        );

        assert_eq!(groups.resolve("buks_Women").name, "Stirnu buks sievietes");
        assert_eq!(groups.resolve("buks_Men").name, "buks_Men");
        assert_eq!(groups.resolve("buks_Men").image, "men.png");
        let missing = groups.resolve("vilks_Men");
        assert_eq!(missing.name, "vilks_Men");
        assert_eq!(missing.image, "");
    }

    #[test]
    fn full_preset_parses_with_defaults() {
        let raw = r#"{
            "groups": {"vilks_Men": {"name": "Vilks V"}},
            "distances": {"vilks": {"group_by": "classgroups", "top_count": 60}},
            "empty_groups": "emit_blank"
        }"#;
        let preset = parse_preset_json(raw).expect("preset parses");
        assert_eq!(preset.groups.resolve("vilks_Men").name, "Vilks V");
        assert_eq!(
            preset.distance("vilks"),
            DistanceConfig {
                group_by: GroupingMode::ByCourseClass,
                top_count: 60
            }
        );
        assert_eq!(preset.distance("buks"), DistanceConfig::default());
        assert_eq!(preset.empty_groups, EmptyGroupPolicy::EmitBlank);
        assert_eq!(preset.podium_title("VILKS"), "GARMIN FĒNIX VILKS");
        assert!(preset.skips_podium_group("Komandas"));
    }

    #[test]
    fn legacy_flat_map_is_read_as_groups() {
        let raw = r#"{"zakis_Women": {"name": "Zaķis S", "image": "z.png"}}"#;
        let preset = parse_preset_json(raw).expect("legacy preset parses");
        assert_eq!(preset.groups.len(), 1);
        assert_eq!(preset.groups.resolve("zakis_Women").image, "z.png");
    }

    #[test]
    fn legacy_latvian_gender_keys_are_renamed() {
        let raw = r#"{
            "buks_Vīrieši": {"name": "VENDEN STIRNU BUKS V", "image": "v.png"},
            "buks_Sievietes": {"name": "VENDEN STIRNU BUKS S", "image": ""},
            "buks_Men": {"name": "already current", "image": ""}
        }"#;
        let preset = parse_preset_json(raw).expect("legacy preset parses");
        assert_eq!(preset.groups.len(), 2);
        assert_eq!(preset.groups.resolve("buks_Men").name, "already current");
        assert_eq!(preset.groups.resolve("buks_Women").name, "VENDEN STIRNU BUKS S");
    }

    #[test]
    fn suffix_without_separator_is_left_alone() {
        let mut groups = GroupConfig::new();
        groups.insert("Sievietes", GroupDisplay::default());
        let groups = groups.with_canonical_keys();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups.resolve("Sievietes").name, "Sievietes");
    }

    #[test]
    fn zero_top_count_still_yields_one_slot() {
        let cfg = DistanceConfig {
            group_by: GroupingMode::ByDistanceGender,
            top_count: 0,
        };
        assert_eq!(cfg.slot_count(), 1);
    }

    #[test]
    fn list_parsing_dedups_and_trims() {
        assert_eq!(
            parse_list("buks, vilks;buks  zakis"),
            vec!["buks".to_string(), "vilks".to_string(), "zakis".to_string()]
        );
    }

    #[test]
    fn saved_preset_loads_back() {
        let dir = std::env::temp_dir().join(format!("stirnubuks_preset_{}", std::process::id()));
        let path = dir.join("preset.json");
        let mut preset = Preset::default();
        preset.groups.insert(
            "vilks_Women",
            GroupDisplay {
                name: "Vilks S".to_string(),
                image: String::new(),
            },
        );
        save_preset(&path, &preset).expect("preset saves");
        let loaded = load_preset(&path).expect("preset loads");
        assert_eq!(loaded, preset);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
