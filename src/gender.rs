use serde::{Deserialize, Serialize};

pub const WOMEN_LABEL: &str = "Women";
pub const MEN_LABEL: &str = "Men";
pub const UNKNOWN_LABEL: &str = "Unknown";

// Labels older preset files used in their group keys.
pub const LEGACY_WOMEN_LABEL: &str = "Sievietes";
pub const LEGACY_MEN_LABEL: &str = "Vīrieši";

/// Display gender derived from the provider's single-letter code.
///
/// Codes outside the table are carried through as `Other` so nothing is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Women,
    Men,
    Unknown,
    Other(String),
}

impl Gender {
    pub fn from_code(code: &str) -> Self {
        match code {
            "S" => Gender::Women,
            "V" => Gender::Men,
            other => Gender::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Gender::Women => WOMEN_LABEL,
            Gender::Men => MEN_LABEL,
            Gender::Unknown => UNKNOWN_LABEL,
            Gender::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Gender::Women | Gender::Men)
    }

    // Women before Men, everything else after.
    pub(crate) fn display_rank(&self) -> u8 {
        match self {
            Gender::Women => 0,
            Gender::Men => 1,
            Gender::Unknown | Gender::Other(_) => 2,
        }
    }
}

pub fn normalize(code: &str) -> String {
    Gender::from_code(code).label().to_string()
}
