use std::collections::BTreeMap;

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::config::Preset;
use crate::gender::normalize;
use crate::group::build_groups;
use crate::leaderboard::{FieldSet, LeaderboardRecord, format_group};
use crate::participant::Participant;

const UNKNOWN_TEAM: &str = "Unknown Team";
const UNKNOWN_SUBTEAM: &str = "Unknown Subteam";

/// Participants fetched for one distance, in provider order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistanceResults {
    pub distance: String,
    pub participants: Vec<Participant>,
}

/// Row of the per-distance live results document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRow {
    #[serde(rename = "ImagePath1")]
    pub image_path: String,
    #[serde(rename = "Gender1")]
    pub gender: String,
    #[serde(rename = "Number1")]
    pub number: String,
    #[serde(rename = "Name1")]
    pub name: String,
    #[serde(rename = "Time1")]
    pub time: String,
}

impl From<&Participant> for ResultRow {
    fn from(p: &Participant) -> Self {
        // The graphics layer picks images per group; live rows carry none.
        Self {
            image_path: String::new(),
            gender: normalize(&p.gender_code),
            number: p.id.clone(),
            name: p.name.clone(),
            time: p.time.clone(),
        }
    }
}

/// Live rows per distance, serialized as one JSON object whose keys keep the
/// configured distance order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultsByDistance {
    entries: Vec<(String, Vec<ResultRow>)>,
}

impl ResultsByDistance {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, distance: &str) -> Option<&[ResultRow]> {
        self.entries
            .iter()
            .find(|(d, _)| d == distance)
            .map(|(_, rows)| rows.as_slice())
    }

    pub fn distances(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(d, _)| d.as_str())
    }
}

impl Serialize for ResultsByDistance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (distance, rows) in &self.entries {
            map.serialize_entry(distance, rows)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeamsDocument {
    pub teams: Vec<LeaderboardRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartListEntry {
    pub image_path: String,
    pub gender: String,
    pub number: String,
    pub name: String,
    pub category: String,
    pub club: String,
    pub points: String,
}

pub type StartListGroups = BTreeMap<String, Vec<StartListEntry>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartListDocuments {
    pub by_club: StartListGroups,
    pub by_category: StartListGroups,
}

pub fn build_results_by_distance(data: &[DistanceResults]) -> ResultsByDistance {
    let entries = data
        .iter()
        .filter(|d| !d.participants.is_empty())
        .map(|d| {
            let rows = d.participants.iter().map(ResultRow::from).collect();
            (d.distance.clone(), rows)
        })
        .collect();
    ResultsByDistance { entries }
}

/// Group, rank and format every distance per its configured mode and slot count.
pub fn build_teams_document(
    data: &[DistanceResults],
    preset: &Preset,
    fields: FieldSet,
) -> TeamsDocument {
    let mut teams = Vec::new();
    for d in data {
        if d.participants.is_empty() {
            continue;
        }
        let cfg = preset.distance(&d.distance);
        let groups = build_groups(
            &d.participants,
            &d.distance,
            &preset.groups,
            cfg.group_by,
            preset.empty_groups,
        );
        teams.extend(
            groups
                .iter()
                .map(|g| format_group(g, cfg.slot_count(), fields)),
        );
    }
    TeamsDocument { teams }
}

pub fn build_start_list(participants: &[Participant]) -> StartListDocuments {
    let mut docs = StartListDocuments::default();
    for p in participants {
        let entry = StartListEntry {
            image_path: p.image.clone(),
            gender: normalize(&p.gender_code),
            number: p.id.clone(),
            name: p.name.clone(),
            category: p.category.clone(),
            club: p.club.clone(),
            points: p.points.clone(),
        };
        docs.by_club
            .entry(or_fallback(&p.club, UNKNOWN_TEAM))
            .or_default()
            .push(entry.clone());
        docs.by_category
            .entry(or_fallback(&p.category, UNKNOWN_SUBTEAM))
            .or_default()
            .push(entry);
    }
    docs
}

fn or_fallback(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}
