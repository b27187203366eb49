use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::classify::classify;
use crate::config::{GroupConfig, GroupDisplay};
use crate::gender::Gender;
use crate::participant::Participant;
use crate::rank::rank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupingMode {
    #[serde(rename = "distance")]
    ByDistanceGender,
    #[serde(rename = "classgroups")]
    ByCourseClass,
}

/// What to do with a gender bucket that has no participants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyGroupPolicy {
    #[default]
    Omit,
    EmitBlank,
}

/// One ranked group ready for formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardGroup {
    pub key: String,
    pub dimension: String,
    pub gender: Gender,
    pub display: GroupDisplay,
    pub participants: Vec<Participant>,
}

/// Partition, rank and label `participants`.
///
/// In `ByDistanceGender` mode the config key is `<dimension_key>_<gender>`.
/// In `ByCourseClass` mode the classified course group replaces the dimension,
/// so keys read `<group>_<gender>` (for example `U21_Men`) and `dimension_key`
/// is not used. The same class shares one config entry across distances.
pub fn build_groups(
    participants: &[Participant],
    dimension_key: &str,
    config: &GroupConfig,
    mode: GroupingMode,
    empty: EmptyGroupPolicy,
) -> Vec<LeaderboardGroup> {
    match mode {
        GroupingMode::ByDistanceGender => {
            build_by_distance_gender(participants, dimension_key, config, empty)
        }
        GroupingMode::ByCourseClass => build_by_course_class(participants, config),
    }
}

fn build_by_distance_gender(
    participants: &[Participant],
    distance: &str,
    config: &GroupConfig,
    empty: EmptyGroupPolicy,
) -> Vec<LeaderboardGroup> {
    let mut buckets: HashMap<Gender, Vec<Participant>> = HashMap::new();
    for p in participants {
        buckets.entry(p.gender()).or_default().push(p.clone());
    }
    if empty == EmptyGroupPolicy::EmitBlank {
        buckets.entry(Gender::Women).or_default();
        buckets.entry(Gender::Men).or_default();
    }

    let mut ordered: Vec<(Gender, Vec<Participant>)> = buckets.into_iter().collect();
    ordered.sort_by(|(a, _), (b, _)| {
        a.display_rank()
            .cmp(&b.display_rank())
            .then_with(|| a.label().cmp(b.label()))
    });

    ordered
        .into_iter()
        .map(|(gender, members)| make_group(distance, gender, &members, config))
        .collect()
}

fn build_by_course_class(
    participants: &[Participant],
    config: &GroupConfig,
) -> Vec<LeaderboardGroup> {
    let mut buckets: BTreeMap<String, Vec<Participant>> = BTreeMap::new();
    for p in participants {
        buckets
            .entry(p.course_class.clone())
            .or_default()
            .push(p.clone());
    }

    buckets
        .into_iter()
        .map(|(course_class, members)| {
            let class = classify(&course_class, &members);
            make_group(&class.group, class.gender, &members, config)
        })
        .collect()
}

fn make_group(
    dimension: &str,
    gender: Gender,
    members: &[Participant],
    config: &GroupConfig,
) -> LeaderboardGroup {
    let key = format!("{}_{}", dimension, gender.label());
    let display = config.resolve(&key);
    LeaderboardGroup {
        key,
        dimension: dimension.to_string(),
        gender,
        display,
        participants: rank(members),
    }
}
