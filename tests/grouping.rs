use std::fs;
use std::path::PathBuf;

use stirnubuks_feed::config::{
    DistanceConfig, GroupConfig, GroupDisplay, Preset, parse_preset_json,
};
use stirnubuks_feed::documents::{DistanceResults, build_teams_document};
use stirnubuks_feed::gender::Gender;
use stirnubuks_feed::group::{EmptyGroupPolicy, GroupingMode, build_groups};
use stirnubuks_feed::leaderboard::{FieldSet, format_group};
use stirnubuks_feed::participant::{Participant, parse_participants_json};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn runner(name: &str, gender: &str, time: &str) -> Participant {
    Participant {
        name: name.to_string(),
        gender_code: gender.to_string(),
        time: time.to_string(),
        ..Participant::default()
    }
}

#[test]
fn three_slot_boards_rank_numeric_times_first() {
    let rows = vec![
        runner("Anna", "S", "35:00"),
        runner("Jānis", "V", "31:20"),
        runner("Līga", "S", "DNF"),
        runner("Marta", "S", "33:10"),
        runner("Pēteris", "V", "30:05"),
    ];
    let groups = build_groups(
        &rows,
        "D1",
        &GroupConfig::new(),
        GroupingMode::ByDistanceGender,
        EmptyGroupPolicy::Omit,
    );
    let records: Vec<_> = groups
        .iter()
        .map(|g| format_group(g, 3, FieldSet::results()))
        .collect();

    assert_eq!(records.len(), 2);
    let women = &records[0];
    assert_eq!(women.title, "D1_Women");
    assert_eq!(women.slots.len(), 3);
    let order: Vec<&str> = women.slots.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(order, vec!["Marta", "Anna", "Līga"]);

    let men = &records[1];
    assert_eq!(men.title, "D1_Men");
    assert_eq!(men.slots.len(), 3);
    assert_eq!(men.filled(), 2);
    assert_eq!(men.slots[0].name, "Pēteris");
    assert!(men.slots[2].is_blank());
}

#[test]
fn fixture_groups_by_course_class() {
    let rows = parse_participants_json(&read_fixture("results_buks.json")).expect("fixture parses");
    assert_eq!(rows.len(), 6);

    let groups = build_groups(
        &rows,
        "buks",
        &GroupConfig::new(),
        GroupingMode::ByCourseClass,
        EmptyGroupPolicy::Omit,
    );
    let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(keys, vec!["Unknown_Men", "S21_Women", "U16_Women", "V40_Men"]);

    let s21 = &groups[1];
    assert_eq!(s21.gender, Gender::Women);
    assert_eq!(s21.participants[0].name, "Anna Ozola");
    assert_eq!(s21.participants[1].name, "Līga Kalniņa");
}

#[test]
fn teams_document_follows_distance_config() {
    let rows = parse_participants_json(&read_fixture("results_buks.json")).expect("fixture parses");
    let mut preset = Preset::default();
    preset.distances.insert(
        "buks".to_string(),
        DistanceConfig {
            group_by: GroupingMode::ByDistanceGender,
            top_count: 60,
        },
    );
    preset.groups.insert(
        "buks_Women",
        GroupDisplay {
            name: "Stirnu buks sievietes".to_string(),
            image: "buks_s.png".to_string(),
        },
    );
    let data = vec![
        DistanceResults {
            distance: "buks".to_string(),
            participants: rows,
        },
        DistanceResults {
            distance: "vilks".to_string(),
            participants: Vec::new(),
        },
    ];

    let doc = build_teams_document(&data, &preset, FieldSet::results());
    assert_eq!(doc.teams.len(), 2);
    let women = &doc.teams[0];
    assert_eq!(women.title, "Stirnu buks sievietes");
    assert_eq!(women.slots.len(), 60);
    assert_eq!(women.slots[0].name, "Marta Egle");
    assert_eq!(women.slots[0].image, "buks_s.png");
    assert_eq!(women.slots[3].image, "");

    let json = serde_json::to_value(&doc).expect("serializes");
    let first = &json["teams"][0];
    assert_eq!(first["Group1"], "Stirnu buks sievietes");
    assert_eq!(first["Number1"], "104");
    assert_eq!(first["Name60"], "");
    assert!(first.get("Name61").is_none());
}

#[test]
fn legacy_preset_names_reach_distance_groups() {
    let preset = parse_preset_json(&read_fixture("legacy_preset.json")).expect("preset parses");
    let rows = vec![runner("Jānis", "V", "31:20"), runner("Anna", "S", "35:00")];
    let groups = build_groups(
        &rows,
        "buks",
        &preset.groups,
        GroupingMode::ByDistanceGender,
        EmptyGroupPolicy::Omit,
    );

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].display.name, "VENDEN STIRNU BUKS sievietes");
    assert_eq!(groups[1].key, "buks_Men");
    assert_eq!(groups[1].display.name, "VENDEN STIRNU BUKS vīrieši");
    assert_eq!(groups[1].display.image, "C:/grafika/buks_v.png");
}
