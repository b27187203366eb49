use std::fs;
use std::path::PathBuf;

use stirnubuks_feed::config::Preset;
use stirnubuks_feed::podium::parse_podium_html;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_podium_page() {
    let records = parse_podium_html(&read_fixture("podium.html"), &Preset::default());
    let labels: Vec<(&str, &str)> = records
        .iter()
        .map(|r| (r.title.as_str(), r.subtitle.as_str()))
        .collect();
    assert_eq!(
        labels,
        vec![
            ("GARMIN FĒNIX VILKS", "V40 Women"),
            ("GARMIN FĒNIX VILKS", "V40 Men"),
            ("KARTE VESELĪBA ZAĶIS", "KOPVĒRTĒJUMS Women"),
        ]
    );

    let women = &records[0];
    assert_eq!(women.slots.len(), 3);
    assert_eq!(women.slots[0].name, "Anna Ozola");
    assert!(women.slots[1].is_blank());
    assert_eq!(women.slots[2].name, "Līga Kalniņa");

    let men = &records[1];
    assert_eq!(men.slots[0].name, "Jānis Bērziņš");
    assert_eq!(men.slots[0].time, "35:12");
    assert_eq!(men.slots[2].name, "Andris Kalns");
}

#[test]
fn podium_records_serialize_name_and_time_only() {
    let records = parse_podium_html(&read_fixture("podium.html"), &Preset::default());
    let json = serde_json::to_value(&records[2]).expect("serializes");
    assert_eq!(json["Group1"], "KARTE VESELĪBA ZAĶIS");
    assert_eq!(json["Name2"], "Ilze Zariņa");
    assert_eq!(json["Time3"], "");
    assert!(json.get("Number1").is_none());
    assert!(json.get("Image1").is_none());
}

#[test]
fn markup_without_page_wrapper_still_parses() {
    let html = concat!(
        "<p>SUSURS</p>",
        "<table><tr><td>1. A B - 10:00</td><td>1. C D - 9:59</td></tr></table>",
    );
    let records = parse_podium_html(html, &Preset::default());
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].title, "GARDU MUTI SUSURS");
    assert_eq!(records[0].subtitle, "Women");
    assert_eq!(records[1].slots[0].time, "9:59");
}

#[test]
fn tables_before_any_heading_are_ignored() {
    let html = concat!(
        "<page><table>",
        "<tr><td>1. A B - 10:00</td><td>1. C D - 9:59</td></tr>",
        "</table></page>",
    );
    assert!(parse_podium_html(html, &Preset::default()).is_empty());
}

#[test]
fn blank_heading_keeps_following_tables() {
    let html = concat!(
        "<page><p>VILKS</p>",
        "<table><tr><td>1. A B - 10:00</td><td>-</td></tr></table>",
        "<p> </p>",
        "<table><tr><td>-</td><td>1. C D - 9:59</td></tr></table></page>",
    );
    let records = parse_podium_html(html, &Preset::default());
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].title, "");
    assert_eq!(records[1].subtitle, "Men");
    assert_eq!(records[1].slots[0].name, "C D");
}
