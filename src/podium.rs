//! Podium pages come as loose markup: a `<p>` heading names each group and the
//! table after it holds women in the left column and men in the right one,
//! each cell reading `1. Name Surname - 1:02:03 (club)`.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::config::Preset;
use crate::gender::Gender;
use crate::leaderboard::{FieldSet, LeaderboardRecord, Slot};

const EMPTY_MARKER: &str = "-nav-";
const OVERALL_MARKER: &str = "KOPVĒRTĒJUMS";
const PODIUM_SIZE: usize = 3;

static CELL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)\.\s*(.+?)\s*[-–—]\s*([\d:,.]+)(?:\s*\([^)]*\))?$")
        .expect("podium cell pattern is valid")
});
static PAGE_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("page").expect("page selector is valid"));
static BLOCK_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p, table").expect("block selector is valid"));
static ROW_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("row selector is valid"));
static CELL_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("cell selector is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodiumEntry {
    pub position: String,
    pub name: String,
    pub time: String,
}

/// Parse one `position. name - time` cell. Blank markers and text that does
/// not follow the pattern yield `None`.
pub fn parse_cell(text: &str) -> Option<PodiumEntry> {
    let caps = CELL_RE.captures(text.trim())?;
    let name = caps[2].trim();
    if name == EMPTY_MARKER {
        return None;
    }
    Some(PodiumEntry {
        position: caps[1].to_string(),
        name: name.to_string(),
        time: caps[3].to_string(),
    })
}

/// Exactly three places, matched by each entry's declared position rather than
/// list order. Missing places stay `None`.
pub fn top_three(entries: &[PodiumEntry]) -> [Option<PodiumEntry>; PODIUM_SIZE] {
    std::array::from_fn(|idx| {
        let wanted = (idx + 1).to_string();
        entries.iter().find(|e| e.position == wanted).cloned()
    })
}

/// Walk a podium page and emit one record per non-empty gender per table.
pub fn parse_podium_html(html: &str, preset: &Preset) -> Vec<LeaderboardRecord> {
    let document = Html::parse_document(html);
    let blocks: Vec<ElementRef> = match document.select(&PAGE_SEL).next() {
        Some(page) => page
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| matches!(el.value().name(), "p" | "table"))
            .collect(),
        None => document.select(&BLOCK_SEL).collect(),
    };

    let mut records = Vec::new();
    let mut current_group: Option<String> = None;

    for block in blocks {
        if block.value().name() == "p" {
            let heading = element_text(&block);
            // A blank heading still opens a group; its tables get an empty title.
            current_group = if preset.skips_podium_group(&heading) {
                None
            } else {
                Some(heading)
            };
            continue;
        }

        let Some(group) = current_group.as_deref() else {
            continue;
        };
        records.extend(parse_table(&block, &preset.podium_title(group)));
    }

    records
}

fn parse_table(table: &ElementRef, title: &str) -> Vec<LeaderboardRecord> {
    let mut rows: Vec<ElementRef> = table.select(&ROW_SEL).collect();
    if rows.is_empty() {
        return Vec::new();
    }

    let mut subgroup = String::new();
    let header = rows[0].select(&CELL_SEL).next();
    if let Some(first) = header
        && first.value().attr("colspan").is_some()
    {
        subgroup = subgroup_label(&element_text(&first));
        rows.remove(0);
    }

    let mut women = Vec::new();
    let mut men = Vec::new();
    for row in &rows {
        let cells: Vec<ElementRef> = row.select(&CELL_SEL).collect();
        if cells.len() < 2 {
            continue;
        }
        if let Some(entry) = parse_cell(&element_text(&cells[0])) {
            women.push(entry);
        }
        if let Some(entry) = parse_cell(&element_text(&cells[1])) {
            men.push(entry);
        }
    }

    [(Gender::Women, women), (Gender::Men, men)]
        .into_iter()
        .filter_map(|(gender, entries)| {
            let podium = top_three(&entries);
            if podium.iter().all(Option::is_none) {
                return None;
            }
            Some(LeaderboardRecord {
                title: title.to_string(),
                subtitle: format!("{} {}", subgroup, gender.label()).trim().to_string(),
                slots: podium.into_iter().map(podium_slot).collect(),
                fields: FieldSet::podium(),
            })
        })
        .collect()
}

fn subgroup_label(raw: &str) -> String {
    if raw.to_uppercase().contains(OVERALL_MARKER) {
        return OVERALL_MARKER.to_string();
    }
    let token = raw.split_whitespace().next().unwrap_or_default();
    match token.split_once('.') {
        Some((head, _)) if !head.is_empty() => head.to_string(),
        _ => token.trim_matches('.').to_string(),
    }
}

fn podium_slot(entry: Option<PodiumEntry>) -> Slot {
    match entry {
        Some(e) => Slot {
            name: e.name,
            time: e.time,
            position: e.position,
            ..Slot::default()
        },
        None => Slot::default(),
    }
}

// Whitespace-collapsed text content, so nested tags do not glue words together.
fn element_text(el: &ElementRef) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::{PodiumEntry, parse_cell, subgroup_label, top_three};

    #[test]
    fn parses_plain_cell() {
        assert_eq!(
            parse_cell("1. Jane Doe - 34:12"),
            Some(PodiumEntry {
                position: "1".to_string(),
                name: "Jane Doe".to_string(),
                time: "34:12".to_string(),
            })
        );
    }

    #[test]
    fn accepts_any_dash_and_drops_annotation() {
        let e = parse_cell("3. Anna-Marija Ozola — 1:02:03 (SK Noskrien)").expect("parses");
        assert_eq!(e.name, "Anna-Marija Ozola");
        assert_eq!(e.time, "1:02:03");
        let e = parse_cell("2.Pēteris Kalniņš–41:07").expect("parses");
        assert_eq!(e.name, "Pēteris Kalniņš");
    }

    #[test]
    fn placeholder_and_garbage_are_absent() {
        assert_eq!(parse_cell("2. -nav- – 00:00"), None);
        assert_eq!(parse_cell(""), None);
        assert_eq!(parse_cell("Sievietes"), None);
    }

    #[test]
    fn top_three_matches_declared_positions() {
        let entries = vec![PodiumEntry {
            position: "2".to_string(),
            name: "B".to_string(),
            time: "1".to_string(),
        }];
        let podium = top_three(&entries);
        assert!(podium[0].is_none());
        assert_eq!(podium[1].as_ref().map(|e| e.name.as_str()), Some("B"));
        assert!(podium[2].is_none());
    }

    #[test]
    fn subgroup_labels() {
        assert_eq!(subgroup_label("U14. grupa"), "U14");
        assert_eq!(subgroup_label("V40 vecuma grupa"), "V40");
        assert_eq!(subgroup_label("Kopvērtējums distancē"), "KOPVĒRTĒJUMS");
    }
}
