use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use serde_json::Value;

use crate::gender::Gender;

const ID_KEYS: &[&str] = &["dal_id", "id", "number"];
const NAME_KEYS: &[&str] = &["Name", "full_name", "name"];
const GENDER_KEYS: &[&str] = &["dzimums", "gender"];
const POSITION_KEYS: &[&str] = &["Position", "vieta", "place"];
const TIME_KEYS: &[&str] = &["RaceTime", "Laiks", "time"];
const CLUB_KEYS: &[&str] = &["komanda", "club", "team"];
const COURSE_CLASS_KEYS: &[&str] = &["klase", "course_class", "CourseClass"];
const CATEGORY_KEYS: &[&str] = &["grupa", "category", "group"];
const POINTS_KEYS: &[&str] = &["punkti", "points"];
const IMAGE_KEYS: &[&str] = &["image_path", "image"];

/// One provider row. Every field is optional upstream; missing ones are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub gender_code: String,
    pub position: String,
    pub time: String,
    pub club: String,
    pub course_class: String,
    pub category: String,
    pub points: String,
    pub image: String,
}

impl Participant {
    pub fn from_value(value: &Value) -> Self {
        Self {
            id: pick_string(value, ID_KEYS),
            name: pick_string(value, NAME_KEYS),
            gender_code: pick_string(value, GENDER_KEYS),
            position: pick_string(value, POSITION_KEYS),
            time: pick_string(value, TIME_KEYS),
            club: pick_string(value, CLUB_KEYS),
            course_class: pick_string(value, COURSE_CLASS_KEYS),
            category: pick_string(value, CATEGORY_KEYS),
            points: pick_string(value, POINTS_KEYS),
            image: pick_string(value, IMAGE_KEYS),
        }
    }

    pub fn gender(&self) -> Gender {
        Gender::from_code(&self.gender_code)
    }
}

/// Decode a provider body into participants.
///
/// An empty body or `null` is an empty list. Anything that is not a JSON array
/// (an error object, a bare string) is rejected.
pub fn parse_participants_json(raw: &str) -> Result<Vec<Participant>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }

    let root: Value = serde_json::from_str(trimmed).context("invalid participants json")?;
    match root {
        Value::Array(items) => Ok(items.iter().map(Participant::from_value).collect()),
        Value::Null => Ok(Vec::new()),
        other => Err(anyhow!(
            "expected a list of participants, got {}",
            kind_name(&other)
        )),
    }
}

fn pick_string(value: &Value, keys: &[&str]) -> String {
    for key in keys {
        if let Some(text) = value.get(*key).and_then(as_string) {
            return text;
        }
    }
    String::new()
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
