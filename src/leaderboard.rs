use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::group::LeaderboardGroup;
use crate::participant::Participant;

/// One numbered position in a record. Unused slots are all empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Slot {
    pub name: String,
    pub time: String,
    pub number: String,
    pub club: String,
    pub position: String,
    pub points: String,
    pub image: String,
}

impl Slot {
    pub fn is_blank(&self) -> bool {
        *self == Slot::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMode {
    None,
    /// Each participant's own image.
    PerSlot,
    /// The group's image on every filled slot.
    Shared,
}

/// Which per-slot keys a consumer expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSet {
    pub name: bool,
    pub time: bool,
    pub number: bool,
    pub club: bool,
    pub position: bool,
    pub points: bool,
    pub image: ImageMode,
}

impl FieldSet {
    pub fn results() -> Self {
        Self {
            name: true,
            time: true,
            number: true,
            club: true,
            position: true,
            points: false,
            image: ImageMode::Shared,
        }
    }

    pub fn podium() -> Self {
        Self {
            name: true,
            time: true,
            number: false,
            club: false,
            position: false,
            points: false,
            image: ImageMode::None,
        }
    }

    pub fn standings() -> Self {
        Self {
            name: true,
            time: false,
            number: false,
            club: false,
            position: false,
            points: true,
            image: ImageMode::PerSlot,
        }
    }
}

/// Fixed-cardinality leaderboard. `slots.len()` is always the configured count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRecord {
    pub title: String,
    pub subtitle: String,
    pub slots: Vec<Slot>,
    pub fields: FieldSet,
}

impl LeaderboardRecord {
    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_blank()).count()
    }
}

/// Shape the first `slot_count` ranked participants into slots, padding with
/// blanks. Participants beyond `slot_count` are dropped.
pub fn format_slots(
    ranked: &[Participant],
    slot_count: usize,
    fields: &FieldSet,
    shared_image: &str,
) -> Vec<Slot> {
    (0..slot_count)
        .map(|idx| match ranked.get(idx) {
            Some(p) => fill_slot(p, fields, shared_image),
            None => Slot::default(),
        })
        .collect()
}

pub fn format_group(
    group: &LeaderboardGroup,
    slot_count: usize,
    fields: FieldSet,
) -> LeaderboardRecord {
    LeaderboardRecord {
        title: group.display.name.clone(),
        subtitle: group.gender.label().to_string(),
        slots: format_slots(&group.participants, slot_count, &fields, &group.display.image),
        fields,
    }
}

fn fill_slot(p: &Participant, fields: &FieldSet, shared_image: &str) -> Slot {
    let image = match fields.image {
        ImageMode::None => String::new(),
        ImageMode::PerSlot => p.image.clone(),
        ImageMode::Shared => shared_image.to_string(),
    };
    Slot {
        name: p.name.clone(),
        time: p.time.clone(),
        number: p.id.clone(),
        club: p.club.clone(),
        position: p.position.clone(),
        points: p.points.clone(),
        image,
    }
}

impl Serialize for LeaderboardRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("Group1", &self.title)?;
        map.serialize_entry("Subgroup1", &self.subtitle)?;
        let f = &self.fields;
        for (idx, slot) in self.slots.iter().enumerate() {
            let n = idx + 1;
            if f.name {
                map.serialize_entry(&format!("Name{n}"), &slot.name)?;
            }
            if f.time {
                map.serialize_entry(&format!("Time{n}"), &slot.time)?;
            }
            if f.number {
                map.serialize_entry(&format!("Number{n}"), &slot.number)?;
            }
            if f.club {
                map.serialize_entry(&format!("Club{n}"), &slot.club)?;
            }
            if f.position {
                map.serialize_entry(&format!("Position{n}"), &slot.position)?;
            }
            if f.points {
                map.serialize_entry(&format!("Points{n}"), &slot.points)?;
            }
            if f.image != ImageMode::None {
                map.serialize_entry(&format!("Image{n}"), &slot.image)?;
            }
        }
        map.end()
    }
}
