use crate::gender::{Gender, UNKNOWN_LABEL};
use crate::participant::Participant;

const PROBE_SIZE: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub group: String,
    pub gender: Gender,
}

/// Infer the (group, gender) pair a course-class code stands for.
///
/// Gender may be encoded as a `U..V`/`U..S` suffix, a `V`/`S` prefix, or not at
/// all, in which case the first few participants decide.
pub fn classify(course_class: &str, participants: &[Participant]) -> Classification {
    if course_class.is_empty() {
        return Classification {
            group: UNKNOWN_LABEL.to_string(),
            gender: probe_gender(participants),
        };
    }

    if course_class.starts_with('U') {
        if let Some(group) = course_class.strip_suffix('V') {
            return Classification {
                group: group.to_string(),
                gender: Gender::Men,
            };
        }
        if let Some(group) = course_class.strip_suffix('S') {
            return Classification {
                group: group.to_string(),
                gender: Gender::Women,
            };
        }
    }

    if course_class.starts_with('V') {
        return Classification {
            group: course_class.to_string(),
            gender: Gender::Men,
        };
    }
    if course_class.starts_with('S') {
        return Classification {
            group: course_class.to_string(),
            gender: Gender::Women,
        };
    }

    Classification {
        group: course_class.to_string(),
        gender: probe_gender(participants),
    }
}

// All probed participants must agree on a known gender; an empty list is Unknown.
fn probe_gender(participants: &[Participant]) -> Gender {
    let mut probed = participants.iter().take(PROBE_SIZE).map(Participant::gender);
    let Some(first) = probed.next() else {
        return Gender::Unknown;
    };
    if !first.is_known() {
        return Gender::Unknown;
    }
    if probed.all(|g| g == first) {
        first
    } else {
        Gender::Unknown
    }
}
