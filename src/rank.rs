use std::cmp::Ordering;

use crate::participant::Participant;

/// Finishing position as a sort key. Anything that is not a plain
/// non-negative integer sorts after every real position.
pub fn position_key(raw: &str) -> f64 {
    raw.trim()
        .parse::<u64>()
        .map(|v| v as f64)
        .unwrap_or(f64::INFINITY)
}

/// Race time as a sort key in the provider's own unit.
///
/// Accepts a non-negative decimal with at most one `.` or `,` separator, or a
/// clock value (`mm:ss`, `h:mm:ss`) converted to seconds. Placeholders such as
/// `DNF` or `--:--` sort last and never read as zero.
pub fn time_key(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.contains(':') {
        return parse_clock(trimmed).unwrap_or(f64::INFINITY);
    }
    parse_decimal(trimmed).unwrap_or(f64::INFINITY)
}

/// Stable sort by position, then time.
pub fn rank(participants: &[Participant]) -> Vec<Participant> {
    let mut keyed: Vec<(f64, f64, &Participant)> = participants
        .iter()
        .map(|p| (position_key(&p.position), time_key(&p.time), p))
        .collect();
    keyed.sort_by(|a, b| compare_keys((a.0, a.1), (b.0, b.1)));
    keyed.into_iter().map(|(_, _, p)| p.clone()).collect()
}

fn compare_keys(a: (f64, f64), b: (f64, f64)) -> Ordering {
    a.0.total_cmp(&b.0).then_with(|| a.1.total_cmp(&b.1))
}

fn parse_decimal(raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return None;
    }
    let mut separators = 0usize;
    for ch in raw.chars() {
        match ch {
            '0'..='9' => {}
            '.' | ',' => separators += 1,
            _ => return None,
        }
    }
    if separators > 1 || !raw.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    raw.replace(',', ".").parse::<f64>().ok()
}

fn parse_clock(raw: &str) -> Option<f64> {
    let parts: Vec<&str> = raw.split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return None;
    }
    let (last, leading) = parts.split_last()?;
    let mut total = 0.0;
    for part in leading {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        total = total * 60.0 + part.parse::<f64>().ok()?;
    }
    let seconds = parse_decimal(last)?;
    if seconds >= 60.0 {
        return None;
    }
    Some(total * 60.0 + seconds)
}

#[cfg(test)]
mod tests {
    use super::{position_key, rank, time_key};
    use crate::participant::Participant;

    fn runner(name: &str, position: &str, time: &str) -> Participant {
        Participant {
            name: name.to_string(),
            position: position.to_string(),
            time: time.to_string(),
            ..Participant::default()
        }
    }

    fn names(rows: &[Participant]) -> Vec<&str> {
        rows.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn keys_treat_placeholders_as_worst() {
        assert_eq!(position_key("4"), 4.0);
        assert_eq!(position_key(" 12 "), 12.0);
        assert!(position_key("").is_infinite());
        assert!(position_key("-1").is_infinite());
        assert!(position_key("DNF").is_infinite());

        assert_eq!(time_key("12.5"), 12.5);
        assert_eq!(time_key("12,5"), 12.5);
        assert_eq!(time_key("34:12"), 34.0 * 60.0 + 12.0);
        assert_eq!(time_key("1:02:03"), 3723.0);
        assert!(time_key("1.2.3").is_infinite());
        assert!(time_key("").is_infinite());
        assert!(time_key("--:--").is_infinite());
        assert!(time_key("DNS").is_infinite());
    }

    #[test]
    fn sorts_by_position_then_time() {
        let rows = vec![
            runner("c", "3", "40:00"),
            runner("b", "", "35:00"),
            runner("a", "1", "30:00"),
            runner("d", "", "33:00"),
        ];
        assert_eq!(names(&rank(&rows)), vec!["a", "c", "d", "b"]);
    }

    #[test]
    fn unparseable_rows_keep_input_order() {
        let rows = vec![
            runner("x", "DNF", ""),
            runner("y", "", "DNS"),
            runner("winner", "1", "20:00"),
            runner("z", "-", "-"),
        ];
        assert_eq!(names(&rank(&rows)), vec!["winner", "x", "y", "z"]);
    }

    #[test]
    fn ranking_is_idempotent() {
        let rows = vec![
            runner("a", "2", "31:00"),
            runner("b", "2", "30:00"),
            runner("c", "", ""),
            runner("d", "1", ""),
        ];
        let once = rank(&rows);
        let twice = rank(&once);
        assert_eq!(once, twice);
    }
}
