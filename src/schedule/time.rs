//! Clock time parsing and formatting for course meeting strings

/// Weekdays that get a calendar column, in column order
pub const DAY_NAMES: [&str; 5] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"];

pub const DAY_COUNT: usize = DAY_NAMES.len();

/// Parse a 12-hour time like "9:50 AM" or "12pm" to minutes since midnight.
/// Returns None for "N/A" or anything that doesn't match `H(:MM)? (AM|PM)`.
pub fn parse_time_to_minutes(text: &str) -> Option<u32> {
    let input = text.trim().to_ascii_uppercase();
    if input.is_empty() || input == "N/A" {
        return None;
    }

    let (time_part, is_pm) = if let Some(rest) = input.strip_suffix("PM") {
        (rest, true)
    } else if let Some(rest) = input.strip_suffix("AM") {
        (rest, false)
    } else {
        return None;
    };
    let time_part = time_part.trim_end();

    let (hour_text, minute_text) = match time_part.split_once(':') {
        Some((h, m)) => (h, Some(m)),
        None => (time_part, None),
    };

    if hour_text.is_empty() || hour_text.len() > 2 || !hour_text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hour: u32 = hour_text.parse().ok()?;

    let minute: u32 = match minute_text {
        Some(m) if m.len() == 2 && m.bytes().all(|b| b.is_ascii_digit()) => m.parse().ok()?,
        Some(_) => return None,
        None => 0,
    };

    if !(1..=12).contains(&hour) || minute > 59 {
        return None;
    }

    // 12 AM is midnight, 12 PM stays noon
    let hour_24 = match (hour, is_pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    };

    Some(hour_24 * 60 + minute)
}

/// Format minutes since midnight as "H:MM AM/PM". 1440 wraps to "12:00 AM".
pub fn format_minutes(minutes: u32) -> String {
    let hour = (minutes / 60) % 24;
    let minute = minutes % 60;
    let (h12, suffix) = match hour {
        0 => (12, "AM"),
        1..=11 => (hour, "AM"),
        12 => (12, "PM"),
        _ => (hour - 12, "PM"),
    };
    format!("{}:{:02} {}", h12, minute, suffix)
}

/// Column for a weekday name; weekends and unknown names are not on the grid
pub fn day_to_index(name: &str) -> Option<usize> {
    DAY_NAMES.iter().position(|d| *d == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_common_forms() {
        assert_eq!(parse_time_to_minutes("9:00 AM"), Some(540));
        assert_eq!(parse_time_to_minutes("10:20 am"), Some(620));
        assert_eq!(parse_time_to_minutes("1:05 PM"), Some(13 * 60 + 5));
        assert_eq!(parse_time_to_minutes("3PM"), Some(15 * 60));
        assert_eq!(parse_time_to_minutes(" 11:59 pm "), Some(1439));
    }

    #[test]
    fn twelve_oclock_edges() {
        assert_eq!(parse_time_to_minutes("12:00 AM"), Some(0));
        assert_eq!(parse_time_to_minutes("12:30 AM"), Some(30));
        assert_eq!(parse_time_to_minutes("12:00 PM"), Some(720));
        assert_eq!(parse_time_to_minutes("12:45 PM"), Some(765));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_time_to_minutes("N/A"), None);
        assert_eq!(parse_time_to_minutes("n/a"), None);
        assert_eq!(parse_time_to_minutes(""), None);
        assert_eq!(parse_time_to_minutes("0940"), None);
        assert_eq!(parse_time_to_minutes("13:00 PM"), None);
        assert_eq!(parse_time_to_minutes("9:7 AM"), None);
        assert_eq!(parse_time_to_minutes("9:60 AM"), None);
        assert_eq!(parse_time_to_minutes("TBA"), None);
    }

    #[test]
    fn weekdays_only() {
        assert_eq!(day_to_index("Monday"), Some(0));
        assert_eq!(day_to_index("Friday"), Some(4));
        assert_eq!(day_to_index("Saturday"), None);
        assert_eq!(day_to_index("monday"), None);
        assert_eq!(day_to_index(""), None);
    }

    #[test]
    fn midnight_label() {
        assert_eq!(format_minutes(0), "12:00 AM");
        assert_eq!(format_minutes(24 * 60), "12:00 AM");
        assert_eq!(format_minutes(7 * 60), "7:00 AM");
        assert_eq!(format_minutes(12 * 60), "12:00 PM");
    }

    proptest! {
        #[test]
        fn format_then_parse_is_identity(minutes in 0u32..1440) {
            prop_assert_eq!(parse_time_to_minutes(&format_minutes(minutes)), Some(minutes));
        }
    }
}
