use serde::{Deserialize, Deserializer, Serialize};

use super::time::{day_to_index, format_minutes, parse_time_to_minutes};

/// Default length of a meeting whose end time can't be read
pub const DEFAULT_MEETING_MINUTES: u32 = 60;

/// A clock time as delivered by the course API ("9:50 AM")
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeText {
    #[serde(default)]
    pub formatted: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub military: Option<String>,
}

impl TimeText {
    pub fn new(formatted: impl Into<String>) -> Self {
        Self {
            formatted: formatted.into(),
            military: None,
        }
    }

    pub fn minutes(&self) -> Option<u32> {
        parse_time_to_minutes(&self.formatted)
    }
}

/// One recurring weekly time slot of a section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    #[serde(default)]
    pub day: String,
    #[serde(default)]
    pub start_time: TimeText,
    #[serde(default)]
    pub end_time: TimeText,
    #[serde(default)]
    pub building: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(default)]
    pub campus: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl Meeting {
    pub fn day_index(&self) -> Option<usize> {
        day_to_index(&self.day)
    }

    pub fn start_minute(&self) -> Option<u32> {
        self.start_time.minutes()
    }

    /// End minute, falling back to a one hour meeting when the end time is unreadable.
    /// An afternoon or evening meeting ending at 12:00 AM ends at 1440; any other end
    /// before the start counts as unreadable.
    pub fn end_minute(&self) -> Option<u32> {
        let start = self.start_minute()?;
        Some(match self.end_time.minutes() {
            Some(0) if start >= 12 * 60 => 24 * 60,
            Some(end) if end >= start => end,
            _ => start + DEFAULT_MEETING_MINUTES,
        })
    }

    /// "9:00 AM - 10:20 AM", built from the parsed times when possible
    pub fn time_range(&self) -> String {
        match (self.start_minute(), self.end_minute()) {
            (Some(start), Some(end)) => format!("{} - {}", format_minutes(start), format_minutes(end)),
            _ => format!("{} - {}", self.start_time.formatted, self.end_time.formatted),
        }
    }

    /// Building and room, e.g. "HLL 114"
    pub fn location(&self) -> String {
        match &self.room {
            Some(room) if !room.is_empty() => format!("{} {}", self.building, room).trim().to_string(),
            _ => self.building.clone(),
        }
    }
}

/// A registrable offering of a course
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(default)]
    pub number: String,
    pub index: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub instructors: Vec<String>,
    #[serde(default)]
    pub meeting_times: Vec<Meeting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl Section {
    pub fn is_open(&self) -> bool {
        self.status.eq_ignore_ascii_case("open")
    }

    pub fn instructors_label(&self) -> String {
        if self.instructors.is_empty() {
            "TBA".to_string()
        } else {
            self.instructors.join(", ")
        }
    }
}

/// De-duplication identity of a scheduled entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryKey {
    pub course_string: String,
    pub section_index: String,
}

/// One entry of the personal schedule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledCourse {
    pub course_string: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_description: Option<String>,
    #[serde(default, deserialize_with = "lenient_credits")]
    pub credits: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(default)]
    pub campus_locations: Vec<String>,
    pub selected_section: Section,
}

impl ScheduledCourse {
    pub fn key(&self) -> EntryKey {
        EntryKey {
            course_string: self.course_string.clone(),
            section_index: self.selected_section.index.clone(),
        }
    }

    /// Campus of the first meeting, else the first listed campus, else "Unknown"
    pub fn primary_campus(&self) -> &str {
        self.selected_section
            .meeting_times
            .first()
            .map(|m| m.campus.as_str())
            .filter(|c| !c.is_empty())
            .or_else(|| {
                self.campus_locations
                    .first()
                    .map(String::as_str)
                    .filter(|c| !c.is_empty())
            })
            .unwrap_or("Unknown")
    }

    pub fn credits_label(&self) -> String {
        if let Some(desc) = self.credits_description.as_deref().filter(|d| !d.is_empty()) {
            return desc.to_string();
        }
        match self.credits {
            Some(c) if c.fract() == 0.0 => format!("{}", c as i64),
            Some(c) => format!("{:.1}", c),
            None => "N/A".to_string(),
        }
    }
}

/// Credits arrive as a number, a numeric string, or null depending on the source
pub(crate) fn lenient_credits<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
