use serde::Deserialize;

use crate::schedule::model::{lenient_credits, Meeting, ScheduledCourse, Section, TimeText};

/// Envelope of `/api/courses`
#[derive(Debug, Clone, Deserialize)]
pub struct CoursesResponse {
    pub status: String,
    #[serde(default)]
    pub data: Vec<ApiCourse>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiCourse {
    #[serde(rename = "courseString")]
    pub course_string: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subject: String,
    #[serde(rename = "subjectDescription", default)]
    pub subject_description: Option<String>,
    #[serde(default, deserialize_with = "lenient_credits")]
    pub credits: Option<f64>,
    #[serde(rename = "creditsDescription", default)]
    pub credits_description: Option<String>,
    #[serde(default)]
    pub school: Option<String>,
    #[serde(rename = "campusLocations", default)]
    pub campus_locations: Vec<String>,
    #[serde(default)]
    pub sections: Vec<ApiSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSection {
    #[serde(default)]
    pub number: String,
    pub index: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub instructors: Vec<String>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub meeting_times: Vec<ApiMeeting>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTime {
    #[serde(default)]
    pub military: Option<String>,
    #[serde(default)]
    pub formatted: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiMeeting {
    #[serde(default)]
    pub day: String,
    pub start_time: Option<ApiTime>,
    pub end_time: Option<ApiTime>,
    #[serde(default)]
    pub building: Option<String>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub campus: Option<String>,
}

/// The service fills missing values with "N/A"
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "N/A")
}

pub fn campus_name(code: &str) -> &str {
    match code {
        "1" | "CA" => "College Ave",
        "2" | "BU" => "Busch",
        "3" | "LIV" => "Livingston",
        "4" | "CD" | "C/D" | "D/C" => "Cook/Doug",
        other => other,
    }
}

pub fn weekday_name(code: &str) -> &str {
    match code {
        "M" => "Monday",
        "T" => "Tuesday",
        "W" => "Wednesday",
        "H" => "Thursday",
        "F" => "Friday",
        "S" => "Saturday",
        "Su" => "Sunday",
        other => other,
    }
}

impl From<ApiTime> for TimeText {
    fn from(time: ApiTime) -> Self {
        TimeText {
            formatted: time.formatted,
            military: present(time.military),
        }
    }
}

impl From<ApiMeeting> for Meeting {
    fn from(m: ApiMeeting) -> Self {
        let missing = || TimeText::new("N/A");
        Meeting {
            day: weekday_name(&m.day).to_string(),
            start_time: m.start_time.map(TimeText::from).unwrap_or_else(missing),
            end_time: m.end_time.map(TimeText::from).unwrap_or_else(missing),
            building: present(m.building).unwrap_or_default(),
            room: present(m.room),
            campus: present(m.campus)
                .map(|c| campus_name(&c).to_string())
                .unwrap_or_default(),
            mode: present(m.mode),
        }
    }
}

impl From<ApiSection> for Section {
    fn from(s: ApiSection) -> Self {
        Section {
            number: s.number,
            index: s.index,
            status: s.status,
            instructors: s.instructors.into_iter().filter(|i| !i.trim().is_empty()).collect(),
            meeting_times: s.meeting_times.into_iter().map(Meeting::from).collect(),
            comments: present(s.comments),
        }
    }
}

impl ApiCourse {
    /// Sections in the internal shape
    pub fn internal_sections(&self) -> Vec<Section> {
        self.sections.iter().cloned().map(Section::from).collect()
    }

    /// Schedule entry for one of this course's sections
    pub fn to_scheduled(&self, section: Section) -> ScheduledCourse {
        ScheduledCourse {
            course_string: self.course_string.clone(),
            title: self.title.clone(),
            subject: self.subject.clone(),
            subject_description: present(self.subject_description.clone()),
            credits: self.credits,
            credits_description: present(self.credits_description.clone()),
            school: present(self.school.clone()),
            campus_locations: self.campus_locations.clone(),
            selected_section: section,
        }
    }
}

/// All sections of the course whose identifier matches exactly
pub fn sections_for_course(response: CoursesResponse, course_string: &str) -> Vec<Section> {
    response
        .data
        .into_iter()
        .filter(|c| c.course_string == course_string)
        .flat_map(|c| c.sections)
        .map(Section::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"{
        "status": "success",
        "data": [
            {
                "courseString": "01:198:112",
                "title": "DATA STRUCTURES",
                "subject": "198",
                "subjectDescription": "Computer Science",
                "credits": 4,
                "creditsDescription": "4.0 credits",
                "school": "School of Arts and Sciences",
                "campusLocations": ["Busch"],
                "sections": [{
                    "number": "01",
                    "index": "12345",
                    "status": "Open",
                    "instructors": ["CENTENO, ANA"],
                    "comments": "",
                    "meeting_times": [{
                        "day": "Monday",
                        "start_time": {"military": "1020", "formatted": "10:20 AM"},
                        "end_time": {"military": "1140", "formatted": "11:40 AM"},
                        "building": "HLL",
                        "room": "114",
                        "mode": "LEC",
                        "campus": "Busch"
                    }, {
                        "day": "N/A",
                        "start_time": {"military": "N/A", "formatted": "N/A"},
                        "end_time": {"military": "N/A", "formatted": "N/A"},
                        "building": "N/A",
                        "room": "N/A",
                        "mode": "ONLINE INSTRUCTION(INTERNET)",
                        "campus": "N/A"
                    }]
                }]
            },
            {
                "courseString": "01:198:112H",
                "title": "DATA STRUCTURES HONORS",
                "subject": "198",
                "credits": "",
                "sections": [{"number": "H1", "index": "99999", "meeting_times": []}]
            }
        ],
        "last_update": "2025-01-10T12:00:00"
    }"#;

    #[test]
    fn maps_wire_meetings_into_model() {
        let response: CoursesResponse = serde_json::from_str(RESPONSE).unwrap();
        let sections = sections_for_course(response, "01:198:112");
        assert_eq!(sections.len(), 1);

        let section = &sections[0];
        assert!(section.is_open());
        assert_eq!(section.comments, None);

        let lecture = &section.meeting_times[0];
        assert_eq!(lecture.start_minute(), Some(620));
        assert_eq!(lecture.end_minute(), Some(700));
        assert_eq!(lecture.start_time.military.as_deref(), Some("1020"));
        assert_eq!(lecture.location(), "HLL 114");

        let online = &section.meeting_times[1];
        assert_eq!(online.building, "");
        assert_eq!(online.room, None);
        assert_eq!(online.campus, "");
        assert_eq!(online.start_minute(), None);
    }

    #[test]
    fn exact_course_string_match_only() {
        let response: CoursesResponse = serde_json::from_str(RESPONSE).unwrap();
        let honors = sections_for_course(response, "01:198:112H");
        assert_eq!(honors.len(), 1);
        assert_eq!(honors[0].index, "99999");
    }

    #[test]
    fn codes_are_expanded() {
        let meeting = Meeting::from(ApiMeeting {
            day: "H".to_string(),
            start_time: None,
            end_time: None,
            building: Some("ARC".to_string()),
            room: None,
            mode: None,
            campus: Some("2".to_string()),
        });
        assert_eq!(meeting.day, "Thursday");
        assert_eq!(meeting.campus, "Busch");
        assert_eq!(meeting.start_time.formatted, "N/A");
        assert_eq!(weekday_name("Su"), "Sunday");
        assert_eq!(campus_name("C/D"), "Cook/Doug");
    }

    #[test]
    fn builds_schedule_entry_from_course() {
        let response: CoursesResponse = serde_json::from_str(RESPONSE).unwrap();
        let course = &response.data[0];
        let section = course.internal_sections().remove(0);
        let entry = course.to_scheduled(section);

        assert_eq!(entry.course_string, "01:198:112");
        assert_eq!(entry.credits, Some(4.0));
        assert_eq!(entry.credits_label(), "4.0 credits");
        assert_eq!(entry.primary_campus(), "Busch");

        let honors = &response.data[1];
        assert_eq!(honors.credits, None);
        assert!(honors.to_scheduled(Section::default()).campus_locations.is_empty());
    }
}
