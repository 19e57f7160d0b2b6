use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use directories::{ProjectDirs, UserDirs};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::schedule::{ScheduleError, ScheduledCourse};

/// Downloadable snapshot of the schedule
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleExport<'a> {
    pub courses: &'a [ScheduledCourse],
    pub export_date: String,
    pub total_courses: usize,
}

fn require_courses(courses: &[ScheduledCourse]) -> Result<(), ScheduleError> {
    if courses.is_empty() {
        return Err(ScheduleError::EmptyScheduleExport);
    }
    Ok(())
}

pub fn build_export(courses: &[ScheduledCourse], now: DateTime<Utc>) -> Result<ScheduleExport<'_>, ScheduleError> {
    require_courses(courses)?;
    Ok(ScheduleExport {
        courses,
        export_date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        total_courses: courses.len(),
    })
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("rutgers-schedule-{}.json", date.format("%Y-%m-%d"))
}

/// Write the export as pretty JSON into `dir`
/// Returns the path of the created file on success
pub fn write_export(courses: &[ScheduledCourse], dir: &Path, now: DateTime<Utc>) -> Result<PathBuf, ScheduleError> {
    let export = build_export(courses, now)?;

    fs::create_dir_all(dir)
        .map_err(|e| ScheduleError::ExportFailed(format!("Failed to create {}: {}", dir.display(), e)))?;

    let json = serde_json::to_string_pretty(&export)
        .map_err(|e| ScheduleError::ExportFailed(format!("Failed to serialize: {}", e)))?;

    let file_path = dir.join(export_file_name(now.date_naive()));
    fs::write(&file_path, json)
        .map_err(|e| ScheduleError::ExportFailed(format!("Failed to write file: {}", e)))?;

    log::info!("Exported {} courses to {}", export.total_courses, file_path.display());
    Ok(file_path)
}

/// Downloads folder, else the app's data folder
pub fn export_dir() -> Option<PathBuf> {
    UserDirs::new()
        .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
        .or_else(|| ProjectDirs::from("edu", "rutgers", "course-planner").map(|d| d.data_dir().to_path_buf()))
}

/// Deep link into the registration system with every section index preselected
pub fn registration_link(
    courses: &[ScheduledCourse],
    registration_url: &str,
    semester_code: &str,
) -> Result<String, ScheduleError> {
    require_courses(courses)?;
    let indices: Vec<&str> = courses
        .iter()
        .map(|c| c.selected_section.index.as_str())
        .collect();
    Ok(format!(
        "{}?login=cas&semesterSelection={}&indexList={}",
        registration_url,
        semester_code,
        indices.join(",")
    ))
}

/// Link to the search page that reopens this schedule
pub fn share_link(courses: &[ScheduledCourse], base_url: &str) -> Result<String, ScheduleError> {
    require_courses(courses)?;
    let json = serde_json::to_string(courses)
        .map_err(|e| ScheduleError::ExportFailed(format!("Failed to serialize: {}", e)))?;
    Ok(format!(
        "{}/search?schedule={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(&json)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::model::fixtures::{course, meeting, section};
    use chrono::TimeZone;

    fn schedule() -> Vec<ScheduledCourse> {
        vec![
            course("01:198:112", section("12345", vec![meeting("Monday", "9:00 AM", "10:20 AM")])),
            course("01:640:250", section("22222", vec![])),
        ]
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 14, 30, 0).unwrap()
    }

    #[test]
    fn empty_schedule_exports_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(write_export(&[], dir.path(), now()).unwrap_err(), ScheduleError::EmptyScheduleExport);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(
            registration_link(&[], "https://reg.example.edu", "12025").unwrap_err(),
            ScheduleError::EmptyScheduleExport
        );
        assert!(share_link(&[], "http://localhost:5000").is_err());
    }

    #[test]
    fn export_document_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_export(&schedule(), dir.path(), now()).unwrap();
        assert_eq!(path.file_name().unwrap(), "rutgers-schedule-2025-01-15.json");

        let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["totalCourses"], 2);
        assert_eq!(doc["exportDate"], "2025-01-15T14:30:00.000Z");
        assert_eq!(doc["courses"][0]["courseString"], "01:198:112");
        assert_eq!(doc["courses"][0]["selectedSection"]["meetingTimes"][0]["startTime"]["formatted"], "9:00 AM");
    }

    #[test]
    fn registration_link_lists_indices_in_order() {
        let link = registration_link(&schedule(), "https://sims.rutgers.edu/webreg/editSchedule.htm", "12025").unwrap();
        assert_eq!(
            link,
            "https://sims.rutgers.edu/webreg/editSchedule.htm?login=cas&semesterSelection=12025&indexList=12345,22222"
        );
    }

    #[test]
    fn share_link_round_trips_the_schedule() {
        let link = share_link(&schedule(), "http://localhost:5000/").unwrap();
        let encoded = link.strip_prefix("http://localhost:5000/search?schedule=").unwrap();
        let decoded = urlencoding::decode(encoded).unwrap();
        let courses: Vec<ScheduledCourse> = serde_json::from_str(&decoded).unwrap();
        assert_eq!(courses, schedule());
    }
}
