//! The ordered list of scheduled courses and its persistence.
//!
//! Every mutation writes the full list back under [`STORAGE_KEY`]. Write failures never drop
//! the in-memory change; they surface once through [`ScheduleStore::take_warning`].

use std::collections::BTreeSet;
#[cfg(test)]
use std::collections::HashMap;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;

use super::error::ScheduleError;
use super::model::{EntryKey, ScheduledCourse, Section};

pub const STORAGE_KEY: &str = "scheduledCourses";

/// Key/value persistence for the schedule
pub trait PersistenceStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the platform data directory
    pub fn open_default() -> Result<Self> {
        let dirs = ProjectDirs::from("edu", "rutgers", "course-planner")
            .context("Could not determine data directory")?;
        Ok(Self::new(dirs.data_dir()))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl PersistenceStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(contents))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        // Write beside the target then rename, so a crash never leaves half a file
        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{}.json.tmp", key));
        fs::write(&tmp, value).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path).with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub values: HashMap<String, String>,
    pub fail_writes: bool,
    pub writes: usize,
}

#[cfg(test)]
impl PersistenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes {
            anyhow::bail!("quota exceeded");
        }
        self.values.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }
}

/// Header summary of the schedule
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScheduleStats {
    pub total_courses: usize,
    pub campus_count: usize,
    pub total_credits: f64,
}

/// Keep the first entry for each (course, section index), in order
fn dedup_entries(courses: Vec<ScheduledCourse>) -> Vec<ScheduledCourse> {
    let mut seen = HashSet::new();
    courses
        .into_iter()
        .filter(|course| {
            let key = course.key();
            if seen.insert(key.clone()) {
                true
            } else {
                log::warn!(
                    "Dropping duplicate saved entry {} section {}",
                    key.course_string, key.section_index
                );
                false
            }
        })
        .collect()
}

pub struct ScheduleStore<P: PersistenceStore> {
    courses: Vec<ScheduledCourse>,
    persistence: P,
    pending_warning: Option<ScheduleError>,
}

impl<P: PersistenceStore> ScheduleStore<P> {
    /// Read the saved schedule. Missing data is an empty schedule; unreadable data is reset
    /// to empty with a warning waiting in [`take_warning`](Self::take_warning).
    pub fn load(persistence: P) -> Self {
        let mut pending_warning = None;
        let courses = match persistence.get(STORAGE_KEY) {
            Ok(None) => Vec::new(),
            Ok(Some(raw)) if raw.trim().is_empty() => Vec::new(),
            Ok(Some(raw)) => match serde_json::from_str::<Vec<ScheduledCourse>>(&raw) {
                Ok(courses) => dedup_entries(courses),
                Err(e) => {
                    log::warn!("Discarding unreadable saved schedule: {}", e);
                    pending_warning = Some(ScheduleError::CorruptPersistedState(e.to_string()));
                    Vec::new()
                }
            },
            Err(e) => {
                log::warn!("Could not read saved schedule: {:#}", e);
                pending_warning = Some(ScheduleError::CorruptPersistedState(format!("{:#}", e)));
                Vec::new()
            }
        };
        log::info!("Loaded {} scheduled courses", courses.len());

        Self {
            courses,
            persistence,
            pending_warning,
        }
    }

    pub fn courses(&self) -> &[ScheduledCourse] {
        &self.courses
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&ScheduledCourse> {
        self.courses.get(position)
    }

    pub fn position_of(&self, key: &EntryKey) -> Option<usize> {
        self.courses.iter().position(|c| &c.key() == key)
    }

    pub fn take_warning(&mut self) -> Option<ScheduleError> {
        self.pending_warning.take()
    }

    #[cfg(test)]
    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn add(&mut self, course: ScheduledCourse) -> Result<(), ScheduleError> {
        let key = course.key();
        if self.position_of(&key).is_some() {
            return Err(ScheduleError::DuplicateSection {
                course_string: key.course_string,
                section_index: key.section_index,
            });
        }
        log::info!("Adding {} section {}", key.course_string, key.section_index);
        self.courses.push(course);
        self.persist();
        Ok(())
    }

    pub fn remove(&mut self, position: usize) -> Result<ScheduledCourse, ScheduleError> {
        self.check_position(position)?;
        let removed = self.courses.remove(position);
        log::info!("Removed {}", removed.course_string);
        self.persist();
        Ok(removed)
    }

    /// Swap the selected section of one entry, keeping its position
    pub fn replace_section(&mut self, position: usize, section: Section) -> Result<(), ScheduleError> {
        self.check_position(position)?;

        let course_string = self.courses[position].course_string.clone();
        let taken_elsewhere = self.courses.iter().enumerate().any(|(i, c)| {
            i != position && c.course_string == course_string && c.selected_section.index == section.index
        });
        if taken_elsewhere {
            return Err(ScheduleError::DuplicateSection {
                course_string,
                section_index: section.index,
            });
        }

        log::info!(
            "{}: section {} -> {}",
            course_string,
            self.courses[position].selected_section.index,
            section.index
        );
        self.courses[position].selected_section = section;
        self.persist();
        Ok(())
    }

    /// Empty the schedule. Returns false when there was nothing to clear.
    pub fn clear(&mut self) -> bool {
        if self.courses.is_empty() {
            return false;
        }
        self.courses.clear();
        self.persist();
        true
    }

    pub fn stats(&self) -> ScheduleStats {
        let campuses: BTreeSet<&str> = self.courses.iter().map(ScheduledCourse::primary_campus).collect();
        ScheduleStats {
            total_courses: self.courses.len(),
            campus_count: campuses.len(),
            total_credits: self.courses.iter().filter_map(|c| c.credits).sum(),
        }
    }

    fn check_position(&self, position: usize) -> Result<(), ScheduleError> {
        if position >= self.courses.len() {
            return Err(ScheduleError::PositionOutOfRange {
                position,
                len: self.courses.len(),
            });
        }
        Ok(())
    }

    fn persist(&mut self) {
        let result = serde_json::to_string(&self.courses)
            .context("Failed to serialize schedule")
            .and_then(|json| self.persistence.set(STORAGE_KEY, &json));
        if let Err(e) = result {
            log::error!("Failed to persist schedule: {:#}", e);
            self.pending_warning = Some(ScheduleError::Persistence(format!("{:#}", e)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::model::fixtures::{course, meeting, section};

    fn calc() -> ScheduledCourse {
        course("01:640:135", section("11111", vec![meeting("Monday", "9:00 AM", "10:20 AM")]))
    }

    #[test]
    fn add_rejects_duplicates() {
        let mut store = ScheduleStore::load(MemoryStore::default());
        store.add(calc()).unwrap();
        let err = store.add(calc()).unwrap_err();
        assert!(matches!(err, ScheduleError::DuplicateSection { .. }));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn same_course_other_section_is_allowed() {
        let mut store = ScheduleStore::load(MemoryStore::default());
        store.add(calc()).unwrap();
        store
            .add(course("01:640:135", section("22222", vec![])))
            .unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn mutations_persist_and_reload() {
        let mut store = ScheduleStore::load(MemoryStore::default());
        store.add(calc()).unwrap();
        store.add(course("01:198:112", section("12345", vec![]))).unwrap();
        store.remove(0).unwrap();
        assert_eq!(store.persistence().writes, 3);

        let saved = store.persistence().values.get(STORAGE_KEY).cloned().unwrap();
        let reloaded = ScheduleStore::load(MemoryStore {
            values: HashMap::from([(STORAGE_KEY.to_string(), saved)]),
            ..Default::default()
        });
        assert_eq!(reloaded.courses()[0].course_string, "01:198:112");
    }

    #[test]
    fn remove_out_of_range() {
        let mut store = ScheduleStore::load(MemoryStore::default());
        let err = store.remove(0).unwrap_err();
        assert_eq!(err, ScheduleError::PositionOutOfRange { position: 0, len: 0 });
    }

    #[test]
    fn replace_section_keeps_position() {
        let mut store = ScheduleStore::load(MemoryStore::default());
        store.add(course("A", section("1", vec![]))).unwrap();
        store.add(calc()).unwrap();
        store.add(course("B", section("2", vec![]))).unwrap();

        store.replace_section(1, section("33333", vec![])).unwrap();
        assert_eq!(store.courses()[1].selected_section.index, "33333");
        assert_eq!(store.courses()[1].course_string, "01:640:135");
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn replace_section_refuses_duplicate_key() {
        let mut store = ScheduleStore::load(MemoryStore::default());
        store.add(calc()).unwrap();
        store.add(course("01:640:135", section("22222", vec![]))).unwrap();
        let err = store.replace_section(1, section("11111", vec![])).unwrap_err();
        assert!(matches!(err, ScheduleError::DuplicateSection { .. }));
        assert_eq!(store.courses()[1].selected_section.index, "22222");
    }

    #[test]
    fn corrupt_state_resets_with_warning() {
        let persistence = MemoryStore {
            values: HashMap::from([(STORAGE_KEY.to_string(), "{not json".to_string())]),
            ..Default::default()
        };
        let mut store = ScheduleStore::load(persistence);
        assert!(store.is_empty());
        assert!(matches!(store.take_warning(), Some(ScheduleError::CorruptPersistedState(_))));
        assert!(store.take_warning().is_none());
    }

    #[test]
    fn saved_duplicates_keep_the_first_copy() {
        let other = course("01:198:112", section("12345", vec![]));
        let mut renamed = calc();
        renamed.title = "Second copy".to_string();
        let saved = serde_json::to_string(&vec![calc(), other, renamed]).unwrap();

        let mut store = ScheduleStore::load(MemoryStore {
            values: HashMap::from([(STORAGE_KEY.to_string(), saved)]),
            ..Default::default()
        });
        assert_eq!(store.len(), 2);
        assert_eq!(store.courses()[0], calc());
        assert_eq!(store.courses()[1].course_string, "01:198:112");
        assert!(store.take_warning().is_none());
    }

    #[test]
    fn write_failure_keeps_memory_state() {
        let mut store = ScheduleStore::load(MemoryStore {
            fail_writes: true,
            ..Default::default()
        });
        store.add(calc()).unwrap();
        assert_eq!(store.len(), 1);
        assert!(matches!(store.take_warning(), Some(ScheduleError::Persistence(_))));
    }

    #[test]
    fn clear_reports_whether_anything_changed() {
        let mut store = ScheduleStore::load(MemoryStore::default());
        assert!(!store.clear());
        store.add(calc()).unwrap();
        assert!(store.clear());
        assert!(store.is_empty());
    }

    #[test]
    fn stats_count_campuses_and_credits() {
        let mut store = ScheduleStore::load(MemoryStore::default());
        store.add(calc()).unwrap();
        let mut livingston = course("01:198:205", section("3", vec![]));
        livingston.campus_locations = vec!["Livingston".to_string()];
        livingston.credits = Some(3.0);
        store.add(livingston).unwrap();
        let mut no_credits = course("01:198:206", section("4", vec![]));
        no_credits.credits = None;
        store.add(no_credits).unwrap();

        let stats = store.stats();
        assert_eq!(stats.total_courses, 3);
        assert_eq!(stats.campus_count, 2);
        assert!((stats.total_credits - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn file_store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = FileStore::new(dir.path().join("nested"));
        assert_eq!(files.get(STORAGE_KEY).unwrap(), None);

        files.set(STORAGE_KEY, "[]").unwrap();
        assert_eq!(files.get(STORAGE_KEY).unwrap().as_deref(), Some("[]"));
        assert!(!dir.path().join("nested").join("scheduledCourses.json.tmp").exists());

        let mut store = ScheduleStore::load(files);
        store.add(calc()).unwrap();
        let reloaded = ScheduleStore::load(FileStore::new(dir.path().join("nested")));
        assert_eq!(reloaded.len(), 1);
    }
}
