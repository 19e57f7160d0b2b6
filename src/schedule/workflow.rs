//! Side panel state machine: course details, choosing an alternate section, ghost previews.
//!
//! `Closed -> Details -> Sections -> Details (after commit) -> Closed`. Section lists are fetched
//! asynchronously by the caller; each fetch carries a [`FetchTicket`] and only the ticket the
//! panel is currently waiting on is applied. Time is passed in so the hover debounce is testable.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::error::ScheduleError;
use super::layout::{layout_preview, CalendarBlock};
use super::model::{EntryKey, ScheduledCourse, Section};
use super::store::{PersistenceStore, ScheduleStore};

pub const PREVIEW_DEBOUNCE: Duration = Duration::from_millis(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket(u64);

/// Ask the Sections Lookup Service for every section of `course_string`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub ticket: FetchTicket,
    pub course_string: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Alternatives {
    Loading,
    Ready(Vec<Section>),
    /// The fetch failed; shown as an empty list
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelState {
    Closed,
    Details {
        entry: EntryKey,
        position: usize,
    },
    Sections {
        entry: EntryKey,
        position: usize,
        ticket: FetchTicket,
        alternatives: Alternatives,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Applied,
    /// The panel moved on before the result arrived
    Stale,
    Failed(ScheduleError),
}

/// Single-shot timer: scheduling again pushes the deadline out
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, deadline: None }
    }

    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// True once, when the deadline has passed
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }
}

pub struct DetailWorkflow {
    state: PanelState,
    /// Section lists per course string, kept for the session
    cache: HashMap<String, Vec<Section>>,
    preview: Option<String>,
    clear_preview: Debouncer,
    next_ticket: u64,
}

impl DetailWorkflow {
    pub fn new(debounce: Duration) -> Self {
        Self {
            state: PanelState::Closed,
            cache: HashMap::new(),
            preview: None,
            clear_preview: Debouncer::new(debounce),
            next_ticket: 0,
        }
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.state, PanelState::Closed)
    }

    /// Store position of the entry the panel shows
    pub fn position(&self) -> Option<usize> {
        match &self.state {
            PanelState::Closed => None,
            PanelState::Details { position, .. } | PanelState::Sections { position, .. } => Some(*position),
        }
    }

    pub fn alternatives(&self) -> Option<&Alternatives> {
        match &self.state {
            PanelState::Sections { alternatives, .. } => Some(alternatives),
            _ => None,
        }
    }

    pub fn open_details(&mut self, courses: &[ScheduledCourse], position: usize) -> Result<(), ScheduleError> {
        let course = courses.get(position).ok_or(ScheduleError::PositionOutOfRange {
            position,
            len: courses.len(),
        })?;
        self.stop_preview();
        self.state = PanelState::Details {
            entry: course.key(),
            position,
        };
        Ok(())
    }

    /// Move from details to the section list. Returns a request when the list isn't cached.
    pub fn begin_switch(&mut self, courses: &[ScheduledCourse]) -> Option<FetchRequest> {
        let (entry, position) = match &self.state {
            PanelState::Details { entry, position } => (entry.clone(), *position),
            _ => return None,
        };
        let course_string = courses.get(position)?.course_string.clone();
        self.enter_sections(entry, position, course_string)
    }

    fn enter_sections(&mut self, entry: EntryKey, position: usize, course_string: String) -> Option<FetchRequest> {
        let ticket = self.issue_ticket();
        if let Some(sections) = self.cache.get(&course_string) {
            log::debug!("Sections for {} served from cache", course_string);
            self.state = PanelState::Sections {
                entry,
                position,
                ticket,
                alternatives: Alternatives::Ready(sections.clone()),
            };
            return None;
        }

        self.state = PanelState::Sections {
            entry,
            position,
            ticket,
            alternatives: Alternatives::Loading,
        };
        Some(FetchRequest { ticket, course_string })
    }

    fn issue_ticket(&mut self) -> FetchTicket {
        self.next_ticket += 1;
        FetchTicket(self.next_ticket)
    }

    /// Deliver a finished fetch. Successful lists are cached even when stale.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        course_string: &str,
        result: Result<Vec<Section>, ScheduleError>,
    ) -> FetchOutcome {
        if let Ok(sections) = &result {
            self.cache.insert(course_string.to_string(), sections.clone());
        }

        let alternatives = match &mut self.state {
            PanelState::Sections {
                ticket: current,
                alternatives,
                ..
            } if *current == ticket => alternatives,
            _ => {
                log::debug!("Ignoring stale section list for {}", course_string);
                return FetchOutcome::Stale;
            }
        };

        match result {
            Ok(sections) => {
                *alternatives = Alternatives::Ready(sections);
                FetchOutcome::Applied
            }
            Err(e) => {
                log::warn!("Section fetch for {} failed: {}", course_string, e);
                *alternatives = Alternatives::Failed;
                FetchOutcome::Failed(e)
            }
        }
    }

    /// Show a ghost preview of the section with this index right away
    pub fn hover_section(&mut self, index: &str) {
        let listed = matches!(
            self.alternatives(),
            Some(Alternatives::Ready(sections)) if sections.iter().any(|s| s.index == index)
        );
        if !listed {
            return;
        }
        self.clear_preview.cancel();
        self.preview = Some(index.to_string());
    }

    /// Pointer or focus left a section; the preview goes away after the debounce
    pub fn leave_section(&mut self, now: Instant) {
        if self.preview.is_some() {
            self.clear_preview.schedule(now);
        }
    }

    /// Run due timers. Returns true when the preview changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.clear_preview.fire(now) {
            return self.preview.take().is_some();
        }
        false
    }

    pub fn next_wakeup(&self, now: Instant) -> Option<Duration> {
        self.clear_preview.remaining(now)
    }

    pub fn preview_section(&self) -> Option<&Section> {
        let index = self.preview.as_deref()?;
        match self.alternatives()? {
            Alternatives::Ready(sections) => sections.iter().find(|s| s.index == index),
            _ => None,
        }
    }

    pub fn preview_blocks(&self, courses: &[ScheduledCourse], row_height: f32) -> Vec<CalendarBlock> {
        match (self.position(), self.preview_section()) {
            (Some(position), Some(section)) => layout_preview(courses, position, section, row_height),
            _ => Vec::new(),
        }
    }

    /// Commit the listed section with this index. Ok(false) when there is nothing to commit.
    pub fn select_section<P: PersistenceStore>(
        &mut self,
        store: &mut ScheduleStore<P>,
        index: &str,
    ) -> Result<bool, ScheduleError> {
        let (position, section) = match &self.state {
            PanelState::Sections {
                position,
                alternatives: Alternatives::Ready(sections),
                ..
            } => match sections.iter().find(|s| s.index == index) {
                Some(section) => (*position, section.clone()),
                None => return Ok(false),
            },
            _ => return Ok(false),
        };

        store.replace_section(position, section)?;
        self.stop_preview();
        let entry = store
            .get(position)
            .map(ScheduledCourse::key)
            .ok_or(ScheduleError::PositionOutOfRange {
                position,
                len: store.len(),
            })?;
        self.state = PanelState::Details { entry, position };
        Ok(true)
    }

    pub fn back_to_details(&mut self) {
        if let PanelState::Sections { entry, position, .. } = &self.state {
            self.state = PanelState::Details {
                entry: entry.clone(),
                position: *position,
            };
            self.stop_preview();
        }
    }

    pub fn close(&mut self) {
        self.stop_preview();
        self.state = PanelState::Closed;
    }

    fn stop_preview(&mut self) {
        self.clear_preview.cancel();
        self.preview = None;
    }

    /// Follow the panel's entry after a store mutation. Closes the panel if the entry is gone;
    /// a section list that failed to load is requested again.
    pub fn on_store_changed(&mut self, courses: &[ScheduledCourse]) -> Option<FetchRequest> {
        let entry = match &self.state {
            PanelState::Closed => return None,
            PanelState::Details { entry, .. } | PanelState::Sections { entry, .. } => entry.clone(),
        };

        let Some(new_position) = courses.iter().position(|c| c.key() == entry) else {
            log::debug!("Closing panel, {} was removed", entry.course_string);
            self.close();
            return None;
        };

        let refetch = match &mut self.state {
            PanelState::Details { position, .. } => {
                *position = new_position;
                false
            }
            PanelState::Sections {
                position,
                alternatives,
                ..
            } => {
                *position = new_position;
                match alternatives {
                    Alternatives::Loading => false,
                    Alternatives::Ready(sections) => {
                        if let Some(cached) = self.cache.get(&entry.course_string) {
                            *sections = cached.clone();
                        }
                        false
                    }
                    Alternatives::Failed => true,
                }
            }
            PanelState::Closed => false,
        };

        if !refetch {
            return None;
        }
        self.preview = None;
        let course_string = entry.course_string.clone();
        self.enter_sections(entry, new_position, course_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::model::fixtures::{course, meeting, section};
    use crate::schedule::store::MemoryStore;

    fn store_with_two() -> ScheduleStore<MemoryStore> {
        let mut store = ScheduleStore::load(MemoryStore::default());
        store
            .add(course("01:198:112", section("12345", vec![meeting("Monday", "9:00 AM", "10:20 AM")])))
            .unwrap();
        store
            .add(course("01:640:250", section("22222", vec![meeting("Tuesday", "1:00 PM", "2:20 PM")])))
            .unwrap();
        store
    }

    fn alternates() -> Vec<Section> {
        vec![
            section("12345", vec![meeting("Monday", "9:00 AM", "10:20 AM")]),
            section("12346", vec![meeting("Wednesday", "9:00 AM", "10:20 AM")]),
            section("12347", vec![meeting("Tuesday", "1:30 PM", "2:50 PM")]),
        ]
    }

    fn workflow_in_sections(store: &ScheduleStore<MemoryStore>) -> (DetailWorkflow, FetchRequest) {
        let mut wf = DetailWorkflow::new(PREVIEW_DEBOUNCE);
        wf.open_details(store.courses(), 0).unwrap();
        let request = wf.begin_switch(store.courses()).unwrap();
        (wf, request)
    }

    #[test]
    fn open_details_validates_position() {
        let store = store_with_two();
        let mut wf = DetailWorkflow::new(PREVIEW_DEBOUNCE);
        assert!(wf.open_details(store.courses(), 5).is_err());
        assert!(!wf.is_open());
        wf.open_details(store.courses(), 1).unwrap();
        assert_eq!(wf.position(), Some(1));
    }

    #[test]
    fn switch_requires_details() {
        let store = store_with_two();
        let mut wf = DetailWorkflow::new(PREVIEW_DEBOUNCE);
        assert!(wf.begin_switch(store.courses()).is_none());
        assert_eq!(wf.state(), &PanelState::Closed);
    }

    #[test]
    fn fetch_applies_then_cache_serves_repeat() {
        let store = store_with_two();
        let (mut wf, request) = workflow_in_sections(&store);
        assert_eq!(request.course_string, "01:198:112");
        assert_eq!(wf.alternatives(), Some(&Alternatives::Loading));

        let outcome = wf.complete_fetch(request.ticket, &request.course_string, Ok(alternates()));
        assert_eq!(outcome, FetchOutcome::Applied);
        assert!(matches!(wf.alternatives(), Some(Alternatives::Ready(list)) if list.len() == 3));

        wf.back_to_details();
        assert!(wf.begin_switch(store.courses()).is_none());
        assert!(matches!(wf.alternatives(), Some(Alternatives::Ready(_))));
    }

    #[test]
    fn result_after_close_is_ignored_but_cached() {
        let store = store_with_two();
        let (mut wf, request) = workflow_in_sections(&store);
        wf.close();

        let outcome = wf.complete_fetch(request.ticket, &request.course_string, Ok(alternates()));
        assert_eq!(outcome, FetchOutcome::Stale);
        assert_eq!(wf.state(), &PanelState::Closed);

        wf.open_details(store.courses(), 0).unwrap();
        assert!(wf.begin_switch(store.courses()).is_none());
    }

    #[test]
    fn result_for_previous_course_is_ignored() {
        let store = store_with_two();
        let (mut wf, first) = workflow_in_sections(&store);
        wf.open_details(store.courses(), 1).unwrap();
        let second = wf.begin_switch(store.courses()).unwrap();
        assert_ne!(first.ticket, second.ticket);

        let outcome = wf.complete_fetch(first.ticket, &first.course_string, Ok(alternates()));
        assert_eq!(outcome, FetchOutcome::Stale);
        assert_eq!(wf.alternatives(), Some(&Alternatives::Loading));
    }

    #[test]
    fn failed_fetch_keeps_panel_open_and_is_not_cached() {
        let store = store_with_two();
        let (mut wf, request) = workflow_in_sections(&store);
        let err = ScheduleError::SectionFetchFailure("connection refused".to_string());

        let outcome = wf.complete_fetch(request.ticket, &request.course_string, Err(err.clone()));
        assert_eq!(outcome, FetchOutcome::Failed(err));
        assert_eq!(wf.alternatives(), Some(&Alternatives::Failed));

        wf.back_to_details();
        assert!(wf.begin_switch(store.courses()).is_some());
    }

    #[test]
    fn hover_preview_clears_after_debounce() {
        let store = store_with_two();
        let (mut wf, request) = workflow_in_sections(&store);
        wf.complete_fetch(request.ticket, &request.course_string, Ok(alternates()));

        let t0 = Instant::now();
        wf.hover_section("12346");
        assert_eq!(wf.preview_section().map(|s| s.index.as_str()), Some("12346"));

        wf.leave_section(t0);
        assert!(!wf.poll(t0 + Duration::from_millis(30)));
        assert!(wf.preview_section().is_some());

        // Moving onto the next section cancels the pending clear
        wf.hover_section("12347");
        assert!(!wf.poll(t0 + Duration::from_millis(90)));
        assert_eq!(wf.preview_section().map(|s| s.index.as_str()), Some("12347"));

        let t1 = t0 + Duration::from_millis(100);
        wf.leave_section(t1);
        assert_eq!(wf.next_wakeup(t1), Some(PREVIEW_DEBOUNCE));
        assert!(wf.poll(t1 + PREVIEW_DEBOUNCE));
        assert!(wf.preview_section().is_none());
    }

    #[test]
    fn unknown_section_is_not_previewed() {
        let store = store_with_two();
        let (mut wf, request) = workflow_in_sections(&store);
        wf.hover_section("12346");
        assert!(wf.preview_section().is_none());

        wf.complete_fetch(request.ticket, &request.course_string, Ok(alternates()));
        wf.hover_section("99999");
        assert!(wf.preview_section().is_none());
    }

    #[test]
    fn close_drops_preview_and_timer() {
        let store = store_with_two();
        let (mut wf, request) = workflow_in_sections(&store);
        wf.complete_fetch(request.ticket, &request.course_string, Ok(alternates()));
        let now = Instant::now();
        wf.hover_section("12346");
        wf.leave_section(now);

        wf.close();
        assert!(wf.preview_section().is_none());
        assert_eq!(wf.next_wakeup(now), None);
        assert!(!wf.poll(now + Duration::from_secs(1)));
    }

    #[test]
    fn ghost_blocks_follow_preview() {
        let store = store_with_two();
        let (mut wf, request) = workflow_in_sections(&store);
        wf.complete_fetch(request.ticket, &request.course_string, Ok(alternates()));

        wf.hover_section("12347");
        let ghosts = wf.preview_blocks(store.courses(), 45.0);
        assert_eq!(ghosts.len(), 1);
        // Tuesday 1:30 PM overlaps the other course's 1:00 PM meeting
        assert_eq!(ghosts[0].kind, crate::schedule::layout::BlockKind::Ghost { conflicting: true });
        assert_eq!(store.courses()[0].selected_section.index, "12345");
    }

    #[test]
    fn select_commits_and_returns_to_details() {
        let mut store = store_with_two();
        let (mut wf, request) = workflow_in_sections(&store);
        wf.complete_fetch(request.ticket, &request.course_string, Ok(alternates()));
        wf.hover_section("12346");

        let before = store.courses()[0].clone();
        assert!(wf.select_section(&mut store, "12346").unwrap());

        let after = &store.courses()[0];
        assert_eq!(after.selected_section.index, "12346");
        assert_eq!(after.course_string, before.course_string);
        assert_eq!(after.title, before.title);
        assert_eq!(after.credits, before.credits);
        assert_eq!(after.campus_locations, before.campus_locations);
        assert!(wf.preview_section().is_none());
        assert!(matches!(wf.state(), PanelState::Details { entry, position: 0 } if entry.section_index == "12346"));
    }

    #[test]
    fn select_outside_sections_is_a_no_op() {
        let mut store = store_with_two();
        let mut wf = DetailWorkflow::new(PREVIEW_DEBOUNCE);
        assert!(!wf.select_section(&mut store, "12346").unwrap());
        assert_eq!(store.persistence().writes, 2);
    }

    #[test]
    fn panel_follows_or_closes_on_store_changes() {
        let mut store = store_with_two();
        let mut wf = DetailWorkflow::new(PREVIEW_DEBOUNCE);
        wf.open_details(store.courses(), 1).unwrap();

        store.remove(0).unwrap();
        assert!(wf.on_store_changed(store.courses()).is_none());
        assert_eq!(wf.position(), Some(0));

        store.remove(0).unwrap();
        wf.on_store_changed(store.courses());
        assert_eq!(wf.state(), &PanelState::Closed);
    }

    #[test]
    fn failed_list_is_refetched_on_store_change() {
        let mut store = store_with_two();
        let (mut wf, request) = workflow_in_sections(&store);
        wf.complete_fetch(
            request.ticket,
            &request.course_string,
            Err(ScheduleError::SectionFetchFailure("timeout".to_string())),
        );

        store.remove(1).unwrap();
        let retry = wf.on_store_changed(store.courses()).unwrap();
        assert_eq!(retry.course_string, "01:198:112");
        assert_ne!(retry.ticket, request.ticket);
        assert_eq!(wf.alternatives(), Some(&Alternatives::Loading));
    }
}
