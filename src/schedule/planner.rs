//! Application root for the schedule: owns the store, the panel workflow and the current grid.
//! Every store mutation recomputes the layout, reports conflicts once, and lets the panel follow.

use std::time::{Duration, Instant};

use super::error::ScheduleError;
use super::layout::{layout, resolve_row_height, CalendarBlock, GridModel, FALLBACK_ROW_HEIGHT};
use super::model::{ScheduledCourse, Section};
use super::store::{PersistenceStore, ScheduleStats, ScheduleStore};
use super::workflow::{DetailWorkflow, FetchOutcome, FetchRequest, FetchTicket};
use crate::notify::{Level, Notifier};

pub struct Planner<P: PersistenceStore> {
    store: ScheduleStore<P>,
    workflow: DetailWorkflow,
    grid: GridModel,
    row_height: f32,
    pending_fetch: Option<FetchRequest>,
}

impl<P: PersistenceStore> Planner<P> {
    pub fn new(store: ScheduleStore<P>, preview_debounce: Duration) -> Self {
        let grid = layout(store.courses(), FALLBACK_ROW_HEIGHT);
        Self {
            store,
            workflow: DetailWorkflow::new(preview_debounce),
            grid,
            row_height: FALLBACK_ROW_HEIGHT,
            pending_fetch: None,
        }
    }

    /// Surface what loading the saved schedule turned up
    pub fn report_loaded(&mut self, notifier: &mut impl Notifier) {
        self.flush_store_warning(notifier);
        if let Some(warning) = self.grid_warning() {
            notifier.notify(&warning, Level::Warning);
        }
    }

    pub fn courses(&self) -> &[ScheduledCourse] {
        self.store.courses()
    }

    pub fn stats(&self) -> ScheduleStats {
        self.store.stats()
    }

    pub fn grid(&self) -> &GridModel {
        &self.grid
    }

    pub fn workflow(&self) -> &DetailWorkflow {
        &self.workflow
    }

    pub fn conflict_count(&self) -> usize {
        self.grid.conflicts.len()
    }

    /// Feed the row height measured from the rendered grid. Relayout is silent.
    pub fn set_row_height(&mut self, measured: Option<f32>) {
        let row_height = resolve_row_height(measured);
        if (row_height - self.row_height).abs() > 0.5 {
            log::debug!("Row height {} -> {}", self.row_height, row_height);
            self.row_height = row_height;
            self.grid = layout(self.store.courses(), row_height);
        }
    }

    /// Section fetch the UI should start, if any
    pub fn take_fetch_request(&mut self) -> Option<FetchRequest> {
        self.pending_fetch.take()
    }

    pub fn add_course(&mut self, course: ScheduledCourse, notifier: &mut impl Notifier) -> bool {
        let number = course.selected_section.number.clone();
        match self.store.add(course) {
            Ok(()) => {
                notifier.notify(&format!("Course added to planner (Section {})!", number), Level::Success);
                self.after_mutation(notifier);
                true
            }
            Err(e) => {
                notifier.notify(&e.to_string(), Level::Warning);
                false
            }
        }
    }

    pub fn remove_course(&mut self, position: usize, notifier: &mut impl Notifier) -> bool {
        match self.store.remove(position) {
            Ok(_) => {
                notifier.notify("Course removed from planner", Level::Info);
                self.after_mutation(notifier);
                true
            }
            Err(e) => {
                log::warn!("{}", e);
                false
            }
        }
    }

    /// Called after the user confirmed. Clearing an empty schedule does nothing.
    pub fn clear(&mut self, notifier: &mut impl Notifier) -> bool {
        if !self.store.clear() {
            return false;
        }
        notifier.notify("Schedule cleared", Level::Info);
        self.after_mutation(notifier);
        true
    }

    pub fn open_details(&mut self, position: usize) {
        if let Err(e) = self.workflow.open_details(self.store.courses(), position) {
            log::warn!("{}", e);
        }
    }

    /// A calendar block was clicked or activated from the keyboard
    pub fn open_block(&mut self, block: &CalendarBlock) {
        if !block.is_ghost() {
            self.open_details(block.at.entry);
        }
    }

    pub fn begin_switch(&mut self) {
        if let Some(request) = self.workflow.begin_switch(self.store.courses()) {
            self.pending_fetch = Some(request);
        }
    }

    pub fn sections_loaded(
        &mut self,
        ticket: FetchTicket,
        course_string: &str,
        result: Result<Vec<Section>, ScheduleError>,
        notifier: &mut impl Notifier,
    ) {
        if let FetchOutcome::Failed(e) = self.workflow.complete_fetch(ticket, course_string, result) {
            notifier.notify(&e.to_string(), Level::Error);
        }
    }

    pub fn hover_section(&mut self, index: &str) {
        self.workflow.hover_section(index);
    }

    pub fn leave_section(&mut self, now: Instant) {
        self.workflow.leave_section(now);
    }

    /// Run preview timers; true when the calendar needs repainting
    pub fn poll(&mut self, now: Instant) -> bool {
        self.workflow.poll(now)
    }

    pub fn next_wakeup(&self, now: Instant) -> Option<Duration> {
        self.workflow.next_wakeup(now)
    }

    pub fn select_section(&mut self, index: &str, notifier: &mut impl Notifier) -> bool {
        match self.workflow.select_section(&mut self.store, index) {
            Ok(true) => {
                notifier.notify("Section switched successfully!", Level::Success);
                self.after_mutation(notifier);
                true
            }
            Ok(false) => false,
            Err(e) => {
                notifier.notify(&e.to_string(), Level::Warning);
                false
            }
        }
    }

    pub fn back_to_details(&mut self) {
        self.workflow.back_to_details();
    }

    pub fn close_panel(&mut self) {
        self.workflow.close();
    }

    pub fn ghost_blocks(&self) -> Vec<CalendarBlock> {
        self.workflow.preview_blocks(self.store.courses(), self.row_height)
    }

    fn grid_warning(&self) -> Option<String> {
        super::conflicts::conflict_warning(&self.grid.conflicts)
    }

    fn flush_store_warning(&mut self, notifier: &mut impl Notifier) {
        if let Some(e) = self.store.take_warning() {
            notifier.notify(&e.to_string(), Level::Error);
        }
    }

    fn after_mutation(&mut self, notifier: &mut impl Notifier) {
        self.grid = layout(self.store.courses(), self.row_height);
        if let Some(warning) = self.grid_warning() {
            notifier.notify(&warning, Level::Warning);
        }
        if let Some(request) = self.workflow.on_store_changed(self.store.courses()) {
            self.pending_fetch = Some(request);
        }
        self.flush_store_warning(notifier);
    }
}
