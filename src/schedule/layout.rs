//! Calendar grid model: hour rows from 7 AM to midnight across five weekday columns,
//! with minute-precise blocks positioned in per-day overlays spanning the full grid height.

use super::conflicts::{detect_conflicts, detect_conflicts_with, ConflictReport, Interval, MeetingRef, PlacedMeeting};
use super::error::ScheduleError;
use super::model::{ScheduledCourse, Section};
use super::time::format_minutes;

pub const GRID_START_HOUR: u32 = 7;
pub const GRID_END_HOUR: u32 = 24;

/// Blocks never get shorter than this, so short meetings stay clickable
pub const MIN_BLOCK_HEIGHT: f32 = 18.0;

/// Row height used when no rendered row could be measured
pub const FALLBACK_ROW_HEIGHT: f32 = 45.0;

#[derive(Debug, Clone, PartialEq)]
pub struct TimeRow {
    pub hour: u32,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Scheduled,
    /// Preview of an alternate section, never written to the store
    Ghost { conflicting: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarBlock {
    pub at: MeetingRef,
    pub day: usize,
    pub start_minute: u32,
    pub end_minute: u32,
    /// Offset from the top of the day overlay, in pixels
    pub top: f32,
    pub height: f32,
    pub course_label: String,
    pub title: String,
    pub time_label: String,
    pub location: String,
    pub kind: BlockKind,
}

impl CalendarBlock {
    pub fn is_ghost(&self) -> bool {
        matches!(self.kind, BlockKind::Ghost { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridModel {
    pub rows: Vec<TimeRow>,
    pub row_height: f32,
    pub blocks: Vec<CalendarBlock>,
    pub conflicts: Vec<ConflictReport>,
    pub dropped: Vec<(MeetingRef, ScheduleError)>,
}

impl GridModel {
    /// Height of each day overlay
    pub fn grid_height(&self) -> f32 {
        self.rows.len() as f32 * self.row_height
    }

    pub fn blocks_for_day(&self, day: usize) -> impl Iterator<Item = &CalendarBlock> {
        self.blocks.iter().filter(move |b| b.day == day)
    }
}

/// Use a measured row height when there is a usable one
pub fn resolve_row_height(measured: Option<f32>) -> f32 {
    match measured {
        Some(h) if h.is_finite() && h > 0.0 => h,
        _ => FALLBACK_ROW_HEIGHT,
    }
}

/// One labeled row per hour, 7 AM through the closing 12 AM row
pub fn time_rows() -> Vec<TimeRow> {
    (GRID_START_HOUR..=GRID_END_HOUR)
        .map(|hour| TimeRow {
            hour,
            label: format_minutes(hour * 60),
        })
        .collect()
}

pub fn in_grid(interval: &Interval) -> bool {
    interval.start >= GRID_START_HOUR * 60 && interval.end <= GRID_END_HOUR * 60
}

/// (top, height) in pixels for a minute range
pub fn block_geometry(interval: &Interval, row_height: f32) -> (f32, f32) {
    let px_per_minute = row_height / 60.0;
    let from_grid_start = interval.start.saturating_sub(GRID_START_HOUR * 60);
    let top = from_grid_start as f32 * px_per_minute;
    let height = ((interval.end - interval.start) as f32 * px_per_minute).max(MIN_BLOCK_HEIGHT);
    (top, height)
}

fn build_block(
    entries: &[ScheduledCourse],
    section: &Section,
    placed: &PlacedMeeting,
    row_height: f32,
    kind: BlockKind,
) -> Option<CalendarBlock> {
    let course = entries.get(placed.at.entry)?;
    let meeting = section.meeting_times.get(placed.at.meeting)?;
    let (top, height) = block_geometry(&placed.interval, row_height);
    Some(CalendarBlock {
        at: placed.at,
        day: placed.interval.day,
        start_minute: placed.interval.start,
        end_minute: placed.interval.end,
        top,
        height,
        course_label: course.course_string.clone(),
        title: course.title.clone(),
        time_label: placed.interval.range_label(),
        location: meeting.location(),
        kind,
    })
}

fn out_of_grid(placed: &PlacedMeeting) -> ScheduleError {
    ScheduleError::OutOfGridRange {
        range: placed.interval.range_label(),
    }
}

pub fn layout(entries: &[ScheduledCourse], row_height_px: f32) -> GridModel {
    let row_height = resolve_row_height(Some(row_height_px));
    let result = detect_conflicts(entries);
    let mut dropped = result.skipped;
    let mut blocks = Vec::with_capacity(result.placed.len());

    for placed in &result.placed {
        if !in_grid(&placed.interval) {
            log::debug!("Dropping meeting {:?}: {}", placed.at, out_of_grid(placed));
            dropped.push((placed.at, out_of_grid(placed)));
            continue;
        }
        let section = &entries[placed.at.entry].selected_section;
        if let Some(block) = build_block(entries, section, placed, row_height, BlockKind::Scheduled) {
            blocks.push(block);
        }
    }

    GridModel {
        rows: time_rows(),
        row_height,
        blocks,
        conflicts: result.conflicts,
        dropped,
    }
}

/// Ghost blocks for `candidate` as if it replaced the section at `position`
pub fn layout_preview(
    entries: &[ScheduledCourse],
    position: usize,
    candidate: &Section,
    row_height_px: f32,
) -> Vec<CalendarBlock> {
    if position >= entries.len() {
        return Vec::new();
    }
    let row_height = resolve_row_height(Some(row_height_px));
    let result = detect_conflicts_with(entries, Some((position, candidate)));

    let placed = result.placed.iter().map(|p| (p, false));
    let conflicting = result.conflicting.iter().map(|p| (p, true));

    let mut blocks: Vec<CalendarBlock> = placed
        .chain(conflicting)
        .filter(|(p, _)| p.at.entry == position && in_grid(&p.interval))
        .filter_map(|(p, conflicting)| {
            build_block(entries, candidate, p, row_height, BlockKind::Ghost { conflicting })
        })
        .collect();
    blocks.sort_by_key(|b| b.at.meeting);
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::model::fixtures::{course, meeting, section};

    #[test]
    fn eighteen_rows_from_seven_am_to_midnight() {
        let rows = time_rows();
        assert_eq!(rows.len(), 18);
        assert_eq!(rows[0].label, "7:00 AM");
        assert_eq!(rows[5].label, "12:00 PM");
        assert_eq!(rows[17].label, "12:00 AM");
    }

    #[test]
    fn eight_to_nine_monday_block_geometry() {
        let entries = vec![course("01:198:112", section("1", vec![meeting("Monday", "8:00 AM", "9:00 AM")]))];
        let grid = layout(&entries, 45.0);

        assert_eq!(grid.blocks.len(), 1);
        let block = &grid.blocks[0];
        assert_eq!(block.day, 0);
        assert!((block.top - 45.0).abs() < f32::EPSILON);
        assert!((block.height - 45.0).abs() < f32::EPSILON);
        assert_eq!(block.time_label, "8:00 AM - 9:00 AM");
        assert_eq!(block.location, "HLL 114");
    }

    #[test]
    fn short_meeting_gets_minimum_height() {
        let entries = vec![course("A", section("1", vec![meeting("Tuesday", "10:00 AM", "10:10 AM")]))];
        let grid = layout(&entries, 45.0);
        assert!((grid.blocks[0].height - MIN_BLOCK_HEIGHT).abs() < f32::EPSILON);
    }

    #[test]
    fn sub_hour_start_is_minute_precise() {
        let entries = vec![course("A", section("1", vec![meeting("Thursday", "1:40 PM", "3:00 PM")]))];
        let grid = layout(&entries, 60.0);
        let block = &grid.blocks[0];
        // 13:40 is 400 minutes after 7:00, at one pixel per minute
        assert!((block.top - 400.0).abs() < f32::EPSILON);
        assert!((block.height - 80.0).abs() < f32::EPSILON);
    }

    #[test]
    fn conflicting_meetings_are_not_rendered() {
        let entries = vec![
            course("01:198:112", section("12345", vec![meeting("Monday", "9:00 AM", "10:20 AM")])),
            course("01:640:250", section("22222", vec![meeting("Monday", "9:50 AM", "11:00 AM")])),
        ];
        let grid = layout(&entries, 45.0);
        assert!(grid.blocks.is_empty());
        assert_eq!(grid.conflicts.len(), 1);
    }

    #[test]
    fn meetings_outside_the_grid_are_dropped() {
        let entries = vec![course(
            "A",
            section(
                "1",
                vec![
                    meeting("Monday", "6:30 AM", "7:30 AM"),
                    meeting("Tuesday", "11:30 PM", "N/A"),
                    meeting("Wednesday", "10:00 PM", "12:00 AM"),
                ],
            ),
        )];
        let grid = layout(&entries, 45.0);
        // Ending at 12:00 AM closes exactly at the bottom of the grid
        assert_eq!(grid.blocks.len(), 1);
        assert_eq!(grid.blocks[0].day, 2);
        assert_eq!(grid.blocks[0].end_minute, 24 * 60);
        assert!((grid.blocks[0].height - 90.0).abs() < f32::EPSILON);
        assert_eq!(grid.dropped.len(), 2);
        assert!(grid
            .dropped
            .iter()
            .all(|(_, e)| matches!(e, ScheduleError::OutOfGridRange { .. })));
    }

    #[test]
    fn reversed_times_do_not_swallow_the_day() {
        let entries = vec![
            course("A", section("1", vec![meeting("Monday", "10:00 AM", "9:50 AM")])),
            course("B", section("2", vec![meeting("Monday", "3:00 PM", "4:00 PM")])),
        ];
        let grid = layout(&entries, 45.0);
        assert!(grid.conflicts.is_empty());
        assert_eq!(grid.blocks.len(), 2);
        assert_eq!(grid.blocks[0].end_minute, 11 * 60);
    }

    #[test]
    fn bad_row_height_uses_fallback() {
        assert_eq!(resolve_row_height(None), FALLBACK_ROW_HEIGHT);
        assert_eq!(resolve_row_height(Some(0.0)), FALLBACK_ROW_HEIGHT);
        assert_eq!(resolve_row_height(Some(f32::NAN)), FALLBACK_ROW_HEIGHT);
        assert_eq!(resolve_row_height(Some(52.0)), 52.0);

        let grid = layout(&[], 0.0);
        assert_eq!(grid.row_height, FALLBACK_ROW_HEIGHT);
        assert!((grid.grid_height() - 18.0 * FALLBACK_ROW_HEIGHT).abs() < f32::EPSILON);
    }

    #[test]
    fn preview_marks_ghosts_and_their_conflicts() {
        let entries = vec![
            course("A", section("1", vec![meeting("Monday", "9:00 AM", "10:00 AM")])),
            course("B", section("2", vec![meeting("Friday", "9:00 AM", "10:00 AM")])),
        ];
        let alternate = section(
            "3",
            vec![
                meeting("Monday", "9:30 AM", "10:30 AM"),
                meeting("Wednesday", "9:30 AM", "10:30 AM"),
            ],
        );
        let ghosts = layout_preview(&entries, 1, &alternate, 45.0);

        assert_eq!(ghosts.len(), 2);
        assert!(ghosts.iter().all(CalendarBlock::is_ghost));
        assert_eq!(ghosts[0].kind, BlockKind::Ghost { conflicting: true });
        assert_eq!(ghosts[1].kind, BlockKind::Ghost { conflicting: false });
        assert_eq!(ghosts[1].day, 2);
    }
}
