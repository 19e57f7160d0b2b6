//! Per-day overlap detection over the meetings of scheduled sections.
//!
//! Meetings are visited in schedule order. A meeting is accepted when it overlaps no
//! previously accepted meeting on its day. When it does overlap, the new meeting and every
//! accepted meeting it hits are marked conflicting, and one report is emitted per pair.
//! Accepted meetings that later turn out to conflict are dropped from `placed` at the end.

use serde::Serialize;

use super::error::ScheduleError;
use super::model::{Meeting, ScheduledCourse, Section};
use super::time::{format_minutes, DAY_COUNT, DAY_NAMES};

/// Half-open `[start, end)` minute range on one weekday column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub day: usize,
    pub start: u32,
    pub end: u32,
}

impl Interval {
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.day == other.day && !(self.end <= other.start || self.start >= other.end)
    }

    pub fn range_label(&self) -> String {
        format!("{} - {}", format_minutes(self.start), format_minutes(self.end))
    }
}

/// Points at one meeting: entry position in the store, meeting position in its section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeetingRef {
    pub entry: usize,
    pub meeting: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedMeeting {
    pub at: MeetingRef,
    pub interval: Interval,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    pub course_label: String,
    pub day: String,
    pub time_range: String,
    pub conflicts_with_label: String,
    #[serde(skip)]
    pub meeting: MeetingRef,
    #[serde(skip)]
    pub conflicts_with: MeetingRef,
}

impl ConflictReport {
    pub fn message(&self) -> String {
        format!(
            "{} ({} {}) conflicts with {}",
            self.course_label, self.day, self.time_range, self.conflicts_with_label
        )
    }

    pub fn involves(&self, at: MeetingRef) -> bool {
        self.meeting == at || self.conflicts_with == at
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConflictResult {
    pub placed: Vec<PlacedMeeting>,
    pub conflicting: Vec<PlacedMeeting>,
    pub conflicts: Vec<ConflictReport>,
    /// Meetings that never reached the grid, with the reason
    pub skipped: Vec<(MeetingRef, ScheduleError)>,
}

pub fn conflict_warning(conflicts: &[ConflictReport]) -> Option<String> {
    if conflicts.is_empty() {
        return None;
    }
    let noun = if conflicts.len() == 1 { "conflict" } else { "conflicts" };
    let lines: Vec<String> = conflicts.iter().map(ConflictReport::message).collect();
    Some(format!(
        "{} time {} hidden from the calendar: {}",
        conflicts.len(),
        noun,
        lines.join("; ")
    ))
}

/// Weekday column and minute range of a meeting
pub fn meeting_interval(meeting: &Meeting) -> Result<Interval, ScheduleError> {
    let start = meeting.start_minute().ok_or_else(|| ScheduleError::UnparsableTime {
        text: meeting.start_time.formatted.clone(),
    })?;
    let day = meeting.day_index().ok_or_else(|| ScheduleError::OffGridDay {
        day: meeting.day.clone(),
    })?;
    let end = meeting.end_minute().unwrap_or(start);
    Ok(Interval { day, start, end })
}

pub fn detect_conflicts(entries: &[ScheduledCourse]) -> ConflictResult {
    detect_conflicts_with(entries, None)
}

/// Same as [`detect_conflicts`], with the section at one position swapped for a candidate.
/// Used to preview an alternate section without touching the store.
pub fn detect_conflicts_with(
    entries: &[ScheduledCourse],
    substitute: Option<(usize, &Section)>,
) -> ConflictResult {
    let mut result = ConflictResult::default();
    let mut candidates: Vec<PlacedMeeting> = Vec::new();
    let mut marked: Vec<bool> = Vec::new();
    let mut accepted: [Vec<usize>; DAY_COUNT] = Default::default();

    for (entry_idx, course) in entries.iter().enumerate() {
        let section = match substitute {
            Some((position, candidate)) if position == entry_idx => candidate,
            _ => &course.selected_section,
        };

        for (meeting_idx, meeting) in section.meeting_times.iter().enumerate() {
            let at = MeetingRef {
                entry: entry_idx,
                meeting: meeting_idx,
            };

            let interval = match meeting_interval(meeting) {
                Ok(interval) => interval,
                Err(reason) => {
                    log::debug!("{}: meeting {} not placed: {}", course.course_string, meeting_idx, reason);
                    result.skipped.push((at, reason));
                    continue;
                }
            };

            let collisions: Vec<usize> = accepted[interval.day]
                .iter()
                .copied()
                .filter(|&id| candidates[id].interval.overlaps(&interval))
                .collect();

            let id = candidates.len();
            candidates.push(PlacedMeeting { at, interval });

            if collisions.is_empty() {
                accepted[interval.day].push(id);
                marked.push(false);
                continue;
            }

            marked.push(true);
            for other in collisions {
                marked[other] = true;
                let other_label = entries
                    .get(candidates[other].at.entry)
                    .map(|c| c.course_string.clone())
                    .unwrap_or_default();
                result.conflicts.push(ConflictReport {
                    course_label: course.course_string.clone(),
                    day: DAY_NAMES[interval.day].to_string(),
                    time_range: interval.range_label(),
                    conflicts_with_label: other_label,
                    meeting: at,
                    conflicts_with: candidates[other].at,
                });
            }
        }
    }

    for (candidate, is_conflicting) in candidates.into_iter().zip(marked) {
        if is_conflicting {
            result.conflicting.push(candidate);
        } else {
            result.placed.push(candidate);
        }
    }

    if !result.conflicts.is_empty() {
        log::info!("{} schedule conflicts detected", result.conflicts.len());
    }

    result
}
