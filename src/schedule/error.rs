use thiserror::Error;

/// Everything that can go wrong in the schedule engine. None of these are fatal;
/// callers turn them into a notification and keep a safe state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    #[error("Section {section_index} of {course_string} is already in your planner")]
    DuplicateSection {
        course_string: String,
        section_index: String,
    },

    #[error("No scheduled course at position {position} (schedule has {len})")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("Unreadable meeting time \"{text}\"")]
    UnparsableTime { text: String },

    #[error("Meeting {range} is outside the 7:00 AM - 12:00 AM calendar")]
    OutOfGridRange { range: String },

    #[error("\"{day}\" is not a weekday on the calendar")]
    OffGridDay { day: String },

    #[error("Could not load sections: {0}")]
    SectionFetchFailure(String),

    #[error("Saved schedule was unreadable and has been reset: {0}")]
    CorruptPersistedState(String),

    #[error("No courses in your schedule")]
    EmptyScheduleExport,

    #[error("Could not save schedule: {0}")]
    Persistence(String),

    #[error("Export failed: {0}")]
    ExportFailed(String),
}
