pub mod conflicts;
pub mod error;
pub mod layout;
pub mod model;
pub mod planner;
pub mod store;
pub mod time;
pub mod workflow;

pub use error::ScheduleError;
pub use layout::{BlockKind, CalendarBlock, GridModel};
pub use model::{ScheduledCourse, Section};
pub use planner::Planner;
pub use store::{FileStore, ScheduleStore};
pub use workflow::{Alternatives, FetchRequest, FetchTicket, PanelState};
