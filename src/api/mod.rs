mod types;
mod client;

pub use types::*;
pub use client::CourseClient;
